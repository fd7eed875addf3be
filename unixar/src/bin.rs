use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::error;
use unixar_core::Mode;

use crate::ext::check_name;
use crate::{wrap_io_err, Archive, Config, Error};

/// Run `op` on every item, carrying on past failures. Each failure is logged
/// and the overall result counts them.
fn for_each_member<T, F>(items: &[T], mut op: F) -> Result<(), Error>
where
    T: AsRef<OsStr>,
    F: FnMut(&T) -> Result<(), Error>,
{
    let mut failed = 0;
    for item in items {
        if let Err(err) = op(item) {
            error!("{}: {}", Path::new(item.as_ref()).display(), err);
            failed += 1;
        }
    }
    if failed > 0 {
        Err(Error::Members {
            failed,
            total: items.len(),
        })
    } else {
        Ok(())
    }
}

/// Append `files` to the archive, creating it if it does not exist.
pub fn append(
    archive_path: impl AsRef<Path>,
    files: &[PathBuf],
    config: &Config,
) -> Result<(), Error> {
    let mut archive = Archive::open_or_create(archive_path, config)?;
    let result = for_each_member(files, |file| archive.append(file).map(|_| ()));
    archive.close()?;
    result
}

/// Append every regular file directly inside `dir`, in name order. The
/// archive and its lock file are skipped.
pub fn append_all(
    archive_path: impl AsRef<Path>,
    dir: impl AsRef<Path>,
    config: &Config,
) -> Result<(), Error> {
    let dir = dir.as_ref();
    let mut archive = Archive::open_or_create(archive_path, config)?;
    let own_path = fs::canonicalize(archive.path())
        .map_err(wrap_io_err!(archive.path(), "Resolving archive path"))?;
    let own_lock = archive
        .archive_lock()
        .and_then(|lock| fs::canonicalize(lock.path()).ok());

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(wrap_io_err!(dir, "Reading directory"))? {
        let entry = entry.map_err(wrap_io_err!(dir, "Reading directory"))?;
        let file_type = entry
            .file_type()
            .map_err(wrap_io_err!(entry.path(), "Reading file type"))?;
        if !file_type.is_file() {
            continue;
        }
        let path = entry.path();
        if let Ok(canonical) = fs::canonicalize(&path) {
            if canonical == own_path || Some(&canonical) == own_lock.as_ref() {
                continue;
            }
        }
        files.push(path);
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let result = for_each_member(&files, |file| archive.append(file).map(|_| ()));
    archive.close()?;
    result
}

/// Extract the named members into `base_dir`, removing them from the archive.
pub fn extract(
    archive_path: impl AsRef<Path>,
    names: &[OsString],
    base_dir: impl AsRef<Path>,
    config: &Config,
) -> Result<(), Error> {
    let mut archive = Archive::open(archive_path, config)?;
    let result = for_each_member(names, |name| {
        let relative = check_name(name.as_bytes())?;
        let dest = base_dir.as_ref().join(relative);
        archive.extract(name.as_bytes(), dest).map(|_| ())
    });
    archive.close()?;
    result
}

/// Delete the named members.
pub fn delete(
    archive_path: impl AsRef<Path>,
    names: &[OsString],
    config: &Config,
) -> Result<(), Error> {
    let mut archive = Archive::open(archive_path, config)?;
    let result = for_each_member(names, |name| archive.delete(name.as_bytes()).map(|_| ()));
    archive.close()?;
    result
}

/// Write the table of contents to `out`, one member per line. The verbose
/// form adds permissions, owner, size and modification time.
pub fn list(
    archive_path: impl AsRef<Path>,
    verbose: bool,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), Error> {
    let mut archive = Archive::open_read_only(archive_path, config)?;
    for member_ref in archive.members()? {
        let member = member_ref?.member()?;
        if verbose {
            writeln!(
                out,
                "{} {}/{} {:>10} {} {}",
                symbolic_mode(member.mode),
                member.uid,
                member.gid,
                member.size,
                format_mtime(member.mtime),
                member.name_lossy()
            )
        } else {
            writeln!(out, "{}", member.name_lossy())
        }
        .map_err(wrap_io_err!("Writing listing"))?;
    }
    archive.close()
}

/// Local time in the layout of `ctime(3)`, e.g. `Sun Sep  9 01:46:40 2001`.
/// Times outside the calendar range print as raw seconds.
pub fn format_mtime(mtime: u64) -> String {
    i64::try_from(mtime)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| {
            time.with_timezone(&Local)
                .format("%a %b %e %H:%M:%S %Y")
                .to_string()
        })
        .unwrap_or_else(|| mtime.to_string())
}

/// Permission bits as `ls` shows them, e.g. `rwsr-xr-x`
pub fn symbolic_mode(mode: Mode) -> String {
    let bit = |flag: Mode, set: char| if mode.contains(flag) { set } else { '-' };
    let exec = |flag: Mode, special: Mode, set: char| {
        match (mode.contains(flag), mode.contains(special)) {
            (true, true) => set,
            (false, true) => set.to_ascii_uppercase(),
            (true, false) => 'x',
            (false, false) => '-',
        }
    };

    [
        bit(Mode::USER_READ, 'r'),
        bit(Mode::USER_WRITE, 'w'),
        exec(Mode::USER_EXEC, Mode::SETUID, 's'),
        bit(Mode::GROUP_READ, 'r'),
        bit(Mode::GROUP_WRITE, 'w'),
        exec(Mode::GROUP_EXEC, Mode::SETGID, 's'),
        bit(Mode::OTHER_READ, 'r'),
        bit(Mode::OTHER_WRITE, 'w'),
        exec(Mode::OTHER_EXEC, Mode::STICKY, 't'),
    ]
    .iter()
    .collect()
}
