//! Cut a byte range out of the middle of an archive
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::mover::{copy_range, read_full};
use crate::{wrap_io_err, Error};

/// Storage whose length can be cut down
pub trait Truncate {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl Truncate for Cursor<Vec<u8>> {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        self.get_mut().truncate(len);
        Ok(())
    }
}

impl<T: Truncate + ?Sized> Truncate for &mut T {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        (**self).truncate(len)
    }
}

fn check_range<S: Seek + ?Sized>(src: &mut S, start: u64, end: u64) -> Result<u64, Error> {
    let len = src
        .seek(SeekFrom::End(0))
        .map_err(wrap_io_err!("Seeking to archive end"))?;
    if end <= start || end > len {
        return Err(Error::InvalidRange { start, end, len });
    }
    Ok(len)
}

/// Remove `start..end` by moving every following block `end - start` bytes
/// towards the start of the file, front to back, then truncating. Returns the
/// new length.
///
/// A failure partway leaves the file partially shifted.
pub fn delete_range<F>(file: &mut F, start: u64, end: u64, buf: &mut [u8]) -> Result<u64, Error>
where
    F: Read + Write + Seek + Truncate + ?Sized,
{
    if buf.is_empty() {
        return Err(Error::InvalidBlockSize(0));
    }
    let len = check_range(file, start, end)?;
    let span = end - start;

    let mut read_pos = end;
    loop {
        file.seek(SeekFrom::Start(read_pos))
            .map_err(wrap_io_err!("Seeking to block"))?;
        let count = read_full(file, buf).map_err(wrap_io_err!("Reading block"))?;
        if count == 0 {
            break;
        }
        file.seek(SeekFrom::Start(read_pos - span))
            .map_err(wrap_io_err!("Seeking to block destination"))?;
        file.write_all(&buf[..count])
            .map_err(wrap_io_err!("Shifting block"))?;
        read_pos += count as u64;
    }

    let new_len = len - span;
    file.truncate(new_len)
        .map_err(wrap_io_err!("Truncating archive"))?;
    debug!("removed {}..{} in place, length now {}", start, end, new_len);
    Ok(new_len)
}

/// Remove `start..end` by writing everything else to a temporary file in the
/// same directory as `path` and renaming it over `path`. `file` is the open
/// archive at `path`; the returned handle refers to the replacement and is
/// open for reading and writing.
pub fn rewrite_without_range(
    path: &Path,
    file: &mut File,
    start: u64,
    end: u64,
    buf: &mut [u8],
) -> Result<File, Error> {
    let len = check_range(file, start, end)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".unixar.")
        .tempfile_in(dir)
        .map_err(wrap_io_err!(dir, "Creating temporary archive"))?;

    let head = copy_range(file, 0, start, tmp.as_file_mut(), buf)?;
    let tail = copy_range(file, end, len - end, tmp.as_file_mut(), buf)?;
    if head + tail != len - (end - start) {
        return Err(Error::InvalidRange { start, end, len });
    }

    let permissions = file
        .metadata()
        .map_err(wrap_io_err!(path, "Reading archive metadata"))?
        .permissions();
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(wrap_io_err!(tmp.path(), "Setting permissions"))?;
    tmp.as_file()
        .sync_all()
        .map_err(wrap_io_err!(tmp.path(), "Syncing temporary archive"))?;

    let replacement = tmp
        .persist(path)
        .map_err(|err| Error::Io {
            source: err.error,
            path: Some(path.to_path_buf()),
            context: "Replacing archive",
        })?;
    debug!(
        "removed {}..{} via rewrite, length now {}",
        start,
        end,
        head + tail
    );
    Ok(replacement)
}
