//! Advisory locks serializing access to an archive between processes.
//!
//! The lock is taken on a sidecar file next to the archive rather than on the
//! archive itself. A rewrite renames a new file over the archive, and a lock
//! on the old inode would no longer exclude anyone. POSIX record locks are
//! also dropped when any descriptor of the locked file is closed, which would
//! happen whenever the archive is opened a second time as a member source.
//! Nothing but this module opens the sidecar.
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use rustix::fs::{fcntl_lock, FlockOperation};

use crate::{wrap_io_err, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockKind {
    /// Readers
    Shared,
    /// Writers
    Exclusive,
}

/// Path of the lock file guarding `archive`: `.<name>.lock` in the same
/// directory.
pub fn lock_path(archive: &Path) -> Result<PathBuf, Error> {
    let name = archive.file_name().ok_or_else(|| Error::InvalidName {
        path: archive.to_path_buf(),
    })?;
    let mut lock_name = OsString::from(".");
    lock_name.push(name);
    lock_name.push(".lock");
    Ok(archive.with_file_name(lock_name))
}

/// A held lock on an archive. Released on drop.
#[derive(Debug)]
pub struct ArchiveLock {
    path: PathBuf,
    file: File,
    kind: LockKind,
}

impl ArchiveLock {
    /// Block until the lock guarding `archive` is acquired.
    pub fn acquire(archive: &Path, kind: LockKind) -> Result<ArchiveLock, Error> {
        let path = lock_path(archive)?;
        let file = open_lock_file(&path, kind).map_err(wrap_io_err!(&path, "Opening lock file"))?;

        let operation = match kind {
            LockKind::Shared => FlockOperation::LockShared,
            LockKind::Exclusive => FlockOperation::LockExclusive,
        };
        fcntl_lock(&file, operation).map_err(|errno| Error::Io {
            source: io::Error::from(errno),
            path: Some(path.clone()),
            context: "Locking archive",
        })?;
        debug!("locked {} ({:?})", path.display(), kind);

        Ok(ArchiveLock { path, file, kind })
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn unlock(&self) -> Result<(), Error> {
        fcntl_lock(&self.file, FlockOperation::Unlock).map_err(|errno| Error::Io {
            source: io::Error::from(errno),
            path: Some(self.path.clone()),
            context: "Unlocking archive",
        })
    }
}

impl Drop for ArchiveLock {
    fn drop(&mut self) {
        let _ = fcntl_lock(&self.file, FlockOperation::Unlock);
    }
}

/// Shared locks only need read access, so a reader may fall back to opening
/// an existing lock file it cannot write.
fn open_lock_file(path: &Path, kind: LockKind) -> io::Result<File> {
    let result = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path);
    match (kind, result) {
        (LockKind::Shared, Err(err)) if err.kind() == io::ErrorKind::PermissionDenied => {
            File::open(path)
        }
        (_, result) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_name() {
        assert_eq!(
            lock_path(Path::new("dir/lib.a")).unwrap(),
            Path::new("dir/.lib.a.lock")
        );
        assert_eq!(lock_path(Path::new("x")).unwrap(), Path::new(".x.lock"));
        assert!(lock_path(Path::new("..")).is_err());
    }

    #[test]
    fn lock_survives_closing_other_handles() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("test.a");
        std::fs::write(&archive, b"!<arch>\n").unwrap();

        let lock = ArchiveLock::acquire(&archive, LockKind::Exclusive).unwrap();
        // Opening and closing the archive itself does not touch the sidecar
        drop(File::open(&archive).unwrap());
        assert!(lock.path().exists());
        assert_eq!(lock.kind(), LockKind::Exclusive);
        lock.unlock().unwrap();
    }
}
