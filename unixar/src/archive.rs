use std::cmp;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use unixar_core::{Member, MAGIC};

use crate::config::{Config, DuplicatePolicy, SpliceStrategy};
use crate::cursor::{ArchiveCursor, MemberRef};
use crate::lock::{ArchiveLock, LockKind};
use crate::{locate, mover, splice, wrap_io_err, Error};

/// An `ar` archive on disk
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    file: File,
    config: Config,
    /// Exclusive when opened for writing
    access: LockKind,
    lock: Option<ArchiveLock>,
    buf: Vec<u8>,
}

impl Archive {
    /// Take the lock for `path` before the archive is opened, so the handle
    /// opened afterwards is the file the lock holder left behind.
    fn lock(path: &Path, config: &Config, kind: LockKind) -> Result<Option<ArchiveLock>, Error> {
        if !config.lock {
            return Ok(None);
        }
        match ArchiveLock::acquire(path, kind) {
            Ok(lock) => Ok(Some(lock)),
            // Readers in a directory they cannot write carry on unlocked
            Err(Error::Io { source, path: lock_path, .. })
                if kind == LockKind::Shared
                    && matches!(
                        source.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                    ) =>
            {
                warn!(
                    "reading {} without a lock: {}: {}",
                    path.display(),
                    lock_path.unwrap_or_default().display(),
                    source
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn from_file(
        path: PathBuf,
        file: File,
        config: &Config,
        access: LockKind,
        lock: Option<ArchiveLock>,
    ) -> Result<Archive, Error> {
        let buf = config.buffer()?;
        let mut archive = Archive {
            path,
            file,
            config: config.clone(),
            access,
            lock,
            buf,
        };
        // Reject anything that is not an archive before touching it
        ArchiveCursor::open(&mut archive.file).map_err(|err| with_path(err, &archive.path))?;
        Ok(archive)
    }

    /// Open an existing archive for reading and writing. The archive is
    /// locked exclusively until it is closed.
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Archive, Error> {
        let path = path.as_ref().to_path_buf();
        let lock = Archive::lock(&path, config, LockKind::Exclusive)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(wrap_io_err!(&path, "Opening archive"))?;
        Archive::from_file(path, file, config, LockKind::Exclusive, lock)
    }

    /// Open an existing archive for reading only, under a shared lock.
    /// Mutating operations fail on such an archive.
    pub fn open_read_only(path: impl AsRef<Path>, config: &Config) -> Result<Archive, Error> {
        let path = path.as_ref().to_path_buf();
        let lock = Archive::lock(&path, config, LockKind::Shared)?;
        let file = File::open(&path).map_err(wrap_io_err!(&path, "Opening archive"))?;
        Archive::from_file(path, file, config, LockKind::Shared, lock)
    }

    /// Create a new, empty archive. Fails if `path` exists.
    pub fn create(path: impl AsRef<Path>, config: &Config) -> Result<Archive, Error> {
        let path = path.as_ref().to_path_buf();
        let lock = Archive::lock(&path, config, LockKind::Exclusive)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(wrap_io_err!(&path, "Creating archive"))?;
        file.write_all(&MAGIC)
            .map_err(wrap_io_err!(&path, "Writing archive magic"))?;
        info!("created archive {}", path.display());
        Archive::from_file(path, file, config, LockKind::Exclusive, lock)
    }

    /// Open the archive at `path`, creating an empty one if there is none.
    pub fn open_or_create(path: impl AsRef<Path>, config: &Config) -> Result<Archive, Error> {
        let path = path.as_ref();
        match Archive::open(path, config) {
            Err(Error::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Archive::create(path, config)
            }
            result => result,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The lock held on the archive, if locking is enabled
    pub fn archive_lock(&self) -> Option<&ArchiveLock> {
        self.lock.as_ref()
    }

    pub fn len(&mut self) -> Result<u64, Error> {
        self.file
            .seek(SeekFrom::End(0))
            .map_err(wrap_io_err!(&self.path, "Seeking to archive end"))
    }

    /// Lazily walk the members, starting from the first. A truncated trailing
    /// header ends the walk rather than failing it.
    pub fn members(&mut self) -> Result<ArchiveCursor<&mut File>, Error> {
        ArchiveCursor::open(&mut self.file)
    }

    /// Decode the metadata of every member.
    pub fn list(&mut self) -> Result<Vec<Member>, Error> {
        self.members()?
            .map(|member| member.and_then(|member| member.member()))
            .collect()
    }

    pub fn find(&mut self, name: &[u8]) -> Result<MemberRef, Error> {
        locate::find(&mut self.file, name)
    }

    /// Append the regular file at `source` as a new member, named after its
    /// final path component.
    pub fn append(&mut self, source: impl AsRef<Path>) -> Result<MemberRef, Error> {
        let source = source.as_ref();
        let name = source.file_name().ok_or_else(|| Error::InvalidName {
            path: source.to_path_buf(),
        })?;
        self.check_writable()?;
        self.check_append(name.as_bytes())?;

        let member = mover::append_file(&mut self.file, source, &mut self.buf)?;
        info!(
            "appended {} to {}",
            source.display(),
            self.path.display()
        );
        Ok(member)
    }

    /// Append a member whose content is read from `data`.
    pub fn append_reader(&mut self, member: &Member, data: impl Read) -> Result<MemberRef, Error> {
        self.check_writable()?;
        self.check_append(&member.name)?;
        let member_ref = mover::append_member(&mut self.file, member, data, &mut self.buf)?;
        info!("appended {} to {}", member, self.path.display());
        Ok(member_ref)
    }

    fn check_writable(&self) -> Result<(), Error> {
        match self.access {
            LockKind::Exclusive => Ok(()),
            LockKind::Shared => Err(Error::ReadOnly {
                path: self.path.clone(),
            }),
        }
    }

    /// New members must not land after a damaged tail, and must not repeat a
    /// name when duplicates are rejected.
    fn check_append(&mut self, name: &[u8]) -> Result<(), Error> {
        let existing = locate::scan(&mut self.file, name)?;
        if existing.is_some() && self.config.duplicates == DuplicatePolicy::Reject {
            return Err(Error::DuplicateMember {
                name: name.to_vec(),
            });
        }
        Ok(())
    }

    /// Find the member to change, checking the rest of the archive on the way
    fn find_for_update(&mut self, name: &[u8]) -> Result<MemberRef, Error> {
        locate::scan(&mut self.file, name)?.ok_or_else(|| Error::NotFound {
            name: name.to_vec(),
        })
    }

    /// Copy the member `name` into a new file at `dest`, then remove it from
    /// the archive.
    pub fn extract(&mut self, name: &[u8], dest: impl AsRef<Path>) -> Result<MemberRef, Error> {
        let dest = dest.as_ref();
        self.check_writable()?;
        let member = self.find_for_update(name)?;
        mover::extract_to(&mut self.file, &member, dest, &mut self.buf)?;
        self.remove(&member)?;
        info!(
            "extracted {} to {}",
            String::from_utf8_lossy(name),
            dest.display()
        );
        Ok(member)
    }

    /// Remove the first member called `name`.
    pub fn delete(&mut self, name: &[u8]) -> Result<MemberRef, Error> {
        self.check_writable()?;
        let member = self.find_for_update(name)?;
        self.remove(&member)?;
        info!(
            "deleted {} from {}",
            String::from_utf8_lossy(name),
            self.path.display()
        );
        Ok(member)
    }

    /// Cut out the header and content of `member`, and its pad byte when one
    /// is present, so the following headers stay on even offsets.
    fn remove(&mut self, member: &MemberRef) -> Result<(), Error> {
        let len = self.len()?;
        let end = cmp::min(member.next_offset(), len);
        self.delete_range(member.offset, end)
    }

    /// Remove the bytes `start..end` using the configured splice strategy.
    pub fn delete_range(&mut self, start: u64, end: u64) -> Result<(), Error> {
        self.check_writable()?;
        match self.config.splice {
            SpliceStrategy::InPlace => {
                splice::delete_range(&mut self.file, start, end, &mut self.buf)
                    .map_err(|err| with_path(err, &self.path))?;
            }
            SpliceStrategy::RewriteViaTemp => {
                self.file = splice::rewrite_without_range(
                    &self.path,
                    &mut self.file,
                    start,
                    end,
                    &mut self.buf,
                )?;
            }
        }
        debug!("spliced {}..{} out of {}", start, end, self.path.display());
        Ok(())
    }

    /// Flush the archive to disk and release the lock.
    pub fn close(self) -> Result<(), Error> {
        if self.access == LockKind::Exclusive {
            self.file
                .sync_all()
                .map_err(wrap_io_err!(&self.path, "Syncing archive"))?;
        }
        if let Some(lock) = &self.lock {
            lock.unlock()?;
        }
        Ok(())
    }
}

/// Attach the archive path to I/O errors that were raised without one
fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::Io {
            source,
            path: None,
            context,
        } => Error::Io {
            source,
            path: Some(path.to_path_buf()),
            context,
        },
        err => err,
    }
}
