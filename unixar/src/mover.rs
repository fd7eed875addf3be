//! Block copies between the archive and outside files
use std::cmp;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use log::{debug, warn};
use unixar_core::{Header, Member, HEADER_SIZE, PAD_BYTE};

use crate::cursor::MemberRef;
use crate::ext::MemberExt;
use crate::{wrap_io_err, Error};

/// Read until `buf` is full or the source is exhausted. Returns the number of
/// bytes read, which is only short of `buf.len()` at end of file.
pub fn read_full<R: Read + ?Sized>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match src.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(count) => total += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(total)
}

/// Stream `src` into `dst` one block at a time until `src` is exhausted.
fn copy_blocks<R: Read, W: Write + ?Sized>(
    src: &mut R,
    dst: &mut W,
    buf: &mut [u8],
) -> Result<u64, Error> {
    let mut total = 0;
    loop {
        let count = read_full(src, buf).map_err(wrap_io_err!("Reading member data"))?;
        if count == 0 {
            break;
        }
        dst.write_all(&buf[..count])
            .map_err(wrap_io_err!("Writing member data"))?;
        total += count as u64;
    }
    Ok(total)
}

/// Copy `len` bytes starting at `start` in `src` to `dst`. The last block is
/// clipped to the end of the region; returns the number of bytes copied, which
/// is less than `len` only if `src` ended first.
pub fn copy_range<R, W>(
    src: &mut R,
    start: u64,
    len: u64,
    dst: &mut W,
    buf: &mut [u8],
) -> Result<u64, Error>
where
    R: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    if buf.is_empty() {
        return Err(Error::InvalidBlockSize(0));
    }
    src.seek(SeekFrom::Start(start))
        .map_err(wrap_io_err!("Seeking to region"))?;

    let mut remaining = len;
    while remaining > 0 {
        let block = cmp::min(remaining, buf.len() as u64) as usize;
        let count = read_full(src, &mut buf[..block]).map_err(wrap_io_err!("Reading region"))?;
        if count == 0 {
            break;
        }
        dst.write_all(&buf[..count])
            .map_err(wrap_io_err!("Writing region"))?;
        remaining -= count as u64;
    }
    Ok(len - remaining)
}

/// Append a member to the end of `archive`, reading exactly `member.size`
/// bytes of content from `data`.
pub fn append_member<A, R>(
    archive: &mut A,
    member: &Member,
    data: R,
    buf: &mut [u8],
) -> Result<MemberRef, Error>
where
    A: Write + Seek + ?Sized,
    R: Read,
{
    if buf.is_empty() {
        return Err(Error::InvalidBlockSize(0));
    }
    let header = Header::encode(member)?;

    let mut offset = archive
        .seek(SeekFrom::End(0))
        .map_err(wrap_io_err!("Seeking to archive end"))?;
    if offset % 2 == 1 {
        archive
            .write_all(&[PAD_BYTE])
            .map_err(wrap_io_err!("Writing pad byte"))?;
        offset += 1;
    }

    archive
        .write_all(header.as_bytes())
        .map_err(wrap_io_err!("Writing member header"))?;

    let mut data = data.take(member.size);
    let written = copy_blocks(&mut data, archive, buf)?;
    if written != member.size {
        return Err(Error::LengthMismatch {
            name: member.name.clone(),
            expected: member.size,
            actual: written,
        });
    }

    debug!("appended {} at offset {}", member, offset);
    Ok(MemberRef {
        header,
        offset,
        data_offset: offset + HEADER_SIZE as u64,
        size: member.size,
    })
}

/// Append the regular file at `source`, named after its final path component.
pub fn append_file<A>(archive: &mut A, source: &Path, buf: &mut [u8]) -> Result<MemberRef, Error>
where
    A: Write + Seek + ?Sized,
{
    let file = File::open(source).map_err(wrap_io_err!(source, "Opening source file"))?;
    let metadata = file
        .metadata()
        .map_err(wrap_io_err!(source, "Reading source metadata"))?;
    if !metadata.is_file() {
        return Err(Error::NotRegularFile {
            path: source.to_path_buf(),
        });
    }

    let member = Member::from_path(source, &metadata)?;
    append_member(archive, &member, file, buf)
}

/// Create `dest` and copy the content of `member` into it. `dest` must not
/// exist. The file gets the permission bits and modification time recorded in
/// the header.
pub fn extract_to<R>(src: &mut R, member: &MemberRef, dest: &Path, buf: &mut [u8]) -> Result<(), Error>
where
    R: Read + Seek + ?Sized,
{
    let mode = member.header.mode()?.perm();
    let mtime = member.header.mtime()?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode.bits())
        .open(dest)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => Error::AlreadyExists {
                path: dest.to_path_buf(),
            },
            _ => Error::Io {
                source,
                path: Some(dest.to_path_buf()),
                context: "Creating extracted file",
            },
        })?;

    let copied = match copy_range(src, member.data_offset, member.size, &mut file, buf) {
        Ok(copied) if copied == member.size => copied,
        result => {
            if let Err(err) = fs::remove_file(dest) {
                warn!("failed to remove partial {}: {}", dest.display(), err);
            }
            let actual = result?;
            return Err(Error::LengthMismatch {
                name: member.name().to_vec(),
                expected: member.size,
                actual,
            });
        }
    };

    // The umask applies at creation, so set the recorded bits explicitly
    file.set_permissions(Permissions::from_mode(mode.bits()))
        .map_err(wrap_io_err!(dest, "Setting permissions"))?;
    file.set_modified(UNIX_EPOCH + Duration::from_secs(mtime))
        .map_err(wrap_io_err!(dest, "Setting modification time"))?;

    debug!("extracted {} bytes to {}", copied, dest.display());
    Ok(())
}
