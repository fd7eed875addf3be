//! Find members by name
use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::cursor::{ArchiveCursor, MemberRef};
use crate::{wrap_io_err, Error};

/// Scan from the first member for one whose name is `name`. When names repeat
/// the first occurrence is returned.
pub fn find<R: Read + Seek>(src: R, name: &[u8]) -> Result<MemberRef, Error> {
    let mut cursor = ArchiveCursor::open(src)?.strict(true);
    while let Some(member) = cursor.next_member()? {
        if member.name() == name {
            debug!(
                "found {} at offset {}",
                String::from_utf8_lossy(name),
                member.offset
            );
            return Ok(member);
        }
    }
    Err(Error::NotFound {
        name: name.to_vec(),
    })
}

pub fn contains<R: Read + Seek>(src: R, name: &[u8]) -> Result<bool, Error> {
    match find(src, name) {
        Ok(_) => Ok(true),
        Err(Error::NotFound { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Walk every member strictly and return the first one called `name`. Unlike
/// [`find`] the walk always reaches the end of the archive, so a partial
/// trailing header or content cut short by the end of the file is an error.
/// Mutations go through this before writing anything.
pub fn scan<R: Read + Seek>(mut src: R, name: &[u8]) -> Result<Option<MemberRef>, Error> {
    let len = src
        .seek(SeekFrom::End(0))
        .map_err(wrap_io_err!("Seeking to archive end"))?;

    let mut found = None;
    let mut cursor = ArchiveCursor::open(src)?.strict(true);
    while let Some(member) = cursor.next_member()? {
        if member.data_end() > len {
            return Err(Error::LengthMismatch {
                name: member.name().to_vec(),
                expected: member.size,
                actual: len.saturating_sub(member.data_offset),
            });
        }
        if found.is_none() && member.name() == name {
            found = Some(member);
        }
    }
    Ok(found)
}
