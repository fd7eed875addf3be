//! Forward-only traversal over the members of an archive
use std::io::{Read, Seek, SeekFrom};

use log::debug;
use unixar_core::{check_magic, pad_len, Header, Member, HEADER_SIZE, MAGIC_SIZE};

use crate::mover::read_full;
use crate::{wrap_io_err, Error};

/// A member header together with where it sits in the archive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberRef {
    pub header: Header,
    /// Absolute offset of the header
    pub offset: u64,
    /// Absolute offset of the content
    pub data_offset: u64,
    /// Content size in bytes, from the header
    pub size: u64,
}

impl MemberRef {
    pub fn name(&self) -> &[u8] {
        self.header.display_name()
    }

    pub fn member(&self) -> Result<Member, Error> {
        Ok(self.header.member()?)
    }

    /// End of the content, excluding the pad byte
    pub fn data_end(&self) -> u64 {
        self.data_offset + self.size
    }

    /// Offset where the following header would start
    pub fn next_offset(&self) -> u64 {
        self.data_end() + pad_len(self.size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorState {
    /// At a header boundary
    Positioned(u64),
    End,
}

pub struct ArchiveCursor<R> {
    src: R,
    state: CursorState,
    strict: bool,
}

impl<R: Read + Seek> ArchiveCursor<R> {
    /// Check the archive magic and position the cursor at the first member.
    pub fn open(mut src: R) -> Result<ArchiveCursor<R>, Error> {
        src.seek(SeekFrom::Start(0))
            .map_err(wrap_io_err!("Seeking to archive start"))?;
        let mut magic = [0; MAGIC_SIZE];
        let count = read_full(&mut src, &mut magic).map_err(wrap_io_err!("Reading archive magic"))?;
        check_magic(&magic[..count])?;

        Ok(ArchiveCursor {
            src,
            state: CursorState::Positioned(MAGIC_SIZE as u64),
            strict: false,
        })
    }

    /// In strict mode a partial trailing header is an error instead of the end
    /// of the archive.
    pub fn strict(mut self, strict: bool) -> ArchiveCursor<R> {
        self.strict = strict;
        self
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn into_inner(self) -> R {
        self.src
    }

    /// Read the header at the current position and step over its content.
    /// Returns `None` once the archive is exhausted. Errors also end the
    /// traversal.
    pub fn next_member(&mut self) -> Result<Option<MemberRef>, Error> {
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.state = CursorState::End;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<MemberRef>, Error> {
        let offset = match self.state {
            CursorState::Positioned(offset) => offset,
            CursorState::End => return Ok(None),
        };

        self.src
            .seek(SeekFrom::Start(offset))
            .map_err(wrap_io_err!("Seeking to member header"))?;
        let mut record = [0; HEADER_SIZE];
        let count = read_full(&mut self.src, &mut record)
            .map_err(wrap_io_err!("Reading member header"))?;
        if count < HEADER_SIZE {
            if self.strict && count > 0 {
                return Err(unixar_core::Error::Truncated {
                    expected: HEADER_SIZE,
                    actual: count,
                }
                .into());
            }
            debug!("end of archive at offset {} ({} trailing bytes)", offset, count);
            return Ok(None);
        }

        let header = Header::decode(&record)?;
        let size = header.size()?;
        let data_offset = offset + HEADER_SIZE as u64;
        let next = data_offset
            .checked_add(size)
            .and_then(|end| end.checked_add(pad_len(size)))
            .ok_or(unixar_core::Error::Overflow)?;
        self.state = CursorState::Positioned(next);

        Ok(Some(MemberRef {
            header,
            offset,
            data_offset,
            size,
        }))
    }
}

impl<R: Read + Seek> Iterator for ArchiveCursor<R> {
    type Item = Result<MemberRef, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_member().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use unixar_core::{Member, Mode, MAGIC};

    use super::*;
    use crate::mover::append_member;

    fn archive(members: &[(&[u8], &[u8])]) -> Cursor<Vec<u8>> {
        let mut archive = Cursor::new(MAGIC.to_vec());
        let mut buf = [0; 16];
        for (name, data) in members {
            let member = Member {
                name: name.to_vec(),
                mtime: 0,
                uid: 0,
                gid: 0,
                mode: Mode::FILE | Mode::from_bits_truncate(0o644),
                size: data.len() as u64,
            };
            append_member(&mut archive, &member, *data, &mut buf).unwrap();
        }
        archive
    }

    #[test]
    fn empty_archive() {
        let mut cursor = ArchiveCursor::open(archive(&[])).unwrap();
        assert!(cursor.next_member().unwrap().is_none());
        assert_eq!(cursor.state(), CursorState::End);
    }

    #[test]
    fn not_an_archive() {
        let err = ArchiveCursor::open(Cursor::new(b"!<arch".to_vec())).err().unwrap();
        assert!(matches!(err, Error::Core(unixar_core::Error::NotAnArchive)));

        let err = ArchiveCursor::open(Cursor::new(b"<bigaf>\n".to_vec())).err().unwrap();
        assert!(matches!(err, Error::Core(unixar_core::Error::NotAnArchive)));
    }

    #[test]
    fn offsets_and_padding() {
        let src = archive(&[(b"odd", b"abc"), (b"even", b"abcd"), (b"last", b"x")]);
        let members = ArchiveCursor::open(src)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let names: Vec<&[u8]> = members.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec![&b"odd"[..], b"even", b"last"]);

        assert_eq!(members[0].offset, 8);
        assert_eq!(members[0].data_offset, 68);
        assert_eq!(members[0].next_offset(), 72);
        assert_eq!(members[1].offset, 72);
        assert_eq!(members[2].offset, 136);
        for member in &members {
            assert_eq!(member.offset % 2, 0);
        }
    }

    #[test]
    fn truncated_trailing_header() {
        let mut src = archive(&[(b"a", b"ab")]);
        src.get_mut().extend_from_slice(b"partial");

        let names = ArchiveCursor::open(src.clone())
            .unwrap()
            .map(|m| m.map(|m| m.name().to_vec()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(names, vec![b"a".to_vec()]);

        let mut strict = ArchiveCursor::open(src).unwrap().strict(true);
        assert!(strict.next_member().unwrap().is_some());
        let err = strict.next_member().unwrap_err();
        assert!(matches!(
            err,
            Error::Core(unixar_core::Error::Truncated { expected: 60, actual: 7 })
        ));
        assert_eq!(strict.state(), CursorState::End);
        assert!(strict.next().is_none());
    }

    #[test]
    fn corrupt_header_ends_traversal() {
        let mut src = archive(&[(b"a", b"ab"), (b"b", b"cd")]);
        // Clobber the terminator of the second header
        let second = 8 + 60 + 2 + 58;
        src.get_mut()[second] = b'?';

        let mut cursor = ArchiveCursor::open(src).unwrap();
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().unwrap().is_err());
        assert!(cursor.next().is_none());
    }
}
