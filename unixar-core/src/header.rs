//! The packed struct represents the on-disk format of a member header
use bytemuck::{Pod, Zeroable};

use crate::field;
use crate::{pad_len, Error, Field, Member, Mode, HEADER_SIZE, TERMINATOR};

/// The header at the start of an archive member. Every field is ASCII text,
/// left-justified and padded with spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Header {
    /// Member name, terminated by `/`
    pub name: [u8; 16],
    /// Modification time in decimal seconds since the epoch
    pub date: [u8; 12],
    /// Owner id in decimal
    pub uid: [u8; 6],
    /// Group id in decimal
    pub gid: [u8; 6],
    /// File mode in octal
    pub mode: [u8; 8],
    /// Content size in decimal bytes, not counting the pad byte
    pub size: [u8; 10],
    /// Must be equal to `TERMINATOR`
    pub terminator: [u8; 2],
}

impl Header {
    /// Parse one header from the front of `data`
    pub fn decode(data: &[u8]) -> Result<Header, Error> {
        let record = data.get(..HEADER_SIZE).ok_or(Error::Truncated {
            expected: HEADER_SIZE,
            actual: data.len(),
        })?;

        let header: Header = *bytemuck::try_from_bytes(record)?;
        if header.terminator != TERMINATOR {
            return Err(Error::InvalidTerminator(header.terminator));
        }
        Ok(header)
    }

    /// Build a header describing `member`. Values that do not fit their field
    /// are an error rather than being cut short.
    pub fn encode(member: &Member) -> Result<Header, Error> {
        let mut header = Header::zeroed();
        header.set_name(&member.name)?;
        field::format(&mut header.date, Field::Date, format_args!("{}", member.mtime))?;
        field::format(&mut header.uid, Field::Uid, format_args!("{}", member.uid))?;
        field::format(&mut header.gid, Field::Gid, format_args!("{}", member.gid))?;
        field::format(&mut header.mode, Field::Mode, format_args!("{:o}", member.mode.bits()))?;
        field::format(&mut header.size, Field::Size, format_args!("{}", member.size))?;
        header.terminator = TERMINATOR;
        Ok(header)
    }

    fn set_name(&mut self, name: &[u8]) -> Result<(), Error> {
        if name.is_empty() || name.iter().any(|&b| b == b'/' || b == 0) {
            return Err(Error::InvalidName);
        }
        // One byte is reserved for the terminating slash
        if name.len() >= self.name.len() {
            return Err(Error::FieldOverflow(Field::Name));
        }
        self.name.fill(b' ');
        self.name[..name.len()].copy_from_slice(name);
        self.name[name.len()] = b'/';
        Ok(())
    }

    /// Retrieve the name, without the trailing padding and `/` terminator
    pub fn display_name(&self) -> &[u8] {
        let mut end = self.name.len();
        while end > 0 && self.name[end - 1] == b' ' {
            end -= 1;
        }
        if end > 0 && self.name[end - 1] == b'/' {
            end -= 1;
        }
        &self.name[..end]
    }

    pub fn mtime(&self) -> Result<u64, Error> {
        Ok(field::parse(&self.date, 10, Field::Date)?.unwrap_or(0))
    }

    pub fn uid(&self) -> Result<u32, Error> {
        let uid = field::parse(&self.uid, 10, Field::Uid)?.unwrap_or(0);
        u32::try_from(uid).map_err(|_| Error::InvalidField(Field::Uid))
    }

    pub fn gid(&self) -> Result<u32, Error> {
        let gid = field::parse(&self.gid, 10, Field::Gid)?.unwrap_or(0);
        u32::try_from(gid).map_err(|_| Error::InvalidField(Field::Gid))
    }

    pub fn mode(&self) -> Result<Mode, Error> {
        let mode = field::parse(&self.mode, 8, Field::Mode)?.unwrap_or(0);
        u32::try_from(mode)
            .map(Mode::from_bits_retain)
            .map_err(|_| Error::InvalidField(Field::Mode))
    }

    pub fn size(&self) -> Result<u64, Error> {
        field::parse(&self.size, 10, Field::Size)?.ok_or(Error::InvalidField(Field::Size))
    }

    /// Decode every field
    pub fn member(&self) -> Result<Member, Error> {
        Ok(Member {
            name: self.display_name().to_vec(),
            mtime: self.mtime()?,
            uid: self.uid()?,
            gid: self.gid()?,
            mode: self.mode()?,
            size: self.size()?,
        })
    }

    /// Retrieve the size of the header and its content, excluding the pad
    pub fn total_size(&self) -> Result<u64, Error> {
        self.size()?
            .checked_add(HEADER_SIZE as u64)
            .ok_or(Error::Overflow)
    }

    /// Retrieve the distance from this header to the next one
    pub fn padded_size(&self) -> Result<u64, Error> {
        let size = self.size()?;
        self.total_size()?
            .checked_add(pad_len(size))
            .ok_or(Error::Overflow)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
