//! Formatting and parsing of the space-padded ASCII header fields
use core::fmt::{self, Write};
use core::str;

use crate::{Error, Field};

/// Writes into a fixed field, failing instead of growing past its end
struct FieldWriter<'a> {
    field: &'a mut [u8],
    pos: usize,
}

impl Write for FieldWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.pos.checked_add(s.len()).ok_or(fmt::Error)?;
        let dst = self.field.get_mut(self.pos..end).ok_or(fmt::Error)?;
        dst.copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }
}

/// Format `args` left-justified into `field`, filling the rest with spaces.
pub(crate) fn format(field: &mut [u8], which: Field, args: fmt::Arguments) -> Result<(), Error> {
    field.fill(b' ');
    let mut writer = FieldWriter { field, pos: 0 };
    writer
        .write_fmt(args)
        .map_err(|_| Error::FieldOverflow(which))
}

/// Parse a numeric field. Surrounding spaces are ignored and a blank field
/// reads as `None`.
pub(crate) fn parse(field: &[u8], radix: u32, which: Field) -> Result<Option<u64>, Error> {
    let text = str::from_utf8(field)
        .map_err(|_| Error::InvalidField(which))?
        .trim_matches(' ');
    if text.is_empty() {
        return Ok(None);
    }
    if !text.bytes().all(|b| (b as char).is_digit(radix)) {
        return Err(Error::InvalidField(which));
    }
    u64::from_str_radix(text, radix)
        .map(Some)
        .map_err(|_| Error::InvalidField(which))
}
