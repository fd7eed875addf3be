//! Data types for the classic UNIX `ar` archive format.
//!
//! An archive is the 8 byte [`MAGIC`] followed by members. Each member is a
//! [`Header`] of [`HEADER_SIZE`] ASCII bytes, then `size` bytes of content,
//! then a single [`PAD_BYTE`] when `size` is odd so the next header starts on
//! an even offset.
#![no_std]
extern crate alloc;

use core::mem;

pub use crate::error::{Error, Field};
pub use crate::header::Header;
pub use crate::member::Member;
pub use crate::mode::Mode;

mod error;
mod field;
mod header;
mod member;
mod mode;
#[cfg(test)]
mod test;

/// File identification bytes stored at the beginning of the archive.
pub const MAGIC: [u8; 8] = *b"!<arch>\n";
pub const MAGIC_SIZE: usize = MAGIC.len();

/// The terminator for each member header.
pub const TERMINATOR: [u8; 2] = *b"`\n";

pub const HEADER_SIZE: usize = mem::size_of::<Header>();

/// Filler written after odd-sized content.
pub const PAD_BYTE: u8 = b'\n';

/// Check that `data` starts with the archive magic.
pub fn check_magic(data: &[u8]) -> Result<(), Error> {
    match data.get(..MAGIC_SIZE) {
        Some(magic) if magic == MAGIC => Ok(()),
        _ => Err(Error::NotAnArchive),
    }
}

/// Number of pad bytes following `size` bytes of member content.
pub const fn pad_len(size: u64) -> u64 {
    size & 1
}
