use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display};

use crate::Mode;

/// Decoded metadata of one archive member
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Name as stored, without the terminator
    pub name: Vec<u8>,
    /// Seconds since the epoch
    pub mtime: u64,
    pub uid: u32,
    pub gid: u32,
    pub mode: Mode,
    /// Size in bytes of the content
    pub size: u64,
}

impl Member {
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={:?} mtime={} uid={} gid={} mode={:o} size={}",
            self.name_lossy(),
            self.mtime,
            self.uid,
            self.gid,
            self.mode.bits(),
            self.size
        )
    }
}
