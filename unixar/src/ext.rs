//! Extension traits for base types defined in `unixar-core`.
use std::ffi::OsStr;
use std::fs::Metadata;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Component, Path};

use unixar_core::{Member, Mode};

use crate::Error;

pub trait MemberExt: Sized {
    /// Describe the file at `path` using its final component as the name.
    fn from_path(path: &Path, metadata: &Metadata) -> Result<Self, Error>;

    /// Ensure the name can be used as a single relative path component.
    fn check_path(&self) -> Result<&Path, Error>;
}

impl MemberExt for Member {
    fn from_path(path: &Path, metadata: &Metadata) -> Result<Member, Error> {
        let name = path.file_name().ok_or_else(|| Error::InvalidName {
            path: path.to_path_buf(),
        })?;
        Ok(Member {
            name: name.as_bytes().to_vec(),
            // Pre-epoch timestamps are clamped
            mtime: u64::try_from(metadata.mtime()).unwrap_or(0),
            uid: metadata.uid(),
            gid: metadata.gid(),
            mode: Mode::from_bits_retain(metadata.mode()),
            size: metadata.len(),
        })
    }

    fn check_path(&self) -> Result<&Path, Error> {
        check_name(&self.name)
    }
}

/// Iterate the components of the name and ensure that there is exactly one,
/// and that it is a normal component.
pub(crate) fn check_name(name: &[u8]) -> Result<&Path, Error> {
    let path = Path::new(OsStr::from_bytes(name));
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(&b'/') => Ok(path),
        _ => Err(Error::InvalidName {
            path: path.to_path_buf(),
        }),
    }
}
