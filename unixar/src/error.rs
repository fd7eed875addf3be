use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Wrap an [`io::Error`] in [`Error::Io`] with some context and an optional
/// path, for use with `map_err`.
#[macro_export]
macro_rules! wrap_io_err {
    ($context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: None,
            context: $context,
        }
    };
    ($path:expr, $context:expr) => {
        |source| $crate::Error::Io {
            source,
            path: Some(::std::path::PathBuf::from($path)),
            context: $context,
        }
    };
}

#[derive(thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] unixar_core::Error),

    #[error("{context}{}", display_path(.path))]
    Io {
        source: io::Error,
        path: Option<PathBuf>,
        context: &'static str,
    },

    #[error("Member not found: {}", String::from_utf8_lossy(.name))]
    NotFound { name: Vec<u8> },

    #[error("Member already in archive: {}", String::from_utf8_lossy(.name))]
    DuplicateMember { name: Vec<u8> },

    #[error("Destination already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Member size mismatch for {}: expected {expected}, got {actual}", String::from_utf8_lossy(.name))]
    LengthMismatch {
        name: Vec<u8>,
        expected: u64,
        actual: u64,
    },

    #[error("Archive is open read-only: {}", .path.display())]
    ReadOnly { path: PathBuf },

    #[error("Invalid range {start}..{end} in archive of {len} bytes")]
    InvalidRange { start: u64, end: u64, len: u64 },

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Not a regular file: {}", .path.display())]
    NotRegularFile { path: PathBuf },

    #[error("Invalid member name: {}", .path.display())]
    InvalidName { path: PathBuf },

    #[error("{failed} of {total} members failed")]
    Members { failed: usize, total: usize },

    #[error("Config: {}", .path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(": {}", path.display()),
        None => String::new(),
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;

        let mut source = self.source();
        while let Some(err) = source {
            writeln!(f, "\tCaused by: {err}")?;
            source = err.source();
        }

        Ok(())
    }
}
