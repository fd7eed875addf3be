//! Create, list and modify UNIX `ar` archives.
//!
//! [`Archive`] is the entry point. It owns the archive file and drives the
//! lower level pieces: [`cursor`] walks headers, [`locate`] finds members by
//! name, [`mover`] copies content in and out, and [`splice`] cuts members out
//! of the file. The functions at the crate root run one command over several
//! members at once, as the `unixar` binary does.
mod archive;
mod bin;
pub mod config;
pub mod cursor;
mod error;
pub mod ext;
pub mod locate;
mod lock;
pub mod mover;
pub mod splice;

pub use archive::Archive;
pub use bin::*;
pub use config::{Config, DuplicatePolicy, SpliceStrategy, DEFAULT_CONFIG};
pub use cursor::{ArchiveCursor, CursorState, MemberRef};
pub use error::Error;
pub use lock::{lock_path, ArchiveLock, LockKind};

pub use unixar_core::{Header, Member, Mode, HEADER_SIZE, MAGIC};
