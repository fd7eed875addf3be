use core::error;
use core::fmt::{Display, Formatter, Result};

use bytemuck::PodCastError;

/// A fixed-width field of the member header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Name,
    Date,
    Uid,
    Gid,
    Mode,
    Size,
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let name = match self {
            Field::Name => "name",
            Field::Date => "date",
            Field::Uid => "uid",
            Field::Gid => "gid",
            Field::Mode => "mode",
            Field::Size => "size",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Cast(PodCastError),
    FieldOverflow(Field),
    InvalidField(Field),
    InvalidName,
    InvalidTerminator([u8; 2]),
    NotAnArchive,
    Overflow,
    Truncated { expected: usize, actual: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        use Error::*;

        match self {
            Cast(err) => write!(f, "Cast: {:?}", err),
            FieldOverflow(field) => write!(f, "Value does not fit in header field: {}", field),
            InvalidField(field) => write!(f, "Invalid header field: {}", field),
            InvalidName => write!(f, "Invalid member name"),
            InvalidTerminator(bytes) => write!(f, "Invalid header terminator: {:02x?}", bytes),
            NotAnArchive => write!(f, "Not an archive"),
            Overflow => write!(f, "Overflow"),
            Truncated { expected, actual } => {
                write!(f, "Truncated header: expected {} bytes, got {}", expected, actual)
            }
        }
    }
}

impl error::Error for Error {}

impl From<PodCastError> for Error {
    fn from(err: PodCastError) -> Error {
        Error::Cast(err)
    }
}
