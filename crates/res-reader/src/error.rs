use std::io;

/// Errors raised while opening or walking a `.resources` container.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("bad magic: expected 0xbeefcace, got 0x{0:08x}")]
    BadMagic(u32),

    #[error("unsupported {what} version {version}")]
    UnsupportedVersion { what: &'static str, version: i32 },

    #[error("unsupported reader type '{0}'")]
    UnsupportedReader(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("truncated: {0}")]
    Truncated(String),

    #[error("io error: {0}")]
    Io(#[source] io::Error),
}

pub type FormatResult<T> = std::result::Result<T, FormatError>;

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::Truncated(e.to_string())
        } else {
            FormatError::Io(e)
        }
    }
}
