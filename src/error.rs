use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("io error: {0}")]
    Io(io::Error),

    #[error("invalid GIF signature")]
    InvalidSignature,

    /// Fewer bytes were available than a fixed-size structure or a
    /// sub-block length prefix required.
    #[error("GIF stream truncated")]
    Truncated,

    /// A structural field is invalid or contradictory.
    #[error("invalid GIF format: {0}")]
    Format(String),

    /// Declared dimensions exceed the configured limits.
    #[error("{what} dimensions {width}x{height} exceed the limit of {max_width}x{max_height}")]
    Range {
        what: &'static str,
        width: u16,
        height: u16,
        max_width: u16,
        max_height: u16,
    },
}

impl DecodingError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        DecodingError::Format(msg.into())
    }
}

impl From<io::Error> for DecodingError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodingError::Truncated,
            _ => DecodingError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodingError>;
