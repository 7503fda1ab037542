use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning user input into an [`Rgb`](crate::color::Rgb).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid color {0:?}: expected #rrggbb, rrggbb or r,g,b")]
    InvalidColor(String),

    #[error("Invalid color: expected exactly 3 bytes, got {0}")]
    WrongLength(usize),
}

/// Errors that can occur while encoding a solid image.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero or above the container's 2^31-1 limit
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be between 1 and 2147483647")]
    InvalidDimensions { width: u32, height: u32 },

    /// The uncompressed scanline buffer would not fit in memory
    #[error("Image too large: {width}x{height} scanlines overflow the address space")]
    TooLarge { width: u32, height: u32 },

    /// The deflate stream could not be produced
    #[error("Compression failed: {0}")]
    Compression(#[source] io::Error),
}

/// Errors found while reading an encoded artifact back.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Missing PNG signature")]
    BadSignature,

    #[error("Unexpected end of data while reading {0}")]
    Truncated(&'static str),

    #[error("Invalid chunk type: {0:?}")]
    InvalidChunkType([u8; 4]),

    #[error("CRC mismatch in {chunk_type} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        chunk_type: String,
        stored: u32,
        computed: u32,
    },

    #[error("Chunk length {0} exceeds 2^31-1")]
    LengthOverflow(u32),

    #[error("{0} bytes of trailing data after IEND")]
    TrailingData(usize),

    #[error("Missing {0} chunk")]
    MissingChunk(&'static str),

    #[error("{0} chunk is out of place")]
    MisplacedChunk(String),

    #[error("Invalid header: {0}")]
    BadHeader(String),

    #[error("Failed to inflate image data: {0}")]
    Inflate(#[source] io::Error),

    #[error("Image data inflated to {actual} bytes, expected {expected}")]
    RawSizeMismatch { expected: usize, actual: usize },
}

/// Top-level error for the command-line surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Color(#[from] ColorError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Conforming decoder rejected image: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
