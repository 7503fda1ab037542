//! Solid-color PNG encoding.
//!
//! The output is always four pieces in the order the container demands:
//! signature, `IHDR`, a single `IDAT` holding the zlib stream, `IEND`.
//! Every scanline uses filter type 0 so the uncompressed stream is exactly
//! `height * (1 + 3 * width)` bytes.
//!
//! ```
//! use solid_png::color::Rgb;
//! use solid_png::encode::encode;
//!
//! let png = encode(2, 2, Rgb::PWA_BLUE).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```

use crate::chunk::{self, Chunk, ChunkType};
use crate::color::Rgb;
use crate::error::{EncodeError, ParseError};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use log::debug;
use std::io::Write;

/// Largest width or height the container can declare.
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

pub const BIT_DEPTH: u8 = 8;
/// Color type 2: red, green, blue, no alpha.
pub const COLOR_TYPE_TRUECOLOR: u8 = 2;
pub const BYTES_PER_PIXEL: usize = 3;
/// Filter type 0: scanline bytes are stored as-is.
pub const FILTER_NONE: u8 = 0;

/// The 13-byte `IHDR` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression: u8,
    pub filter: u8,
    pub interlace: u8,
}

impl ImageHeader {
    pub const LEN: usize = 13;

    /// 8-bit truecolor, deflate, adaptive filtering method 0, no interlace.
    pub fn truecolor(width: u32, height: u32) -> Self {
        ImageHeader {
            width,
            height,
            bit_depth: BIT_DEPTH,
            color_type: COLOR_TYPE_TRUECOLOR,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    pub fn is_rgb8(&self) -> bool {
        self.bit_depth == BIT_DEPTH && self.color_type == COLOR_TYPE_TRUECOLOR
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut bytes = [0u8; Self::LEN];
        bytes[0..4].copy_from_slice(&self.width.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.height.to_be_bytes());
        bytes[8] = self.bit_depth;
        bytes[9] = self.color_type;
        bytes[10] = self.compression;
        bytes[11] = self.filter;
        bytes[12] = self.interlace;
        bytes
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        let data: &[u8; Self::LEN] = data.try_into().map_err(|_| {
            ParseError::BadHeader(format!("expected {} bytes, got {}", Self::LEN, data.len()))
        })?;
        let header = ImageHeader {
            width: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            height: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            bit_depth: data[8],
            color_type: data[9],
            compression: data[10],
            filter: data[11],
            interlace: data[12],
        };
        if !valid_dimension(header.width) || !valid_dimension(header.height) {
            return Err(ParseError::BadHeader(format!(
                "dimensions {}x{} out of range",
                header.width, header.height
            )));
        }
        Ok(header)
    }
}

fn valid_dimension(n: u32) -> bool {
    (1..=MAX_DIMENSION).contains(&n)
}

/// Bytes in one filtered scanline: the filter selector plus the pixels.
pub fn scanline_len(width: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .and_then(|n| n.checked_add(1))
}

/// Size of the whole uncompressed stream, `None` on overflow.
pub fn raw_len(width: u32, height: u32) -> Option<usize> {
    scanline_len(width).and_then(|n| n.checked_mul(height as usize))
}

fn check_dimensions(width: u32, height: u32) -> Result<usize, EncodeError> {
    if !valid_dimension(width) || !valid_dimension(height) {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    raw_len(width, height).ok_or(EncodeError::TooLarge { width, height })
}

/// The uncompressed `IDAT` stream: each row is a 0 filter byte followed by
/// `width` copies of `color`.
///
/// Callers are expected to have checked the dimensions; see [`encode`].
pub fn raw_scanlines(width: u32, height: u32, color: Rgb) -> Vec<u8> {
    let mut row = Vec::with_capacity(scanline_len(width).unwrap_or_default());
    row.push(FILTER_NONE);
    for _ in 0..width {
        row.extend_from_slice(&color.bytes());
    }
    row.repeat(height as usize)
}

fn compress(raw: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).map_err(EncodeError::Compression)?;
    encoder.finish().map_err(EncodeError::Compression)
}

/// Encode a `width` x `height` image filled with `color`.
///
/// The output depends only on the arguments: no timestamps, no optional
/// chunks, fixed compression level.
pub fn encode(width: u32, height: u32, color: Rgb) -> Result<Vec<u8>, EncodeError> {
    let raw_size = check_dimensions(width, height)?;

    let raw = raw_scanlines(width, height, color);
    debug_assert_eq!(raw.len(), raw_size);
    let compressed = compress(&raw)?;
    if chunk::chunk_length(compressed.len()).is_none() {
        return Err(EncodeError::TooLarge { width, height });
    }
    debug!(
        "{}x{} {}: {} raw bytes deflated to {}",
        width,
        height,
        color,
        raw.len(),
        compressed.len()
    );

    let header = ImageHeader::truecolor(width, height);
    let chunks = [
        Chunk::new(ChunkType::IHDR, header.to_bytes().to_vec()),
        Chunk::new(ChunkType::IDAT, compressed),
        Chunk::new(ChunkType::IEND, Vec::new()),
    ];
    Ok(chunk::assemble(&chunks))
}
