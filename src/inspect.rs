//! Reading an encoded image back: chunk listing, header, and whether the
//! pixel stream is a single repeated color.

use crate::chunk::{Chunk, ChunkType, parse_chunks};
use crate::color::Rgb;
use crate::encode::{self, BYTES_PER_PIXEL, FILTER_NONE, ImageHeader};
use crate::error::ParseError;
use flate2::read::ZlibDecoder;
use log::warn;
use std::io::Read;

/// Inflate cap for headers whose pixel layout is not checked.
const MAX_UNCHECKED_INFLATE: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub chunk_type: ChunkType,
    pub length: u32,
    pub crc: u32,
}

impl From<&Chunk> for ChunkSummary {
    fn from(chunk: &Chunk) -> Self {
        ChunkSummary {
            chunk_type: *chunk.chunk_type(),
            length: chunk.length(),
            crc: chunk.crc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub header: ImageHeader,
    pub chunks: Vec<ChunkSummary>,
    /// Length of the inflated `IDAT` stream.
    pub raw_len: usize,
    /// Set only for 8-bit truecolor images whose scanlines are all
    /// unfiltered and hold one color.
    pub uniform_color: Option<Rgb>,
}

pub fn inspect(data: &[u8]) -> Result<Inspection, ParseError> {
    let chunks = parse_chunks(data)?;

    let first = chunks.first().ok_or(ParseError::MissingChunk("IHDR"))?;
    if *first.chunk_type() != ChunkType::IHDR {
        return Err(ParseError::MisplacedChunk(first.chunk_type().to_string()));
    }
    let header = ImageHeader::from_bytes(first.data())?;

    if let Some(stray) = chunks[1..]
        .iter()
        .find(|c| *c.chunk_type() == ChunkType::IHDR)
    {
        return Err(ParseError::MisplacedChunk(stray.chunk_type().to_string()));
    }

    let compressed: Vec<u8> = chunks
        .iter()
        .filter(|c| *c.chunk_type() == ChunkType::IDAT)
        .flat_map(|c| c.data().iter().copied())
        .collect();
    if !chunks.iter().any(|c| *c.chunk_type() == ChunkType::IDAT) {
        return Err(ParseError::MissingChunk("IDAT"));
    }

    let checkable = header.is_rgb8()
        && header.compression == 0
        && header.filter == 0
        && header.interlace == 0;
    let expected = if checkable {
        Some(
            encode::raw_len(header.width, header.height)
                .ok_or_else(|| ParseError::BadHeader("image too large".to_string()))?,
        )
    } else {
        None
    };

    // One byte past the declared size is enough to prove a mismatch
    let limit = expected.map_or(MAX_UNCHECKED_INFLATE, |n| n as u64 + 1);
    let mut raw = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(limit)
        .read_to_end(&mut raw)
        .map_err(ParseError::Inflate)?;

    let uniform_color = match expected {
        Some(expected) => {
            if raw.len() != expected {
                return Err(ParseError::RawSizeMismatch {
                    expected,
                    actual: raw.len(),
                });
            }
            uniform_color(&raw, header.width)
        }
        None => {
            warn!(
                "bit depth {} color type {} compression {} filter {} interlace {}: not checking pixels",
                header.bit_depth,
                header.color_type,
                header.compression,
                header.filter,
                header.interlace
            );
            None
        }
    };

    Ok(Inspection {
        header,
        chunks: chunks.iter().map(ChunkSummary::from).collect(),
        raw_len: raw.len(),
        uniform_color,
    })
}

/// Scans unfiltered RGB rows for a single color.
fn uniform_color(raw: &[u8], width: u32) -> Option<Rgb> {
    let stride = encode::scanline_len(width)?;
    let color = Rgb::try_from(raw.get(1..1 + BYTES_PER_PIXEL)?).ok()?;
    let same = raw.chunks(stride).all(|row| {
        row[0] == FILTER_NONE
            && row[1..]
                .chunks(BYTES_PER_PIXEL)
                .all(|pixel| pixel == color.bytes())
    });
    same.then_some(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::assemble;
    use crate::encode::encode;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn deflate(raw: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw).unwrap();
        encoder.finish().unwrap()
    }

    fn build(header: ImageHeader, raw: &[u8]) -> Vec<u8> {
        assemble(&[
            Chunk::new(ChunkType::IHDR, header.to_bytes().to_vec()),
            Chunk::new(ChunkType::IDAT, deflate(raw)),
            Chunk::new(ChunkType::IEND, vec![]),
        ])
    }

    #[test]
    fn test_inspect_encoded_image() {
        let bytes = encode(2, 2, Rgb::PWA_BLUE).unwrap();
        let inspection = inspect(&bytes).unwrap();

        assert_eq!(inspection.header, ImageHeader::truecolor(2, 2));
        assert_eq!(inspection.raw_len, 2 * (1 + 3 * 2));
        assert_eq!(inspection.uniform_color, Some(Rgb::new(59, 130, 246)));
        let tags: Vec<ChunkType> = inspection.chunks.iter().map(|c| c.chunk_type).collect();
        assert_eq!(tags, [ChunkType::IHDR, ChunkType::IDAT, ChunkType::IEND]);
        assert_eq!(inspection.chunks[0].length, 13);
        assert_eq!(inspection.chunks[2].length, 0);
    }

    #[test]
    fn test_inspect_single_pixel() {
        let inspection = inspect(&encode(1, 1, Rgb::new(0, 0, 0)).unwrap()).unwrap();
        assert_eq!(inspection.raw_len, 4);
        assert_eq!(inspection.uniform_color, Some(Rgb::new(0, 0, 0)));
    }

    #[test]
    fn test_mixed_pixels_are_not_uniform() {
        let raw = [0, 1, 2, 3, 4, 5, 6];
        let inspection = inspect(&build(ImageHeader::truecolor(2, 1), &raw)).unwrap();
        assert_eq!(inspection.uniform_color, None);
    }

    #[test]
    fn test_filtered_rows_are_not_uniform() {
        let raw = [1, 7, 7, 7];
        let inspection = inspect(&build(ImageHeader::truecolor(1, 1), &raw)).unwrap();
        assert_eq!(inspection.uniform_color, None);
    }

    #[test]
    fn test_split_idat_is_joined() {
        let compressed = deflate(&[0, 5, 6, 7, 0, 5, 6, 7]);
        let (a, b) = compressed.split_at(compressed.len() / 2);
        let bytes = assemble(&[
            Chunk::new(ChunkType::IHDR, ImageHeader::truecolor(1, 2).to_bytes().to_vec()),
            Chunk::new(ChunkType::IDAT, a.to_vec()),
            Chunk::new(ChunkType::IDAT, b.to_vec()),
            Chunk::new(ChunkType::IEND, vec![]),
        ]);
        assert_eq!(inspect(&bytes).unwrap().uniform_color, Some(Rgb::new(5, 6, 7)));
    }

    #[test]
    fn test_raw_size_mismatch() {
        let raw = [0, 1, 2, 3];
        assert!(matches!(
            inspect(&build(ImageHeader::truecolor(2, 2), &raw)),
            Err(ParseError::RawSizeMismatch { expected: 14, actual: 4 })
        ));
    }

    #[test]
    fn test_missing_header_and_data() {
        let no_header = assemble(&[
            Chunk::new(ChunkType::IDAT, deflate(&[0, 1, 2, 3])),
            Chunk::new(ChunkType::IEND, vec![]),
        ]);
        assert!(matches!(
            inspect(&no_header),
            Err(ParseError::MisplacedChunk(tag)) if tag == "IDAT"
        ));

        let no_data = assemble(&[
            Chunk::new(ChunkType::IHDR, ImageHeader::truecolor(1, 1).to_bytes().to_vec()),
            Chunk::new(ChunkType::IEND, vec![]),
        ]);
        assert!(matches!(
            inspect(&no_data),
            Err(ParseError::MissingChunk("IDAT"))
        ));
    }

    #[test]
    fn test_non_truecolor_is_reported_without_pixel_check() {
        let mut header = ImageHeader::truecolor(1, 1);
        header.color_type = 0;
        let inspection = inspect(&build(header, &[0, 9])).unwrap();
        assert_eq!(inspection.uniform_color, None);
        assert_eq!(inspection.raw_len, 2);
    }

    #[test]
    fn test_oversized_stream_stops_past_declared_size() {
        let raw = vec![0u8; 1 << 20];
        match inspect(&build(ImageHeader::truecolor(1, 1), &raw)) {
            Err(ParseError::RawSizeMismatch { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 5);
            }
            other => panic!("expected size mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_nonzero_methods_skip_pixel_check() {
        let mut filtered = ImageHeader::truecolor(1, 1);
        filtered.filter = 1;
        let inspection = inspect(&build(filtered, &[0, 7, 7, 7])).unwrap();
        assert_eq!(inspection.uniform_color, None);

        let mut compressed = ImageHeader::truecolor(1, 1);
        compressed.compression = 1;
        let inspection = inspect(&build(compressed, &[0, 7, 7, 7])).unwrap();
        assert_eq!(inspection.uniform_color, None);
        assert_eq!(inspection.raw_len, 4);
    }

    #[test]
    fn test_corrupted_artifact_is_rejected() {
        let mut bytes = encode(4, 4, Rgb::PWA_BLUE).unwrap();
        // First byte of the IHDR payload
        bytes[16] ^= 0x01;
        assert!(matches!(inspect(&bytes), Err(ParseError::CrcMismatch { .. })));
    }
}
