//! PNG container primitives: the file signature, chunk tags, and length/CRC
//! framed chunks.
//!
//! Every chunk on disk is laid out as
//!
//! ```text
//! length (u32 BE) | type (4 ASCII letters) | data (length bytes) | crc (u32 BE)
//! ```
//!
//! where the CRC covers type + data but not the length.

use crate::error::ParseError;
use crate::util::{TakeArray, TakeVec};
use crc::{CRC_32_ISO_HDLC, Crc};
use log::debug;
use std::fmt::{self, Display};
use std::str::{FromStr, from_utf8};

/// The polynomial zlib and every PNG decoder check against.
pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub const STANDARD_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Largest chunk length the format allows.
pub const MAX_CHUNK_LENGTH: u32 = i32::MAX as u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    length: u32,
    chunk_type: ChunkType,
    data: Vec<u8>,
    crc: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType {
    data: [u8; 4],
}

impl ChunkType {
    pub const IHDR: ChunkType = ChunkType { data: *b"IHDR" };
    pub const IDAT: ChunkType = ChunkType { data: *b"IDAT" };
    pub const IEND: ChunkType = ChunkType { data: *b"IEND" };

    pub fn bytes(&self) -> [u8; 4] {
        self.data
    }
    pub fn is_critical(&self) -> bool {
        self.data[0].is_ascii_uppercase()
    }
    pub fn is_public(&self) -> bool {
        self.data[1].is_ascii_uppercase()
    }
    pub fn is_reserved_bit_valid(&self) -> bool {
        self.data[2].is_ascii_uppercase()
    }
    pub fn is_safe_to_copy(&self) -> bool {
        self.data[3].is_ascii_lowercase()
    }

    pub fn is_valid(&self) -> bool {
        is_valid_chunk_type(self.data) && self.is_reserved_bit_valid()
    }
}

fn is_valid_chunk_type(data: [u8; 4]) -> bool {
    data.iter().all(u8::is_ascii_alphabetic)
}

impl TryFrom<[u8; 4]> for ChunkType {
    type Error = ParseError;

    fn try_from(value: [u8; 4]) -> Result<Self, Self::Error> {
        if is_valid_chunk_type(value) {
            Ok(ChunkType { data: value })
        } else {
            Err(ParseError::InvalidChunkType(value))
        }
    }
}

impl FromStr for ChunkType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s.as_bytes().try_into().map_err(|_| {
            let mut padded = [0u8; 4];
            s.bytes().take(4).zip(padded.iter_mut()).for_each(|(b, p)| *p = b);
            ParseError::InvalidChunkType(padded)
        })?;
        ChunkType::try_from(bytes)
    }
}

impl Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Construction guarantees ASCII letters
        match from_utf8(&self.data) {
            Ok(s) => f.write_str(s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// `len` as a chunk length field, `None` past [`MAX_CHUNK_LENGTH`].
pub fn chunk_length(len: usize) -> Option<u32> {
    u32::try_from(len).ok().filter(|&n| n <= MAX_CHUNK_LENGTH)
}

impl Chunk {
    /// `data` must be at most [`MAX_CHUNK_LENGTH`] bytes; check with
    /// [`chunk_length`] when the size is not known up front.
    pub fn new(chunk_type: ChunkType, data: Vec<u8>) -> Chunk {
        let length = chunk_length(data.len());
        debug_assert!(length.is_some(), "{} byte chunk payload", data.len());

        let mut digest = CRC32.digest();
        digest.update(&chunk_type.bytes());
        digest.update(&data);

        Self {
            length: length.unwrap_or(MAX_CHUNK_LENGTH),
            chunk_type,
            data,
            crc: digest.finalize(),
        }
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn chunk_type(&self) -> &ChunkType {
        &self.chunk_type
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }

    /// Size of this chunk once framed: length + type + data + crc.
    pub fn encoded_len(&self) -> usize {
        12 + self.data.len()
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut bytes);
        bytes
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.length.to_be_bytes());
        out.extend_from_slice(&self.chunk_type.bytes());
        out.extend_from_slice(self.data());
        out.extend_from_slice(&self.crc.to_be_bytes());
    }
}

impl Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-byte chunk of type {} with crc {:#010x}",
            self.length, self.chunk_type, self.crc
        )
    }
}

/// Signature followed by each chunk in order.
pub fn assemble(chunks: &[Chunk]) -> Vec<u8> {
    let total = STANDARD_HEADER.len() + chunks.iter().map(Chunk::encoded_len).sum::<usize>();
    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(&STANDARD_HEADER);
    for chunk in chunks {
        chunk.write_to(&mut bytes);
    }
    bytes
}

/// Split a PNG byte stream into verified chunks, ending at `IEND`.
pub fn parse_chunks(data: &[u8]) -> Result<Vec<Chunk>, ParseError> {
    let mut stream = data.iter().copied();
    let signature: [u8; 8] = stream.take_array().ok_or(ParseError::BadSignature)?;
    if signature != STANDARD_HEADER {
        return Err(ParseError::BadSignature);
    }

    let mut chunks = Vec::new();
    let mut parser = stream.by_ref().parse();
    while let Some(chunk) = parser.next() {
        let chunk = chunk?;
        debug!("{}", chunk);
        let is_end = chunk.chunk_type == ChunkType::IEND;
        chunks.push(chunk);
        if is_end {
            let trailing = stream.count();
            if trailing > 0 {
                return Err(ParseError::TrailingData(trailing));
            }
            return Ok(chunks);
        }
    }
    Err(ParseError::MissingChunk("IEND"))
}

/// Parse a byte stream into a stream of chunks, verifying each CRC.
pub struct Parser<I>
where
    I: Iterator<Item = u8>,
{
    byte_stream: I,
}

impl<I: Iterator<Item = u8>> Parser<I> {
    fn read_chunk(&mut self, length: [u8; 4]) -> Result<Chunk, ParseError> {
        let data_length = u32::from_be_bytes(length);
        if data_length > MAX_CHUNK_LENGTH {
            return Err(ParseError::LengthOverflow(data_length));
        }
        let tag: [u8; 4] = self
            .byte_stream
            .take_array()
            .ok_or(ParseError::Truncated("chunk type"))?;
        let chunk_type = ChunkType::try_from(tag)?;
        let chunk_data = self
            .byte_stream
            .take_vec(data_length as usize)
            .ok_or(ParseError::Truncated("chunk data"))?;
        let stored = u32::from_be_bytes(
            self.byte_stream
                .take_array()
                .ok_or(ParseError::Truncated("chunk crc"))?,
        );

        let chunk = Chunk::new(chunk_type, chunk_data);
        if chunk.crc != stored {
            return Err(ParseError::CrcMismatch {
                chunk_type: chunk_type.to_string(),
                stored,
                computed: chunk.crc,
            });
        }
        Ok(chunk)
    }
}

impl<I: Iterator<Item = u8>> Iterator for Parser<I> {
    type Item = Result<Chunk, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        // A clean end of stream lands exactly on a chunk boundary
        let first = self.byte_stream.next()?;
        let rest: Option<[u8; 3]> = self.byte_stream.take_array();
        let length = match rest {
            Some([b, c, d]) => [first, b, c, d],
            None => return Some(Err(ParseError::Truncated("chunk length"))),
        };
        Some(self.read_chunk(length))
    }
}

/// Adapts any byte iterator into a chunk [`Parser`].
pub trait Parse {
    fn parse(self) -> Parser<Self>
    where
        Self: Sized,
        Self: Iterator<Item = u8>;
}

impl<I> Parse for I
where
    I: Iterator<Item = u8>,
{
    fn parse(self) -> Parser<I> {
        Parser { byte_stream: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testing_chunk() -> Chunk {
        Chunk::new(
            "RuSt".parse().unwrap(),
            b"This is where your secret message will be!".to_vec(),
        )
    }

    #[test]
    fn test_chunk_type_from_bytes() {
        let expected = [82, 117, 83, 116];
        let actual = ChunkType::try_from([82, 117, 83, 116]).unwrap();
        assert_eq!(expected, actual.bytes());
    }

    #[test]
    fn test_chunk_type_rejects_non_letters() {
        assert!(matches!(
            ChunkType::try_from(*b"Ru1t"),
            Err(ParseError::InvalidChunkType(_))
        ));
        assert!("Rust!".parse::<ChunkType>().is_err());
        assert!("Rus".parse::<ChunkType>().is_err());
    }

    #[test]
    fn test_chunk_type_property_bits() {
        let ihdr = ChunkType::IHDR;
        assert!(ihdr.is_critical());
        assert!(ihdr.is_public());
        assert!(ihdr.is_reserved_bit_valid());
        assert!(!ihdr.is_safe_to_copy());
        assert!(ihdr.is_valid());

        let text: ChunkType = "tEXt".parse().unwrap();
        assert!(!text.is_critical());
        assert!(text.is_safe_to_copy());

        let bad_reserved: ChunkType = "Rust".parse().unwrap();
        assert!(!bad_reserved.is_valid());
    }

    #[test]
    fn test_chunk_type_display() {
        assert_eq!(ChunkType::IDAT.to_string(), "IDAT");
    }

    #[test]
    fn test_known_iend_crc() {
        // Every PNG on earth ends with these 12 bytes
        let iend = Chunk::new(ChunkType::IEND, vec![]);
        assert_eq!(iend.crc(), 0xAE42_6082);
        assert_eq!(
            iend.as_bytes(),
            [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn test_chunk_crc_matches_reference() {
        assert_eq!(testing_chunk().crc(), 2882656334);
        assert_eq!(testing_chunk().length(), 42);
    }

    #[test]
    fn test_crc_excludes_length_field() {
        let chunk = testing_chunk();
        let mut message = chunk.chunk_type().bytes().to_vec();
        message.extend_from_slice(chunk.data());
        assert_eq!(chunk.crc(), CRC32.checksum(&message));
    }

    #[test]
    fn test_single_byte_edit_changes_crc() {
        let original = testing_chunk();
        let mut data = original.data().to_vec();
        data[7] ^= 0x01;
        let edited = Chunk::new(*original.chunk_type(), data);
        assert_ne!(original.crc(), edited.crc());
    }

    #[test]
    fn test_assemble_then_parse() {
        let chunks = vec![testing_chunk(), Chunk::new(ChunkType::IEND, vec![])];
        let bytes = assemble(&chunks);
        assert_eq!(&bytes[..8], &STANDARD_HEADER);
        assert_eq!(parse_chunks(&bytes).unwrap(), chunks);
    }

    #[test]
    fn test_parse_rejects_bad_signature() {
        let mut bytes = assemble(&[Chunk::new(ChunkType::IEND, vec![])]);
        bytes[1] = b'p';
        assert!(matches!(parse_chunks(&bytes), Err(ParseError::BadSignature)));
        assert!(matches!(parse_chunks(&bytes[..4]), Err(ParseError::BadSignature)));
    }

    #[test]
    fn test_parse_rejects_corrupted_crc() {
        let mut bytes = assemble(&[testing_chunk(), Chunk::new(ChunkType::IEND, vec![])]);
        bytes[8 + 8 + 3] ^= 0xff;
        match parse_chunks(&bytes) {
            Err(ParseError::CrcMismatch { chunk_type, .. }) => assert_eq!(chunk_type, "RuSt"),
            other => panic!("expected crc mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_truncation() {
        let bytes = assemble(&[testing_chunk(), Chunk::new(ChunkType::IEND, vec![])]);
        assert!(matches!(
            parse_chunks(&bytes[..20]),
            Err(ParseError::Truncated("chunk data"))
        ));
        assert!(matches!(
            parse_chunks(&bytes[..10]),
            Err(ParseError::Truncated("chunk length"))
        ));
    }

    #[test]
    fn test_parse_requires_iend() {
        let bytes = assemble(&[testing_chunk()]);
        assert!(matches!(
            parse_chunks(&bytes),
            Err(ParseError::MissingChunk("IEND"))
        ));
    }

    #[test]
    fn test_parse_rejects_trailing_data() {
        let mut bytes = assemble(&[Chunk::new(ChunkType::IEND, vec![])]);
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(parse_chunks(&bytes), Err(ParseError::TrailingData(3))));
    }

    #[test]
    fn test_chunk_length_limit() {
        assert_eq!(chunk_length(0), Some(0));
        assert_eq!(chunk_length(MAX_CHUNK_LENGTH as usize), Some(MAX_CHUNK_LENGTH));
        assert_eq!(chunk_length(MAX_CHUNK_LENGTH as usize + 1), None);
        assert_eq!(chunk_length(usize::MAX), None);
    }

    #[test]
    fn test_parse_rejects_oversized_length() {
        let mut bytes = STANDARD_HEADER.to_vec();
        bytes.extend_from_slice(&0x8000_0000u32.to_be_bytes());
        bytes.extend_from_slice(b"IDAT");
        assert!(matches!(
            parse_chunks(&bytes),
            Err(ParseError::LengthOverflow(0x8000_0000))
        ));
    }
}
