use crate::color::Rgb;
use crate::encode;
use crate::error::EncodeError;

/// A validated request for a solid-color image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidImage {
    width: u32,
    height: u32,
    color: Rgb,
}

impl SolidImage {
    /// Rejects dimensions the encoder cannot honour before any work is done.
    pub fn new(width: u32, height: u32, color: Rgb) -> Result<Self, EncodeError> {
        if !(1..=encode::MAX_DIMENSION).contains(&width)
            || !(1..=encode::MAX_DIMENSION).contains(&height)
        {
            return Err(EncodeError::InvalidDimensions { width, height });
        }
        if encode::raw_len(width, height).is_none() {
            return Err(EncodeError::TooLarge { width, height });
        }
        Ok(SolidImage {
            width,
            height,
            color,
        })
    }

    /// Square image, the shape app icons come in.
    pub fn square(size: u32, color: Rgb) -> Result<Self, EncodeError> {
        Self::new(size, size, color)
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn encode(&self) -> Result<EncodedImage, EncodeError> {
        let bytes = encode::encode(self.width, self.height, self.color)?;
        Ok(EncodedImage {
            image: *self,
            bytes,
        })
    }
}

/// The finished PNG together with what it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    image: SolidImage,
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn width(&self) -> u32 {
        self.image.width
    }
    pub fn height(&self) -> u32 {
        self.image.height
    }
    pub fn color(&self) -> Rgb {
        self.image.color
    }
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for EncodedImage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
