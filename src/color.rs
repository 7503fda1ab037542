use crate::error::ColorError;
use std::fmt::{self, Display};
use std::str::FromStr;

/// A truecolor pixel value, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    data: [u8; 3],
}

impl Rgb {
    /// `#3b82f6`, the color the app icons have always shipped with.
    pub const PWA_BLUE: Rgb = Rgb::new(0x3b, 0x82, 0xf6);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { data: [r, g, b] }
    }

    pub fn bytes(&self) -> [u8; 3] {
        self.data
    }

    pub fn r(&self) -> u8 {
        self.data[0]
    }
    pub fn g(&self) -> u8 {
        self.data[1]
    }
    pub fn b(&self) -> u8 {
        self.data[2]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(data: [u8; 3]) -> Self {
        Rgb { data }
    }
}

impl TryFrom<&[u8]> for Rgb {
    type Error = ColorError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let data: [u8; 3] = value
            .try_into()
            .map_err(|_| ColorError::WrongLength(value.len()))?;
        Ok(Rgb { data })
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorError::InvalidColor(s.to_string());
        let trimmed = s.trim();

        if trimmed.contains(',') {
            let channels = trimmed
                .split(',')
                .map(str::trim)
                .map(|part| {
                    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(invalid());
                    }
                    part.parse::<u8>().map_err(|_| invalid())
                })
                .collect::<Result<Vec<u8>, _>>()?;
            return Rgb::try_from(channels.as_slice()).map_err(|_| invalid());
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        // from_str_radix alone would let a sign through
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut data = [0u8; 3];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Rgb { data })
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r(), self.g(), self.b())
    }
}
