//! Encoder for solid-color truecolor PNG images, plus the helpers needed to
//! read them back and the command-line surface that writes app icons.

pub mod chunk;
pub mod cli;
pub mod color;
pub mod commands;
pub mod encode;
pub mod error;
pub mod img;
pub mod inspect;
mod util;

pub use color::Rgb;
pub use encode::encode;
pub use error::{EncodeError, Error, ParseError};
pub use img::{EncodedImage, SolidImage};
