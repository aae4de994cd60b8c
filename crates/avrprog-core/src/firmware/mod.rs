//! Firmware images and their on-disk formats
//!
//! A [`FirmwareImage`] is a set of address-ordered segments. With the `std`
//! feature, images can be decoded from Intel HEX text or taken verbatim from
//! a raw binary file.

mod image;

#[cfg(feature = "std")]
mod hex;
#[cfg(feature = "std")]
mod load;

pub use image::{FirmwareImage, OverlapError, Segment};

#[cfg(feature = "std")]
pub use hex::{parse_hex, FormatError};
#[cfg(feature = "std")]
pub use load::{decode, load, ImageFormat, LoadError, LoadedImage};
