//! Reading firmware files from disk

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::hex::parse_hex;
use super::image::FirmwareImage;

/// How a firmware file was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Intel HEX text
    IntelHex,
    /// Raw binary placed at the start address
    RawBinary,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::IntelHex => write!(f, "Intel HEX"),
            ImageFormat::RawBinary => write!(f, "raw binary"),
        }
    }
}

/// A decoded firmware file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// The image contents
    pub image: FirmwareImage,
    /// The format the file was decoded as
    pub format: ImageFormat,
}

/// Failure to produce an image from a file
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file has no contents
    #[error("{} is empty", path.display())]
    Empty {
        /// Path of the file
        path: PathBuf,
    },
}

/// Decode file contents, trying Intel HEX first and falling back to raw
///
/// `start_address` only applies to raw binaries; HEX files carry their own
/// addresses.
pub fn decode(bytes: Vec<u8>, start_address: u32) -> LoadedImage {
    let hex_attempt = match core::str::from_utf8(&bytes) {
        Ok(text) => parse_hex(text).map_err(|e| e.to_string()),
        Err(_) => Err("not UTF-8 text".into()),
    };

    match hex_attempt {
        Ok(image) => {
            if start_address != 0 {
                log::info!(
                    "Ignoring start address 0x{:X} for Intel HEX input",
                    start_address
                );
            }
            LoadedImage {
                image,
                format: ImageFormat::IntelHex,
            }
        }
        Err(reason) => {
            if bytes.first() == Some(&b':') {
                log::warn!(
                    "File looks like Intel HEX but does not parse ({}), programming it as raw binary",
                    reason
                );
            } else {
                log::debug!("Not an Intel HEX file ({}), using raw binary", reason);
            }
            LoadedImage {
                image: FirmwareImage::from_raw(bytes, start_address),
                format: ImageFormat::RawBinary,
            }
        }
    }
}

/// Load a firmware file
pub fn load(path: &Path, start_address: u32) -> Result<LoadedImage, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let loaded = decode(bytes, start_address);
    log::info!(
        "Loaded {} as {}: {} bytes in {} segment(s)",
        path.display(),
        loaded.format,
        loaded.image.len(),
        loaded.image.segments().len()
    );
    Ok(loaded)
}
