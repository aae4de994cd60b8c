//! Error types for avrprog-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// SPI transfer failed
    SpiTransferFailed,
    /// Driving the reset line failed
    ResetLineFailed,
    /// General programmer error
    ProgrammerError,

    // Device errors
    /// No target answered (signature read as all 0x00 or all 0xFF)
    DeviceNotFound,
    /// Target answered with a signature that is not in the device database
    DeviceNotSupported {
        /// The signature bytes that were read
        signature: [u8; 3],
    },
    /// The target never reported completion of a page write
    DeviceTimeout {
        /// Word address of the page being written
        word_address: u32,
    },

    // Image/geometry errors
    /// Firmware image does not fit into the device's flash
    CapacityExceeded {
        /// First byte address past the end of the image
        image_end: u32,
        /// Flash size of the device in bytes
        flash_size: u32,
    },
    /// Page size is zero, odd, or larger than the ISP page buffer can index
    InvalidPageSize {
        /// The rejected page size in bytes
        page_size: u32,
    },
    /// Address is beyond the device's flash
    AddressOutOfBounds,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::ResetLineFailed => write!(f, "failed to drive reset line"),
            Self::ProgrammerError => write!(f, "programmer error"),
            Self::DeviceNotFound => write!(f, "no AVR device found (check wiring and reset line)"),
            Self::DeviceNotSupported { signature } => write!(
                f,
                "unsupported device signature {:02X} {:02X} {:02X}",
                signature[0], signature[1], signature[2]
            ),
            Self::DeviceTimeout { word_address } => write!(
                f,
                "device timed out writing page at word address 0x{:05X}",
                word_address
            ),
            Self::CapacityExceeded {
                image_end,
                flash_size,
            } => write!(
                f,
                "firmware image ends at 0x{:05X} but flash is only {} bytes",
                image_end, flash_size
            ),
            Self::InvalidPageSize { page_size } => {
                write!(f, "invalid flash page size: {} bytes", page_size)
            }
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
