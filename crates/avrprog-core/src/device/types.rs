//! AVR device type definitions

use core::fmt;

use crate::error::{Error, Result};

/// Largest page the ISP page buffer can address (256 words, 8-bit word index)
pub const MAX_PAGE_SIZE: u32 = 512;

/// How the end of a page write is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum BusyMode {
    /// Poll the RDY/BSY instruction (`F0 00 00 00`)
    #[default]
    ReadyBusyPoll,
    /// Read back a programmed byte until it returns the written value
    ///
    /// For older parts that do not implement RDY/BSY polling.
    ReadBackPoll,
}

/// Flash geometry and timing of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Total flash size in bytes
    pub flash_size: u32,
    /// Flash page size in bytes
    pub page_size: u32,
    /// Time to wait after Chip Erase, in milliseconds
    pub erase_delay_ms: u32,
    /// Page write completion detection
    pub busy_mode: BusyMode,
}

impl DeviceProfile {
    /// Create a profile
    pub const fn new(flash_size: u32, page_size: u32, erase_delay_ms: u32, busy_mode: BusyMode) -> Self {
        Self {
            flash_size,
            page_size,
            erase_delay_ms,
            busy_mode,
        }
    }

    /// Check that the page size can be driven through the ISP page buffer
    pub fn validate(&self) -> Result<()> {
        let page_size = self.page_size;
        if page_size == 0 || page_size % 2 != 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidPageSize { page_size });
        }
        Ok(())
    }

    /// Number of pages in the flash
    pub fn page_count(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.flash_size / self.page_size
    }

    /// Whether addresses beyond 64K words are used (extended address register)
    pub fn has_extended_address(&self) -> bool {
        self.flash_size > 128 * 1024
    }
}

/// Three-byte device signature (vendor, flash size code, part number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 3]);

impl Signature {
    /// Whether the bytes look like no device answered at all
    pub fn is_absent(&self) -> bool {
        self.0 == [0x00; 3] || self.0 == [0xFF; 3]
    }
}

impl From<[u8; 3]> for Signature {
    fn from(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X} {:02X}", self.0[0], self.0[1], self.0[2])
    }
}
