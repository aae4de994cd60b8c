//! Firmware image types

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};

/// A contiguous run of bytes to be placed at `address`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Byte address in flash of the first byte
    pub address: u32,
    /// Segment contents
    pub data: Vec<u8>,
}

impl Segment {
    /// Create a segment
    pub fn new(address: u32, data: Vec<u8>) -> Self {
        Self { address, data }
    }

    /// Number of bytes in the segment
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the segment holds no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First byte address past the segment
    pub fn end(&self) -> u32 {
        self.address.saturating_add(self.data.len() as u32)
    }
}

/// Two segments claim the same byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapError {
    /// First byte address claimed twice
    pub address: u32,
}

impl fmt::Display for OverlapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlapping data at 0x{:08X}", self.address)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OverlapError {}

/// A firmware image: address-ordered, non-overlapping segments
///
/// Contiguous segments are merged, so each segment is one maximal run of
/// data. Images are immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmwareImage {
    segments: Vec<Segment>,
}

impl FirmwareImage {
    /// Build an image from segments in any order
    ///
    /// Empty segments are dropped and touching segments are merged.
    pub fn from_segments(mut segments: Vec<Segment>) -> core::result::Result<Self, OverlapError> {
        segments.retain(|s| !s.is_empty());
        segments.sort_by_key(|s| s.address);

        let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
        for segment in segments {
            match merged.last_mut() {
                Some(last) if segment.address < last.end() => {
                    return Err(OverlapError {
                        address: segment.address,
                    });
                }
                Some(last) if segment.address == last.end() => {
                    last.data.extend_from_slice(&segment.data);
                }
                _ => merged.push(segment),
            }
        }

        Ok(Self { segments: merged })
    }

    /// An image holding `data` as a single segment at `start_address`
    pub fn from_raw(data: Vec<u8>, start_address: u32) -> Self {
        Self {
            segments: vec![Segment::new(start_address, data)],
        }
    }

    /// The segments, in ascending address order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total number of data bytes
    pub fn len(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Whether the image holds no data
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the first byte
    pub fn start_address(&self) -> Option<u32> {
        self.segments.first().map(|s| s.address)
    }

    /// First byte address past the last segment
    pub fn end_address(&self) -> u32 {
        self.segments.last().map(Segment::end).unwrap_or(0)
    }

    /// Fail if the image reaches beyond a flash of `flash_size` bytes
    pub fn check_capacity(&self, flash_size: u32) -> Result<()> {
        let image_end = self.end_address();
        if image_end > flash_size {
            return Err(Error::CapacityExceeded {
                image_end,
                flash_size,
            });
        }
        Ok(())
    }

    /// The image as one buffer from its start address, gaps filled with `fill`
    pub fn to_flat(&self, fill: u8) -> Vec<u8> {
        let Some(start) = self.start_address() else {
            return Vec::new();
        };
        let mut flat = vec![fill; (self.end_address() - start) as usize];
        for segment in &self.segments {
            let offset = (segment.address - start) as usize;
            flat[offset..offset + segment.len()].copy_from_slice(&segment.data);
        }
        flat
    }

    /// Merge segments that share a flash page
    ///
    /// Each page may only be committed once after an erase, so segments
    /// that end and start within the same page become a single run with
    /// the gap filled with `0xFF`.
    pub fn coalesce(&self, page_size: u32) -> FirmwareImage {
        if page_size == 0 {
            return self.clone();
        }

        let mut runs: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match runs.last_mut() {
                Some(last) if page_index(segment.address, page_size) <= page_index(last.end() - 1, page_size) => {
                    let gap = (segment.address - last.end()) as usize;
                    last.data.resize(last.data.len() + gap, 0xFF);
                    last.data.extend_from_slice(&segment.data);
                }
                _ => runs.push(segment.clone()),
            }
        }

        FirmwareImage { segments: runs }
    }
}

fn page_index(address: u32, page_size: u32) -> u32 {
    address / page_size
}
