//! Intel HEX decoding

use alloc::string::String;
use alloc::vec::Vec;

use ihex::Record;
use thiserror::Error;

use super::image::{FirmwareImage, OverlapError, Segment};

/// Why a file could not be decoded as Intel HEX
#[derive(Debug, Error)]
pub enum FormatError {
    /// Malformed record, bad checksum or invalid character
    #[error("Intel HEX record error: {0}")]
    Record(#[from] ihex::ReaderError),

    /// Two data records claim the same address
    #[error("{0}")]
    Overlap(#[from] OverlapError),

    /// The file parsed but contains no data records
    #[error("Intel HEX file contains no data records")]
    NoData,
}

/// Decode Intel HEX text into an image
///
/// Data records are placed using the extended segment (type 02) and
/// extended linear (type 04) address records. Consecutive records become
/// one segment; every gap in the address space starts a new one. Trailing
/// whitespace on a line is ignored.
pub fn parse_hex(text: &str) -> Result<FirmwareImage, FormatError> {
    let records: String = text
        .lines()
        .map(str::trim_end)
        .flat_map(|line| [line, "\n"])
        .collect();

    let mut base_address: u32 = 0;
    let mut segments: Vec<Segment> = Vec::new();

    for record in ihex::Reader::new(&records) {
        match record? {
            Record::Data { offset, value } => {
                let address = base_address.wrapping_add(offset as u32);
                match segments.last_mut() {
                    Some(last) if last.end() == address => last.data.extend_from_slice(&value),
                    _ => segments.push(Segment::new(address, value)),
                }
            }
            Record::ExtendedSegmentAddress(address) => {
                base_address = (address as u32) * 16;
            }
            Record::ExtendedLinearAddress(address) => {
                base_address = (address as u32) << 16;
            }

            Record::EndOfFile
            | Record::StartSegmentAddress { .. }
            | Record::StartLinearAddress(_) => {}
        }
    }

    let image = FirmwareImage::from_segments(segments)?;
    if image.is_empty() {
        return Err(FormatError::NoData);
    }
    Ok(image)
}
