//! Read-back verification

use crate::error::Result;
use crate::programmer::IspTransport;
use crate::protocol::{self, ExtendedAddress};

/// Result of comparing flash contents against expected data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Every byte matched
    Match,
    /// The first byte that differs
    Mismatch {
        /// Byte offset from the start of the compared range
        offset: u32,
        /// Byte in the image
        expected: u8,
        /// Byte read from the device
        actual: u8,
    },
}

impl VerifyOutcome {
    /// Whether the range matched
    pub fn is_match(&self) -> bool {
        matches!(self, VerifyOutcome::Match)
    }
}

/// Compare flash starting at byte `address` against `expected`
///
/// Reads every word covering the range, low byte then high byte, and stops
/// at the first differing byte. The memory interface must already be
/// enabled; banks are selected through `cache`.
pub fn verify_range<T: IspTransport + ?Sized>(
    transport: &mut T,
    cache: &mut ExtendedAddress,
    address: u32,
    expected: &[u8],
) -> Result<VerifyOutcome> {
    verify_range_with(transport, cache, address, expected, &mut |_| {})
}

/// [`verify_range`] reporting the number of bytes compared after every word
pub(crate) fn verify_range_with<T: IspTransport + ?Sized>(
    transport: &mut T,
    cache: &mut ExtendedAddress,
    address: u32,
    expected: &[u8],
    progress: &mut dyn FnMut(usize),
) -> Result<VerifyOutcome> {
    if expected.is_empty() {
        return Ok(VerifyOutcome::Match);
    }

    let end = address as u64 + expected.len() as u64;
    let first_word = address / 2;
    let last_word = ((end - 1) / 2) as u32;

    for word in first_word..=last_word {
        cache.select(transport, word)?;
        let low = protocol::read_program_byte(transport, word, false)?;
        let high = protocol::read_program_byte(transport, word, true)?;

        for (byte_address, actual) in [(word as u64 * 2, low), (word as u64 * 2 + 1, high)] {
            if byte_address < address as u64 || byte_address >= end {
                continue;
            }
            let offset = (byte_address - address as u64) as usize;
            if expected[offset] != actual {
                return Ok(VerifyOutcome::Mismatch {
                    offset: offset as u32,
                    expected: expected[offset],
                    actual,
                });
            }
        }

        let compared = ((word as u64 * 2 + 2).min(end) - address as u64) as usize;
        progress(compared);
    }

    Ok(VerifyOutcome::Match)
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::isp::opcodes;
    use crate::mock::MockTarget;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_verify_match() {
        let mut target = MockTarget::new(1024);
        let data: Vec<u8> = (0..16u8).collect();
        target.memory_mut()[0x20..0x30].copy_from_slice(&data);
        let mut cache = ExtendedAddress::new();

        let outcome = verify_range(&mut target, &mut cache, 0x20, &data).unwrap();
        assert!(outcome.is_match());
        assert_eq!(target.transmitted_with_opcode(opcodes::READ_LOW).len(), 8);
        assert_eq!(target.transmitted_with_opcode(opcodes::READ_HIGH).len(), 8);
        assert_eq!(target.transmitted_with_opcode(opcodes::LOAD_EXT_ADDR).len(), 1);
    }

    #[test]
    fn test_verify_reports_first_mismatch_and_stops() {
        let mut target = MockTarget::new(1024);
        let data = vec![0x11u8; 32];
        target.memory_mut()[..32].copy_from_slice(&data);
        target.memory_mut()[5] = 0x10;
        target.memory_mut()[20] = 0x00;
        let mut cache = ExtendedAddress::new();

        let outcome = verify_range(&mut target, &mut cache, 0, &data).unwrap();
        assert_eq!(
            outcome,
            VerifyOutcome::Mismatch {
                offset: 5,
                expected: 0x11,
                actual: 0x10
            }
        );
        // Words 0, 1 and 2 were read, nothing after the mismatch
        assert_eq!(target.transmitted_with_opcode(opcodes::READ_HIGH).len(), 3);
    }

    #[test]
    fn test_verify_odd_bounds() {
        let mut target = MockTarget::new(1024);
        target.memory_mut()[0x10] = 0x00;
        target.memory_mut()[0x11] = 0xA1;
        target.memory_mut()[0x12] = 0xA2;
        target.memory_mut()[0x13] = 0x00;
        let mut cache = ExtendedAddress::new();

        let outcome = verify_range(&mut target, &mut cache, 0x11, &[0xA1, 0xA2]).unwrap();
        assert!(outcome.is_match());
        assert_eq!(
            target.transmitted_with_opcode(opcodes::READ_LOW),
            vec![vec![0x20, 0x00, 0x08], vec![0x20, 0x00, 0x09]]
        );
    }

    #[test]
    fn test_verify_crosses_bank() {
        let mut target = MockTarget::new(256 * 1024);
        target.memory_mut()[0x1_FFFE..0x2_0002].fill(0x5A);
        let mut cache = ExtendedAddress::new();

        let outcome = verify_range(&mut target, &mut cache, 0x1_FFFE, &[0x5A; 4]).unwrap();
        assert!(outcome.is_match());
        assert_eq!(
            target.transmitted_with_opcode(opcodes::LOAD_EXT_ADDR),
            vec![vec![0x4D, 0x00, 0x00, 0x00], vec![0x4D, 0x00, 0x01, 0x00]]
        );
    }

    #[test]
    fn test_verify_progress() {
        let mut target = MockTarget::new(1024);
        let mut cache = ExtendedAddress::new();
        let mut seen = Vec::new();

        verify_range_with(&mut target, &mut cache, 1, &[0xFF; 4], &mut |n| seen.push(n)).unwrap();
        assert_eq!(seen, vec![1, 3, 4]);
    }
}
