//! ISP instruction frame

use super::opcodes;

/// A single ISP instruction as clocked out on the bus
///
/// Most instructions are four bytes. The program memory read instructions
/// are sent as three bytes, with the data byte clocked in by a separate
/// receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IspFrame {
    bytes: [u8; 4],
    len: usize,
}

impl IspFrame {
    const fn full(bytes: [u8; 4]) -> Self {
        Self { bytes, len: 4 }
    }

    /// Programming Enable: `AC 53 00 00`
    pub const fn programming_enable() -> Self {
        Self::full([opcodes::PROG_CTRL, opcodes::PROG_ENABLE, 0x00, 0x00])
    }

    /// Chip Erase: `AC 80 00 00`
    pub const fn chip_erase() -> Self {
        Self::full([opcodes::PROG_CTRL, opcodes::CHIP_ERASE, 0x00, 0x00])
    }

    /// Poll RDY/BSY: `F0 00 00 00`
    pub const fn poll_ready() -> Self {
        Self::full([opcodes::POLL_RDY_BSY, 0x00, 0x00, 0x00])
    }

    /// Load the low byte of word `index` in the page buffer
    pub const fn load_low(index: u8, byte: u8) -> Self {
        Self::full([opcodes::LOAD_PAGE_LOW, 0x00, index, byte])
    }

    /// Load the high byte of word `index` in the page buffer
    pub const fn load_high(index: u8, byte: u8) -> Self {
        Self::full([opcodes::LOAD_PAGE_HIGH, 0x00, index, byte])
    }

    /// Load the extended address byte (bank above the 16-bit word address)
    pub const fn load_extended_address(ext: u8) -> Self {
        Self::full([opcodes::LOAD_EXT_ADDR, 0x00, ext, 0x00])
    }

    /// Commit the page buffer to the page containing `word_address`
    pub const fn write_page(word_address: u32) -> Self {
        Self::full([
            opcodes::WRITE_PAGE,
            (word_address >> 8) as u8,
            word_address as u8,
            0x00,
        ])
    }

    /// Read the low byte of the word at `word_address` (within the loaded bank)
    pub const fn read_low(word_address: u32) -> Self {
        Self {
            bytes: [
                opcodes::READ_LOW,
                (word_address >> 8) as u8,
                word_address as u8,
                0x00,
            ],
            len: 3,
        }
    }

    /// Read the high byte of the word at `word_address` (within the loaded bank)
    pub const fn read_high(word_address: u32) -> Self {
        Self {
            bytes: [
                opcodes::READ_HIGH,
                (word_address >> 8) as u8,
                word_address as u8,
                0x00,
            ],
            len: 3,
        }
    }

    /// Read signature byte `index` (0..=2)
    pub const fn read_signature(index: u8) -> Self {
        Self::full([opcodes::READ_SIGNATURE, 0x00, index, 0x00])
    }

    /// The bytes to put on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}
