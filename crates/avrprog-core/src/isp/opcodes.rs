//! AVR serial programming instruction bytes
//!
//! Naming follows the "Serial Programming Instruction Set" tables of the
//! AVR datasheets.

// ============================================================================
// Programming control
// ============================================================================

/// First byte of the programming-enable and chip-erase instructions
pub const PROG_CTRL: u8 = 0xAC;
/// Second byte of Programming Enable (`AC 53 00 00`)
pub const PROG_ENABLE: u8 = 0x53;
/// Second byte of Chip Erase (`AC 80 00 00`)
pub const CHIP_ERASE: u8 = 0x80;
/// Poll RDY/BSY (`F0 00 00 00`), bit 0 of the last byte is 1 while busy
pub const POLL_RDY_BSY: u8 = 0xF0;

// ============================================================================
// Program memory page buffer
// ============================================================================

/// Load Program Memory Page, low byte (`40 00 <word index> <byte>`)
pub const LOAD_PAGE_LOW: u8 = 0x40;
/// Load Program Memory Page, high byte (`48 00 <word index> <byte>`)
pub const LOAD_PAGE_HIGH: u8 = 0x48;
/// Load Extended Address byte (`4D 00 <ext> 00`)
pub const LOAD_EXT_ADDR: u8 = 0x4D;
/// Write Program Memory Page (`4C <addr hi> <addr lo> 00`)
pub const WRITE_PAGE: u8 = 0x4C;

// ============================================================================
// Program memory read
// ============================================================================

/// Read Program Memory, low byte (`20 <addr hi> <addr lo>` + 1 byte)
pub const READ_LOW: u8 = 0x20;
/// Read Program Memory, high byte (`28 <addr hi> <addr lo>` + 1 byte)
pub const READ_HIGH: u8 = 0x28;

// ============================================================================
// Identification
// ============================================================================

/// Read Signature Byte (`30 00 <index> 00`), byte returned in the last slot
pub const READ_SIGNATURE: u8 = 0x30;

/// Bit 0 of the poll response: set while a write is in progress
pub const RDY_BSY_BUSY: u8 = 0x01;
