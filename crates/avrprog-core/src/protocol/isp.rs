//! AVR serial programming protocol
//!
//! Instruction sequences for the ISP interface. Each function issues one
//! instruction (or a short fixed sequence) on an [`IspTransport`]; the
//! ordering between them is the caller's responsibility, see
//! [`crate::flash`] for the erase, program and verify sequencers.

use crate::error::{Error, Result};
use crate::isp::{opcodes, IspFrame};
use crate::programmer::IspTransport;

/// Settle time after Programming Enable before memory access is reliable
pub const PROGRAMMING_ENABLE_SETTLE_US: u32 = 500_000;

/// Send Programming Enable and report whether the target echoed it
///
/// A target in sync shifts `0x53` back while the third byte is clocked
/// out. A missing echo is not treated as an error since some parts only
/// come into sync after the settle delay.
pub fn programming_enable<T: IspTransport + ?Sized>(transport: &mut T) -> Result<bool> {
    let frame = IspFrame::programming_enable();
    let mut rx = [0u8; 4];
    transport.transmit_receive(frame.as_bytes(), &mut rx)?;

    let in_sync = rx[2] == opcodes::PROG_ENABLE;
    if !in_sync {
        log::warn!(
            "Programming Enable not echoed (got {:02X} {:02X} {:02X} {:02X})",
            rx[0],
            rx[1],
            rx[2],
            rx[3]
        );
    }
    Ok(in_sync)
}

/// Send Programming Enable and wait for the memory interface to settle
pub fn enable_memory_access<T: IspTransport + ?Sized>(transport: &mut T) -> Result<()> {
    log::debug!("Enabling memory access");
    programming_enable(transport)?;
    transport.delay_us(PROGRAMMING_ENABLE_SETTLE_US);
    Ok(())
}

/// Send Chip Erase
///
/// The target gives no acknowledgement; the caller must wait the device's
/// erase delay before issuing anything else.
pub fn chip_erase<T: IspTransport + ?Sized>(transport: &mut T) -> Result<()> {
    transport.transmit(IspFrame::chip_erase().as_bytes())
}

/// Load one word into the target's page buffer (low byte first)
pub fn load_page_word<T: IspTransport + ?Sized>(
    transport: &mut T,
    index: u8,
    low: u8,
    high: u8,
) -> Result<()> {
    transport.transmit(IspFrame::load_low(index, low).as_bytes())?;
    transport.transmit(IspFrame::load_high(index, high).as_bytes())
}

/// Load the extended address register
pub fn load_extended_address<T: IspTransport + ?Sized>(transport: &mut T, ext: u8) -> Result<()> {
    log::trace!("Loading extended address 0x{:02X}", ext);
    transport.transmit(IspFrame::load_extended_address(ext).as_bytes())
}

/// Commit the page buffer to the page containing `word_address`
pub fn write_page<T: IspTransport + ?Sized>(transport: &mut T, word_address: u32) -> Result<()> {
    transport.transmit(IspFrame::write_page(word_address).as_bytes())
}

/// Read one byte of program memory
///
/// `word_address` is taken modulo 64K words; the bank must already be
/// selected through the extended address register.
pub fn read_program_byte<T: IspTransport + ?Sized>(
    transport: &mut T,
    word_address: u32,
    high: bool,
) -> Result<u8> {
    let frame = if high {
        IspFrame::read_high(word_address)
    } else {
        IspFrame::read_low(word_address)
    };
    transport.transmit(frame.as_bytes())?;
    let mut buf = [0u8; 1];
    transport.receive(&mut buf)?;
    Ok(buf[0])
}

/// Poll RDY/BSY once, returns true while the target is busy
pub fn is_busy<T: IspTransport + ?Sized>(transport: &mut T) -> Result<bool> {
    let frame = IspFrame::poll_ready();
    let mut rx = [0u8; 4];
    transport.transmit_receive(frame.as_bytes(), &mut rx)?;
    Ok(rx[3] & opcodes::RDY_BSY_BUSY != 0)
}

/// Read the three signature bytes
pub fn read_signature<T: IspTransport + ?Sized>(transport: &mut T) -> Result<[u8; 3]> {
    let mut signature = [0u8; 3];
    for (index, byte) in signature.iter_mut().enumerate() {
        let frame = IspFrame::read_signature(index as u8);
        let mut rx = [0u8; 4];
        transport.transmit_receive(frame.as_bytes(), &mut rx)?;
        *byte = rx[3];
    }
    Ok(signature)
}

fn max_polls(poll_delay_us: u32, timeout_us: u32) -> u32 {
    let polls = if poll_delay_us > 0 {
        timeout_us / poll_delay_us
    } else {
        timeout_us // Fall back to polling once per microsecond
    };
    polls.max(1)
}

/// Wait for RDY/BSY to report ready
///
/// # Arguments
/// * `poll_delay_us` - Delay in microseconds between polls
/// * `timeout_us` - Maximum time to wait before returning `Error::DeviceTimeout`
/// * `word_address` - Page being written, reported in the timeout error
pub fn wait_ready<T: IspTransport + ?Sized>(
    transport: &mut T,
    poll_delay_us: u32,
    timeout_us: u32,
    word_address: u32,
) -> Result<()> {
    for _ in 0..max_polls(poll_delay_us, timeout_us) {
        if !is_busy(transport)? {
            return Ok(());
        }
        if poll_delay_us > 0 {
            transport.delay_us(poll_delay_us);
        }
    }

    Err(Error::DeviceTimeout { word_address })
}

/// Wait until reading back a program memory byte returns `expected`
///
/// Used on parts without RDY/BSY polling: while a page write is in
/// progress the target returns a placeholder value instead of the data.
pub fn wait_read_back<T: IspTransport + ?Sized>(
    transport: &mut T,
    word_address: u32,
    high: bool,
    expected: u8,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    for _ in 0..max_polls(poll_delay_us, timeout_us) {
        if read_program_byte(transport, word_address, high)? == expected {
            return Ok(());
        }
        if poll_delay_us > 0 {
            transport.delay_us(poll_delay_us);
        }
    }

    Err(Error::DeviceTimeout { word_address })
}

/// Bank of a word address, as loaded into the extended address register
pub const fn bank_of(word_address: u32) -> u16 {
    (word_address >> 16) as u16
}

/// Cache of the value last loaded into the target's extended address register
///
/// Loading the register is a wire operation of its own, so it is only
/// reloaded when the bank changes. The cache starts out empty: the first
/// access of a session always loads the register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendedAddress {
    loaded: Option<u16>,
}

impl ExtendedAddress {
    /// Create an empty cache
    pub const fn new() -> Self {
        Self { loaded: None }
    }

    /// The bank last loaded into the target, if any
    pub const fn current(&self) -> Option<u16> {
        self.loaded
    }

    /// Make sure the bank containing `word_address` is selected
    ///
    /// Returns true if the register had to be reloaded.
    pub fn select<T: IspTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        word_address: u32,
    ) -> Result<bool> {
        self.select_bank(transport, bank_of(word_address))
    }

    /// Make sure `bank` is selected, returns true if the register was reloaded
    pub fn select_bank<T: IspTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        bank: u16,
    ) -> Result<bool> {
        if self.loaded == Some(bank) {
            return Ok(false);
        }
        load_extended_address(transport, bank as u8)?;
        self.loaded = Some(bank);
        Ok(true)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::mock::{MockEvent, MockTarget};
    use alloc::vec;

    #[test]
    fn test_extended_address_reloads_only_on_bank_change() {
        let mut target = MockTarget::new(256 * 1024);
        let mut cache = ExtendedAddress::new();

        assert!(cache.select(&mut target, 0x0000).unwrap());
        assert!(!cache.select(&mut target, 0xFFFF).unwrap());
        assert!(cache.select(&mut target, 0x1_0000).unwrap());
        assert!(!cache.select(&mut target, 0x1_FF80).unwrap());
        assert!(cache.select(&mut target, 0x0080).unwrap());

        assert_eq!(
            target.transmitted_with_opcode(opcodes::LOAD_EXT_ADDR),
            vec![
                vec![0x4D, 0x00, 0x00, 0x00],
                vec![0x4D, 0x00, 0x01, 0x00],
                vec![0x4D, 0x00, 0x00, 0x00],
            ]
        );
        assert_eq!(cache.current(), Some(0));
    }

    #[test]
    fn test_programming_enable_echo() {
        let mut target = MockTarget::new(1024);
        assert!(programming_enable(&mut target).unwrap());

        target.set_echo(false);
        assert!(!programming_enable(&mut target).unwrap());
    }

    #[test]
    fn test_wait_ready_polls_until_clear() {
        let mut target = MockTarget::new(1024);
        target.set_busy_polls(3);

        wait_ready(&mut target, 10, 1_000, 0).unwrap();
        assert_eq!(target.transmitted_with_opcode(opcodes::POLL_RDY_BSY).len(), 4);
    }

    #[test]
    fn test_wait_ready_times_out() {
        let mut target = MockTarget::new(1024);
        target.set_busy_polls(u32::MAX);

        let result = wait_ready(&mut target, 100, 1_000, 0x40);
        assert_eq!(result, Err(Error::DeviceTimeout { word_address: 0x40 }));
        assert_eq!(target.transmitted_with_opcode(opcodes::POLL_RDY_BSY).len(), 10);
    }

    #[test]
    fn test_read_signature() {
        let mut target = MockTarget::new(32 * 1024);
        target.set_signature([0x1E, 0x95, 0x0F]);
        assert_eq!(read_signature(&mut target).unwrap(), [0x1E, 0x95, 0x0F]);
    }

    #[test]
    fn test_read_program_byte_sends_three_bytes_then_receives() {
        let mut target = MockTarget::new(1024);
        target.memory_mut()[0x21] = 0xA5;

        assert_eq!(read_program_byte(&mut target, 0x10, true).unwrap(), 0xA5);
        assert_eq!(
            target.events(),
            &[MockEvent::Transmit(vec![0x28, 0x00, 0x10]), MockEvent::Receive(1)]
        );
    }
}
