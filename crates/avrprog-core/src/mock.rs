//! Recording mock target for unit tests
//!
//! Models just enough of an AVR's serial programming interface to exercise
//! the sequencers: page buffer loads, page commits, extended address,
//! program memory reads, RDY/BSY and signature. Every bus and reset
//! operation is recorded so tests can assert on exact wire traffic.

use crate::error::{Error, Result};
use crate::isp::opcodes;
use crate::programmer::{IspTransport, Level};
use alloc::vec;
use alloc::vec::Vec;

/// One recorded transport operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Transmit(Vec<u8>),
    TransmitReceive(Vec<u8>),
    Receive(usize),
    Reset(Level),
    Delay(u32),
}

pub struct MockTarget {
    memory: Vec<u8>,
    events: Vec<MockEvent>,
    /// (word index, high byte, value) loaded since the last commit
    page_loads: Vec<(u8, bool, u8)>,
    ext: u8,
    pending_read: Option<u8>,
    busy_remaining: u32,
    busy_after_write: u32,
    echo: bool,
    signature: [u8; 3],
    fail_transfers: bool,
}

impl MockTarget {
    pub fn new(flash_size: usize) -> Self {
        Self {
            memory: vec![0xFF; flash_size],
            events: Vec::new(),
            page_loads: Vec::new(),
            ext: 0,
            pending_read: None,
            busy_remaining: 0,
            busy_after_write: 0,
            echo: true,
            signature: [0x1E, 0x95, 0x0F],
            fail_transfers: false,
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    pub fn events(&self) -> &[MockEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Bytes of every transmitted frame (with or without receive)
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MockEvent::Transmit(d) | MockEvent::TransmitReceive(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn transmitted_with_opcode(&self, opcode: u8) -> Vec<Vec<u8>> {
        self.frames()
            .into_iter()
            .filter(|f| f.first() == Some(&opcode))
            .collect()
    }

    pub fn resets(&self) -> Vec<Level> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MockEvent::Reset(level) => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_remaining = polls;
    }

    pub fn set_busy_after_write(&mut self, polls: u32) {
        self.busy_after_write = polls;
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    pub fn set_signature(&mut self, signature: [u8; 3]) {
        self.signature = signature;
    }

    pub fn set_fail_transfers(&mut self, fail: bool) {
        self.fail_transfers = fail;
    }

    fn word_address(&self, hi: u8, lo: u8) -> usize {
        ((self.ext as usize) << 16) | ((hi as usize) << 8) | lo as usize
    }

    fn commit_page(&mut self, page_word: usize) {
        for (index, high, value) in self.page_loads.drain(..) {
            let byte = (page_word + index as usize) * 2 + high as usize;
            if let Some(cell) = self.memory.get_mut(byte) {
                *cell &= value;
            }
        }
        self.busy_remaining = self.busy_after_write;
    }

    fn handle(&mut self, tx: &[u8], rx: &mut [u8]) {
        match tx.first().copied() {
            Some(opcodes::PROG_CTRL) if tx.get(1) == Some(&opcodes::PROG_ENABLE) => {
                if self.echo && rx.len() > 2 {
                    rx[2] = opcodes::PROG_ENABLE;
                }
            }
            Some(opcodes::LOAD_PAGE_LOW) => self.page_loads.push((tx[2], false, tx[3])),
            Some(opcodes::LOAD_PAGE_HIGH) => self.page_loads.push((tx[2], true, tx[3])),
            Some(opcodes::LOAD_EXT_ADDR) => self.ext = tx[2],
            Some(opcodes::WRITE_PAGE) => {
                let word = self.word_address(tx[1], tx[2]);
                self.commit_page(word);
            }
            Some(op @ (opcodes::READ_LOW | opcodes::READ_HIGH)) => {
                let byte = self.word_address(tx[1], tx[2]) * 2 + (op == opcodes::READ_HIGH) as usize;
                let value = if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                    0xFF
                } else {
                    self.memory.get(byte).copied().unwrap_or(0xFF)
                };
                self.pending_read = Some(value);
            }
            Some(opcodes::POLL_RDY_BSY) => {
                let busy = if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                    opcodes::RDY_BSY_BUSY
                } else {
                    0
                };
                if let Some(last) = rx.last_mut() {
                    *last = busy;
                }
            }
            Some(opcodes::READ_SIGNATURE) => {
                if rx.len() == 4 {
                    rx[3] = self.signature[(tx[2] as usize).min(2)];
                }
            }
            _ => {}
        }
    }
}

impl IspTransport for MockTarget {
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        if self.fail_transfers {
            return Err(Error::SpiTransferFailed);
        }
        self.events.push(MockEvent::Transmit(data.to_vec()));
        let mut sink = [0u8; 4];
        let len = data.len().min(4);
        self.handle(data, &mut sink[..len]);
        Ok(())
    }

    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if self.fail_transfers {
            return Err(Error::SpiTransferFailed);
        }
        self.events.push(MockEvent::TransmitReceive(tx.to_vec()));
        rx.fill(0);
        self.handle(tx, rx);
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.fail_transfers {
            return Err(Error::SpiTransferFailed);
        }
        self.events.push(MockEvent::Receive(buf.len()));
        let value = self.pending_read.take().unwrap_or(0xFF);
        buf.fill(value);
        Ok(())
    }

    fn set_reset(&mut self, level: Level) -> Result<()> {
        self.events.push(MockEvent::Reset(level));
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.events.push(MockEvent::Delay(us));
    }
}
