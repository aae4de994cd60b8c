//! avrprog-dummy - In-memory AVR target for testing
//!
//! This crate provides a programmer that talks to an emulated AVR instead
//! of real hardware. The emulation follows the serial programming
//! interface closely enough to exercise every sequence the core issues:
//! programming enable with echo, chip erase, the page buffer, the extended
//! address register, program memory reads, RDY/BSY and the signature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use avrprog_core::device::{BusyMode, DeviceProfile, Signature};
use avrprog_core::error::{Error, Result};
use avrprog_core::isp::opcodes;
use avrprog_core::programmer::{IspTransport, Level};

/// Configuration for the emulated target
#[derive(Debug, Clone, Copy)]
pub struct DummyConfig {
    /// Signature bytes returned by Read Signature
    pub signature: Signature,
    /// Flash geometry and busy detection capability
    pub profile: DeviceProfile,
    /// Number of polls a page write stays busy for
    pub busy_polls: u32,
    /// Never finish a page write
    pub stuck_busy: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            signature: Signature([0x1E, 0x95, 0x0F]), // ATmega328P
            profile: DeviceProfile::new(32 * 1024, 128, 9, BusyMode::ReadyBusyPoll),
            busy_polls: 2,
            stuck_busy: false,
        }
    }
}

impl DummyConfig {
    /// Emulate a part with the given signature and profile
    pub fn new(signature: Signature, profile: DeviceProfile) -> Self {
        Self {
            signature,
            profile,
            ..Default::default()
        }
    }

    /// Set how many polls a page write stays busy for
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Make every page write hang forever
    pub fn with_stuck_busy(mut self, stuck: bool) -> Self {
        self.stuck_busy = stuck;
        self
    }
}

/// Emulated AVR target
///
/// Implements [`IspTransport`] directly: the reset line is part of the
/// emulation, commands are only accepted while reset is held low and
/// programming has been enabled.
#[cfg(feature = "alloc")]
pub struct DummyAvr {
    config: DummyConfig,
    flash: Vec<u8>,
    page_buffer: Vec<u8>,
    reset: Level,
    programming: bool,
    ext: u8,
    pending_read: Option<u8>,
    busy_remaining: u32,
    page_writes: usize,
    ext_loads: usize,
    elapsed_us: u64,
}

#[cfg(feature = "alloc")]
impl DummyAvr {
    /// Create a blank (erased) target
    pub fn new(config: DummyConfig) -> Self {
        let flash = vec![0xFF; config.profile.flash_size as usize];
        let page_buffer = vec![0xFF; config.profile.page_size as usize];
        Self {
            config,
            flash,
            page_buffer,
            reset: Level::High,
            programming: false,
            ext: 0,
            pending_read: None,
            busy_remaining: 0,
            page_writes: 0,
            ext_loads: 0,
            elapsed_us: 0,
        }
    }

    /// Create an ATmega328P
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a target with pre-filled flash
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut avr = Self::new(config);
        let len = core::cmp::min(initial_data.len(), avr.flash.len());
        avr.flash[..len].copy_from_slice(&initial_data[..len]);
        avr
    }

    /// Get a reference to the flash contents
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Get a mutable reference to the flash contents
    pub fn flash_mut(&mut self) -> &mut [u8] {
        &mut self.flash
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current level of the reset line
    pub fn reset_level(&self) -> Level {
        self.reset
    }

    /// Number of Write Program Memory Page commands executed
    pub fn page_writes(&self) -> usize {
        self.page_writes
    }

    /// Number of Load Extended Address commands executed
    pub fn ext_loads(&self) -> usize {
        self.ext_loads
    }

    /// Total time spent in delays, in microseconds
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    fn page_words(&self) -> usize {
        self.page_buffer.len() / 2
    }

    fn word_address(&self, hi: u8, lo: u8) -> usize {
        ((self.ext as usize) << 16) | ((hi as usize) << 8) | lo as usize
    }

    fn is_busy(&self) -> bool {
        self.config.stuck_busy || self.busy_remaining > 0
    }

    fn tick_busy(&mut self) {
        self.busy_remaining = self.busy_remaining.saturating_sub(1);
    }

    fn load_page_byte(&mut self, index: u8, high: bool, value: u8) {
        let word = index as usize & (self.page_words() - 1);
        self.page_buffer[word * 2 + high as usize] = value;
    }

    fn write_page(&mut self, hi: u8, lo: u8) -> Result<()> {
        let page_word = self.word_address(hi, lo) & !(self.page_words() - 1);
        let start = page_word * 2;
        let end = start + self.page_buffer.len();
        if end > self.flash.len() {
            log::warn!("dummy: Page write at word 0x{:05X} beyond flash", page_word);
            return Err(Error::AddressOutOfBounds);
        }

        // Programming can only clear bits
        for (cell, &byte) in self.flash[start..end].iter_mut().zip(&self.page_buffer) {
            *cell &= byte;
        }
        self.page_buffer.fill(0xFF);
        self.page_writes += 1;
        self.busy_remaining = self.config.busy_polls;

        log::trace!("dummy: Wrote page at word 0x{:05X}", page_word);
        Ok(())
    }

    fn read_program(&mut self, hi: u8, lo: u8, high: bool) {
        let byte = self.word_address(hi, lo) * 2 + high as usize;
        let value = if self.is_busy() {
            self.tick_busy();
            0xFF
        } else {
            self.flash.get(byte).copied().unwrap_or(0xFF)
        };
        self.pending_read = Some(value);
    }

    fn chip_erase(&mut self) {
        log::debug!("dummy: Chip erase");
        self.flash.fill(0xFF);
        self.page_buffer.fill(0xFF);
    }

    /// Execute one instruction, filling `rx` with the bytes shifted back
    fn execute(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        rx.fill(0);
        if self.reset == Level::High {
            log::warn!("dummy: Ignoring {:02X?} while out of reset", tx);
            return Ok(());
        }

        let Some(&opcode) = tx.first() else {
            return Ok(());
        };

        if opcode == opcodes::PROG_CTRL && tx.get(1) == Some(&opcodes::PROG_ENABLE) {
            self.programming = true;
            if let Some(echo) = rx.get_mut(2) {
                *echo = opcodes::PROG_ENABLE;
            }
            return Ok(());
        }

        if !self.programming {
            log::warn!("dummy: Ignoring {:02X?} before Programming Enable", tx);
            return Ok(());
        }
        if tx.len() < 3 {
            return Err(Error::ProgrammerError);
        }

        match opcode {
            opcodes::PROG_CTRL if tx[1] == opcodes::CHIP_ERASE => self.chip_erase(),
            opcodes::LOAD_PAGE_LOW => self.load_page_byte(tx[2], false, *tx.get(3).unwrap_or(&0xFF)),
            opcodes::LOAD_PAGE_HIGH => self.load_page_byte(tx[2], true, *tx.get(3).unwrap_or(&0xFF)),
            opcodes::LOAD_EXT_ADDR => {
                self.ext = tx[2];
                self.ext_loads += 1;
            }
            opcodes::WRITE_PAGE => self.write_page(tx[1], tx[2])?,
            opcodes::READ_LOW => self.read_program(tx[1], tx[2], false),
            opcodes::READ_HIGH => self.read_program(tx[1], tx[2], true),
            opcodes::POLL_RDY_BSY => {
                // Older parts do not implement RDY/BSY and shift back garbage
                let busy = match self.config.profile.busy_mode {
                    BusyMode::ReadyBusyPoll => self.is_busy(),
                    BusyMode::ReadBackPoll => true,
                };
                self.tick_busy();
                if busy {
                    if let Some(last) = rx.get_mut(3) {
                        *last = opcodes::RDY_BSY_BUSY;
                    }
                }
            }
            opcodes::READ_SIGNATURE => {
                let index = (tx[2] & 0x03) as usize;
                if let Some(out) = rx.get_mut(3) {
                    *out = self.config.signature.0.get(index).copied().unwrap_or(0xFF);
                }
            }
            _ => log::warn!("dummy: Unsupported instruction {:02X?}", tx),
        }

        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl IspTransport for DummyAvr {
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        let mut sink = [0u8; 4];
        let len = data.len().min(sink.len());
        self.execute(data, &mut sink[..len])
    }

    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.len() != rx.len() {
            return Err(Error::ProgrammerError);
        }
        self.execute(tx, rx)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        let value = self.pending_read.take().unwrap_or(0xFF);
        buf.fill(value);
        Ok(())
    }

    fn set_reset(&mut self, level: Level) -> Result<()> {
        if level == Level::High {
            self.programming = false;
            self.pending_read = None;
        }
        self.reset = level;
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}
