//! Programmer trait definitions
//!
//! The ISP protocol needs two things from a programmer: a SPI bus that can
//! clock bytes out and in, and a digital output driving the target's
//! `RESET` pin. [`IspTransport`] is the combined port the protocol code
//! talks to. Backends that only provide one half implement [`SpiBus`] or
//! [`ResetLine`] and are combined with [`Port`].

use crate::error::Result;

/// Logic level of the reset line
///
/// AVR targets enter serial programming mode while `RESET` is held low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Driven low - target held in reset, programming interface selected
    Low,
    /// Driven high - target released
    High,
}

/// Transport port used by the ISP protocol
///
/// All operations are blocking. A session borrows the transport mutably
/// for its whole duration, so no other user can interleave frames.
pub trait IspTransport {
    /// Clock out `data`, discarding whatever the target shifts back
    fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Clock out `tx` and capture the bytes shifted back into `rx`
    ///
    /// `rx` must be the same length as `tx`.
    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;

    /// Clock in `buf.len()` bytes
    fn receive(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Drive the target's reset line
    fn set_reset(&mut self, level: Level) -> Result<()>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Delay for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

/// A SPI bus without a reset line
pub trait SpiBus {
    /// Clock out `data`, discarding the received bytes
    fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Full-duplex transfer, `rx` is the same length as `tx`
    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;

    /// Clock in `buf.len()` bytes
    fn receive(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

/// A digital output connected to the target's reset pin
pub trait ResetLine {
    /// Drive the line to `level`
    fn set_level(&mut self, level: Level) -> Result<()>;
}

/// Combines a [`SpiBus`] and a [`ResetLine`] into an [`IspTransport`]
#[derive(Debug)]
pub struct Port<B, R> {
    bus: B,
    reset: R,
}

impl<B: SpiBus, R: ResetLine> Port<B, R> {
    /// Create a port from a bus and a reset line
    pub fn new(bus: B, reset: R) -> Self {
        Self { bus, reset }
    }
}

impl<B: SpiBus, R: ResetLine> IspTransport for Port<B, R> {
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        self.bus.transmit(data)
    }

    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.bus.transmit_receive(tx, rx)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        self.bus.receive(buf)
    }

    fn set_reset(&mut self, level: Level) -> Result<()> {
        self.reset.set_level(level)
    }

    fn delay_us(&mut self, us: u32) {
        self.bus.delay_us(us)
    }
}

// Blanket impls for boxed trait objects (CLI dispatch)
#[cfg(feature = "alloc")]
impl IspTransport for alloc::boxed::Box<dyn IspTransport + Send> {
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        (**self).transmit(data)
    }

    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        (**self).transmit_receive(tx, rx)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).receive(buf)
    }

    fn set_reset(&mut self, level: Level) -> Result<()> {
        (**self).set_reset(level)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

#[cfg(feature = "alloc")]
impl SpiBus for alloc::boxed::Box<dyn SpiBus + Send> {
    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        (**self).transmit(data)
    }

    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        (**self).transmit_receive(tx, rx)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).receive(buf)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

#[cfg(feature = "alloc")]
impl ResetLine for alloc::boxed::Box<dyn ResetLine + Send> {
    fn set_level(&mut self, level: Level) -> Result<()> {
        (**self).set_level(level)
    }
}

/// Information about a programmer
#[derive(Debug, Clone)]
pub struct ProgrammerInfo {
    /// Name of the programmer
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
    /// Whether this programmer requires elevated privileges
    pub requires_root: bool,
}
