//! Page write completion detection

use crate::device::BusyMode;
use crate::error::Result;
use crate::programmer::IspTransport;
use crate::protocol::{self, ExtendedAddress};

/// Bounds for a busy wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollLimit {
    /// Delay between two polls in microseconds
    pub poll_delay_us: u32,
    /// Give up with `Error::DeviceTimeout` after this many microseconds
    pub timeout_us: u32,
}

impl Default for PollLimit {
    fn default() -> Self {
        // t_WD_FLASH is at most 4.5 ms on current parts, older ones need
        // up to 64 ms with the read-back method
        Self {
            poll_delay_us: 100,
            timeout_us: 100_000,
        }
    }
}

/// How to wait for a committed page to finish programming
///
/// Chosen once per session from the device's [`BusyMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyWait {
    /// Poll the RDY/BSY instruction
    ReadyBusy(PollLimit),
    /// Read back the first programmed byte of the page until it matches
    ReadBack(PollLimit),
}

impl BusyWait {
    /// Strategy for a device's busy mode
    pub fn for_mode(mode: BusyMode, limit: PollLimit) -> Self {
        match mode {
            BusyMode::ReadyBusyPoll => BusyWait::ReadyBusy(limit),
            BusyMode::ReadBackPoll => BusyWait::ReadBack(limit),
        }
    }

    /// Wait until the page at `page_word` has been written
    ///
    /// `page` is the buffer that was committed. The read-back strategy
    /// polls through `cache` and leaves the previously selected bank
    /// selected again when done.
    pub fn wait<T: IspTransport + ?Sized>(
        &self,
        transport: &mut T,
        cache: &mut ExtendedAddress,
        page: &[u8],
        page_word: u32,
    ) -> Result<()> {
        match *self {
            BusyWait::ReadyBusy(limit) => {
                protocol::wait_ready(transport, limit.poll_delay_us, limit.timeout_us, page_word)
            }
            BusyWait::ReadBack(limit) => {
                // An erased byte reads 0xFF while busy too, nothing to poll
                let Some(offset) = page.iter().position(|&b| b != 0xFF) else {
                    return Ok(());
                };

                let word = page_word + (offset / 2) as u32;
                let high = offset % 2 == 1;
                let previous = cache.current();

                cache.select(transport, word)?;
                protocol::wait_read_back(
                    transport,
                    word,
                    high,
                    page[offset],
                    limit.poll_delay_us,
                    limit.timeout_us,
                )?;

                if let Some(bank) = previous {
                    cache.select_bank(transport, bank)?;
                }
                Ok(())
            }
        }
    }
}
