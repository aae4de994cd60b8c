//! spidev bus implementation
//!
//! AVR targets sample MOSI on the rising edge of SCK with the clock idling
//! low, so the bus is always configured for SPI mode 0 with 8-bit words.

use crate::error::{LinuxSpiError, Result};

use avrprog_core::error::{Error as CoreError, Result as CoreResult};
use avrprog_core::programmer::SpiBus;

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// Default SPI clock in Hz
///
/// Safe for targets running at 4 MHz or more; slower targets need a lower
/// `spispeed`.
const DEFAULT_SPEED_HZ: u32 = 1_000_000;

/// Highest SPI clock accepted, in Hz
pub const MAX_SPEED_HZ: u32 = 50_000_000;

const SPI_MODE_0: u8 = 0;
const BITS_PER_WORD: u8 = 8;

/// spidev ioctls (linux/spi/spidev.h)
mod ioctl {
    use super::SpiIocTransfer;

    const SPI_IOC_MAGIC: u8 = b'k';

    nix::ioctl_write_ptr!(wr_mode, SPI_IOC_MAGIC, 1, u8);
    nix::ioctl_write_ptr!(wr_bits_per_word, SPI_IOC_MAGIC, 3, u8);
    nix::ioctl_write_ptr!(wr_max_speed_hz, SPI_IOC_MAGIC, 4, u32);

    // SPI_IOC_MESSAGE(n): the request size encodes the number of transfers
    nix::ioctl_write_buf!(message, SPI_IOC_MAGIC, 0, SpiIocTransfer);
}

/// `struct spi_ioc_transfer`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    pad: u8,
}

impl SpiIocTransfer {
    /// A single transfer of `len` bytes; a null buffer means "don't care"
    fn new(tx: *const u8, rx: *mut u8, len: usize, speed_hz: u32) -> Self {
        Self {
            tx_buf: tx as u64,
            rx_buf: rx as u64,
            len: len as u32,
            speed_hz,
            bits_per_word: BITS_PER_WORD,
            ..Default::default()
        }
    }
}

/// Configuration for opening a spidev bus
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock in Hz
    pub speed_hz: u32,
}

impl LinuxSpiConfig {
    /// Create a configuration for `device` at the default clock
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            speed_hz: DEFAULT_SPEED_HZ,
        }
    }

    /// Set the SPI clock in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }
}

fn check_speed(speed_hz: u32) -> Result<()> {
    if speed_hz > MAX_SPEED_HZ {
        return Err(LinuxSpiError::SpeedTooHigh {
            speed: speed_hz,
            max: MAX_SPEED_HZ,
        });
    }
    Ok(())
}

/// ISP bus on a Linux spidev device
///
/// Each call is one `SPI_IOC_MESSAGE` with chip select asserted for its
/// duration. Chip select is not wired to the target; `RESET` is driven by
/// a separate [`avrprog_core::programmer::ResetLine`].
pub struct LinuxSpi {
    file: File,
    speed_hz: u32,
}

impl LinuxSpi {
    /// Open and configure a spidev device
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }
        check_speed(config.speed_hz)?;

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|source| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source,
            })?;

        let mut spi = Self {
            file,
            speed_hz: config.speed_hz,
        };

        let fd = spi.file.as_raw_fd();
        // SAFETY: fd is an open spidev descriptor and each pointer refers
        // to a live local of the type the request expects.
        unsafe { ioctl::wr_mode(fd, &SPI_MODE_0) }
            .map_err(|source| LinuxSpiError::ConfigureFailed {
                setting: "SPI mode",
                value: SPI_MODE_0 as u32,
                source,
            })?;
        unsafe { ioctl::wr_bits_per_word(fd, &BITS_PER_WORD) }.map_err(|source| {
            LinuxSpiError::ConfigureFailed {
                setting: "bits per word",
                value: BITS_PER_WORD as u32,
                source,
            }
        })?;
        spi.set_speed(config.speed_hz)?;

        log::info!(
            "linux_spi: Opened {} at {} kHz",
            config.device,
            spi.speed_hz / 1000
        );

        Ok(spi)
    }

    /// Open a device at the default clock
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    /// Current SPI clock in Hz
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Change the SPI clock
    pub fn set_speed(&mut self, speed_hz: u32) -> Result<()> {
        check_speed(speed_hz)?;
        // SAFETY: as in `open`
        unsafe { ioctl::wr_max_speed_hz(self.file.as_raw_fd(), &speed_hz) }.map_err(|source| {
            LinuxSpiError::ConfigureFailed {
                setting: "clock speed (Hz)",
                value: speed_hz,
                source,
            }
        })?;
        self.speed_hz = speed_hz;
        log::debug!("linux_spi: Clock set to {} Hz", speed_hz);
        Ok(())
    }

    fn message(&mut self, transfer: SpiIocTransfer) -> Result<()> {
        if transfer.len == 0 {
            return Ok(());
        }
        // SAFETY: the buffers behind tx_buf/rx_buf are borrowed by the
        // caller for at least `len` bytes and outlive the ioctl.
        unsafe { ioctl::message(self.file.as_raw_fd(), &[transfer]) }
            .map_err(LinuxSpiError::TransferFailed)?;
        Ok(())
    }

    /// Clock out `tx`, dropping the received bytes
    pub fn write(&mut self, tx: &[u8]) -> Result<()> {
        let transfer = SpiIocTransfer::new(tx.as_ptr(), std::ptr::null_mut(), tx.len(), self.speed_hz);
        self.message(transfer)
    }

    /// Clock out `tx` while capturing into `rx`
    pub fn exchange(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.len() != rx.len() {
            return Err(LinuxSpiError::LengthMismatch {
                tx: tx.len(),
                rx: rx.len(),
            });
        }
        let transfer = SpiIocTransfer::new(tx.as_ptr(), rx.as_mut_ptr(), tx.len(), self.speed_hz);
        self.message(transfer)
    }

    /// Clock in `rx.len()` bytes while sending zeros
    pub fn read(&mut self, rx: &mut [u8]) -> Result<()> {
        let transfer = SpiIocTransfer::new(std::ptr::null(), rx.as_mut_ptr(), rx.len(), self.speed_hz);
        self.message(transfer)
    }
}

fn bus_error(e: LinuxSpiError) -> CoreError {
    log::error!("linux_spi: {}", e);
    CoreError::SpiTransferFailed
}

impl SpiBus for LinuxSpi {
    fn transmit(&mut self, data: &[u8]) -> CoreResult<()> {
        self.write(data).map_err(bus_error)
    }

    fn transmit_receive(&mut self, tx: &[u8], rx: &mut [u8]) -> CoreResult<()> {
        self.exchange(tx, rx).map_err(bus_error)
    }

    fn receive(&mut self, buf: &mut [u8]) -> CoreResult<()> {
        self.read(buf).map_err(bus_error)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

/// Build a bus configuration from programmer options
///
/// Recognises `dev` and `spispeed` (kHz). Other keys belong to the reset
/// line and are skipped, so the whole option list can be passed in.
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut config = LinuxSpiConfig::new("");

    for &(key, value) in options {
        match key {
            "dev" => config.device = value.to_string(),
            "spispeed" => {
                let khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                if !(1..=MAX_SPEED_HZ / 1000).contains(&khz) {
                    return Err(format!(
                        "Invalid spispeed: {} kHz (must be 1-{})",
                        khz,
                        MAX_SPEED_HZ / 1000
                    ));
                }
                config.speed_hz = khz * 1000;
            }
            _ => log::trace!("linux_spi: Skipping option {}={}", key, value),
        }
    }

    if config.device.is_empty() {
        return Err("No device specified. Use dev=/dev/spidevX.Y".to_string());
    }

    Ok(config)
}
