//! avrprog-linux-spi - Linux spidev bus
//!
//! This crate clocks ISP frames through a Linux SPI controller exposed as
//! `/dev/spidevX.Y`. It only provides the bus half of a programmer; the
//! target's reset pin is driven separately (see `avrprog-linux-gpio`) and
//! the two are combined with [`avrprog_core::programmer::Port`].
//!
//! # Example
//!
//! ```no_run
//! use avrprog_linux_spi::{LinuxSpi, LinuxSpiConfig};
//! use avrprog_core::programmer::SpiBus;
//!
//! // Open with default settings (1 MHz)
//! let mut spi = LinuxSpi::open_device("/dev/spidev0.0")?;
//!
//! // Or with custom settings
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_speed(250_000);
//! let mut spi = LinuxSpi::open(&config)?;
//!
//! // Programming Enable, the target echoes 0x53 in the third byte
//! let mut rx = [0u8; 4];
//! spi.transmit_receive(&[0xAC, 0x53, 0x00, 0x00], &mut rx)?;
//! println!("in sync: {}", rx[2] == 0x53);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with avrprog CLI
//!
//! ```bash
//! # Probe a target on SPI bus 0, chip select 0, reset on GPIO 25
//! avrprog -p linux_spi:dev=/dev/spidev0.0,gpiochip=0,reset=25 probe
//!
//! # Slow the clock down for a target running from its 1 MHz internal RC
//! avrprog -p linux_spi:dev=/dev/spidev0.0,spispeed=100,gpiochip=0,reset=25 write -i app.hex
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y`
//!
//! The SPI clock must stay below a quarter of the target's CPU clock.

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxSpi, LinuxSpiConfig, MAX_SPEED_HZ};
pub use error::{LinuxSpiError, Result};

/// Open a Linux SPI device and return a boxed SpiBus
///
/// This is a convenience function for use in the CLI programmer dispatch.
///
/// # Example Options
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=1000` - Optional: speed in kHz (default: 1000)
pub fn open_linux_spi(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn avrprog_core::programmer::SpiBus + Send>, Box<dyn std::error::Error>>
{
    let config = parse_options(options)?;
    let spi = LinuxSpi::open(&config)?;
    Ok(Box::new(spi))
}
