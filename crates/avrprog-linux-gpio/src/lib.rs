//! avrprog-linux-gpio - Linux GPIO reset line
//!
//! This crate drives the target's `RESET` pin from a GPIO line using the
//! Linux character device interface (gpiocdev). Combined with an SPI bus
//! it forms a complete ISP programmer on boards like the Raspberry Pi.
//!
//! # Example
//!
//! ```no_run
//! use avrprog_linux_gpio::{LinuxGpioReset, LinuxGpioResetConfig};
//! use avrprog_core::programmer::{Level, ResetLine};
//!
//! let config = LinuxGpioResetConfig::new("/dev/gpiochip0", 25);
//! let mut reset = LinuxGpioReset::open(&config)?;
//!
//! // Hold the target in reset
//! reset.set_level(Level::Low)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! | AVR Pin | Host | Description |
//! |---------|------|-------------|
//! | RESET   | GPIO line (`reset=N`) | Held low while programming |
//! | SCK     | SPI SCLK | Serial clock |
//! | MOSI    | SPI MOSI | Instructions to the target |
//! | MISO    | SPI MISO | Responses from the target |
//! | GND     | GND | Common ground |
//!
//! The line is requested as an output driven high, so the target keeps
//! running until a programming session starts.

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxGpioReset, LinuxGpioResetConfig};
pub use error::{LinuxGpioError, Result};

/// Open a GPIO reset line and return a boxed ResetLine
///
/// This is a convenience function for use in the CLI programmer dispatch.
///
/// # Example Options
///
/// - `gpiodev=/dev/gpiochip0` - GPIO chip device path (or use gpiochip=N)
/// - `gpiochip=0` - GPIO chip number (alternative to gpiodev)
/// - `reset=25` - Line offset wired to the target's RESET pin (required)
pub fn open_linux_gpio_reset(
    options: &[(&str, &str)],
) -> std::result::Result<
    Box<dyn avrprog_core::programmer::ResetLine + Send>,
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let reset = LinuxGpioReset::open(&config)?;
    Ok(Box::new(reset))
}
