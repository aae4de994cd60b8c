//! Reset line on a GPIO character device

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use avrprog_core::error::{Error as CoreError, Result as CoreResult};
use avrprog_core::programmer::{Level, ResetLine};

/// Configuration for the reset line
#[derive(Debug, Clone, Default)]
pub struct LinuxGpioResetConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Line offset wired to the target's RESET pin
    pub line: Offset,
}

impl LinuxGpioResetConfig {
    /// Create a new configuration with the given chip and line offset
    pub fn new(device: impl Into<String>, line: Offset) -> Self {
        Self {
            device: device.into(),
            line,
        }
    }
}

/// The target's reset pin driven from a GPIO line
pub struct LinuxGpioReset {
    /// GPIO line request handle
    request: Request,
    /// Requested line offset
    line: Offset,
}

impl LinuxGpioReset {
    /// Request the line as an output, initially high (target running)
    pub fn open(config: &LinuxGpioResetConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }

        log::debug!(
            "linux_gpio: Requesting line {} on {}",
            config.line,
            config.device
        );

        let mut req_config = Config::default();
        req_config.with_line(config.line).as_output(Value::Active);

        let request = Request::from_config(req_config)
            .on_chip(&config.device)
            .with_consumer("avrprog")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: config.device.clone(),
                line: config.line,
                source,
            })?;

        log::info!(
            "linux_gpio: Using {} line {} as reset",
            config.device,
            config.line
        );

        Ok(Self {
            request,
            line: config.line,
        })
    }

    /// Drive the line, reporting the gpiocdev error
    pub fn set(&self, level: Level) -> Result<()> {
        let value = match level {
            Level::Low => Value::Inactive,
            Level::High => Value::Active,
        };
        self.request
            .set_value(self.line, value)
            .map_err(LinuxGpioError::SetValueFailed)?;
        Ok(())
    }
}

impl ResetLine for LinuxGpioReset {
    fn set_level(&mut self, level: Level) -> CoreResult<()> {
        log::trace!("linux_gpio: reset {:?}", level);
        self.set(level).map_err(|e| {
            log::error!("linux_gpio: {}", e);
            CoreError::ResetLineFailed
        })
    }
}

/// Parse reset line options from a list of key-value pairs
///
/// Keys not meant for the reset line are ignored so the caller can pass the
/// whole programmer option list.
pub fn parse_options(
    options: &[(&str, &str)],
) -> std::result::Result<LinuxGpioResetConfig, String> {
    let mut config = LinuxGpioResetConfig::default();
    let mut have_reset = false;
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        match *key {
            "gpiodev" => {
                config.device = value.to_string();
            }
            "gpiochip" => {
                gpiochip = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid gpiochip value: {}", value))?,
                );
            }
            "reset" => {
                config.line = value
                    .parse()
                    .map_err(|_| format!("Invalid reset value: {}", value))?;
                have_reset = true;
            }
            _ => {
                log::trace!("linux_gpio: Ignoring option {}={}", key, value);
            }
        }
    }

    // Handle gpiodev vs gpiochip
    if config.device.is_empty() {
        if let Some(n) = gpiochip {
            config.device = format!("/dev/gpiochip{}", n);
        } else {
            return Err("Either 'gpiodev' or 'gpiochip' must be specified.\n\
                 e.g. linux_spi:dev=/dev/spidev0.0,gpiochip=0,reset=25"
                .to_string());
        }
    } else if gpiochip.is_some() {
        return Err("Only one of 'gpiodev' and 'gpiochip' may be specified".to_string());
    }

    if !have_reset {
        return Err("Missing required parameter: reset".to_string());
    }

    Ok(config)
}
