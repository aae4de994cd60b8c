//! Error types for Linux SPI operations

use nix::errno::Errno;
use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The driver rejected a bus setting
    #[error("Failed to set {setting} to {value}: {source}")]
    ConfigureFailed {
        setting: &'static str,
        value: u32,
        #[source]
        source: Errno,
    },

    /// Requested clock is above what the driver is allowed to use
    #[error("SPI speed {speed} Hz exceeds the maximum of {max} Hz")]
    SpeedTooHigh { speed: u32, max: u32 },

    /// Transmit and receive buffers differ in length
    #[error("Transfer buffers differ in length ({tx} vs {rx} bytes)")]
    LengthMismatch { tx: usize, rx: usize },

    /// SPI_IOC_MESSAGE failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] Errno),

    /// Device not specified
    #[error("No device specified. Use dev=/dev/spidevX.Y")]
    NoDevice,
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
