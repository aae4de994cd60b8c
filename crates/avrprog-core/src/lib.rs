//! avrprog-core - Core library for AVR in-system programming
//!
//! This crate implements the AVR serial programming (ISP) protocol used to
//! erase, program and verify the flash memory of AVR microcontrollers over
//! a SPI bus and a reset line. It is `no_std` compatible; the `alloc` and
//! `std` features add firmware image handling and the device database.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), firmware
//!   loading (Intel HEX / raw binary) and the RON device database
//! - `alloc` - Enable heap allocation for firmware images and the write session
//!
//! # Example
//!
//! ```ignore
//! use avrprog_core::device::DeviceDatabase;
//! use avrprog_core::firmware;
//! use avrprog_core::flash::{self, NoProgress, WriteOptions};
//!
//! fn program<T: avrprog_core::programmer::IspTransport>(port: &mut T) -> Result<(), Box<dyn std::error::Error>> {
//!     let db = DeviceDatabase::builtin()?;
//!     let signature = flash::read_device_signature(port)?;
//!     let part = db.identify(signature)?;
//!
//!     let loaded = firmware::load("blink.hex".as_ref(), 0)?;
//!     let report = flash::write_image(
//!         port,
//!         &part.profile,
//!         &loaded.image,
//!         &WriteOptions::default(),
//!         &mut NoProgress,
//!     )?;
//!     println!("{} bytes written", report.bytes_written);
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod device;
pub mod error;
#[cfg(feature = "alloc")]
pub mod firmware;
pub mod flash;
pub mod isp;
pub mod programmer;
pub mod protocol;

#[cfg(all(test, feature = "std"))]
mod mock;

pub use error::{Error, Result};
