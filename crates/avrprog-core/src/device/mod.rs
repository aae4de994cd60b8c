//! AVR device types and database
//!
//! This module provides the flash geometry and timing of a target
//! ([`DeviceProfile`]) and, with `std`, a database of known parts keyed
//! by their signature.

mod types;

#[cfg(feature = "std")]
mod database;

pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
