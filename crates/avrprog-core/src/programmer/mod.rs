//! Programmer traits and abstractions
//!
//! This module defines the traits a programmer backend implements so the
//! ISP protocol can drive it.

mod traits;

pub use traits::*;
