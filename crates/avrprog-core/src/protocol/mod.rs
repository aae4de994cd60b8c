//! Protocol implementations
//!
//! This module contains the AVR serial programming instruction sequences.

pub mod isp;

pub use isp::*;
