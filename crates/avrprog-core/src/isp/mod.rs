//! AVR serial programming instruction set
//!
//! The ISP protocol is a sequence of 4-byte instructions clocked out on
//! SPI while the target is held in reset. This module provides the
//! instruction opcodes and a small frame type that encodes them.

mod frame;
pub mod opcodes;

pub use frame::IspFrame;
