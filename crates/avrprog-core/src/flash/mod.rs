//! Flash programming sequencers
//!
//! This module provides the erase, page programming and verification
//! sequences built on [`crate::protocol`], and the write session that
//! strings them together.

mod busy;
mod erase;
mod guard;
mod identify;
mod page;
mod verify;

#[cfg(feature = "alloc")]
mod progress;
#[cfg(feature = "alloc")]
mod session;

pub use busy::{BusyWait, PollLimit};
pub use erase::erase_chip;
pub use guard::ResetGuard;
pub use identify::read_device_signature;
#[cfg(feature = "std")]
pub use identify::probe;
pub use page::{page_addresses, program_page, PageBuffer, PageOutcome};
pub use verify::{verify_range, VerifyOutcome};

#[cfg(feature = "alloc")]
pub use progress::{NoProgress, WriteProgress};
#[cfg(feature = "alloc")]
pub use session::{verify_image, write_image, VerifyReport, WriteOptions, WriteReport};
