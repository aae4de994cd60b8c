//! CLI command implementations
//!
//! Every command that touches hardware takes an already opened
//! [`IspTransport`](avrprog_core::programmer::IspTransport) and the device
//! database. The part is either named with `--part` or identified from the
//! target's signature.

mod erase;
mod list;
mod probe;
mod progress;
mod verify;
mod write;

pub use erase::run_erase;
pub use list::{list_devices, list_programmers};
pub use probe::{resolve_part, run_probe};
pub use verify::run_verify;
pub use write::run_write;
