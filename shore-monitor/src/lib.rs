//! Library face of the `shore-monitor` binary, split out so integration
//! tests under `tests/` can assemble a [`controller::Controller`] the same
//! way `main.rs` does.

pub mod cli;
pub mod controller;
pub mod lock;
pub mod process;
pub mod watchdog;
