//! trapd: signal-driven shutdown for long-running daemons
//!
//! Install a trap with a cleanup routine and keep going:
//! - First SIGINT/SIGTERM: run cleanup once, exit 0
//! - Second and third: ignored while cleanup runs
//! - Fourth and later: skip cleanup, exit `128 + signal`
//! - SIGQUIT: exit `128 + 3` immediately, unless `DEBUG` is set

pub mod config;
pub mod events;
pub mod lifecycle;
pub mod pidfile;

pub use events::TrapEvent;
pub use lifecycle::{install, install_with, DebugMarker, Exit, Trap, TrapError, TrapSignal};
