//! Process lifecycle: signal-driven shutdown
//!
//! - signals: classification and selection of the monitored set
//! - conduit: OS subscription and hand-off to the coordinator
//! - coordinator: attempt counter and escalation policy
//! - terminator: the only place the process exits

mod conduit;
mod coordinator;
mod error;
mod signals;
mod terminator;
mod trap;

pub use coordinator::{decide, Action, Cleanup, Decision, ShutdownCoordinator, FORCE_THRESHOLD};
pub use error::TrapError;
pub use signals::{monitored_signals, DebugMarker, SignalKind, TrapSignal, DEBUG_ENV};
pub use terminator::{Exit, ProcessTerminator, Terminator};
pub use trap::{install, install_with, Trap};
