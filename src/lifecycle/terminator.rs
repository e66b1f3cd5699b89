//! The single place where the process actually ends

use serde::{Deserialize, Serialize};
use tracing::info;

use super::signals::TrapSignal;

/// How the process is leaving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "signal", rename_all = "snake_case")]
pub enum Exit {
    /// Cleanup completed, exit status 0
    Graceful,
    /// Cleanup skipped, exit status `128 + signal number`
    Forced(TrapSignal),
}

impl Exit {
    /// Process exit status for this decision
    pub fn code(self) -> i32 {
        match self {
            Exit::Graceful => 0,
            Exit::Forced(signal) => 128 + signal.number(),
        }
    }
}

/// Ends the process on behalf of the coordinator
pub trait Terminator: Send + Sync + 'static {
    /// Terminate with the given exit decision.
    ///
    /// Real implementations never return.
    fn terminate(&self, exit: Exit);
}

/// Terminator that calls `std::process::exit`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, exit: Exit) {
        info!(code = exit.code(), "process exiting");
        std::process::exit(exit.code())
    }
}
