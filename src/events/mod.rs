//! Events module for shutdown coordination
//!
//! Provides structured event types published by the coordinator as it
//! reacts to termination signals.

use serde::{Deserialize, Serialize};

use crate::lifecycle::TrapSignal;

/// Events emitted by the shutdown coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrapEvent {
    /// A monitored signal reached the coordinator
    SignalReceived {
        /// Which signal
        signal: TrapSignal,
        /// Attempt counter value before this signal was applied
        attempts: u32,
    },

    /// The cleanup callback was handed to a worker
    CleanupStarted,

    /// The cleanup callback returned; a graceful exit follows
    CleanupFinished,

    /// Cleanup skipped, process exiting with a signal-derived status
    ForcedShutdown {
        /// Signal that forced the exit
        signal: TrapSignal,
        /// Exit status, `128 + signal number`
        code: i32,
    },
}

impl std::fmt::Display for TrapEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrapEvent::SignalReceived { signal, attempts } => {
                write!(f, "SIGNAL_RECEIVED ({}, attempts={})", signal, attempts)
            }
            TrapEvent::CleanupStarted => write!(f, "CLEANUP_STARTED"),
            TrapEvent::CleanupFinished => write!(f, "CLEANUP_FINISHED"),
            TrapEvent::ForcedShutdown { signal, code } => {
                write!(f, "FORCED_SHUTDOWN ({}, code={})", signal, code)
            }
        }
    }
}
