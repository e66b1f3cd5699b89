//! Termination signals observed by the trap
//!
//! Classifies OS signals for the coordinator and selects, once at startup,
//! which of them the trap subscribes to.

use std::ffi::OsStr;
use std::fmt;

use nix::sys::signal::Signal;
use serde::{Deserialize, Serialize};

/// Environment variable whose non-empty value disables SIGQUIT monitoring
pub const DEBUG_ENV: &str = "DEBUG";

/// A termination signal the trap can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapSignal {
    /// SIGINT (Ctrl-C)
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGQUIT
    Quit,
}

impl TrapSignal {
    /// The underlying OS signal
    pub fn os_signal(self) -> Signal {
        match self {
            TrapSignal::Interrupt => Signal::SIGINT,
            TrapSignal::Terminate => Signal::SIGTERM,
            TrapSignal::Quit => Signal::SIGQUIT,
        }
    }

    /// Numeric value of the signal, as used in `128 + N` exit codes
    pub fn number(self) -> i32 {
        self.os_signal() as i32
    }

    /// Map a raw signal number back to a trap signal.
    ///
    /// Returns `None` for anything the trap never subscribes to.
    pub fn from_number(raw: i32) -> Option<Self> {
        match Signal::try_from(raw).ok()? {
            Signal::SIGINT => Some(TrapSignal::Interrupt),
            Signal::SIGTERM => Some(TrapSignal::Terminate),
            Signal::SIGQUIT => Some(TrapSignal::Quit),
            _ => None,
        }
    }

    /// How the coordinator treats this signal
    pub fn kind(self) -> SignalKind {
        match self {
            TrapSignal::Interrupt | TrapSignal::Terminate => SignalKind::InterruptOrTerminate,
            TrapSignal::Quit => SignalKind::Quit,
        }
    }
}

impl fmt::Display for TrapSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.os_signal().as_str())
    }
}

/// Classification of an incoming signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGINT or SIGTERM: counted towards escalation
    InterruptOrTerminate,
    /// SIGQUIT: always forces an exit
    Quit,
    /// Not subscribed, never reaches the coordinator
    Unmonitored,
}

impl SignalKind {
    /// Classify a raw signal number
    pub fn of_number(raw: i32) -> Self {
        TrapSignal::from_number(raw)
            .map(TrapSignal::kind)
            .unwrap_or(SignalKind::Unmonitored)
    }
}

/// Debug-mode marker, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugMarker(bool);

impl DebugMarker {
    /// Create a marker with an explicit value
    pub fn new(set: bool) -> Self {
        Self(set)
    }

    /// Read the marker from the `DEBUG` environment variable
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(DEBUG_ENV).as_deref())
    }

    /// Any non-empty value sets the marker
    pub fn from_env_value(value: Option<&OsStr>) -> Self {
        Self(value.is_some_and(|v| !v.is_empty()))
    }

    /// Whether debug mode is on
    pub fn is_set(self) -> bool {
        self.0
    }
}

/// Compute the monitored signal set.
///
/// SIGINT and SIGTERM are always observed. SIGQUIT is observed only when
/// the debug marker is unset; in debug mode it keeps its default
/// disposition (terminate with core dump).
pub fn monitored_signals(marker: DebugMarker) -> Vec<TrapSignal> {
    let mut signals = vec![TrapSignal::Interrupt, TrapSignal::Terminate];
    if !marker.is_set() {
        signals.push(TrapSignal::Quit);
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_numbers() {
        assert_eq!(TrapSignal::Interrupt.number(), 2);
        assert_eq!(TrapSignal::Quit.number(), 3);
        assert_eq!(TrapSignal::Terminate.number(), 15);
    }

    #[test]
    fn test_classification() {
        assert_eq!(SignalKind::of_number(2), SignalKind::InterruptOrTerminate);
        assert_eq!(SignalKind::of_number(15), SignalKind::InterruptOrTerminate);
        assert_eq!(SignalKind::of_number(3), SignalKind::Quit);
        assert_eq!(SignalKind::of_number(Signal::SIGHUP as i32), SignalKind::Unmonitored);
        assert_eq!(SignalKind::of_number(-1), SignalKind::Unmonitored);
    }

    #[test]
    fn test_display_uses_os_names() {
        assert_eq!(TrapSignal::Interrupt.to_string(), "SIGINT");
        assert_eq!(TrapSignal::Quit.to_string(), "SIGQUIT");
    }

    #[test]
    fn test_debug_marker_from_env_value() {
        assert!(!DebugMarker::from_env_value(None).is_set());
        assert!(!DebugMarker::from_env_value(Some(OsStr::new(""))).is_set());
        assert!(DebugMarker::from_env_value(Some(OsStr::new("1"))).is_set());
        // "0" is still a non-empty value
        assert!(DebugMarker::from_env_value(Some(OsStr::new("0"))).is_set());
    }

    #[test]
    fn test_monitored_without_debug() {
        let signals = monitored_signals(DebugMarker::new(false));
        assert_eq!(
            signals,
            vec![TrapSignal::Interrupt, TrapSignal::Terminate, TrapSignal::Quit]
        );
    }

    #[test]
    fn test_monitored_with_debug_excludes_quit() {
        let signals = monitored_signals(DebugMarker::new(true));
        assert_eq!(signals, vec![TrapSignal::Interrupt, TrapSignal::Terminate]);
        assert!(!signals.contains(&TrapSignal::Quit));
    }
}
