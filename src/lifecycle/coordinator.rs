//! Shutdown coordinator state machine
//!
//! The state is the attempt counter combined with the incoming signal; there
//! is no separate phase field. Decisions are computed by [`decide`], a pure
//! function, and applied sequentially by a single consumer so that two
//! signals can never both be treated as "the first".

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::events::TrapEvent;

use super::signals::{SignalKind, TrapSignal};
use super::terminator::{Exit, Terminator};

/// Interrupt/terminate signals counted before the next one forces an exit.
///
/// The first signal starts cleanup, the second and third are swallowed,
/// the fourth and later skip cleanup.
pub const FORCE_THRESHOLD: u32 = 3;

/// Operator-supplied cleanup routine, run at most once
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// What the coordinator does with a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing beyond the receipt log line
    Ignore,
    /// Run cleanup, then exit gracefully
    Cleanup,
    /// Skip cleanup and exit with `128 + signal number`
    Force(TrapSignal),
}

/// Result of applying a signal to the attempt counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Action to take
    pub action: Action,
    /// Counter value after the signal
    pub attempts: u32,
}

/// Map `(signal, attempt counter)` to an action and the next counter value
pub fn decide(signal: TrapSignal, attempts: u32) -> Decision {
    match signal.kind() {
        SignalKind::Quit => Decision {
            action: Action::Force(signal),
            attempts,
        },
        SignalKind::InterruptOrTerminate if attempts < FORCE_THRESHOLD => {
            let attempts = attempts + 1;
            let action = if attempts == 1 {
                Action::Cleanup
            } else {
                Action::Ignore
            };
            Decision { action, attempts }
        }
        SignalKind::InterruptOrTerminate => Decision {
            action: Action::Force(signal),
            attempts,
        },
        // Exhaustive match only; `TrapSignal::kind` never yields it
        SignalKind::Unmonitored => Decision {
            action: Action::Ignore,
            attempts,
        },
    }
}

/// Owns the attempt counter, the cleanup callback and the terminator
pub struct ShutdownCoordinator {
    attempts: Arc<AtomicU32>,
    cleanup: Option<Cleanup>,
    terminator: Arc<dyn Terminator>,
    event_tx: broadcast::Sender<TrapEvent>,
}

impl ShutdownCoordinator {
    /// Create a new coordinator
    pub fn new<F>(
        cleanup: F,
        terminator: Arc<dyn Terminator>,
        event_tx: broadcast::Sender<TrapEvent>,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            attempts: Arc::new(AtomicU32::new(0)),
            cleanup: Some(Box::new(cleanup)),
            terminator,
            event_tx,
        }
    }

    /// Current attempt counter value
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Shared handle to the attempt counter
    pub(crate) fn attempt_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.attempts)
    }

    /// Run the decision loop until the signal conduit closes
    pub async fn run(mut self, mut signal_rx: mpsc::Receiver<TrapSignal>) {
        debug!("shutdown coordinator started");

        while let Some(signal) = signal_rx.recv().await {
            self.handle(signal);
        }

        debug!("signal conduit closed, shutdown coordinator stopped");
    }

    /// Apply one signal and return the action taken
    pub fn handle(&mut self, signal: TrapSignal) -> Action {
        let current = self.attempts();
        info!(%signal, attempts = current, "received signal, starting shutdown");
        self.emit(TrapEvent::SignalReceived {
            signal,
            attempts: current,
        });

        let decision = decide(signal, current);
        self.attempts.fetch_max(decision.attempts, Ordering::SeqCst);

        match decision.action {
            Action::Ignore => {}
            Action::Cleanup => self.start_cleanup(),
            Action::Force(signal) => self.force(signal),
        }

        decision.action
    }

    /// Hand the cleanup callback to a blocking worker.
    ///
    /// The loop keeps receiving while cleanup runs, so a later signal can
    /// still force an exit.
    fn start_cleanup(&mut self) {
        let Some(cleanup) = self.cleanup.take() else {
            return;
        };

        self.emit(TrapEvent::CleanupStarted);

        let terminator = Arc::clone(&self.terminator);
        let event_tx = self.event_tx.clone();
        tokio::task::spawn_blocking(move || {
            // A failing cleanup still ends in a graceful exit
            let _ = panic::catch_unwind(AssertUnwindSafe(cleanup));
            info!("cleanup finished");
            let _ = event_tx.send(TrapEvent::CleanupFinished);
            terminator.terminate(Exit::Graceful);
        });
    }

    fn force(&self, signal: TrapSignal) {
        let exit = Exit::Forced(signal);
        if signal.kind() == SignalKind::Quit {
            warn!(%signal, code = exit.code(), "quit requested, exiting without cleanup");
        } else {
            warn!(%signal, code = exit.code(), "force shutdown, interrupting cleanup");
        }
        self.emit(TrapEvent::ForcedShutdown {
            signal,
            code: exit.code(),
        });
        self.terminator.terminate(exit);
    }

    fn emit(&self, event: TrapEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }
}
