//! Registration surface for the bootstrapping daemon

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use crate::events::TrapEvent;

use super::conduit;
use super::coordinator::ShutdownCoordinator;
use super::error::TrapError;
use super::signals::{monitored_signals, DebugMarker, TrapSignal};
use super::terminator::{ProcessTerminator, Terminator};

const EVENT_CAPACITY: usize = 16;

/// Install the trap, reading the debug marker from the environment.
///
/// * SIGINT or SIGTERM: `cleanup` runs, then the process exits with 0.
/// * A fourth SIGINT/SIGTERM before cleanup completes skips cleanup and
///   exits with `128 + signal number`. The second and third are ignored.
/// * SIGQUIT exits immediately without cleanup, unless `DEBUG` is set, in
///   which case it is not monitored at all.
///
/// Returns immediately; the coordinator runs on the current tokio runtime.
pub fn install<F>(cleanup: F) -> Result<Trap, TrapError>
where
    F: FnOnce() + Send + 'static,
{
    install_with(DebugMarker::from_env(), cleanup)
}

/// Install the trap with an explicit debug marker
pub fn install_with<F>(marker: DebugMarker, cleanup: F) -> Result<Trap, TrapError>
where
    F: FnOnce() + Send + 'static,
{
    Trap::with_terminator(marker, Arc::new(ProcessTerminator), cleanup)
}

/// Handle to an installed trap
pub struct Trap {
    monitored: Vec<TrapSignal>,
    attempts: Arc<AtomicU32>,
    event_tx: broadcast::Sender<TrapEvent>,
    task: JoinHandle<()>,
}

impl Trap {
    /// Install a trap that ends the process through `terminator`
    pub fn with_terminator<F>(
        marker: DebugMarker,
        terminator: Arc<dyn Terminator>,
        cleanup: F,
    ) -> Result<Self, TrapError>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TrapError::NoRuntime)?;

        let monitored = monitored_signals(marker);
        let signal_rx = conduit::subscribe(&monitored)?;

        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let coordinator = ShutdownCoordinator::new(cleanup, terminator, event_tx.clone());
        let attempts = coordinator.attempt_counter();
        let task = runtime.spawn(coordinator.run(signal_rx));

        info!(?monitored, debug = marker.is_set(), "signal trap installed");

        Ok(Self {
            monitored,
            attempts,
            event_tx,
            task,
        })
    }

    /// Signals this trap observes
    pub fn monitored(&self) -> &[TrapSignal] {
        &self.monitored
    }

    /// Interrupt/terminate signals counted so far
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Subscribe to coordinator events
    pub fn subscribe(&self) -> broadcast::Receiver<TrapEvent> {
        self.event_tx.subscribe()
    }

    /// Whether the coordinator loop has stopped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl std::fmt::Debug for Trap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trap")
            .field("monitored", &self.monitored)
            .field("attempts", &self.attempts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nix::sys::signal::{raise, Signal};
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::lifecycle::terminator::testing::{signal_lock, RecordingTerminator};
    use crate::lifecycle::Exit;

    #[test]
    fn test_install_requires_runtime() {
        let result = install_with(DebugMarker::new(true), || {});
        assert!(matches!(assert_err!(result), TrapError::NoRuntime));
    }

    #[tokio::test]
    async fn test_monitored_set_follows_marker() {
        let _lock = signal_lock();
        let terminator = Arc::new(RecordingTerminator::default());

        let trap = assert_ok!(Trap::with_terminator(
            DebugMarker::new(false),
            terminator.clone(),
            || {}
        ));
        assert!(trap.monitored().contains(&TrapSignal::Quit));

        let trap = assert_ok!(Trap::with_terminator(
            DebugMarker::new(true),
            terminator,
            || {}
        ));
        assert!(!trap.monitored().contains(&TrapSignal::Quit));
        assert_eq!(trap.attempts(), 0);
        assert!(!trap.is_finished());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_raised_interrupt_runs_cleanup() {
        let _lock = signal_lock();
        let terminator = Arc::new(RecordingTerminator::default());
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let trap = assert_ok!(Trap::with_terminator(
            DebugMarker::new(true),
            terminator.clone(),
            move || {
                let _ = done_tx.send(());
            }
        ));
        let mut events = trap.subscribe();

        raise(Signal::SIGINT).unwrap();

        tokio::time::timeout(Duration::from_secs(5), done_rx)
            .await
            .expect("cleanup was not invoked")
            .unwrap();
        assert_eq!(terminator.wait_for(1).await, vec![Exit::Graceful]);
        assert_eq!(trap.attempts(), 1);
        assert_eq!(
            events.recv().await.unwrap(),
            TrapEvent::SignalReceived {
                signal: TrapSignal::Interrupt,
                attempts: 0
            }
        );
    }
}
