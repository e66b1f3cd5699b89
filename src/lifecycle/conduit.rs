//! Signal delivery conduit
//!
//! Subscribes to OS delivery for the monitored set and forwards every
//! notification to the coordinator over a channel with room for one
//! pending signal.

use tokio::signal::unix::{signal, SignalKind as OsSignalKind};
use tokio::sync::mpsc;
use tracing::debug;

use super::error::TrapError;
use super::signals::TrapSignal;

/// Pending notifications the hand-off can hold
const CONDUIT_CAPACITY: usize = 1;

/// Subscribe to the given signals and return the receiving end.
///
/// Every signal is registered before any forwarder starts, so a failure
/// leaves nothing half-installed. Must be called from within a tokio
/// runtime.
pub fn subscribe(monitored: &[TrapSignal]) -> Result<mpsc::Receiver<TrapSignal>, TrapError> {
    let mut streams = Vec::with_capacity(monitored.len());
    for &trap_signal in monitored {
        let stream = signal(OsSignalKind::from_raw(trap_signal.number())).map_err(|source| {
            TrapError::Register {
                signal: trap_signal,
                source,
            }
        })?;
        debug!(signal = %trap_signal, "subscribed to signal");
        streams.push((trap_signal, stream));
    }

    let (signal_tx, signal_rx) = mpsc::channel(CONDUIT_CAPACITY);
    for (trap_signal, mut stream) in streams {
        let signal_tx = signal_tx.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                if signal_tx.send(trap_signal).await.is_err() {
                    break;
                }
            }
            debug!(signal = %trap_signal, "signal forwarder stopped");
        });
    }

    Ok(signal_rx)
}
