//! trapd: example daemon built around the signal trap
//!
//! Writes a PID file, installs the trap, then idles until a termination
//! signal arrives. The cleanup routine drains for the configured grace
//! period and removes the PID file before the process exits.

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trapd::config::{Args, Config};
use trapd::pidfile;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;

    // Initialize logging
    let default_level = if config.debug.is_set() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "trapd starting");
    info!(
        ?config.pidfile,
        grace_ms = config.grace.as_millis() as u64,
        debug = config.debug.is_set(),
        "configuration loaded"
    );

    let pidfile_path = config.pidfile.clone();
    let grace = config.grace;

    // Written before the trap exists so cleanup always finds it
    pidfile::write(&config.pidfile)?;

    let installed = trapd::install_with(config.debug, move || {
        info!(grace_ms = grace.as_millis() as u64, "draining before exit");
        std::thread::sleep(grace);
        if let Err(e) = pidfile::remove(&pidfile_path) {
            warn!(?e, "failed to remove pid file");
        }
    });
    let trap = match installed {
        Ok(trap) => trap,
        Err(e) => {
            pidfile::remove(&config.pidfile)?;
            return Err(e.into());
        }
    };

    let mut events = trap.subscribe();

    info!(monitored = ?trap.monitored(), "daemon initialized, waiting for signals");

    loop {
        match events.recv().await {
            Ok(event) => info!(%event, "trap event"),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "trap event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    // The coordinator ends the process; nothing to do but wait for it
    std::future::pending::<()>().await;
    Ok(())
}
