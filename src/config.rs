//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Result};
use clap::Parser;

use crate::lifecycle::DebugMarker;

/// Default location of the daemon PID file
pub const DEFAULT_PIDFILE: &str = "/var/run/trapd.pid";

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "trapd", version, about)]
pub struct Args {
    /// Enable debug mode (same as setting DEBUG in the environment)
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Path to use for daemon PID file
    #[arg(short, long, default_value = DEFAULT_PIDFILE)]
    pub pidfile: PathBuf,

    /// Time the cleanup routine spends draining before it removes the PID file
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub grace_ms: u64,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Debug marker; also removes SIGQUIT from the monitored set
    pub debug: DebugMarker,

    /// Path to the PID file
    pub pidfile: PathBuf,

    /// Drain period of the cleanup routine
    pub grace: Duration,
}

impl Config {
    /// Load configuration from arguments and environment
    pub fn load(args: &Args) -> Result<Self> {
        Self::resolve(args, DebugMarker::from_env())
    }

    /// Combine arguments with an already-read environment marker
    pub fn resolve(args: &Args, env_marker: DebugMarker) -> Result<Self> {
        ensure!(
            !args.pidfile.as_os_str().is_empty(),
            "pid file path must not be empty"
        );

        Ok(Self {
            debug: DebugMarker::new(args.debug || env_marker.is_set()),
            pidfile: args.pidfile.clone(),
            grace: Duration::from_millis(args.grace_ms),
        })
    }
}
