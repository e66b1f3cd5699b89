use super::signals::TrapSignal;

/// Errors that can occur while installing the trap
#[derive(Debug, thiserror::Error)]
pub enum TrapError {
    #[error("trap must be installed from within a tokio runtime")]
    NoRuntime,

    #[error("failed to register {signal} handler")]
    Register {
        signal: TrapSignal,
        #[source]
        source: std::io::Error,
    },
}
