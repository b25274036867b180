//! Error types with fix suggestions
//!
//! One variant per failure class in the emission path. A missing pipe path
//! is not an error: the notifier disables itself and every notification
//! becomes a no-op (see [`crate::notifier::PipeNotifier::new`]).

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum NotifyError {
    /// Local hostname could not be resolved at initialization.
    ///
    /// Reported, never silently defaulted: every event carries the local
    /// hostname as a correlation field.
    #[error("hostname resolution failed: {reason}")]
    Hostname { reason: String },

    /// Pipe path is configured but the stream could not be opened or secured.
    /// Fatal at initialization; there is no retry.
    #[error("cannot open notification pipe '{path}': {source}")]
    Stream {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A result payload could not be rendered as JSON. The event stream is
    /// left truncated at the failing notification.
    #[error("event not JSON-serializable: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The consumer end of the pipe is gone or the write failed outright.
    /// No buffering, no reconnection: the caller is expected to surface this
    /// through its own error-reporting path.
    #[error("write to notification pipe failed: {0}")]
    Write(std::io::Error),
}

impl FixSuggestion for NotifyError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            NotifyError::Hostname { .. } => {
                Some("Check the machine has a resolvable UTF-8 hostname (hostnamectl)")
            }
            NotifyError::Stream { .. } => {
                Some("Create the pipe first (mkfifo) and check path and permissions")
            }
            NotifyError::Serialize(_) => {
                Some("Ensure the engine hands over plain JSON-compatible result payloads")
            }
            NotifyError::Write(_) => {
                Some("Check the consumer process is alive and still reading the pipe")
            }
        }
    }
}
