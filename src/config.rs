//! Environment-sourced configuration
//!
//! Two knobs, both read from the process environment:
//! - `ANSIBLE_NAMED_PIPE` (required): path to a pre-existing named pipe.
//!   When absent the notifier runs disabled and emits nothing.
//! - `ANSIBLE_SESSION_ID` (optional): overrides the generated session id.

use std::env;
use std::path::PathBuf;

use tracing::warn;

/// Env var holding the path to the named pipe.
pub const PIPE_PATH_VAR: &str = "ANSIBLE_NAMED_PIPE";

/// Env var overriding the generated session id.
pub const SESSION_ID_VAR: &str = "ANSIBLE_SESSION_ID";

/// Resolved notifier settings.
///
/// Constructible directly in tests; production code goes through
/// [`NotifyConfig::from_env`].
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    /// Path to the named pipe. `None` disables the notifier entirely.
    pub pipe_path: Option<PathBuf>,
    /// Session id override. `None` means a fresh UUID is generated.
    pub session_id: Option<String>,
}

impl NotifyConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            pipe_path: env::var_os(PIPE_PATH_VAR).map(PathBuf::from),
            session_id: env::var(SESSION_ID_VAR).ok().and_then(printable),
        }
    }
}

/// A supplied session id must be printable. Anything carrying control
/// characters (or nothing at all) is discarded in favor of a generated id.
fn printable(raw: String) -> Option<String> {
    if raw.is_empty() || raw.chars().any(char::is_control) {
        warn!(var = SESSION_ID_VAR, "ignoring non-printable session id override");
        return None;
    }
    Some(raw)
}
