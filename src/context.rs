//! Per-run correlation state
//!
//! [`RunContext`] is the single source of truth for the identifiers that
//! must appear consistently on every event of one run, and for the failure
//! tally that decides the final run status. Created once at notifier
//! initialization, mutated as lifecycle notifications arrive, never reset.

use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::errors::NotifyError;
use crate::event::Status;

#[derive(Debug)]
pub struct RunContext {
    /// Session id: supplied override or a generated UUID. Immutable.
    pub session: String,
    /// Local machine hostname. Immutable.
    pub hostname: String,
    /// Run id assigned by the engine; `None` until the run-start notification.
    pub playbook_id: Option<String>,
    /// Run name assigned by the engine; same lifecycle as `playbook_id`.
    pub playbook_name: Option<String>,
    errors: u64,
    started_at: SystemTime,
}

impl RunContext {
    /// Resolve session id and local hostname.
    ///
    /// Fails only when the hostname cannot be resolved (or is not UTF-8);
    /// that is reported, not defaulted, since every event carries it.
    pub fn initialize(session_override: Option<String>) -> Result<Self, NotifyError> {
        let session = session_override.unwrap_or_else(|| Uuid::new_v4().to_string());
        let hostname = hostname::get()
            .map_err(|e| NotifyError::Hostname {
                reason: e.to_string(),
            })?
            .into_string()
            .map_err(|raw| NotifyError::Hostname {
                reason: format!("not valid UTF-8: {:?}", raw),
            })?;

        Ok(Self {
            session,
            hostname,
            playbook_id: None,
            playbook_name: None,
            errors: 0,
            started_at: SystemTime::now(),
        })
    }

    /// One-time assignment from the run-start notification.
    pub fn record_run_started(&mut self, id: &str, name: &str) {
        self.playbook_id = Some(id.to_string());
        self.playbook_name = Some(name.to_string());
    }

    /// Count one failure-class notification (task failed, host unreachable,
    /// async task failed). Item-level failures do not land here.
    pub fn record_failure(&mut self) {
        self.errors += 1;
    }

    /// Failures recorded so far.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// `FAILED` iff at least one failure was recorded, else `OK`.
    /// Pure function of the counter at read time.
    pub fn final_status(&self) -> Status {
        if self.errors > 0 {
            Status::Failed
        } else {
            Status::Ok
        }
    }

    /// Wall-clock time since initialization (logged at run end).
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed().unwrap_or_default()
    }
}
