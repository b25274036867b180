//! Playbook lifecycle monitor interface
//!
//! The seam the external orchestration engine drives: one method per
//! lifecycle notification, invoked strictly sequentially for a single run.
//! The engine pushes; an implementation never polls or pulls.
//!
//! All methods are synchronous and side-effecting. The engine-facing
//! contract returns nothing; fatal emission errors surface as `Err` so the
//! engine's own error-reporting path can pick them up instead of having
//! events silently dropped.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::NotifyError;

/// Receiver for typed lifecycle notifications of one playbook run.
///
/// Target host, task description and result payload arrive in engine-native
/// form: a display name, a string rendering and an opaque JSON tree. The
/// payload is passed through to the wire uninspected.
pub trait PlaybookMonitor {
    /// The run began; assigns run id and name for all later events.
    fn on_run_start(&mut self, name: &str, id: &str) -> Result<(), NotifyError>;

    /// A task completed successfully on one host.
    fn on_task_ok(&mut self, host: &str, task: &str, result: &Value) -> Result<(), NotifyError>;

    /// A task failed on one host. Counts toward the final run status.
    fn on_task_failed(&mut self, host: &str, task: &str, result: &Value)
        -> Result<(), NotifyError>;

    /// A host could not be reached. Counts toward the final run status.
    fn on_host_unreachable(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError>;

    /// An async task failed on one host. Counts toward the final run status.
    /// Same payload shape as [`Self::on_task_failed`]; kept separate because
    /// the engine delivers it through a distinct lifecycle callback.
    fn on_async_task_failed(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError>;

    /// One looped item completed successfully.
    fn on_item_ok(&mut self, host: &str, task: &str, result: &Value) -> Result<(), NotifyError>;

    /// One looped item failed. Does not count toward the final run status:
    /// the engine fires a task-level failure for the same fault.
    fn on_item_failed(&mut self, host: &str, task: &str, result: &Value)
        -> Result<(), NotifyError>;

    /// One looped item was skipped.
    fn on_item_skipped(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError>;

    /// One looped item is being retried.
    fn on_item_retry(&mut self, host: &str, task: &str, result: &Value)
        -> Result<(), NotifyError>;

    /// The run finished. Emits one statistics event per host in ascending
    /// lexicographic hostname order, then exactly one summary event.
    fn on_run_end(&mut self, stats: &HashMap<String, Value>) -> Result<(), NotifyError>;
}
