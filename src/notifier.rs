//! Named-pipe event emitter
//!
//! [`PipeNotifier`] turns each lifecycle notification into one JSON line on
//! the configured named pipe (the run-end notification emits one line per
//! host plus the summary). Writes are blocking and unbuffered: a slow
//! consumer throttles the whole run, which is the intended backpressure
//! mechanism. There is no internal queue: one would mask a dead consumer
//! and change the failure semantics.
//!
//! Lifecycle: Uninitialized → Ready → Active → Closed, with a Disabled
//! branch when no pipe path is configured. In Disabled mode every
//! notification is an `Ok(())` no-op and nothing is ever written. The pipe
//! handle is released exactly once: at run end, or by `Drop` on any other
//! exit path.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::config::{NotifyConfig, PIPE_PATH_VAR};
use crate::context::RunContext;
use crate::errors::NotifyError;
use crate::event::{Event, EventType, Status};
use crate::monitor::PlaybookMonitor;

pub struct PipeNotifier {
    /// `None` in Disabled mode.
    inner: Option<Inner>,
}

struct Inner {
    ctx: RunContext,
    /// `None` once the run summary has been emitted (Closed).
    pipe: Option<File>,
}

impl PipeNotifier {
    /// Build from the process environment (see [`NotifyConfig::from_env`]).
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::new(NotifyConfig::from_env())
    }

    /// Build from explicit configuration.
    ///
    /// No pipe path → a Disabled notifier (one warning, then silence).
    /// Pipe path set but unusable, or hostname unresolvable → error; the
    /// caller decides whether the run proceeds.
    pub fn new(config: NotifyConfig) -> Result<Self, NotifyError> {
        let Some(path) = config.pipe_path else {
            warn!(
                var = PIPE_PATH_VAR,
                "no notification pipe configured, run events will not be emitted"
            );
            return Ok(Self { inner: None });
        };

        let pipe = open_pipe(&path)?;
        let ctx = RunContext::initialize(config.session_id)?;
        info!(
            path = %path.display(),
            session = %ctx.session,
            host = %ctx.hostname,
            "notification pipe attached"
        );

        Ok(Self {
            inner: Some(Inner {
                ctx,
                pipe: Some(pipe),
            }),
        })
    }

    /// True when no pipe path was configured and nothing will be emitted.
    pub fn is_disabled(&self) -> bool {
        self.inner.is_none()
    }

    /// Correlation state, if the notifier is live.
    pub fn context(&self) -> Option<&RunContext> {
        self.inner.as_ref().map(|inner| &inner.ctx)
    }

    fn record_failure(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.ctx.record_failure();
        }
    }

    fn emit_runner(
        &mut self,
        kind: EventType,
        status: Status,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(());
        };
        let event = Event::runner(&inner.ctx, kind, status, host, task, result);
        write_line(inner.pipe.as_mut(), &event)
    }
}

impl PlaybookMonitor for PipeNotifier {
    fn on_run_start(&mut self, name: &str, id: &str) -> Result<(), NotifyError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(());
        };
        inner.ctx.record_run_started(id, name);
        debug!(playbook = name, id, "run started");
        let event = Event::start(&inner.ctx);
        write_line(inner.pipe.as_mut(), &event)
    }

    fn on_task_ok(&mut self, host: &str, task: &str, result: &Value) -> Result<(), NotifyError> {
        self.emit_runner(EventType::Task, Status::Ok, host, task, result)
    }

    fn on_task_failed(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError> {
        self.record_failure();
        self.emit_runner(EventType::Task, Status::Failed, host, task, result)
    }

    fn on_host_unreachable(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError> {
        self.record_failure();
        self.emit_runner(EventType::Task, Status::Unreachable, host, task, result)
    }

    fn on_async_task_failed(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError> {
        self.record_failure();
        self.emit_runner(EventType::Task, Status::Failed, host, task, result)
    }

    fn on_item_ok(&mut self, host: &str, task: &str, result: &Value) -> Result<(), NotifyError> {
        self.emit_runner(EventType::Item, Status::Ok, host, task, result)
    }

    fn on_item_failed(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError> {
        // No failure recorded: the engine fires on_task_failed for the same
        // fault, counting here would double it.
        self.emit_runner(EventType::Item, Status::Failed, host, task, result)
    }

    fn on_item_skipped(
        &mut self,
        host: &str,
        task: &str,
        result: &Value,
    ) -> Result<(), NotifyError> {
        self.emit_runner(EventType::Item, Status::Skipped, host, task, result)
    }

    fn on_item_retry(&mut self, host: &str, task: &str, result: &Value) -> Result<(), NotifyError> {
        self.emit_runner(EventType::Item, Status::Retry, host, task, result)
    }

    fn on_run_end(&mut self, stats: &HashMap<String, Value>) -> Result<(), NotifyError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(());
        };

        // Deterministic output: hosts in ascending lexicographic order,
        // never map iteration order.
        let mut entries: Vec<(&str, &Value)> = stats.iter().map(|(h, s)| (h.as_str(), s)).collect();
        entries.sort_by_key(|entry| entry.0);

        for (host, stat) in entries {
            let event = Event::host_stats(&inner.ctx, host, stat);
            write_line(inner.pipe.as_mut(), &event)?;
        }

        let summary = Event::summary(&inner.ctx);
        write_line(inner.pipe.as_mut(), &summary)?;

        debug!(
            status = ?inner.ctx.final_status(),
            errors = inner.ctx.errors(),
            elapsed = ?inner.ctx.elapsed(),
            "run summary emitted"
        );

        // Closed: release the pipe. Later calls find no stream and no-op.
        inner.pipe = None;
        Ok(())
    }
}

/// Serialize one event and append it as a newline-terminated line.
/// `None` means the stream is already released (Closed).
fn write_line(pipe: Option<&mut File>, event: &Event) -> Result<(), NotifyError> {
    let Some(pipe) = pipe else {
        return Ok(());
    };
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    pipe.write_all(line.as_bytes()).map_err(NotifyError::Write)?;
    trace!(bytes = line.len(), "event line written");
    Ok(())
}

/// Open the pre-existing pipe write-only at owner-only permissions.
/// The pipe is never created here: its absence is a setup error.
fn open_pipe(path: &Path) -> Result<File, NotifyError> {
    restrict_permissions(path).map_err(|source| NotifyError::Stream {
        path: path.display().to_string(),
        source,
    })?;
    OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|source| NotifyError::Stream {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn file_notifier(dir: &TempDir) -> (PipeNotifier, std::path::PathBuf) {
        // A regular file stands in for the pipe: open/write semantics are
        // identical and the lines can be read back.
        let path = dir.path().join("notify.pipe");
        fs::write(&path, b"").unwrap();
        let notifier = PipeNotifier::new(NotifyConfig {
            pipe_path: Some(path.clone()),
            session_id: Some("abc".into()),
        })
        .unwrap();
        (notifier, path)
    }

    fn lines(path: &Path) -> Vec<Value> {
        let raw = fs::read_to_string(path).unwrap();
        raw.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[test]
    fn test_disabled_without_pipe_path() {
        let mut notifier = PipeNotifier::new(NotifyConfig::default()).unwrap();
        assert!(notifier.is_disabled());
        assert!(notifier.context().is_none());

        // Every notification is a no-op, none errors.
        notifier.on_run_start("deploy", "pb-1").unwrap();
        notifier.on_task_failed("h1", "t", &json!({})).unwrap();
        notifier.on_run_end(&HashMap::new()).unwrap();
    }

    #[test]
    fn test_missing_pipe_is_a_stream_error() {
        let dir = TempDir::new().unwrap();
        let result = PipeNotifier::new(NotifyConfig {
            pipe_path: Some(dir.path().join("absent.pipe")),
            session_id: None,
        });
        assert!(matches!(result, Err(NotifyError::Stream { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let (_notifier, path) = file_notifier(&dir);
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_start_event_line() {
        let dir = TempDir::new().unwrap();
        let (mut notifier, path) = file_notifier(&dir);
        notifier.on_run_start("deploy", "pb-1").unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["status"], "OK");
        assert_eq!(lines[0]["session"], "abc");
        assert_eq!(lines[0]["playbook_name"], "deploy");
        assert_eq!(lines[0]["playbook_id"], "pb-1");
        assert_eq!(lines[0]["ansible_type"], "start");
    }

    #[test]
    fn test_error_count_tracks_failure_class_events_only() {
        let dir = TempDir::new().unwrap();
        let (mut notifier, _path) = file_notifier(&dir);
        notifier.on_run_start("deploy", "pb-1").unwrap();

        let r = json!({"msg": "boom"});
        notifier.on_task_ok("h1", "t", &r).unwrap();
        notifier.on_task_failed("h1", "t", &r).unwrap();
        notifier.on_host_unreachable("h2", "t", &r).unwrap();
        notifier.on_async_task_failed("h3", "t", &r).unwrap();
        notifier.on_item_failed("h1", "t", &r).unwrap();
        notifier.on_item_retry("h1", "t", &r).unwrap();
        notifier.on_item_skipped("h1", "t", &r).unwrap();

        assert_eq!(notifier.context().unwrap().errors(), 3);
    }

    #[test]
    fn test_run_end_sorts_hosts_and_appends_summary() {
        let dir = TempDir::new().unwrap();
        let (mut notifier, path) = file_notifier(&dir);
        notifier.on_run_start("deploy", "pb-1").unwrap();

        let mut stats = HashMap::new();
        stats.insert("web2".to_string(), json!({"ok": 1}));
        stats.insert("db1".to_string(), json!({"ok": 2}));
        stats.insert("web1".to_string(), json!({"ok": 3}));
        notifier.on_run_end(&stats).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 5); // start + 3 hosts + summary
        assert_eq!(lines[1]["ansible_host"], "db1");
        assert_eq!(lines[2]["ansible_host"], "web1");
        assert_eq!(lines[3]["ansible_host"], "web2");

        let summary = &lines[4];
        assert_eq!(summary["status"], "OK");
        assert_eq!(summary["playbook_id"], "pb-1");
        assert!(summary.get("ansible_host").is_none());
    }

    #[test]
    fn test_notifications_after_run_end_are_dropped() {
        let dir = TempDir::new().unwrap();
        let (mut notifier, path) = file_notifier(&dir);
        notifier.on_run_start("deploy", "pb-1").unwrap();
        notifier.on_run_end(&HashMap::new()).unwrap();

        let before = lines(&path).len();
        notifier.on_task_ok("h1", "t", &json!({})).unwrap();
        assert_eq!(lines(&path).len(), before);
    }

    #[test]
    fn test_lines_are_single_line_json_despite_embedded_newlines() {
        let dir = TempDir::new().unwrap();
        let (mut notifier, path) = file_notifier(&dir);
        notifier.on_run_start("deploy", "pb-1").unwrap();
        notifier
            .on_task_ok("h1", "multi\nline task", &json!({"out": "a\nb\nc"}))
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));
        assert_eq!(raw.matches('\n').count(), 2);
        for line in raw.lines() {
            serde_json::from_str::<Value>(line).unwrap();
        }
    }
}
