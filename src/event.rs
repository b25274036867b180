//! Wire event model
//!
//! Events are serialize-once records: built from a [`RunContext`] plus the
//! notification arguments, written as a single JSON line, never stored.
//! Each variant carries exactly the field set of its event kind. Only the
//! run id/name are optional: they serialize as `null` if a misbehaving
//! engine emits before run start.
//!
//! - `Start`: run began (`ansible_type: "start"`)
//! - `Runner`: one task or looped-item outcome (`ansible_type: "task" | "item"`)
//! - `HostStats`: per-host statistics at run end (no type, no status)
//! - `Summary`: final run status, exactly one per run, always last

use serde::Serialize;
use serde_json::Value;

use crate::context::RunContext;

/// Outcome attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Failed,
    Unreachable,
    Skipped,
    Retry,
}

/// Wire discriminator for start/task/item events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Start,
    Task,
    Item,
}

/// One line on the wire.
///
/// Borrows everything from the [`RunContext`] and the notification
/// arguments; the result payload passes through opaquely, its shape is
/// never inspected.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Event<'a> {
    Start {
        status: Status,
        host: &'a str,
        session: &'a str,
        playbook_name: Option<&'a str>,
        playbook_id: Option<&'a str>,
        ansible_type: EventType,
    },
    Runner {
        status: Status,
        host: &'a str,
        session: &'a str,
        ansible_type: EventType,
        playbook_name: Option<&'a str>,
        playbook_id: Option<&'a str>,
        ansible_host: &'a str,
        ansible_task: &'a str,
        ansible_result: &'a Value,
    },
    HostStats {
        host: &'a str,
        ansible_host: &'a str,
        playbook_id: Option<&'a str>,
        playbook_name: Option<&'a str>,
        stats: &'a Value,
    },
    Summary {
        playbook_id: Option<&'a str>,
        playbook_name: Option<&'a str>,
        status: Status,
    },
}

impl<'a> Event<'a> {
    /// Run-start event; always `OK`.
    pub fn start(ctx: &'a RunContext) -> Self {
        Event::Start {
            status: Status::Ok,
            host: &ctx.hostname,
            session: &ctx.session,
            playbook_name: ctx.playbook_name.as_deref(),
            playbook_id: ctx.playbook_id.as_deref(),
            ansible_type: EventType::Start,
        }
    }

    /// Task or item outcome for one target host.
    pub fn runner(
        ctx: &'a RunContext,
        ansible_type: EventType,
        status: Status,
        ansible_host: &'a str,
        ansible_task: &'a str,
        ansible_result: &'a Value,
    ) -> Self {
        Event::Runner {
            status,
            host: &ctx.hostname,
            session: &ctx.session,
            ansible_type,
            playbook_name: ctx.playbook_name.as_deref(),
            playbook_id: ctx.playbook_id.as_deref(),
            ansible_host,
            ansible_task,
            ansible_result,
        }
    }

    /// Statistics record for one target host, emitted at run end.
    pub fn host_stats(ctx: &'a RunContext, ansible_host: &'a str, stats: &'a Value) -> Self {
        Event::HostStats {
            host: &ctx.hostname,
            ansible_host,
            playbook_id: ctx.playbook_id.as_deref(),
            playbook_name: ctx.playbook_name.as_deref(),
            stats,
        }
    }

    /// Final summary; status derives from the failure counter alone.
    pub fn summary(ctx: &'a RunContext) -> Self {
        Event::Summary {
            playbook_id: ctx.playbook_id.as_deref(),
            playbook_name: ctx.playbook_name.as_deref(),
            status: ctx.final_status(),
        }
    }
}
