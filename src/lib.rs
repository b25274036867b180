//! Runpipe - run-event notifier for playbook lifecycles

pub mod config;
pub mod context;
pub mod errors;
pub mod event;
pub mod monitor;
pub mod notifier;

pub use config::NotifyConfig;
pub use context::RunContext;
pub use errors::{FixSuggestion, NotifyError};
pub use event::{Event, EventType, Status};
pub use monitor::PlaybookMonitor;
pub use notifier::PipeNotifier;
