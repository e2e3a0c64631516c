pub mod actions;
pub mod config;
pub mod document;
pub mod error;
pub mod integrations;
pub mod models;
pub mod notify;
pub mod quick_capture;
pub mod sync;
pub mod task_metadata;
pub mod workflows;

#[cfg(test)]
mod testing;

pub use actions::{Invocation, Operation, Outcome, TaskLink, Trigger};
pub use config::{CompletionAction, ServiceConfig, Settings};
pub use document::{DocumentTree, MemoryDocument};
pub use error::{DocumentError, Error, Result, ServiceError};
pub use integrations::todoist::{TodoistClient, TodoistConnector};
pub use integrations::{Connector, TaskService};
pub use notify::{Notifier, Toast, TracingNotifier};
