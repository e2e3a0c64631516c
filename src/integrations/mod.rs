pub mod todoist;

use crate::error::ServiceError;
use crate::models::{CreateTaskOptions, RemoteTask};
use std::thread;

pub trait TaskService: Sync {
    fn list_tasks(&self, filter: &str) -> Result<Vec<RemoteTask>, ServiceError>;
    /// The subset of `ids` that is still open on the service.
    fn list_active_tasks(&self, ids: &[String]) -> Result<Vec<RemoteTask>, ServiceError>;
    fn close_task(&self, id: &str) -> Result<(), ServiceError>;
    fn create_task(
        &self,
        content: &str,
        options: &CreateTaskOptions,
    ) -> Result<RemoteTask, ServiceError>;
}

pub trait Connector {
    type Service: TaskService;

    fn connect(&self, token: &str) -> Result<Self::Service, ServiceError>;
}

#[derive(Debug, Default)]
pub struct CloseReport {
    pub closed: Vec<String>,
    pub failed: Vec<(String, ServiceError)>,
}

impl CloseReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<String>, ServiceError> {
        if self.is_success() {
            Ok(self.closed)
        } else {
            Err(ServiceError::Close(
                self.failed.into_iter().map(|(id, _)| id).collect(),
            ))
        }
    }
}

const CLOSE_BATCH: usize = 8;

/// Closes tasks `CLOSE_BATCH` at a time and keeps each outcome.
pub fn close_tasks<S: TaskService + ?Sized>(service: &S, ids: &[String]) -> CloseReport {
    let mut outcomes: Vec<(String, Result<(), ServiceError>)> = Vec::with_capacity(ids.len());
    for batch in ids.chunks(CLOSE_BATCH) {
        thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|id| (id, scope.spawn(move || service.close_task(id))))
                .collect();
            for (id, handle) in handles {
                let outcome = handle.join().unwrap_or_else(|_| {
                    Err(ServiceError::Request("close worker panicked".to_string()))
                });
                outcomes.push((id.clone(), outcome));
            }
        });
    }

    let mut report = CloseReport::default();
    for (id, outcome) in outcomes {
        match outcome {
            Ok(()) => report.closed.push(id),
            Err(err) => {
                tracing::warn!(task_id = %id, error = %err, "failed to close task");
                report.failed.push((id, err));
            }
        }
    }
    report
}
