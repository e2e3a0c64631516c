use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::integrations::{Connector, TaskService};
use crate::models::{CreateTaskOptions, Priority, RemoteTask};
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct TodoistConnector {
    config: ServiceConfig,
}

impl TodoistConnector {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }
}

impl Connector for TodoistConnector {
    type Service = TodoistClient;

    fn connect(&self, token: &str) -> Result<TodoistClient, ServiceError> {
        TodoistClient::new(&self.config, token)
    }
}

pub struct TodoistClient {
    client: Client,
    base_url: Url,
    token: String,
}

#[derive(Deserialize)]
struct TodoistTask {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    content: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    due: Option<TodoistDue>,
    #[serde(default)]
    priority: Option<i64>,
    #[serde(default, alias = "created")]
    created_at: Option<String>,
    #[serde(default, alias = "completed")]
    is_completed: bool,
}

#[derive(Deserialize)]
struct TodoistDue {
    date: String,
    #[serde(default)]
    datetime: Option<String>,
}

#[derive(Serialize)]
struct CreateTaskRequest<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_string: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
    #[serde(skip_serializing_if = "no_labels")]
    labels: &'a [String],
}

impl TodoistClient {
    pub fn new(config: &ServiceConfig, token: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(5)))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ServiceError::Request(format!("Failed to create HTTP client: {e}")))?;
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            ServiceError::Request(format!("Invalid base url {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Request(format!(
                "Base url {} cannot carry a path",
                config.base_url
            )));
        }
        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn fetch_tasks(&self, query: &[(&str, &str)]) -> Result<Vec<RemoteTask>, ServiceError> {
        let resp = self
            .client
            .get(self.url(&["tasks"]))
            .bearer_auth(&self.token)
            .query(query)
            .send()?;
        let tasks: Vec<TodoistTask> = check_status(resp, "Tasks list")?.json()?;
        Ok(tasks.into_iter().map(RemoteTask::from).collect())
    }
}

impl TaskService for TodoistClient {
    fn list_tasks(&self, filter: &str) -> Result<Vec<RemoteTask>, ServiceError> {
        tracing::debug!(filter, "listing tasks");
        self.fetch_tasks(&[("filter", filter)])
    }

    fn list_active_tasks(&self, ids: &[String]) -> Result<Vec<RemoteTask>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        self.fetch_tasks(&[("ids", joined.as_str())])
    }

    fn close_task(&self, id: &str) -> Result<(), ServiceError> {
        let resp = self
            .client
            .post(self.url(&["tasks", id, "close"]))
            .bearer_auth(&self.token)
            .send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            tracing::debug!(task_id = id, "task already closed or gone");
            return Ok(());
        }
        check_status(resp, "Task close")?;
        Ok(())
    }

    fn create_task(
        &self,
        content: &str,
        options: &CreateTaskOptions,
    ) -> Result<RemoteTask, ServiceError> {
        let body = CreateTaskRequest {
            content,
            description: options.description.as_deref(),
            due_string: options.due_string.as_deref(),
            priority: options.priority.map(Priority::to_api),
            labels: &options.labels,
        };
        let resp = self
            .client
            .post(self.url(&["tasks"]))
            .bearer_auth(&self.token)
            .json(&body)
            .send()?;
        let created: TodoistTask = check_status(resp, "Task create")?.json()?;
        Ok(created.into())
    }
}

fn no_labels(labels: &&[String]) -> bool {
    labels.is_empty()
}

fn check_status(resp: Response, action: &str) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ServiceError::Unauthorized(status.as_u16()));
    }
    let body = resp.text().unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body: format!("{action} failed: {}", truncate_error(body.trim())),
    })
}

fn truncate_error(message: &str) -> String {
    let mut out = message.replace(['\n', '\r'], " ");
    if out.len() > 240 {
        let mut cut = 240;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str("...");
    }
    out
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

impl From<TodoistTask> for RemoteTask {
    fn from(task: TodoistTask) -> Self {
        let priority = match task.priority {
            None => None,
            Some(value @ 1..=4) => Priority::from_api(value),
            Some(value) => {
                tracing::warn!(task_id = %task.id, value, "ignoring malformed priority");
                None
            }
        };
        let created_at = task.created_at.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| tracing::warn!(task_id = %task.id, raw, "bad created_at: {e}"))
                .ok()
        });
        let description = Some(task.description.trim().to_string()).filter(|d| !d.is_empty());
        RemoteTask {
            id: task.id,
            content: task.content,
            description,
            due: task.due.map(|due| due.datetime.unwrap_or(due.date)),
            priority,
            created_at,
            is_completed: task.is_completed,
        }
    }
}
