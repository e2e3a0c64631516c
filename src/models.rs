use chrono::{DateTime, NaiveDate, Utc};

pub type BlockUid = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Priority(u8);

impl Priority {
    pub fn new(level: u8) -> Option<Self> {
        (1..=4).contains(&level).then_some(Priority(level))
    }

    /// Maps the API scale (4 = urgent, 1 = natural) to display levels.
    /// Natural priority is treated as no priority at all.
    pub fn from_api(value: i64) -> Option<Self> {
        match value {
            4 => Some(Priority(1)),
            3 => Some(Priority(2)),
            2 => Some(Priority(3)),
            _ => None,
        }
    }

    pub fn to_api(self) -> u8 {
        5 - self.0
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RemoteTask {
    pub id: String,
    pub content: String,
    pub description: Option<String>,
    pub due: Option<String>,
    pub priority: Option<Priority>,
    pub created_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

impl RemoteTask {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            description: None,
            due: None,
            priority: None,
            created_at: None,
            is_completed: false,
        }
    }

    pub fn created_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|ts| ts.date_naive())
    }
}

#[derive(Clone, Debug, Default)]
pub struct CreateTaskOptions {
    pub description: Option<String>,
    pub due_string: Option<String>,
    pub priority: Option<Priority>,
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentBlock {
    pub uid: BlockUid,
    pub text: String,
    pub order: usize,
    pub parent: Option<BlockUid>,
    pub children: Vec<BlockUid>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigNode {
    pub text: String,
    pub children: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn child(&self, text: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|node| node.text.trim() == text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowTemplate {
    pub title: String,
    pub contents: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Todo,
    Done,
}
