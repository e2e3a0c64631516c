use crate::config::CONFIG_PAGE;
use crate::document::{DocumentTree, MemoryDocument};
use crate::error::ServiceError;
use crate::integrations::{Connector, TaskService};
use crate::models::{CreateTaskOptions, Priority, RemoteTask};
use crate::notify::{Notifier, Toast};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeState {
    pub by_filter: HashMap<String, Vec<RemoteTask>>,
    pub open: HashSet<String>,
    pub closed: Vec<String>,
    pub reject_close: HashSet<String>,
    pub fail_list: bool,
    pub calls: usize,
    pub tokens: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeService {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeService {
    pub fn with_filter(filter: &str, tasks: Vec<RemoteTask>) -> Self {
        let service = FakeService::default();
        service.add_filter(filter, tasks);
        service
    }

    pub fn add_filter(&self, filter: &str, tasks: Vec<RemoteTask>) {
        let mut state = self.state.lock().unwrap();
        for task in &tasks {
            state.open.insert(task.id.clone());
        }
        state.by_filter.insert(filter.to_string(), tasks);
    }

    pub fn closed(&self) -> Vec<String> {
        let mut closed = self.state.lock().unwrap().closed.clone();
        closed.sort();
        closed
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn reject_close(&self, id: &str) {
        self.state.lock().unwrap().reject_close.insert(id.to_string());
    }

    pub fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub fn set_open(&self, ids: &[&str]) {
        self.state.lock().unwrap().open = ids.iter().map(|id| id.to_string()).collect();
    }
}

impl TaskService for FakeService {
    fn list_tasks(&self, filter: &str) -> Result<Vec<RemoteTask>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_list {
            return Err(ServiceError::Request("network down".to_string()));
        }
        Ok(state.by_filter.get(filter).cloned().unwrap_or_default())
    }

    fn list_active_tasks(&self, ids: &[String]) -> Result<Vec<RemoteTask>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_list {
            return Err(ServiceError::Request("network down".to_string()));
        }
        Ok(ids
            .iter()
            .filter(|id| state.open.contains(*id))
            .map(|id| RemoteTask::new(id.clone(), "open"))
            .collect())
    }

    fn close_task(&self, id: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.reject_close.contains(id) {
            return Err(ServiceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        state.open.remove(id);
        state.closed.push(id.to_string());
        Ok(())
    }

    fn create_task(
        &self,
        content: &str,
        _options: &CreateTaskOptions,
    ) -> Result<RemoteTask, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let id = format!("created-{}", state.calls);
        state.open.insert(id.clone());
        Ok(RemoteTask::new(id, content))
    }
}

impl Connector for FakeService {
    type Service = FakeService;

    fn connect(&self, token: &str) -> Result<FakeService, ServiceError> {
        self.state.lock().unwrap().tokens.push(token.to_string());
        Ok(self.clone())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub toasts: Arc<Mutex<Vec<Toast>>>,
}

impl RecordingNotifier {
    pub fn taken(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

pub fn task(id: &str, content: &str, priority: Option<u8>, due: Option<&str>) -> RemoteTask {
    let mut task = RemoteTask::new(id, content);
    task.priority = priority.and_then(Priority::new);
    task.due = due.map(str::to_string);
    task
}

pub fn doc_with_anchor() -> (MemoryDocument, String, String) {
    let mut doc = MemoryDocument::new();
    let page = doc.create_page("January 5th, 2024").unwrap();
    let anchor = doc.create_block(&page, "Todoist", None).unwrap();
    (doc, page, anchor)
}

pub fn write_setting(doc: &mut MemoryDocument, section: &str, field: &str, value: Option<&str>) {
    let page = match doc.page_uid(CONFIG_PAGE).unwrap() {
        Some(uid) => uid,
        None => doc.create_page(CONFIG_PAGE).unwrap(),
    };
    let section_uid = doc
        .children(&page)
        .unwrap()
        .into_iter()
        .find(|block| block.text == section)
        .map(|block| block.uid)
        .unwrap_or_else(|| doc.create_block(&page, section, None).unwrap());
    let field_uid = doc.create_block(&section_uid, field, None).unwrap();
    if let Some(value) = value {
        doc.create_block(&field_uid, value, None).unwrap();
    }
}
