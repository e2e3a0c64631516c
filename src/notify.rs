use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Success,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub content: String,
    pub intent: Intent,
    /// `None` keeps the toast up until the user dismisses it.
    pub timeout: Option<Duration>,
}

impl Toast {
    pub fn success(feature: &str, content: impl Into<String>) -> Self {
        Self {
            id: toast_id(feature),
            content: content.into(),
            intent: Intent::Success,
            timeout: Some(Duration::from_millis(1000)),
        }
    }

    pub fn failure(feature: &str, content: impl Into<String>) -> Self {
        Self {
            id: toast_id(feature),
            content: content.into(),
            intent: Intent::Warning,
            timeout: None,
        }
    }
}

fn toast_id(feature: &str) -> String {
    format!("tasklink-toast-{feature}")
}

pub trait Notifier {
    fn show(&self, toast: Toast);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, toast: Toast) {
        match toast.intent {
            Intent::Success => tracing::info!(id = %toast.id, "{}", toast.content),
            Intent::Warning => tracing::warn!(id = %toast.id, "{}", toast.content),
        }
    }
}
