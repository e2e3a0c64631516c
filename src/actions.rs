use crate::config::Settings;
use crate::document::DocumentTree;
use crate::error::{DocumentError, Result};
use crate::integrations::Connector;
use crate::models::BlockUid;
use crate::notify::{Notifier, Toast};
use crate::quick_capture::{CaptureReport, pull_quick_capture};
use crate::sync::{
    CompletedTask, PullOptions, PullReport, SyncCompletedReport, complete_task, pull_tasks,
    sync_completed,
};
use crate::task_metadata::BlockStyle;
use crate::workflows::{InstallReport, default_workflows, install_workflows};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    CompleteTask,
    PullTasks,
    SyncCompleted,
    QuickCapture,
}

impl Operation {
    pub fn script_name(self) -> &'static str {
        match self {
            Operation::CompleteTask => "completeTask",
            Operation::PullTasks => "pullTasks",
            Operation::SyncCompleted => "syncCompleted",
            Operation::QuickCapture => "pullQuickCapture",
        }
    }

    pub fn feature(self) -> &'static str {
        match self {
            Operation::CompleteTask => "complete-task",
            Operation::PullTasks => "pull-tasks",
            Operation::SyncCompleted => "sync-completed",
            Operation::QuickCapture => "quick-capture",
        }
    }
}

const INSTALL_FEATURE: &str = "install-workflows";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    Focused,
    Block(BlockUid),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    CompleteTask,
    PullTasks { filter: String, only_diff: bool },
    SyncCompleted,
    QuickCapture,
}

impl Invocation {
    pub fn operation(&self) -> Operation {
        match self {
            Invocation::CompleteTask => Operation::CompleteTask,
            Invocation::PullTasks { .. } => Operation::PullTasks,
            Invocation::SyncCompleted => Operation::SyncCompleted,
            Invocation::QuickCapture => Operation::QuickCapture,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed(CompletedTask),
    Pulled(PullReport),
    Synced(SyncCompletedReport),
    Captured(CaptureReport),
}

pub struct TaskLink<D, C, N> {
    doc: D,
    connector: C,
    notifier: N,
}

impl<D, C, N> TaskLink<D, C, N>
where
    D: DocumentTree,
    C: Connector,
    N: Notifier,
{
    pub fn new(doc: D, connector: C, notifier: N) -> Self {
        Self {
            doc,
            connector,
            notifier,
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.doc)
    }

    pub fn dispatch(&mut self, invocation: Invocation, trigger: Trigger) -> Result<Outcome> {
        tracing::debug!(feature = invocation.operation().feature(), ?trigger, "dispatch");
        match invocation {
            Invocation::CompleteTask => self.complete_task(trigger).map(Outcome::Completed),
            Invocation::PullTasks { filter, only_diff } => self
                .pull_tasks(trigger, &filter, only_diff)
                .map(Outcome::Pulled),
            Invocation::SyncCompleted => self.sync_completed(trigger).map(Outcome::Synced),
            Invocation::QuickCapture => self.pull_quick_capture(trigger).map(Outcome::Captured),
        }
    }

    pub fn complete_task(&mut self, trigger: Trigger) -> Result<CompletedTask> {
        let result = self.with_service(|doc, service, settings| {
            let target = resolve(doc, &trigger)?;
            complete_task(doc, service, &target, settings.completion_action())
        });
        self.report(Operation::CompleteTask.feature(), result, |done| {
            format!("task {} {:?}", done.task_id, done.action)
        })
    }

    pub fn pull_tasks(
        &mut self,
        trigger: Trigger,
        filter: &str,
        only_diff: bool,
    ) -> Result<PullReport> {
        let result = self.with_service(|doc, service, settings| {
            let anchor = resolve(doc, &trigger)?;
            let options = PullOptions {
                only_diff,
                style: BlockStyle {
                    hide_priority: settings.hide_priority(),
                    tag: settings.tag().map(str::to_string),
                },
            };
            pull_tasks(doc, service, &anchor, filter, &options)
        });
        self.report(Operation::PullTasks.feature(), result, PullReport::summary)
    }

    pub fn sync_completed(&mut self, trigger: Trigger) -> Result<SyncCompletedReport> {
        let result = self.with_service(|doc, service, _| {
            let root = match &trigger {
                Trigger::Block(uid) => uid.clone(),
                Trigger::Focused => page_of(doc, &resolve(doc, &trigger)?)?,
            };
            sync_completed(doc, service, &root)
        });
        self.report(
            Operation::SyncCompleted.feature(),
            result,
            SyncCompletedReport::summary,
        )
    }

    pub fn pull_quick_capture(&mut self, trigger: Trigger) -> Result<CaptureReport> {
        let result = self.with_service(|doc, service, settings| {
            let target = resolve(doc, &trigger)?;
            let filter = settings.quick_capture_filter()?;
            pull_quick_capture(doc, service, &target, filter, settings.quick_capture_tag())
        });
        self.report(Operation::QuickCapture.feature(), result, |report| {
            format!("captured {}", report.created.len())
        })
    }

    pub fn install_workflows(&mut self) -> Result<InstallReport> {
        let result = Settings::load(&self.doc)
            .and_then(|settings| install_workflows(&mut self.doc, &default_workflows(&settings)));
        self.report(INSTALL_FEATURE, result, |report| {
            format!("installed {} workflows", report.installed)
        })
    }

    fn with_service<T>(
        &mut self,
        run: impl FnOnce(&mut D, &C::Service, &Settings) -> Result<T>,
    ) -> Result<T> {
        let settings = Settings::load(&self.doc)?;
        let service = self.connector.connect(settings.token()?)?;
        run(&mut self.doc, &service, &settings)
    }

    fn report<T>(
        &self,
        feature: &str,
        result: Result<T>,
        summary: impl FnOnce(&T) -> String,
    ) -> Result<T> {
        match &result {
            Ok(value) => {
                tracing::info!(feature, summary = %summary(value), "feature succeeded");
                self.notifier.show(Toast::success(feature, format!("Success: {feature}")));
            }
            Err(err) => {
                tracing::error!(feature, error = %err, "feature failed");
                self.notifier
                    .show(Toast::failure(feature, format!("Failed: {feature}. Error: {err}")));
            }
        }
        result
    }
}

fn resolve<D: DocumentTree + ?Sized>(doc: &D, trigger: &Trigger) -> Result<BlockUid> {
    match trigger {
        Trigger::Block(uid) => Ok(uid.clone()),
        Trigger::Focused => doc
            .focused_block()
            .ok_or_else(|| DocumentError("no focused block".to_string()).into()),
    }
}

fn page_of<D: DocumentTree + ?Sized>(doc: &D, uid: &str) -> Result<BlockUid> {
    let mut current = uid.to_string();
    while let Some(parent) = doc.require_block(&current)?.parent {
        current = parent;
    }
    Ok(current)
}
