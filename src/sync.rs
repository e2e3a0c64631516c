use crate::config::CompletionAction;
use crate::document::DocumentTree;
use crate::error::{DocumentError, Error, Result};
use crate::integrations::{TaskService, close_tasks};
use crate::models::{BlockUid, DocumentBlock, RemoteTask, TaskStatus};
use crate::task_metadata::{
    BlockStyle, compose_task_block, parse_status, parse_task_id, set_status, strike_through,
};
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct PullOptions {
    pub only_diff: bool,
    pub style: BlockStyle,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PullReport {
    pub fetched: usize,
    pub created: Vec<BlockUid>,
    pub deleted: usize,
    pub unchanged: usize,
    pub duplicates: usize,
}

impl PullReport {
    pub fn summary(&self) -> String {
        format!(
            "+{} -{} ={} (fetched {})",
            self.created.len(),
            self.deleted,
            self.unchanged,
            self.fetched
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CompletedTask {
    pub task_id: String,
    pub action: CompletionAction,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncCompletedReport {
    pub closed_remote: Vec<String>,
    pub completed_local: Vec<BlockUid>,
}

impl SyncCompletedReport {
    pub fn summary(&self) -> String {
        format!(
            "closed {} remote, completed {} local",
            self.closed_remote.len(),
            self.completed_local.len()
        )
    }
}

struct SectionBlock {
    block: DocumentBlock,
    task_id: String,
}

pub fn pull_tasks<D, S>(
    doc: &mut D,
    service: &S,
    anchor: &str,
    filter: &str,
    options: &PullOptions,
) -> Result<PullReport>
where
    D: DocumentTree + ?Sized,
    S: TaskService + ?Sized,
{
    let section = task_section(doc, anchor)?;
    let fetched = service.list_tasks(filter)?;

    let mut report = PullReport {
        fetched: fetched.len(),
        ..PullReport::default()
    };
    let tasks = dedupe_tasks(fetched, &mut report.duplicates);

    let mut after = anchor.to_string();
    let pending: Vec<&RemoteTask> = if options.only_diff {
        let local: HashSet<&str> = section.iter().map(|s| s.task_id.as_str()).collect();
        if let Some(last) = section.last() {
            after = last.block.uid.clone();
        }
        report.unchanged = section.len();
        tasks
            .iter()
            .filter(|task| !local.contains(task.id.as_str()))
            .collect()
    } else {
        for entry in &section {
            doc.delete_block(&entry.block.uid)?;
            report.deleted += 1;
        }
        tasks.iter().collect()
    };

    for task in pending {
        let text = compose_task_block(task, &options.style);
        after = doc.create_sibling_block(&after, &text)?;
        report.created.push(after.clone());
    }

    tracing::info!(
        filter,
        only_diff = options.only_diff,
        created = report.created.len(),
        deleted = report.deleted,
        "pulled tasks"
    );
    Ok(report)
}

pub fn complete_task<D, S>(
    doc: &mut D,
    service: &S,
    block_uid: &str,
    action: CompletionAction,
) -> Result<CompletedTask>
where
    D: DocumentTree + ?Sized,
    S: TaskService + ?Sized,
{
    let block = doc.require_block(block_uid)?;
    let task_id = parse_task_id(&block.text)
        .ok_or_else(|| Error::Parse(format!("block {block_uid} has no Todoist task link")))?;

    service.close_task(&task_id)?;

    match action {
        CompletionAction::Done => {
            doc.update_block(block_uid, &set_status(&block.text, TaskStatus::Done))?
        }
        CompletionAction::Strikethrough => {
            doc.update_block(block_uid, &strike_through(&block.text))?
        }
        CompletionAction::Delete => doc.delete_block(block_uid)?,
    }
    tracing::info!(task_id = %task_id, block = block_uid, ?action, "completed task");
    Ok(CompletedTask { task_id, action })
}

/// Closes remote tasks whose blocks are done, and marks blocks done whose
/// tasks were closed remotely. Only tasks still open remotely are closed.
pub fn sync_completed<D, S>(doc: &mut D, service: &S, root: &str) -> Result<SyncCompletedReport>
where
    D: DocumentTree + ?Sized,
    S: TaskService + ?Sized,
{
    let mut done_ids: Vec<String> = Vec::new();
    let mut todo_blocks: Vec<(DocumentBlock, String)> = Vec::new();
    for block in doc.descendants(root)? {
        let Some(task_id) = parse_task_id(&block.text) else {
            continue;
        };
        match parse_status(&block.text) {
            Some(TaskStatus::Done) => {
                if !done_ids.contains(&task_id) {
                    done_ids.push(task_id);
                }
            }
            Some(TaskStatus::Todo) => todo_blocks.push((block, task_id)),
            None => {}
        }
    }

    let mut query: Vec<String> = done_ids.clone();
    for (_, task_id) in &todo_blocks {
        if !query.contains(task_id) {
            query.push(task_id.clone());
        }
    }
    let active: HashSet<String> = service
        .list_active_tasks(&query)?
        .into_iter()
        .map(|task| task.id)
        .collect();

    let mut report = SyncCompletedReport::default();
    for (block, task_id) in &todo_blocks {
        if active.contains(task_id) || done_ids.contains(task_id) {
            continue;
        }
        doc.update_block(&block.uid, &set_status(&block.text, TaskStatus::Done))?;
        report.completed_local.push(block.uid.clone());
    }

    let to_close: Vec<String> = done_ids
        .into_iter()
        .filter(|id| active.contains(id))
        .collect();
    report.closed_remote = close_tasks(service, &to_close).into_result()?;

    tracing::info!(
        root,
        closed_remote = report.closed_remote.len(),
        completed_local = report.completed_local.len(),
        "synced completed tasks"
    );
    Ok(report)
}

// Linked siblings directly after the anchor; the first unlinked sibling ends the run.
fn task_section<D: DocumentTree + ?Sized>(doc: &D, anchor: &str) -> Result<Vec<SectionBlock>> {
    let anchor_block = doc.require_block(anchor)?;
    let Some(parent) = anchor_block.parent else {
        return Err(DocumentError(format!("anchor {anchor} is a page, not a block")).into());
    };
    Ok(doc
        .children(&parent)?
        .into_iter()
        .skip_while(|block| block.order <= anchor_block.order)
        .map_while(|block| {
            parse_task_id(&block.text).map(|task_id| SectionBlock { block, task_id })
        })
        .collect())
}

fn dedupe_tasks(tasks: Vec<RemoteTask>, duplicates: &mut usize) -> Vec<RemoteTask> {
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|task| {
            let fresh = seen.insert(task.id.clone());
            if !fresh {
                tracing::debug!(task_id = %task.id, "dropping duplicate task from response");
                *duplicates += 1;
            }
            fresh
        })
        .collect()
}
