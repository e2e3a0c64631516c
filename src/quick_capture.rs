use crate::document::DocumentTree;
use crate::error::Result;
use crate::integrations::{TaskService, close_tasks};
use crate::models::BlockUid;
use crate::task_metadata::compose_capture_block;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CaptureReport {
    pub created: Vec<BlockUid>,
    pub descriptions: usize,
    pub closed: Vec<String>,
}

/// Turns every task matching `filter` into a block at `target`, then closes the tasks.
pub fn pull_quick_capture<D, S>(
    doc: &mut D,
    service: &S,
    target: &str,
    filter: &str,
    tag: Option<&str>,
) -> Result<CaptureReport>
where
    D: DocumentTree + ?Sized,
    S: TaskService + ?Sized,
{
    doc.require_block(target)?;
    let tasks = service.list_tasks(filter)?;
    let mut report = CaptureReport::default();

    let mut after: BlockUid = target.to_string();
    for (index, task) in tasks.iter().enumerate() {
        after = doc.create_sibling_block(&after, &compose_capture_block(task, tag))?;
        report.created.push(after.clone());
        if index == 0 {
            doc.delete_block(target)?;
        }
        if let Some(description) = task.description.as_deref() {
            doc.create_block(&after, description, Some(0))?;
            report.descriptions += 1;
        }
    }

    let ids: Vec<String> = tasks.into_iter().map(|task| task.id).collect();
    report.closed = close_tasks(service, &ids).into_result()?;
    tracing::info!(
        filter,
        created = report.created.len(),
        closed = report.closed.len(),
        "quick capture finished"
    );
    Ok(report)
}
