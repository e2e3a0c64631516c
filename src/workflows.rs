use crate::actions::Operation;
use crate::config::{CONFIG_PAGE, PullFilter, Settings, WORKFLOW_SECTION};
use crate::document::DocumentTree;
use crate::error::Result;
use crate::models::{BlockUid, WorkflowTemplate};
use regex::Regex;
use std::sync::LazyLock;

pub const HOST_NAMESPACE: &str = "window.Roamist";
const TITLE_PREFIX: &str = "Roamist - ";
const NO_OUTPUT: &str = "<%NOBLOCKOUTPUT%>";

static WORKFLOW_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#?\[\[(?:42)?SmartBlock\]\]|#(?:42)?SmartBlock\b")
        .expect("workflow tag pattern is valid")
});

#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: usize,
    pub created: usize,
    pub removed_children: usize,
    pub removed_duplicates: usize,
}

pub fn workflow_name(text: &str) -> String {
    WORKFLOW_TAG.replace_all(text, "").trim().to_string()
}

pub fn default_workflows(settings: &Settings) -> Vec<WorkflowTemplate> {
    let mut templates = vec![
        template("complete task", vec![async_script(&script_call(Operation::CompleteTask, ""))]),
        template(
            "complete task button",
            vec![
                format!("<%IFTRUE:<%HAS:tUid%>!=true%><%TRIGGERREF:tUid,false%>{NO_OUTPUT}"),
                format!(
                    "{}{NO_OUTPUT}",
                    async_script(&script_call(Operation::CompleteTask, "tUid"))
                ),
            ],
        ),
        template(
            "sync completed",
            vec![format!(
                "{}{NO_OUTPUT}",
                async_script(&script_call(Operation::SyncCompleted, ""))
            )],
        ),
    ];
    for filter in settings.pull_filters() {
        templates.push(pull_template(&filter, false));
        templates.push(pull_template(&filter, true));
    }
    templates.push(template(
        "quick capture",
        vec![async_script(&script_call(Operation::QuickCapture, ""))],
    ));
    templates
}

/// Existing templates are matched by title and their contents replaced.
pub fn install_workflows<D: DocumentTree + ?Sized>(
    doc: &mut D,
    templates: &[WorkflowTemplate],
) -> Result<InstallReport> {
    let section = ensure_section(doc)?;
    let mut report = InstallReport::default();

    for workflow in templates {
        let matches: Vec<BlockUid> = doc
            .children(&section)?
            .into_iter()
            .filter(|block| workflow_name(&block.text) == workflow.title)
            .map(|block| block.uid)
            .collect();

        let container = match matches.split_first() {
            Some((first, duplicates)) => {
                for duplicate in duplicates {
                    doc.delete_block(duplicate)?;
                    report.removed_duplicates += 1;
                }
                first.clone()
            }
            None => {
                report.created += 1;
                doc.create_block(&section, &format!("#SmartBlock {}", workflow.title), None)?
            }
        };

        for child in doc.children(&container)? {
            doc.delete_block(&child.uid)?;
            report.removed_children += 1;
        }
        for (index, content) in workflow.contents.iter().enumerate() {
            doc.create_block(&container, content, Some(index))?;
        }
        report.installed += 1;
    }

    tracing::info!(
        installed = report.installed,
        created = report.created,
        "workflow setup finished"
    );
    Ok(report)
}

fn ensure_section<D: DocumentTree + ?Sized>(doc: &mut D) -> Result<BlockUid> {
    if let Some(uid) = doc.find_block_by_text(CONFIG_PAGE, WORKFLOW_SECTION)? {
        return Ok(uid);
    }
    let page = match doc.page_uid(CONFIG_PAGE)? {
        Some(uid) => uid,
        None => doc.create_page(CONFIG_PAGE)?,
    };
    Ok(doc.create_block(&page, WORKFLOW_SECTION, None)?)
}

fn pull_template(filter: &PullFilter, only_diff: bool) -> WorkflowTemplate {
    let args = format!(
        "{{ todoistFilter: {}, onlyDiff: {} }}",
        quote(&filter.filter),
        only_diff
    );
    let name = if only_diff {
        format!("pull {} (only diff)", filter.name)
    } else {
        format!("pull {}", filter.name)
    };
    template(&name, vec![async_script(&script_call(Operation::PullTasks, &args))])
}

fn template(name: &str, contents: Vec<String>) -> WorkflowTemplate {
    WorkflowTemplate {
        title: format!("{TITLE_PREFIX}{name}"),
        contents,
    }
}

fn script_call(operation: Operation, args: &str) -> String {
    format!("{HOST_NAMESPACE}.{}({args})", operation.script_name())
}

fn async_script(call: &str) -> String {
    format!("<%JAVASCRIPTASYNC:```javascript (async function () {{ await {call}; }})(); ```%>")
}

fn quote(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigTree;
    use crate::document::MemoryDocument;
    use crate::models::ConfigNode;

    fn node(text: &str, children: Vec<ConfigNode>) -> ConfigNode {
        ConfigNode {
            text: text.to_string(),
            children,
        }
    }

    fn settings_with_filter(name: &str, filter: &str) -> Settings {
        Settings::from_tree(ConfigTree::from_root(node(
            CONFIG_PAGE,
            vec![node(
                "pull-tasks",
                vec![node(
                    "filters",
                    vec![node("entry", vec![node(name, vec![]), node(filter, vec![])])],
                )],
            )],
        )))
    }

    fn workflow_children(doc: &MemoryDocument) -> Vec<String> {
        let section = doc
            .find_block_by_text(CONFIG_PAGE, WORKFLOW_SECTION)
            .unwrap()
            .unwrap();
        doc.child_texts(&section)
    }

    #[test]
    fn strips_every_workflow_tag_form() {
        assert_eq!(workflow_name("#SmartBlock Roamist - x"), "Roamist - x");
        assert_eq!(workflow_name("#[[SmartBlock]] Roamist - x"), "Roamist - x");
        assert_eq!(workflow_name("[[42SmartBlock]] Roamist - x"), "Roamist - x");
        assert_eq!(workflow_name("#42SmartBlock Roamist - x"), "Roamist - x");
        assert_eq!(workflow_name("#SmartBlocks Roamist - x"), "#SmartBlocks Roamist - x");
    }

    #[test]
    fn default_set_has_pull_pair_per_filter() {
        let templates = default_workflows(&settings_with_filter("today", "today | overdue"));
        let titles: Vec<&str> = templates.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Roamist - complete task",
                "Roamist - complete task button",
                "Roamist - sync completed",
                "Roamist - pull today",
                "Roamist - pull today (only diff)",
                "Roamist - quick capture",
            ]
        );
        assert_eq!(
            templates[4].contents,
            vec![
                "<%JAVASCRIPTASYNC:```javascript (async function () { await window.Roamist.pullTasks({ todoistFilter: \"today | overdue\", onlyDiff: true }); })(); ```%>"
                    .to_string()
            ]
        );
        assert!(templates[1].contents[1].contains("window.Roamist.completeTask(tUid)"));
    }

    #[test]
    fn filter_quotes_are_escaped() {
        let templates = default_workflows(&settings_with_filter("q", "search: \"a\\b\""));
        assert!(templates[3].contents[0].contains(r#"todoistFilter: "search: \"a\\b\"""#));
    }

    #[test]
    fn installs_into_fresh_document() {
        let mut doc = MemoryDocument::new();
        let templates = vec![WorkflowTemplate {
            title: "Roamist - one".to_string(),
            contents: vec!["a".to_string(), "b".to_string()],
        }];

        let report = install_workflows(&mut doc, &templates).unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(workflow_children(&doc), vec!["#SmartBlock Roamist - one"]);
        let container = doc
            .find_block_by_text(CONFIG_PAGE, "#SmartBlock Roamist - one")
            .unwrap()
            .unwrap();
        assert_eq!(doc.child_texts(&container), vec!["a", "b"]);
    }

    #[test]
    fn reinstall_replaces_contents_without_duplicates() {
        let mut doc = MemoryDocument::new();
        let first = vec![WorkflowTemplate {
            title: "Roamist - one".to_string(),
            contents: vec!["old-1".to_string(), "old-2".to_string(), "old-3".to_string()],
        }];
        install_workflows(&mut doc, &first).unwrap();
        let second = vec![WorkflowTemplate {
            title: "Roamist - one".to_string(),
            contents: vec!["new".to_string()],
        }];

        let report = install_workflows(&mut doc, &second).unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.removed_children, 3);
        assert_eq!(workflow_children(&doc), vec!["#SmartBlock Roamist - one"]);
        let container = doc
            .find_block_by_text(CONFIG_PAGE, "#SmartBlock Roamist - one")
            .unwrap()
            .unwrap();
        assert_eq!(doc.child_texts(&container), vec!["new"]);
    }

    #[test]
    fn existing_containers_match_by_title_and_duplicates_collapse() {
        let mut doc = MemoryDocument::new();
        let page = doc.create_page(CONFIG_PAGE).unwrap();
        let section = doc.create_block(&page, WORKFLOW_SECTION, None).unwrap();
        let kept = doc
            .create_block(&section, "#[[SmartBlock]] Roamist - one", None)
            .unwrap();
        doc.create_block(&kept, "stale", None).unwrap();
        doc.create_block(&section, "#SmartBlock Roamist - one", None).unwrap();
        doc.create_block(&section, "#SmartBlock Someone else", None).unwrap();

        let templates = vec![WorkflowTemplate {
            title: "Roamist - one".to_string(),
            contents: vec!["fresh".to_string()],
        }];
        let report = install_workflows(&mut doc, &templates).unwrap();

        assert_eq!(report.removed_duplicates, 1);
        assert_eq!(
            doc.child_texts(&section),
            vec!["#[[SmartBlock]] Roamist - one", "#SmartBlock Someone else"]
        );
        assert_eq!(doc.child_texts(&kept), vec!["fresh"]);
    }
}
