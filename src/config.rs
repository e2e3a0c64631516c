use crate::document::DocumentTree;
use crate::error::{Error, Result};
use crate::models::ConfigNode;
use serde::{Deserialize, Serialize};

pub const CONFIG_PAGE: &str = "roam/roamist";
pub const WORKFLOW_SECTION: &str = "workflows";

const HOME: &str = "home";
const PULL_TASKS: &str = "pull-tasks";
const QUICK_CAPTURE: &str = "quick-capture";
const COMPLETE_TASK: &str = "complete-task";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigTree {
    root: ConfigNode,
}

impl ConfigTree {
    /// A page that does not exist yet reads as an empty tree.
    pub fn load<D: DocumentTree + ?Sized>(doc: &D, page_title: &str) -> Result<Self> {
        let Some(page) = doc.page_uid(page_title)? else {
            tracing::debug!(page = page_title, "settings page missing, using empty config");
            return Ok(Self::default());
        };
        Ok(Self {
            root: ConfigNode {
                text: page_title.to_string(),
                children: load_children(doc, &page)?,
            },
        })
    }

    pub fn from_root(root: ConfigNode) -> Self {
        Self { root }
    }

    pub fn node(&self, path: &[&str]) -> Option<&ConfigNode> {
        path.iter()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    pub fn get(&self, path: &[&str]) -> Option<&str> {
        self.node(path)?
            .children
            .first()
            .map(|node| node.text.trim())
            .filter(|text| !text.is_empty())
    }

    pub fn flag(&self, path: &[&str]) -> bool {
        self.node(path).is_some()
    }
}

fn load_children<D: DocumentTree + ?Sized>(doc: &D, uid: &str) -> Result<Vec<ConfigNode>> {
    doc.children(uid)?
        .into_iter()
        .map(|block| {
            Ok(ConfigNode {
                children: load_children(doc, &block.uid)?,
                text: block.text,
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullFilter {
    pub name: String,
    pub filter: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompletionAction {
    #[default]
    Done,
    Strikethrough,
    Delete,
}

impl CompletionAction {
    fn from_setting(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "done" => Some(CompletionAction::Done),
            "strikethrough" | "strike-through" | "strike" => Some(CompletionAction::Strikethrough),
            "delete" | "remove" => Some(CompletionAction::Delete),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    tree: ConfigTree,
}

impl Settings {
    pub fn load<D: DocumentTree + ?Sized>(doc: &D) -> Result<Self> {
        Ok(Self {
            tree: ConfigTree::load(doc, CONFIG_PAGE)?,
        })
    }

    pub fn from_tree(tree: ConfigTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn token(&self) -> Result<&str> {
        self.tree
            .get(&[HOME, "token"])
            .ok_or_else(|| Error::Config("Todoist token is not set (home > token)".to_string()))
    }

    pub fn tag(&self) -> Option<&str> {
        self.tree.get(&[HOME, "tag"])
    }

    pub fn hide_priority(&self) -> bool {
        self.tree.flag(&[PULL_TASKS, "Hide priority"])
    }

    /// Each entry block holds the name as its first child and the filter
    /// as its second. Incomplete entries are skipped.
    pub fn pull_filters(&self) -> Vec<PullFilter> {
        let Some(filters) = self.tree.node(&[PULL_TASKS, "filters"]) else {
            return Vec::new();
        };
        filters
            .children
            .iter()
            .filter_map(|entry| {
                let name = entry.children.first()?.text.trim();
                let filter = entry.children.get(1)?.text.trim();
                if name.is_empty() || filter.is_empty() {
                    tracing::warn!(entry = %entry.text, "skipping incomplete pull filter");
                    return None;
                }
                Some(PullFilter {
                    name: name.to_string(),
                    filter: filter.to_string(),
                })
            })
            .collect()
    }

    pub fn quick_capture_filter(&self) -> Result<&str> {
        self.tree.get(&[QUICK_CAPTURE, "filter"]).ok_or_else(|| {
            Error::Config("quick capture filter is not set (quick-capture > filter)".to_string())
        })
    }

    pub fn quick_capture_tag(&self) -> Option<&str> {
        self.tree.get(&[QUICK_CAPTURE, "tag"])
    }

    pub fn completion_action(&self) -> CompletionAction {
        match self.tree.get(&[COMPLETE_TASK, "on complete"]) {
            None => CompletionAction::default(),
            Some(value) => CompletionAction::from_setting(value).unwrap_or_else(|| {
                tracing::warn!(value, "unknown completion action, marking done");
                CompletionAction::default()
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.todoist.com/rest/v2".to_string(),
            timeout_seconds: 30,
            user_agent: format!("tasklink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: ServiceConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("invalid service config: {e}")))?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            ServiceConfig::default().base_url
        } else {
            trimmed.to_string()
        };
        self.timeout_seconds = self.timeout_seconds.max(5);
    }
}
