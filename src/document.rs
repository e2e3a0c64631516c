use crate::error::DocumentError;
use crate::models::{BlockUid, DocumentBlock};
use rand::{Rng, distributions::Alphanumeric};
use std::collections::HashMap;

pub type DocResult<T> = Result<T, DocumentError>;

pub trait DocumentTree {
    fn page_uid(&self, title: &str) -> DocResult<Option<BlockUid>>;
    fn create_page(&mut self, title: &str) -> DocResult<BlockUid>;
    fn block(&self, uid: &str) -> DocResult<Option<DocumentBlock>>;
    fn children(&self, uid: &str) -> DocResult<Vec<DocumentBlock>>;
    fn create_block(&mut self, parent: &str, text: &str, order: Option<usize>)
    -> DocResult<BlockUid>;
    fn create_sibling_block(&mut self, after: &str, text: &str) -> DocResult<BlockUid>;
    fn update_block(&mut self, uid: &str, text: &str) -> DocResult<()>;
    /// Removes the block and all of its descendants.
    fn delete_block(&mut self, uid: &str) -> DocResult<()>;
    fn find_block_by_text(&self, page_title: &str, text: &str) -> DocResult<Option<BlockUid>>;
    fn focused_block(&self) -> Option<BlockUid>;

    fn require_block(&self, uid: &str) -> DocResult<DocumentBlock> {
        self.block(uid)?
            .ok_or_else(|| DocumentError::missing_block(uid))
    }

    fn descendants(&self, uid: &str) -> DocResult<Vec<DocumentBlock>> {
        let mut out = Vec::new();
        let mut stack: Vec<DocumentBlock> = self.children(uid)?.into_iter().rev().collect();
        while let Some(block) = stack.pop() {
            stack.extend(self.children(&block.uid)?.into_iter().rev());
            out.push(block);
        }
        Ok(out)
    }
}

#[derive(Clone, Debug)]
struct Node {
    text: String,
    parent: Option<BlockUid>,
    children: Vec<BlockUid>,
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    nodes: HashMap<BlockUid, Node>,
    pages: Vec<BlockUid>,
    focused: Option<BlockUid>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_focused(&mut self, uid: Option<&str>) {
        self.focused = uid.map(str::to_string);
    }

    pub fn child_texts(&self, uid: &str) -> Vec<String> {
        self.nodes
            .get(uid)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.nodes.get(child))
                    .map(|child| child.text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.nodes.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn next_uid(&self) -> BlockUid {
        loop {
            let uid: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(9)
                .map(char::from)
                .collect();
            if !self.nodes.contains_key(&uid) {
                return uid;
            }
        }
    }

    fn node(&self, uid: &str) -> DocResult<&Node> {
        self.nodes
            .get(uid)
            .ok_or_else(|| DocumentError::missing_block(uid))
    }

    fn snapshot(&self, uid: &str, node: &Node) -> DocumentBlock {
        let order = node
            .parent
            .as_ref()
            .and_then(|parent| self.nodes.get(parent))
            .and_then(|parent| parent.children.iter().position(|c| c == uid))
            .or_else(|| self.pages.iter().position(|p| p == uid))
            .unwrap_or(0);
        DocumentBlock {
            uid: uid.to_string(),
            text: node.text.clone(),
            order,
            parent: node.parent.clone(),
            children: node.children.clone(),
        }
    }

    fn insert_child(&mut self, parent: &str, text: &str, index: usize) -> DocResult<BlockUid> {
        let uid = self.next_uid();
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| DocumentError::missing_block(parent))?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, uid.clone());
        self.nodes.insert(
            uid.clone(),
            Node {
                text: text.to_string(),
                parent: Some(parent.to_string()),
                children: Vec::new(),
            },
        );
        Ok(uid)
    }
}

impl DocumentTree for MemoryDocument {
    fn page_uid(&self, title: &str) -> DocResult<Option<BlockUid>> {
        Ok(self
            .pages
            .iter()
            .find(|uid| self.nodes.get(*uid).is_some_and(|node| node.text == title))
            .cloned())
    }

    fn create_page(&mut self, title: &str) -> DocResult<BlockUid> {
        if let Some(uid) = self.page_uid(title)? {
            return Err(DocumentError(format!("page {title:?} already exists as {uid}")));
        }
        let uid = self.next_uid();
        self.nodes.insert(
            uid.clone(),
            Node {
                text: title.to_string(),
                parent: None,
                children: Vec::new(),
            },
        );
        self.pages.push(uid.clone());
        Ok(uid)
    }

    fn block(&self, uid: &str) -> DocResult<Option<DocumentBlock>> {
        Ok(self.nodes.get(uid).map(|node| self.snapshot(uid, node)))
    }

    fn children(&self, uid: &str) -> DocResult<Vec<DocumentBlock>> {
        let node = self.node(uid)?;
        Ok(node
            .children
            .iter()
            .enumerate()
            .filter_map(|(order, child)| {
                self.nodes.get(child).map(|n| DocumentBlock {
                    uid: child.clone(),
                    text: n.text.clone(),
                    order,
                    parent: Some(uid.to_string()),
                    children: n.children.clone(),
                })
            })
            .collect())
    }

    fn create_block(
        &mut self,
        parent: &str,
        text: &str,
        order: Option<usize>,
    ) -> DocResult<BlockUid> {
        self.insert_child(parent, text, order.unwrap_or(usize::MAX))
    }

    fn create_sibling_block(&mut self, after: &str, text: &str) -> DocResult<BlockUid> {
        let node = self.node(after)?;
        let Some(parent) = node.parent.clone() else {
            return Err(DocumentError(format!("{after} is a page and has no siblings")));
        };
        let index = self
            .node(&parent)?
            .children
            .iter()
            .position(|c| c == after)
            .ok_or_else(|| DocumentError(format!("{after} is detached from {parent}")))?;
        self.insert_child(&parent, text, index + 1)
    }

    fn update_block(&mut self, uid: &str, text: &str) -> DocResult<()> {
        let node = self
            .nodes
            .get_mut(uid)
            .ok_or_else(|| DocumentError::missing_block(uid))?;
        node.text = text.to_string();
        Ok(())
    }

    fn delete_block(&mut self, uid: &str) -> DocResult<()> {
        let node = self
            .nodes
            .remove(uid)
            .ok_or_else(|| DocumentError::missing_block(uid))?;
        match node.parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => parent.children.retain(|c| c != uid),
            None => self.pages.retain(|p| p != uid),
        }
        let mut pending = node.children;
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                pending.extend(removed.children);
            }
        }
        if self
            .focused
            .as_deref()
            .is_some_and(|focused| !self.nodes.contains_key(focused))
        {
            self.focused = None;
        }
        Ok(())
    }

    fn find_block_by_text(&self, page_title: &str, text: &str) -> DocResult<Option<BlockUid>> {
        let Some(page) = self.page_uid(page_title)? else {
            return Ok(None);
        };
        Ok(self
            .descendants(&page)?
            .into_iter()
            .find(|block| block.text.trim() == text)
            .map(|block| block.uid))
    }

    fn focused_block(&self) -> Option<BlockUid> {
        self.focused.clone()
    }
}
