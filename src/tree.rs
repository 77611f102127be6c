// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! The canonical forest of folders and files.
//!
//! A [`Node`] owns its children outright and stores no parent pointer; parent
//! and ancestor relations are recovered by searching from the roots. Keys are
//! expected to be unique across the whole forest. Duplicate keys are a caller
//! error: traversal stays total but lookups return whichever duplicate comes
//! first in depth-first order. Loaders should run [`validate_unique_keys`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::TreeError;

/// One folder or file. The key is the sole identity used for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

// ------------------------------------------------------------------
// BLOCK 1: Construction and per-node traversal
// ------------------------------------------------------------------
impl Node {
    pub fn leaf(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(key: impl Into<String>, title: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Every key in this subtree, the node itself first, in depth-first pre-order.
    pub fn collect_keys(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.count());
        self.collect_keys_into(&mut out);
        out
    }

    pub fn collect_keys_into(&self, out: &mut Vec<String>) {
        out.push(self.key.clone());
        for child in &self.children {
            child.collect_keys_into(out);
        }
    }

    /// Number of nodes in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    pub fn sort_recursive(&mut self) {
        self.children.sort_by(|a, b| match (a.is_leaf(), b.is_leaf()) {
            (false, true) => std::cmp::Ordering::Less,
            (true, false) => std::cmp::Ordering::Greater,
            _ => a.title.cmp(&b.title),
        });
        for child in &mut self.children {
            child.sort_recursive();
        }
    }

    fn insert_recursive(&mut self, parts: &[&str], separator: char) {
        let Some((name, rest)) = parts.split_first() else {
            return;
        };

        let child_idx = match self.children.iter().position(|c| c.title == *name) {
            Some(idx) => idx,
            None => {
                let key = if self.key.is_empty() {
                    name.to_string()
                } else {
                    format!("{}{}{}", self.key, separator, name)
                };
                self.children.push(Node::leaf(key, *name));
                self.children.len() - 1
            }
        };

        self.children[child_idx].insert_recursive(rest, separator);
    }
}

// ------------------------------------------------------------------
// BLOCK 2: Forest-level queries
// ------------------------------------------------------------------

/// Builds a forest from separator-joined paths such as `src/tree.rs`.
///
/// Each node's key is its full path and its title the last segment. Folders
/// sort before files, then by title. Empty segments are skipped, so
/// `a//b` and `/a/b` both land under `a`.
pub fn from_path_list<I, S>(paths: I, separator: char) -> Vec<Node>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut internal_root = Node::leaf(String::new(), String::new());

    for path in paths {
        let parts: Vec<&str> = path
            .as_ref()
            .split(separator)
            .filter(|s| !s.is_empty())
            .collect();
        internal_root.insert_recursive(&parts, separator);
    }

    internal_root.sort_recursive();
    internal_root.children
}

pub fn find<'a>(forest: &'a [Node], key: &str) -> Option<&'a Node> {
    for node in forest {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = find(&node.children, key) {
            return Some(found);
        }
    }
    None
}

/// Key of the node whose children contain `key`. Roots and unknown keys have none.
pub fn parent_key<'a>(forest: &'a [Node], key: &str) -> Option<&'a str> {
    for node in forest {
        if node.children.iter().any(|child| child.key == key) {
            return Some(&node.key);
        }
        if let Some(parent) = parent_key(&node.children, key) {
            return Some(parent);
        }
    }
    None
}

/// Keys on the path from a root down to (but excluding) `key`, root first.
/// Empty when `key` is a root or is not in the forest.
pub fn ancestor_keys(forest: &[Node], key: &str) -> Vec<String> {
    fn walk<'a>(nodes: &'a [Node], key: &str, trail: &mut Vec<&'a str>) -> bool {
        for node in nodes {
            if node.key == key {
                return true;
            }
            trail.push(&node.key);
            if walk(&node.children, key, trail) {
                return true;
            }
            trail.pop();
        }
        false
    }

    let mut trail = Vec::new();
    if walk(forest, key, &mut trail) {
        trail.into_iter().map(str::to_string).collect()
    } else {
        Vec::new()
    }
}

pub fn forest_count(forest: &[Node]) -> usize {
    forest.iter().map(Node::count).sum()
}

pub fn validate_unique_keys(forest: &[Node]) -> Result<(), TreeError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&Node> = forest.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if !seen.insert(&node.key) {
            return Err(TreeError::DuplicateKey {
                key: node.key.clone(),
            });
        }
        stack.extend(node.children.iter().rev());
    }
    Ok(())
}
