// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashSet;

use crate::tree::Node;

/// Case-insensitive substring filter over node titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeFilter {
    query: String,
}

/// Derived display forest plus the keys that must be shown expanded so every
/// match stays reachable. Recomputed from scratch, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    pub nodes: Vec<Node>,
    pub expanded_keys: HashSet<String>,
}

impl TreeFilter {
    pub fn from_text(input: &str) -> Self {
        Self {
            query: input.to_lowercase(),
        }
    }

    /// The empty query means "no filtering".
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self, node: &Node) -> bool {
        node.title.to_lowercase().contains(&self.query)
    }

    pub fn apply(&self, forest: &[Node]) -> FilteredView {
        if self.is_empty() {
            return FilteredView {
                nodes: forest.to_vec(),
                expanded_keys: HashSet::new(),
            };
        }

        let mut expanded_keys = HashSet::new();
        let nodes = forest
            .iter()
            .filter_map(|node| self.filter_node(node, &mut expanded_keys))
            .collect();

        FilteredView {
            nodes,
            expanded_keys,
        }
    }

    fn filter_node(&self, node: &Node, expanded: &mut HashSet<String>) -> Option<Node> {
        // A matching node keeps its whole original subtree.
        if self.matches(node) {
            expanded.insert(node.key.clone());
            return Some(node.clone());
        }

        let children: Vec<Node> = node
            .children
            .iter()
            .filter_map(|child| self.filter_node(child, expanded))
            .collect();

        if children.is_empty() {
            return None;
        }

        expanded.insert(node.key.clone());
        Some(Node {
            key: node.key.clone(),
            title: node.title.clone(),
            children,
        })
    }
}

pub fn filter_forest(forest: &[Node], query: &str) -> FilteredView {
    TreeFilter::from_text(query).apply(forest)
}
