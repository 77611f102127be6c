// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process-scoped selection state shared by the search box, the tree view
//! and the chat sender.
//!
//! The store owns the canonical forest and the checked keys. The filtered
//! view, the query and the expansion state are derived or UI-owned and are
//! rebuilt synchronously on every change. Consumers hold the store by
//! reference and listen on [`SelectionStore::subscribe`] for changes.

use std::collections::HashSet;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::Settings;
use crate::filter::{FilteredView, TreeFilter};
use crate::loader;
use crate::propagate::{self, CheckedKeys};
use crate::tree::{self, Node};

// Upper bound for the notification buffer, whatever the settings ask for.
const MAX_EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    TreeReplaced { roots: usize },
    QueryChanged { query: String },
    ExpandedChanged,
    CheckedChanged { checked: Vec<String> },
}

/// What the chat collaborator receives at send time. A copy, not a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextScope {
    pub checked_keys: Vec<String>,
}

/// One line of the projected tree, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub key: String,
    pub title: String,
    pub depth: usize,
    pub is_leaf: bool,
    pub is_last: bool,
    pub is_expanded: bool,
    pub is_checked: bool,
}

#[derive(Debug)]
pub struct SelectionStore {
    settings: Settings,
    tree: Option<Vec<Node>>,
    checked_keys: CheckedKeys,
    query: String,
    view: FilteredView,
    expanded_keys: HashSet<String>,
    auto_expand_parent: bool,
    event_tx: broadcast::Sender<SelectionEvent>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SelectionStore {
    pub fn new(settings: Settings) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity(settings.event_capacity));
        Self {
            auto_expand_parent: settings.auto_expand_parent,
            settings,
            tree: None,
            checked_keys: CheckedKeys::new(),
            query: String::new(),
            view: FilteredView::default(),
            expanded_keys: HashSet::new(),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.event_tx.subscribe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Canonical tree
    // ------------------------------------------------------------------

    /// Replaces the canonical forest wholesale.
    ///
    /// Keys must be unique (see [`tree::validate_unique_keys`]). Checked keys
    /// are kept as they are; keys that no longer exist simply match nothing.
    pub fn set_tree(&mut self, forest: Vec<Node>) {
        let roots = forest.len();
        tracing::info!(
            "Folder tree replaced: {} roots, {} nodes",
            roots,
            tree::forest_count(&forest)
        );
        self.tree = Some(forest);
        self.recompute();
        self.emit(SelectionEvent::TreeReplaced { roots });
    }

    /// Builds the forest from a flat path listing using the configured separator.
    pub fn set_tree_from_paths<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let forest = loader::load_forest_from_paths(paths, self.settings.path_separator);
        self.set_tree(forest);
    }

    /// `None` until a loader has delivered a forest.
    pub fn tree(&self) -> Option<&[Node]> {
        self.tree.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn set_query(&mut self, query: &str) {
        self.query = if self.settings.trim_query {
            query.trim().to_string()
        } else {
            query.to_string()
        };
        self.auto_expand_parent = self.settings.auto_expand_parent;
        self.recompute();

        tracing::debug!(
            "Query {:?}: {} visible roots, {} expanded keys",
            self.query,
            self.view.nodes.len(),
            self.view.expanded_keys.len()
        );
        self.emit(SelectionEvent::QueryChanged {
            query: self.query.clone(),
        });
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filtered_view(&self) -> &FilteredView {
        &self.view
    }

    /// The forest the rendering layer should draw: full or filtered.
    pub fn display_nodes(&self) -> &[Node] {
        &self.view.nodes
    }

    fn recompute(&mut self) {
        let forest = self.tree.as_deref().unwrap_or(&[]);
        self.view = TreeFilter::from_text(&self.query).apply(forest);
        self.expanded_keys = self.view.expanded_keys.clone();
    }

    // ------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------

    pub fn expanded_keys(&self) -> &HashSet<String> {
        &self.expanded_keys
    }

    pub fn auto_expand_parent(&self) -> bool {
        self.auto_expand_parent
    }

    /// User expand/collapse. The given set becomes authoritative, so
    /// ancestors are no longer opened automatically.
    pub fn set_expanded_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expanded_keys = keys.into_iter().map(Into::into).collect();
        self.auto_expand_parent = false;
        self.emit(SelectionEvent::ExpandedChanged);
    }

    /// Opens the folders leading to `key` so it becomes visible.
    pub fn reveal(&mut self, key: &str) {
        let Some(parent) = self
            .tree
            .as_deref()
            .and_then(|forest| tree::parent_key(forest, key))
        else {
            return;
        };
        self.expanded_keys.insert(parent.to_string());
        self.auto_expand_parent = true;
        self.emit(SelectionEvent::ExpandedChanged);
    }

    /// Expanded keys plus, while auto-expansion is on, all their ancestors.
    pub fn effective_expanded_keys(&self) -> HashSet<String> {
        let mut keys = self.expanded_keys.clone();
        if self.auto_expand_parent {
            if let Some(forest) = self.tree.as_deref() {
                for key in &self.expanded_keys {
                    keys.extend(tree::ancestor_keys(forest, key));
                }
            }
        }
        keys
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Checks or unchecks `key` as it appears in the displayed forest.
    ///
    /// The cascade covers the node's subtree as currently displayed; a key not
    /// on display is toggled on its own. Returns the number of keys changed.
    pub fn toggle(&mut self, key: &str, checked: bool) -> usize {
        let changed = match tree::find(&self.view.nodes, key) {
            Some(node) => propagate::propagate(&mut self.checked_keys, node, checked),
            None => propagate::propagate_key(&mut self.checked_keys, key, checked),
        };

        tracing::debug!(
            "Toggle {:?} checked={}: {} keys changed, {} checked in total",
            key,
            checked,
            changed,
            self.checked_keys.len()
        );

        if changed > 0 {
            self.emit(SelectionEvent::CheckedChanged {
                checked: self.checked_keys.to_vec(),
            });
        }
        changed
    }

    pub fn checked_keys(&self) -> &CheckedKeys {
        &self.checked_keys
    }

    pub fn is_checked(&self, key: &str) -> bool {
        self.checked_keys.contains(key)
    }

    pub fn scope(&self) -> ContextScope {
        ContextScope {
            checked_keys: self.checked_keys.to_vec(),
        }
    }

    // ------------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------------

    /// Flattens the displayed forest, descending only into expanded folders.
    pub fn visible_rows(&self) -> Vec<DisplayRow> {
        let expanded = self.effective_expanded_keys();
        let mut rows = Vec::new();
        self.project_recursive(&self.view.nodes, &expanded, 0, &mut rows);
        rows
    }

    fn project_recursive(
        &self,
        nodes: &[Node],
        expanded: &HashSet<String>,
        depth: usize,
        output: &mut Vec<DisplayRow>,
    ) {
        let len = nodes.len();
        for (i, node) in nodes.iter().enumerate() {
            let is_expanded = !node.is_leaf() && expanded.contains(&node.key);

            output.push(DisplayRow {
                key: node.key.clone(),
                title: node.title.clone(),
                depth,
                is_leaf: node.is_leaf(),
                is_last: i == len - 1,
                is_expanded,
                is_checked: self.checked_keys.contains(&node.key),
            });

            if is_expanded {
                self.project_recursive(&node.children, expanded, depth + 1, output);
            }
        }
    }

    fn emit(&self, event: SelectionEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

fn event_capacity(requested: usize) -> usize {
    let capacity = requested.clamp(1, MAX_EVENT_CAPACITY);
    if capacity != requested {
        tracing::warn!(
            "Event capacity {} out of range, using {}",
            requested,
            capacity
        );
    }
    capacity
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn keys(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scenario_forest() -> Vec<Node> {
        vec![
            Node::leaf("a", "A"),
            Node::branch("b", "B", vec![Node::leaf("c", "C")]),
        ]
    }

    fn mock_complex_tree() -> Vec<Node> {
        vec![
            Node::branch(
                "root1",
                "root1",
                vec![
                    Node::branch(
                        "root1/sub1",
                        "sub1",
                        vec![
                            Node::leaf("root1/sub1/leaf1", "leaf1"),
                            Node::leaf("root1/sub1/leaf2", "leaf2"),
                        ],
                    ),
                    Node::leaf("root1/leaf3", "leaf3"),
                ],
            ),
            Node::leaf("root_leaf", "root_leaf"),
        ]
    }

    fn loaded(forest: Vec<Node>) -> SelectionStore {
        let mut store = SelectionStore::default();
        store.set_tree(forest);
        store
    }

    #[test]
    fn test_initial_state_is_not_loaded() {
        let store = SelectionStore::default();
        assert!(!store.is_loaded());
        assert!(store.tree().is_none());
        assert!(store.display_nodes().is_empty());
        assert!(store.checked_keys().is_empty());
        assert!(store.visible_rows().is_empty());
    }

    #[test]
    fn test_empty_forest_is_loaded() {
        let store = loaded(Vec::new());
        assert!(store.is_loaded());
        assert_eq!(store.tree(), Some(&[][..]));
        assert!(store.display_nodes().is_empty());
    }

    #[test]
    fn test_search_scenario() {
        let mut store = loaded(scenario_forest());
        store.set_query("c");

        assert_eq!(
            store.display_nodes(),
            &[Node::branch("b", "B", vec![Node::leaf("c", "C")])]
        );
        assert_eq!(store.expanded_keys(), &keys(&["b", "c"]));
        assert!(store.auto_expand_parent());

        store.set_query("");
        assert_eq!(store.display_nodes(), scenario_forest().as_slice());
        assert!(store.expanded_keys().is_empty());
    }

    #[test]
    fn test_check_then_uncheck_branch() {
        let mut store = loaded(scenario_forest());

        assert_eq!(store.toggle("b", true), 2);
        assert_eq!(store.checked_keys().to_vec(), vec!["b", "c"]);

        assert_eq!(store.toggle("b", false), 2);
        assert!(store.checked_keys().is_empty());
    }

    #[test]
    fn test_filtering_never_mutates_checked_keys() {
        let mut store = loaded(mock_complex_tree());
        store.toggle("root1/sub1", true);
        let before = store.checked_keys().clone();

        store.set_query("leaf3");
        assert_eq!(store.checked_keys(), &before);
        store.set_query("nothing-matches");
        assert!(store.display_nodes().is_empty());
        assert_eq!(store.checked_keys(), &before);
        store.set_query("");
        assert_eq!(store.checked_keys(), &before);
    }

    #[test]
    fn test_toggle_in_filtered_view_uses_displayed_subtree() {
        let mut store = loaded(mock_complex_tree());
        store.set_query("leaf1");

        // root1 is only an ancestor here, so the cascade stops at what is shown.
        store.toggle("root1", true);
        assert_eq!(
            store.checked_keys().to_vec(),
            vec!["root1", "root1/sub1", "root1/sub1/leaf1"]
        );
        assert!(!store.is_checked("root1/sub1/leaf2"));
        assert!(!store.is_checked("root1/leaf3"));

        // A direct match carries its whole original subtree.
        store.set_query("sub1");
        store.toggle("root1/sub1", true);
        assert!(store.is_checked("root1/sub1/leaf2"));
    }

    #[test]
    fn test_toggle_unknown_key_is_set_arithmetic_only() {
        let mut store = loaded(scenario_forest());
        assert_eq!(store.toggle("ghost", true), 1);
        assert!(store.is_checked("ghost"));
        assert_eq!(store.toggle("ghost", false), 1);
        assert_eq!(store.toggle("ghost", false), 0);
    }

    #[test]
    fn test_tree_reload_keeps_checked_keys() {
        let mut store = loaded(scenario_forest());
        store.toggle("b", true);
        store.set_query("c");

        store.set_tree(mock_complex_tree());
        assert!(store.is_checked("b"));
        assert!(store.is_checked("c"));
        // The active query is re-applied to the new forest.
        assert!(store.display_nodes().is_empty());
    }

    #[test]
    fn test_manual_expansion_disables_auto_expand_parent() {
        let mut store = loaded(mock_complex_tree());
        store.set_query("leaf1");
        assert_eq!(
            store.effective_expanded_keys(),
            keys(&["root1", "root1/sub1", "root1/sub1/leaf1"])
        );

        store.set_expanded_keys(["root1/sub1"]);
        assert!(!store.auto_expand_parent());
        assert_eq!(store.effective_expanded_keys(), keys(&["root1/sub1"]));

        // root1 is collapsed, so only the visible roots are projected.
        let rows = store.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "root1");
        assert!(!rows[0].is_expanded);

        store.set_query("leaf");
        assert!(store.auto_expand_parent());
    }

    #[test]
    fn test_reveal_opens_ancestor_chain() {
        let mut store = loaded(mock_complex_tree());
        store.set_expanded_keys(Vec::<String>::new());

        store.reveal("root1/sub1/leaf2");
        assert!(store.auto_expand_parent());
        assert_eq!(store.expanded_keys(), &keys(&["root1/sub1"]));
        assert_eq!(
            store.effective_expanded_keys(),
            keys(&["root1", "root1/sub1"])
        );

        let visible: Vec<String> = store.visible_rows().into_iter().map(|r| r.key).collect();
        assert!(visible.contains(&"root1/sub1/leaf2".to_string()));

        // Roots have no parent to open.
        store.set_expanded_keys(Vec::<String>::new());
        store.reveal("root_leaf");
        assert!(store.expanded_keys().is_empty());
    }

    #[test]
    fn test_visible_rows_projection() {
        let mut store = loaded(mock_complex_tree());
        store.toggle("root1/sub1/leaf2", true);
        store.set_expanded_keys(["root1", "root1/sub1"]);

        let rows = store.visible_rows();
        let summary: Vec<(&str, usize, bool)> = rows
            .iter()
            .map(|r| (r.key.as_str(), r.depth, r.is_last))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("root1", 0, false),
                ("root1/sub1", 1, false),
                ("root1/sub1/leaf1", 2, false),
                ("root1/sub1/leaf2", 2, true),
                ("root1/leaf3", 1, true),
                ("root_leaf", 0, true),
            ]
        );
        assert!(rows[3].is_checked);
        assert!(!rows[2].is_checked);
        assert!(rows[0].is_expanded);
        assert!(rows[2].is_leaf);
        assert!(!rows[5].is_expanded);
    }

    #[test]
    fn test_notifications() {
        let mut store = SelectionStore::default();
        let mut rx = store.subscribe();

        store.set_tree(scenario_forest());
        store.set_query("c");
        store.toggle("b", true);
        store.toggle("b", true);
        store.set_expanded_keys(["b"]);

        assert_eq!(rx.try_recv(), Ok(SelectionEvent::TreeReplaced { roots: 2 }));
        assert_eq!(
            rx.try_recv(),
            Ok(SelectionEvent::QueryChanged {
                query: "c".to_string()
            })
        );
        assert_eq!(
            rx.try_recv(),
            Ok(SelectionEvent::CheckedChanged {
                checked: vec!["b".to_string(), "c".to_string()]
            })
        );
        // The repeated check changed nothing and stays silent.
        assert_eq!(rx.try_recv(), Ok(SelectionEvent::ExpandedChanged));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_scope_is_a_snapshot() {
        let mut store = loaded(scenario_forest());
        store.toggle("a", true);
        store.toggle("b", true);

        let scope = store.scope();
        store.toggle("a", false);

        assert_eq!(scope.checked_keys, vec!["a", "b", "c"]);
        assert_eq!(
            serde_json::to_string(&scope).unwrap(),
            r#"{"checked_keys":["a","b","c"]}"#
        );
        assert_eq!(store.scope().checked_keys, vec!["b", "c"]);
    }

    #[test]
    fn test_trim_query_setting() {
        let settings = Settings {
            trim_query: true,
            ..Default::default()
        };
        let mut store = SelectionStore::new(settings);
        store.set_tree(scenario_forest());

        store.set_query("  c  ");
        assert_eq!(store.query(), "c");
        assert_eq!(store.display_nodes().len(), 1);

        let mut raw = loaded(scenario_forest());
        raw.set_query("  c  ");
        assert!(raw.display_nodes().is_empty());
    }

    #[test]
    fn test_tree_from_paths_uses_configured_separator() {
        let settings = Settings {
            path_separator: '\\',
            ..Default::default()
        };
        let mut store = SelectionStore::new(settings);
        store.set_tree_from_paths(["src\\lib.rs", "src\\store.rs"]);

        store.toggle("src", true);
        assert_eq!(
            store.scope().checked_keys,
            vec!["src", "src\\lib.rs", "src\\store.rs"]
        );
    }

    #[test]
    fn test_event_capacity_is_clamped() {
        assert_eq!(event_capacity(0), 1);
        assert_eq!(event_capacity(64), 64);
        assert_eq!(event_capacity(usize::MAX), MAX_EVENT_CAPACITY);

        for requested in [0, usize::MAX, usize::MAX / 2] {
            let settings = Settings {
                event_capacity: requested,
                ..Default::default()
            };
            let mut store = SelectionStore::new(settings);
            let mut rx = store.subscribe();
            store.set_tree(scenario_forest());
            assert_eq!(rx.try_recv(), Ok(SelectionEvent::TreeReplaced { roots: 2 }));
        }
    }

    #[test]
    fn test_uncheck_in_filtered_view_spares_hidden_descendants() {
        let mut store = loaded(mock_complex_tree());
        store.toggle("root1", true);
        assert_eq!(store.checked_keys().len(), 5);

        store.set_query("leaf1");
        assert_eq!(store.toggle("root1", false), 3);
        assert!(!store.is_checked("root1"));
        assert!(!store.is_checked("root1/sub1"));
        assert!(!store.is_checked("root1/sub1/leaf1"));
        assert!(store.is_checked("root1/sub1/leaf2"));
        assert!(store.is_checked("root1/leaf3"));

        let after_uncheck = store.checked_keys().clone();
        store.set_query("");
        assert_eq!(store.checked_keys(), &after_uncheck);
        assert_eq!(
            store.checked_keys().to_vec(),
            vec!["root1/sub1/leaf2", "root1/leaf3"]
        );
    }

    #[test]
    fn test_duplicate_keys_do_not_panic() {
        let forest = vec![
            Node::branch("dup", "first", vec![Node::leaf("x", "x1")]),
            Node::branch("dup", "second", vec![Node::leaf("x", "x2")]),
        ];
        let mut store = loaded(forest);

        store.set_query("x");
        assert_eq!(store.display_nodes().len(), 2);
        store.toggle("dup", true);
        assert!(store.is_checked("dup"));
        assert!(store.is_checked("x"));
        assert_eq!(store.checked_keys().len(), 2);

        store.set_query("");
        store.reveal("x");
        let rows = store.visible_rows();
        assert!(rows.iter().any(|r| r.title == "second"));

        store.toggle("dup", false);
        assert!(store.checked_keys().is_empty());
    }

    #[test]
    fn test_auto_expand_parent_setting_off() {
        let settings = Settings {
            auto_expand_parent: false,
            ..Default::default()
        };
        let mut store = SelectionStore::new(settings);
        store.set_tree(mock_complex_tree());
        store.set_query("leaf2");
        assert!(!store.auto_expand_parent());
        // The filter's own expansion set still reveals the match.
        assert!(store.expanded_keys().contains("root1"));
    }
}
