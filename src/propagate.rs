// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashSet;

use serde::{Serialize, Serializer};

use crate::tree::Node;

/// The canonical selection, as node keys.
///
/// Membership is a set; iteration follows insertion order so the list handed
/// to consumers is stable across unrelated toggles.
#[derive(Debug, Clone, Default)]
pub struct CheckedKeys {
    order: Vec<String>,
    members: HashSet<String>,
}

impl CheckedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    /// Appends keys not yet present, keeping existing order. Returns how many were added.
    pub fn union<I, S>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for key in keys {
            let key = key.into();
            if self.members.insert(key.clone()) {
                self.order.push(key);
                added += 1;
            }
        }
        added
    }

    /// Removes every given key that is present. Returns how many were removed.
    pub fn difference<I, S>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.members.len();
        for key in keys {
            self.members.remove(key.as_ref());
        }
        let removed = before - self.members.len();
        if removed > 0 {
            let members = &self.members;
            self.order.retain(|k| members.contains(k));
        }
        removed
    }
}

impl PartialEq for CheckedKeys {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for CheckedKeys {}

impl Serialize for CheckedKeys {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.order.serialize(s)
    }
}

impl<S: Into<String>> FromIterator<S> for CheckedKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut keys = CheckedKeys::new();
        keys.union(iter);
        keys
    }
}

/// Cascades a check or uncheck from `node` down to its whole subtree as given.
///
/// Ancestors are never consulted: checking every child does not check the
/// parent. Applying the same toggle twice is a no-op the second time.
/// Returns the number of keys actually inserted or removed.
pub fn propagate(checked_keys: &mut CheckedKeys, node: &Node, checked: bool) -> usize {
    if node.is_leaf() {
        return propagate_key(checked_keys, &node.key, checked);
    }

    let subtree = node.collect_keys();
    if checked {
        checked_keys.union(subtree)
    } else {
        checked_keys.difference(subtree)
    }
}

/// Toggle for a key with no known subtree.
pub fn propagate_key(checked_keys: &mut CheckedKeys, key: &str, checked: bool) -> usize {
    if checked {
        checked_keys.union([key])
    } else {
        checked_keys.difference([key])
    }
}
