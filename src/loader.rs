// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Inbound side: turns an external folder listing into a validated forest.

use std::fs;
use std::path::Path;

use crate::errors::LoadError;
use crate::tree::{self, Node};

/// Decodes a JSON array of `{"key", "title", "children"}` objects.
pub fn load_forest_from_str(json: &str) -> Result<Vec<Node>, LoadError> {
    let forest: Vec<Node> = serde_json::from_str(json)?;
    check(&forest)?;
    Ok(forest)
}

pub fn load_forest_from_file(path: &Path) -> Result<Vec<Node>, LoadError> {
    tracing::debug!("Loading folder tree from {:?}", path);
    let content = fs::read_to_string(path)?;
    load_forest_from_str(&content)
}

/// Builds a forest from a flat path listing. Keys are the full paths, so
/// uniqueness holds by construction.
pub fn load_forest_from_paths<I, S>(paths: I, separator: char) -> Vec<Node>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let forest = tree::from_path_list(paths, separator);
    tracing::debug!(
        "Built folder tree from path list: {} roots, {} nodes",
        forest.len(),
        tree::forest_count(&forest)
    );
    forest
}

fn check(forest: &[Node]) -> Result<(), LoadError> {
    if let Err(e) = tree::validate_unique_keys(forest) {
        tracing::warn!("Rejecting folder tree: {}", e);
        return Err(e.into());
    }
    Ok(())
}
