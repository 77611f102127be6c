// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Structural precondition violations of a forest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Duplicate node key '{key}' in tree.")]
    DuplicateKey { key: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read tree source: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode tree JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid tree: {0}")]
    Tree(#[from] TreeError),
}
