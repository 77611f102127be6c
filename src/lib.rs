// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hierarchical folder selection with search filtering.
//!
//! A loader hands over a forest of [`Node`]s, the [`SelectionStore`] derives
//! the filtered display view from the current query, cascades checkbox
//! toggles through subtrees and publishes the checked keys as a
//! [`ContextScope`] for whoever builds the chat request.

pub mod config;
pub mod errors;
pub mod filter;
pub mod loader;
pub mod propagate;
pub mod store;
pub mod tree;

pub use config::Settings;
pub use errors::{LoadError, TreeError};
pub use filter::{filter_forest, FilteredView, TreeFilter};
pub use propagate::{propagate, CheckedKeys};
pub use store::{ContextScope, DisplayRow, SelectionEvent, SelectionStore};
pub use tree::Node;
