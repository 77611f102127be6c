// SPDX-FileCopyrightText: 2025 The foldscope Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use figment::providers::{Env, Format};
use figment::{providers::Toml, Figment};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    // Search
    pub trim_query: bool,
    pub auto_expand_parent: bool,

    // Notifications
    pub event_capacity: usize,

    // Loading
    pub path_separator: char,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trim_query: false,
            auto_expand_parent: true,
            event_capacity: 64,
            path_separator: '/',
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "github", "foldscope")?;
    let config_dir = proj_dirs.config_dir().to_path_buf();
    fs::create_dir_all(&config_dir).ok()?;
    Some(config_dir)
}

pub fn load_settings() -> Settings {
    if let Some(config_dir) = get_config_dir() {
        let config_file_path = config_dir.join("settings.toml");

        return Figment::new()
            .merge(Toml::file(config_file_path))
            .merge(Env::prefixed("FOLDSCOPE_"))
            .extract()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default settings: {}", e);
                Settings::default()
            });
    }

    tracing::warn!("Could not determine config directory, using default settings.");
    Settings::default()
}

pub fn save_settings(settings: &Settings) -> io::Result<()> {
    if let Some(config_dir) = get_config_dir() {
        let config_file_path = config_dir.join("settings.toml");
        let temp_file_path = config_dir.join("settings.toml.tmp");
        let content = toml::to_string_pretty(settings).map_err(io::Error::other)?;
        fs::write(&temp_file_path, content)?;
        fs::rename(&temp_file_path, &config_file_path)?;
        tracing::debug!("Saved settings to {:?}", config_file_path);
    } else {
        tracing::warn!("Could not determine config directory, settings not saved.");
    }
    Ok(())
}
