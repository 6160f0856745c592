// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::LevelFilter;
use quickedit_app::EditorOptions;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 1;
pub const APP_NAME: &str = "quickedit";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub editor: Editor,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            editor: Editor::default(),
            logging: Logging::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Editor {
    #[serde(flatten)]
    pub options: EditorOptions,
    pub default_table: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("QUICKEDIT_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set QUICKEDIT_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and keep values under [editor] and [logging]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let mut seen = BTreeSet::new();
        for key in &self.editor.options.changes_always_include {
            if key.as_str().trim().is_empty() {
                bail!(
                    "editor.changes_always_include in {} contains an empty key",
                    path.display()
                );
            }
            if !seen.insert(key.as_str()) {
                bail!(
                    "editor.changes_always_include in {} lists {:?} twice",
                    path.display(),
                    key.as_str()
                );
            }
        }

        self.log_level()
            .with_context(|| format!("invalid [logging] in {}", path.display()))?;
        Ok(())
    }

    pub fn editor_options(&self) -> EditorOptions {
        self.editor.options.clone()
    }

    pub fn default_table(&self) -> Option<PathBuf> {
        self.editor.default_table.as_deref().map(PathBuf::from)
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        let raw = self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
        raw.parse::<LevelFilter>().map_err(|_| {
            anyhow!("logging.level {raw:?} is not one of off, error, warn, info, debug, trace")
        })
    }

    /// Log file path; the parent directory is created when missing.
    pub fn log_path(&self) -> Result<PathBuf> {
        let path = match &self.logging.path {
            Some(path) => PathBuf::from(path),
            None => {
                let cache_root = dirs::cache_dir().ok_or_else(|| {
                    anyhow!("cannot resolve cache directory; set [logging].path in the config")
                })?;
                cache_root.join(APP_NAME).join("quickedit.log")
            }
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
        Ok(path)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# quickedit config\n# Place this file at: {}\n\nversion = 1\n\n[editor]\n# Keys copied from the record into every row of the saved change set.\nchanges_always_include = [\"id\"]\n# Optional. Table file opened when --table is not given.\n# default_table = \"/absolute/path/to/table.toml\"\n\n[logging]\nlevel = \"{}\"\n# Optional. Default is the platform cache dir (for example ~/.cache/quickedit/quickedit.log)\n# path = \"/absolute/path/to/quickedit.log\"\n",
            path.display(),
            DEFAULT_LOG_LEVEL,
        )
    }
}
