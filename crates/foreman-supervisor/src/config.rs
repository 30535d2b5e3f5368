//! Supervisor configuration.
//!
//! The supervisor reads one TOML file describing its own options and the
//! processes to register. Entries may carry a free-form `params` table; it
//! is rendered to a pretty-printed `config.json` inside the process's data
//! directory before the process starts, which is how supervised programs
//! receive their own configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::record::ProcessSpec;

/// Top-level configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SupervisorConfig {
    #[serde(default)]
    pub supervisor: SupervisorOptions,
    #[serde(default, rename = "process")]
    pub processes: Vec<ProcessEntry>,
}

/// Options for the supervisor itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorOptions {
    /// Base directory for per-process data directories.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Port the built-in file server listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds a graceful stop waits before escalating.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            port: default_port(),
            grace_period_secs: default_grace_period_secs(),
            log_level: default_log_level(),
        }
    }
}

/// One `[[process]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// Disabled entries are registered but not auto-started.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Free-form configuration handed to the process as `config.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<toml::Value>,
}

impl SupervisorConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: SupervisorConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// The built-in static file server, registered when the config lists no
    /// processes at all.
    pub fn default_file_server(options: &SupervisorOptions) -> ProcessEntry {
        ProcessEntry {
            name: "fileserver".to_string(),
            command: "caddy".to_string(),
            args: vec![
                "file-server".to_string(),
                "--listen".to_string(),
                format!(":{}", options.port),
            ],
            work_dir: None,
            enabled: true,
            params: None,
        }
    }
}

impl ProcessEntry {
    pub fn to_spec(&self) -> ProcessSpec {
        ProcessSpec {
            name: self.name.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            work_dir: self.work_dir.clone(),
        }
    }

    /// This entry's data directory under `base`.
    pub fn data_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.name)
    }

    /// Create the data directory and, when `params` is present, write the
    /// companion `config.json` into it. Called by the host before starting
    /// the entry, never by the supervisor itself.
    pub fn prepare_data_dir(&self, base: &Path) -> Result<PathBuf> {
        let dir = self.data_dir(base);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory: {}", dir.display()))?;

        if let Some(params) = &self.params {
            let json = serde_json::to_value(params)
                .with_context(|| format!("params of process '{}' are not JSON-safe", self.name))?;
            let mut rendered = serde_json::to_string_pretty(&json)
                .context("failed to render companion config")?;
            rendered.push('\n');

            let path = dir.join("config.json");
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        Ok(dir)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_port() -> u16 {
    8080
}

fn default_grace_period_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled() -> bool {
    true
}
