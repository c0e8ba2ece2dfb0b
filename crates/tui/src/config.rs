use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kanban::StatusSequence;
use serde::Deserialize;

/// Contents of `~/.bimboard/config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub statuses: Option<Vec<String>>,
    pub project_id: Option<String>,
    pub demo: Option<bool>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Remote { api_url: String, api_key: String },
    Demo,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub sequence: StatusSequence,
    pub project_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let file = FileConfig::read(&config_dir()?.join("config.json"))?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge the file with environment overrides (`BIMBOARD_*` wins).
    pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = env("BIMBOARD_API_URL").or(file.api_url);
        let api_key = env("BIMBOARD_API_KEY").or(file.api_key).unwrap_or_default();
        let demo = match env("BIMBOARD_DEMO") {
            Some(v) => matches!(v.trim(), "1" | "true" | "yes"),
            None => file.demo.unwrap_or(false),
        };

        let store = match api_url {
            Some(api_url) if !demo && !api_url.trim().is_empty() => StoreConfig::Remote { api_url, api_key },
            _ => StoreConfig::Demo,
        };

        let statuses = env("BIMBOARD_STATUSES")
            .map(|v| v.split(',').map(str::to_string).collect::<Vec<_>>())
            .or(file.statuses);
        let sequence = match statuses {
            Some(tokens) => StatusSequence::parse_list(&tokens).context("Invalid status list in configuration")?,
            None => StatusSequence::standard(),
        };

        let project_id = env("BIMBOARD_PROJECT").or(file.project_id);

        Ok(Self {
            store,
            sequence,
            project_id,
        })
    }
}

/// `~/.bimboard`, created on first use. Holds the config file and the log.
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("No home directory")?
        .join(".bimboard");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
    Ok(dir)
}
