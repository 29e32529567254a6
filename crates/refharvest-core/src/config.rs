use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root harvester configuration, loaded from `~/.config/refharvest/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub arxiv: ArxivSettings,
    pub zotero: ZoteroSettings,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivSettings {
    pub base_url: String,
    pub user_agent: String,
    /// Human label used in report headings, e.g. `astro-ph`.
    pub label: String,
    pub categories: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoteroSettings {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Item types that are never first-class bibliographic entries.
    pub skip_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub fallback_step_secs: u64,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for ArxivSettings {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org/api/query".to_string(),
            user_agent: "refharvest/0.1".to_string(),
            label: "astro-ph".to_string(),
            categories: [
                "astro-ph",
                "astro-ph.CO",
                "astro-ph.EP",
                "astro-ph.GA",
                "astro-ph.HE",
                "astro-ph.IM",
                "astro-ph.SR",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            timeout_secs: 90,
        }
    }
}

impl Default for ZoteroSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.zotero.org".to_string(),
            api_key_env: "ZOTERO_API_KEY".to_string(),
            timeout_secs: 60,
            skip_types: vec![
                "attachment".to_string(),
                "note".to_string(),
                "annotation".to_string(),
            ],
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            fallback_step_secs: 2,
        }
    }
}

// ─── Load ──────────────────────────────────────────────────

impl HarvestConfig {
    /// Standard config file path: `~/.config/refharvest/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("REFHARVEST_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("refharvest")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
