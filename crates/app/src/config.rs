use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_ocr::{ExtractionRules, OcrSpaceConfig, RulesPreset, ShopNameMode};
use thiserror::Error;

pub const API_KEY_ENV: &str = "TALLY_OCR_API_KEY";
const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "receipts.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not determine a home directory for default paths")]
    NoProjectDirs,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ocr: OcrConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Pretend OCR output read from a text file.
    Mock,
    /// Local Tesseract engine.
    #[default]
    Tesseract,
    /// Remote OCR.space API.
    OcrSpace,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub language: String,
    pub is_table: bool,
    pub timeout_secs: u64,
    pub tessdata: Option<String>,
    pub tesseract_lang: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            endpoint: None,
            language: "eng".to_string(),
            is_table: true,
            timeout_secs: 30,
            tessdata: None,
            tesseract_lang: "eng".to_string(),
        }
    }
}

impl OcrConfig {
    /// Remote API settings, or `None` without an API key.
    pub fn ocr_space(&self) -> Option<OcrSpaceConfig> {
        let api_key = self.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        let mut config = OcrSpaceConfig::new(api_key);
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        config.language.clone_from(&self.language);
        config.is_table = self.is_table;
        config.timeout = Duration::from_secs(self.timeout_secs);
        Some(config)
    }
}

/// A preset plus optional per-field overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub preset: RulesPreset,
    pub shop_prefix_lines: Option<usize>,
    pub shop_name_mode: Option<ShopNameMode>,
    pub exclusion_keywords: Option<Vec<String>>,
}

impl ExtractionConfig {
    pub fn rules(&self) -> ExtractionRules {
        let mut rules = self.preset.rules();
        if let Some(n) = self.shop_prefix_lines {
            rules = rules.with_shop_prefix_lines(n);
        }
        if let Some(mode) = self.shop_name_mode {
            rules = rules.with_shop_name_mode(mode);
        }
        if let Some(words) = &self.exclusion_keywords {
            rules = rules.with_exclusion_keywords(words);
        }
        rules
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// An explicit path must exist. The default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default = project_dirs()?.config_dir().join(CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!(path = %default.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::from_toml(&content)
    }

    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.ocr.api_key = Some(key);
        }
        self
    }

    /// Configured database path, else `receipts.db` in the data directory.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database.path {
            Some(p) => Ok(p.clone()),
            None => Ok(project_dirs()?.data_dir().join(DB_FILE)),
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
    directories::ProjectDirs::from("com", "tally", "Tally").ok_or(ConfigError::NoProjectDirs)
}
