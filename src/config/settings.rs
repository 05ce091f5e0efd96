use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Override for the data directory, used by tests. Not serialized.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    /// API key for the provider. When absent the chat responder and the
    /// embedding worker run in fallback-only mode.
    pub api_key: Option<String>,
    pub api_base: String,
    pub embedding_model: String,
    pub chat_model: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Maximum number of knowledge items included as chat context.
    pub context_limit: usize,
    /// Minimum cosine similarity for an item to count as relevant.
    pub similarity_threshold: f32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid API base URL: {0}")]
    InvalidApiBase(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid context limit: {0} (must be between 1 and 50)")]
    InvalidContextLimit(usize),
    #[error("Invalid similarity threshold: {0} (must be within -1.0..=1.0)")]
    InvalidThreshold(f32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Default for OpenAiConfig {
    #[inline]
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            context_limit: 5,
            similarity_threshold: 0.2,
        }
    }
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".folio-chat"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("folio-chat"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Data directory holding the sqlite database, honoring the test override.
    #[inline]
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base_dir {
            return Ok(base.clone());
        }
        Self::config_dir().context("Failed to determine data directory")
    }

    #[inline]
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("portfolio.db"))
    }

    #[inline]
    pub fn load() -> Result<Self> {
        let config_path =
            Self::config_file_path().context("Failed to determine config file path")?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = Self::config_dir().context("Failed to determine config directory")?;

        fs::create_dir_all(&config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.openai.validate()?;
        self.retrieval.validate()
    }

    /// Whether an embedding-capable provider is configured.
    #[inline]
    pub fn provider_configured(&self) -> bool {
        self.openai
            .api_key
            .as_ref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl OpenAiConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ConfigError::InvalidApiBase(self.api_base.clone()));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        Ok(())
    }
}

impl RetrievalConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_limit == 0 || self.context_limit > 50 {
            return Err(ConfigError::InvalidContextLimit(self.context_limit));
        }

        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.openai.api_key, None);
        assert_eq!(config.openai.api_base, "https://api.openai.com/v1");
        assert_eq!(config.openai.embedding_model, "text-embedding-3-small");
        assert_eq!(config.openai.chat_model, "gpt-4o-mini");
        assert_eq!(config.retrieval.context_limit, 5);
        assert!((config.retrieval.similarity_threshold - 0.2).abs() < f32::EPSILON);
        assert!(!config.provider_configured());
    }

    #[test]
    fn config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = config.clone();
        invalid_config.openai.api_base = "not-a-url".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.openai.embedding_model = String::new();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.retrieval.context_limit = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config;
        invalid_config.retrieval.similarity_threshold = 1.5;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn provider_configured_requires_non_blank_key() {
        let mut config = Config::default();
        assert!(!config.provider_configured());

        config.openai.api_key = Some("   ".to_string());
        assert!(!config.provider_configured());

        config.openai.api_key = Some("sk-test".to_string());
        assert!(config.provider_configured());
    }

    #[test]
    fn data_dir_honors_base_dir_override() {
        let mut config = Config::default();
        config.base_dir = Some(PathBuf::from("/tmp/folio-test"));

        let data_dir = config.data_dir().expect("should resolve data directory");
        assert_eq!(data_dir, PathBuf::from("/tmp/folio-test"));

        let db_path = config.database_path().expect("should resolve database path");
        assert_eq!(db_path, PathBuf::from("/tmp/folio-test/portfolio.db"));
    }

    #[test]
    fn toml_round_trip() {
        let config = Config {
            openai: OpenAiConfig {
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            },
            retrieval: RetrievalConfig::default(),
            base_dir: None,
        };
        let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
        let parsed: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
        assert_eq!(config, parsed);
    }
}
