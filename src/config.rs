use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunking::DEFAULT_CHUNK_SIZE;
use crate::embedding::engine::{DEFAULT_MODEL_ID, DEFAULT_REVISION};
use crate::embedding::hashing::DEFAULT_HASH_DIMENSION;
use crate::embedding::{EmbedderKind, EngineConfig, Pooling};
use crate::errors::PipelineError;
use crate::pipeline::PipelineConfig;
use crate::ranking::DEFAULT_TOP_K;

/// Document searched when none is given
pub const DEFAULT_DOCUMENT: &str = "swebok-v3.pdf";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passage size threshold in characters
    pub chunk_size: usize,
    /// Number of passages returned
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub id: String,
    pub revision: String,
    pub pooling: Pooling,
    pub embedder: EmbedderKind,
    /// Vector length for the hash embedder
    pub hash_dimension: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DOCUMENT),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_MODEL_ID.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            pooling: Pooling::default(),
            embedder: EmbedderKind::default(),
            hash_dimension: DEFAULT_HASH_DIMENSION,
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => match Self::config_path() {
                Ok(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load and parse a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".docseek").join("config.toml"))
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        if self.retrieval.chunk_size == 0 {
            return Err(PipelineError::ConfigError(
                "retrieval.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(PipelineError::ConfigError(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        if self.model.hash_dimension == 0 {
            return Err(PipelineError::ConfigError(
                "model.hash_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for the candle engine
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model_id: self.model.id.clone(),
            revision: self.model.revision.clone(),
            pooling: self.model.pooling,
        }
    }

    /// Settings for the orchestrator
    pub fn pipeline_config(&self) -> PipelineConfig {
        let model_label = match self.model.embedder {
            EmbedderKind::Model => self.model.id.clone(),
            EmbedderKind::Hash => format!("feature-hash ({} dims)", self.model.hash_dimension),
        };

        PipelineConfig {
            document: self.document.path.clone(),
            chunk_size: self.retrieval.chunk_size,
            top_k: self.retrieval.top_k,
            model_label,
        }
    }

    /// Serialize for display
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.document.path, PathBuf::from("swebok-v3.pdf"));
        assert_eq!(config.model.pooling, Pooling::Mean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[retrieval]\ntop_k = 3\n").unwrap();
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.model.id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn test_enum_values_parse() {
        let config: Config =
            toml::from_str("[model]\npooling = \"cls\"\nembedder = \"hash\"\n").unwrap();
        assert_eq!(config.model.pooling, Pooling::Cls);
        assert_eq!(config.model.embedder, EmbedderKind::Hash);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.retrieval.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model.hash_dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.retrieval.chunk_size = 256;
        config.document.path = PathBuf::from("guide.txt");
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_pipeline_config_labels_embedder() {
        let mut config = Config::default();
        config.model.embedder = EmbedderKind::Hash;
        config.model.hash_dimension = 64;
        let pipeline = config.pipeline_config();
        assert!(pipeline.model_label.contains("64"));
        assert_eq!(pipeline.top_k, 5);
    }
}
