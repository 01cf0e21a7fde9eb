use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
    pub summarization: SummarizationConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API.
    pub cors_origins: Vec<String>,
    /// Largest accepted upload body, in megabytes.
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for the database, uploads and exports.
    /// Defaults to the platform data directory.
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub command_path: Option<String>,
    /// ggml model file; required by `whisper-cpp`.
    pub model_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Upper bound on sentences kept by the extractive summarizer.
    pub max_sentences: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of jobs processed at the same time.
    pub concurrency: usize,
    /// Job ids that may wait for a free worker before uploads block.
    pub queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            max_upload_mb: 512,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: Some("whisper-cpp".to_string()),
            model: Some("base".to_string()),
            language: Some("en".to_string()),
            api_endpoint: None,
            api_key: None,
            command_path: Some("whisper-cli".to_string()),
            model_path: None,
        }
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            provider: Some("extractive".to_string()),
            model: None,
            api_endpoint: None,
            api_key: None,
            max_sentences: 5,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            queue_capacity: 64,
        }
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => global::data_dir(),
        }
    }

    pub fn db_file(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("minutes.db"))
    }

    pub fn uploads_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("uploads"))
    }

    pub fn exports_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("exports"))
    }
}

impl Config {
    /// Load from the default location, creating it with defaults if missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&global::config_file()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.worker.concurrency, 2);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[summarization]\nprovider = \"openai-api\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.summarization.provider.as_deref(), Some("openai-api"));
        assert_eq!(config.summarization.max_sentences, 5);
        assert_eq!(config.worker.queue_capacity, 64);
    }

    #[test]
    fn test_storage_paths_follow_data_dir() {
        let storage = StorageConfig {
            data_dir: Some("/srv/minutes".to_string()),
        };
        assert_eq!(storage.db_file().unwrap(), PathBuf::from("/srv/minutes/minutes.db"));
        assert_eq!(storage.uploads_dir().unwrap(), PathBuf::from("/srv/minutes/uploads"));
        assert_eq!(storage.exports_dir().unwrap(), PathBuf::from("/srv/minutes/exports"));
    }
}
