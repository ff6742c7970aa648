use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/paper2notion/config.toml`.
///
/// Secrets never live in this file; each section names the environment
/// variable that carries them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub registry: RegistryConfig,
    pub translation: TranslationConfig,
    pub summary: SummaryConfig,
    pub storage: StorageConfig,
    pub notion: NotionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub crossref_base_url: String,
    pub arxiv_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polite_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub target_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub language: String,
}

/// Where the source PDF is stored before publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Dropbox,
    Notion,
    None,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dropbox" => Ok(Self::Dropbox),
            "notion" => Ok(Self::Notion),
            "none" => Ok(Self::None),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub dropbox_folder: String,
    pub access_token_env: String,
    pub app_key_env: String,
    pub app_secret_env: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub api_key_env: String,
    pub database_id_env: String,
    pub base_url: String,
    pub version: String,
    pub properties: NotionPropertyNames,
}

/// Column names of the target database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionPropertyNames {
    pub title: String,
    pub authors: String,
    pub year: String,
    pub journal: String,
    pub doi: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.2,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            crossref_base_url: "https://api.crossref.org".to_string(),
            arxiv_base_url: "http://export.arxiv.org/api/query".to_string(),
            polite_email: None,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_language: "Japanese".to_string(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            language: "Japanese".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Dropbox,
            dropbox_folder: "Paper2Notion_Uploads".to_string(),
            access_token_env: "DROPBOX_ACCESS_TOKEN".to_string(),
            app_key_env: "DROPBOX_APP_KEY".to_string(),
            app_secret_env: "DROPBOX_APP_SECRET".to_string(),
            redirect_uri: "http://localhost:8501".to_string(),
        }
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key_env: "NOTION_API_KEY".to_string(),
            database_id_env: "NOTION_DATABASE_ID".to_string(),
            base_url: "https://api.notion.com/v1".to_string(),
            version: "2022-06-28".to_string(),
            properties: NotionPropertyNames::default(),
        }
    }
}

impl Default for NotionPropertyNames {
    fn default() -> Self {
        Self {
            title: "Title".to_string(),
            authors: "Authors".to_string(),
            year: "Year".to_string(),
            journal: "Journal".to_string(),
            doi: "DOI".to_string(),
            abstract_text: "Abstract".to_string(),
            pdf: "PDF".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/paper2notion/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PAPER2NOTION_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("paper2notion")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
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

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

/// Read a secret from the environment, treating blank values as unset.
pub fn secret_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.storage.backend, StorageBackend::Dropbox);
        assert_eq!(cfg.notion.version, "2022-06-28");
        assert!(cfg.translation.enabled);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.storage.backend = StorageBackend::Notion;
        cfg.notion.properties.title = "タイトル".to_string();
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.storage.backend, StorageBackend::Notion);
        assert_eq!(loaded.notion.properties.title, "タイトル");
        assert_eq!(loaded.llm.model, cfg.llm.model);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[translation]\nenabled = false\n").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert!(!cfg.translation.enabled);
        assert_eq!(cfg.translation.target_language, "Japanese");
        assert_eq!(cfg.registry.crossref_base_url, "https://api.crossref.org");
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_paper2notion_config.toml")).unwrap();
        assert_eq!(cfg.summary.language, "Japanese");
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("Dropbox".parse::<StorageBackend>(), Ok(StorageBackend::Dropbox));
        assert_eq!("none".parse::<StorageBackend>(), Ok(StorageBackend::None));
        assert!("s3".parse::<StorageBackend>().is_err());
    }
}
