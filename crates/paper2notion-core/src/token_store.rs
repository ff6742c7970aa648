use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    access_token: String,
}

/// Single-file store for the cloud storage access token.
///
/// The file is created on login, read on startup and removed on logout.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.paper2notion/dropbox_token.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(".paper2notion")
            .join("dropbox_token.json")
    }

    pub fn at_default_location() -> Self {
        Self::new(Self::default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, access_token: &str) -> Result<()> {
        if access_token.trim().is_empty() {
            return Err(CoreError::TokenStore("refusing to store an empty token".to_string()));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let record = TokenRecord {
            access_token: access_token.trim().to_string(),
        };
        std::fs::write(&self.path, serde_json::to_vec(&record)?)?;
        Ok(())
    }

    /// Stored token, or `None` when nothing has been saved.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(&self.path)?;
        let record: TokenRecord = serde_json::from_slice(&data)?;
        Ok(Some(record.access_token).filter(|token| !token.is_empty()))
    }

    /// Remove the token file. Returns `false` when there was nothing to remove.
    pub fn delete(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}
