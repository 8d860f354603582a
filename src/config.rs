//! Admin Configuration
//!
//! JSON settings file for the admin shell. Every field has a default, so a
//! missing file or a partial one is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{DomainError, DomainResult};

/// Overrides `apiBaseUrl` when set
pub const API_URL_ENV: &str = "CATALOG_ADMIN_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminConfig {
    /// Root of the catalog REST API, e.g. `http://localhost:8080/api`
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// File logging is off when unset
    pub log_dir: Option<PathBuf>,
    pub app_name: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            request_timeout_ms: 10_000,
            log_dir: None,
            app_name: "CatalogAdmin".to_string(),
        }
    }
}

impl AdminConfig {
    /// Read the settings file, then apply environment overrides
    pub fn load(path: &Path) -> DomainResult<Self> {
        Ok(Self::read(path)?.with_env_overrides())
    }

    fn read(path: &Path) -> DomainResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(DomainError::Internal(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&text).map_err(|e| {
            DomainError::InvalidInput(format!("malformed config {}: {}", path.display(), e))
        })
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_api_url(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn save(&self, path: &Path) -> DomainResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| DomainError::Internal(format!("cannot write {}: {}", path.display(), e)))
    }
}
