use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::models::SiteMode;

/// Root configuration, loaded from `~/.config/catalog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub core: CoreConfig,
    pub storefront: StorefrontConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub site_mode: SiteMode,
    pub preferred_providers: Vec<String>,
    pub page_size: usize,
}

/// Extra raw ASP names per provider, merged over the built-in table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub aliases: BTreeMap<String, Vec<String>>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("catalog");

        Self {
            database_path: data_dir.join("catalog.db").to_string_lossy().to_string(),
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            site_mode: SiteMode::All,
            preferred_providers: Vec::new(),
            page_size: 40,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl CatalogConfig {
    /// Standard config file path: `~/.config/catalog/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CATALOG_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("catalog")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storefront.page_size == 0 {
            return Err(CatalogError::ConfigError(
                "storefront.page_size must be greater than zero".to_string(),
            ));
        }
        for (provider, names) in &self.providers.aliases {
            if provider.trim().is_empty() || names.iter().any(|n| n.trim().is_empty()) {
                return Err(CatalogError::ConfigError(format!(
                    "providers.aliases has an empty entry for '{provider}'"
                )));
            }
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.core.database_path)
    }

    pub fn set_database_path(&mut self, path: PathBuf) {
        self.core.database_path = path.to_string_lossy().to_string();
    }
}
