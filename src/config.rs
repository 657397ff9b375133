// ⚙️ Configuration
//
// Search order:
// 1. Path given on the command line
// 2. dashboard.toml in the working directory
// 3. Embedded default (cleaned CSVs in the working directory)
//
// Relative data paths in a config file resolve against that file's folder.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::stores::StoreCatalog;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[data]
payments = "payments_cleaned.csv"
maintenance = "maintenance_cleaned.csv"
utilities = "utilities_cleaned.csv"

[stores]
ids = ["ShopA", "ShopB", "ShopC"]

[server]
bind = "0.0.0.0:3000"

[maintenance]
persist_on_change = false
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub data: DataConfig,
    pub stores: StoresConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub payments: PathBuf,
    pub maintenance: PathBuf,
    pub utilities: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoresConfig {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MaintenanceConfig {
    /// Write the ticket table after every resolution, not only at shutdown
    #[serde(default)]
    pub persist_on_change: bool,
}

impl DashboardConfig {
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG).context("Embedded default configuration is invalid")
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(contents)?;
        if config.stores.ids.iter().all(|id| id.trim().is_empty()) {
            bail!("[stores] ids must list at least one store");
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.data.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Load configuration following the search order above.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            tracing::info!("Loading config from: {}", local.display());
            return Self::from_file(local);
        }

        tracing::info!("Using default embedded configuration");
        Self::embedded()
    }

    pub fn catalog(&self) -> StoreCatalog {
        StoreCatalog::new(self.stores.ids.iter().filter(|id| !id.trim().is_empty()).cloned())
    }
}

impl DataConfig {
    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.payments, &mut self.maintenance, &mut self.utilities] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
