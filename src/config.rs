use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub inventory: InventoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Tag added to items moved into company storage
    pub storage_tag: String,
    /// JSON export of inventory rows; seed data is used when unset
    pub input_path: Option<String>,
    /// Destination for the rewritten rows; stdout when unset
    pub output_path: Option<String>,
    /// Collapse equivalent rows and refresh stale keys
    pub consolidate: bool,
    /// Tag every row with `storage_tag` before writing
    pub migrate_to_storage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            storage_tag: "company-storage".to_string(),
            input_path: None,
            output_path: None,
            consolidate: true,
            migrate_to_storage: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and `MOVINV_` environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        // e.g. MOVINV_INVENTORY__STORAGE_TAG=storage
        config = config.add_source(
            config::Environment::with_prefix("MOVINV")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    pub fn input_path(&self) -> Option<PathBuf> {
        self.inventory.input_path.as_ref().map(PathBuf::from)
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.inventory.output_path.as_ref().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.inventory.storage_tag, "company-storage");
        assert!(config.inventory.consolidate);
        assert!(!config.inventory.migrate_to_storage);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.input_path(), None);
    }

    #[test]
    fn test_defaults_survive_config_round_trip() {
        let built = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .build()
            .unwrap();
        let parsed: AppConfig = built.try_deserialize().unwrap();

        assert_eq!(parsed.inventory.storage_tag, "company-storage");
        assert_eq!(parsed.inventory.input_path, None);
        assert!(parsed.inventory.consolidate);
    }
}
