//! Configuration file handling for the pantry.
//!
//! The configuration file is stored at `$PANTRY_HOME/config.json` next to the SQLite database,
//! `$PANTRY_HOME/pantry.sqlite`.

use crate::db::Db;
use crate::import::ImportOptions;
use crate::model::{CheckoutLimit, DEFAULT_CATEGORY};
use crate::{utils, Result};
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pantry";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const PANTRY_SQLITE: &str = "pantry.sqlite";
const DEFAULT_ACTOR: &str = "staff";
const LOW_STOCK_THRESHOLD: i64 = 5;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$PANTRY_HOME` and from there it loads `$PANTRY_HOME/config.json` and opens the
/// database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the pantry home directory, an initial `config.json` with default settings and an
    /// empty database.
    ///
    /// # Errors
    /// - Returns an error if a config file or database already exists in `dir`.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the pantry home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let sqlite_path = root.join(PANTRY_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `pantry_home` exists and that the config file exists
    /// - load the config file
    /// - open the database, migrating it if needed
    /// - return the loaded configuration object
    pub async fn load(pantry_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = pantry_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Pantry home is missing, run 'pantry init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(PANTRY_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn default_actor(&self) -> &str {
        &self.config_file.default_actor
    }

    pub fn low_stock_threshold(&self) -> Decimal {
        self.config_file.low_stock_threshold
    }

    /// Import settings from the config, with `actor` overriding the configured default actor.
    pub fn import_options(&self, actor: Option<&str>) -> ImportOptions {
        ImportOptions {
            actor_id: actor.unwrap_or(self.default_actor()).to_string(),
            category: self.config_file.new_item_category.clone(),
            limit: self.config_file.default_limit,
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "pantry",
///   "config_version": 1,
///   "default_actor": "staff",
///   "low_stock_threshold": "5",
///   "new_item_category": "other",
///   "default_limit": { "quantity": "1", "days": 7 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "pantry"
    app_name: String,

    config_version: u8,

    /// Recorded as the actor on imports when none is given on the command line
    #[serde(default = "default_actor")]
    default_actor: String,

    /// Items at or below this quantity are reported as low on stock
    #[serde(default = "default_low_stock_threshold")]
    low_stock_threshold: Decimal,

    /// Category given to items created by an import
    #[serde(default = "default_category")]
    new_item_category: String,

    /// Checkout limit given to items created by an import
    #[serde(default)]
    default_limit: CheckoutLimit,
}

fn default_actor() -> String {
    DEFAULT_ACTOR.to_string()
}

fn default_low_stock_threshold() -> Decimal {
    Decimal::from(LOW_STOCK_THRESHOLD)
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            default_actor: default_actor(),
            low_stock_threshold: default_low_stock_threshold(),
            new_item_category: default_category(),
            default_limit: CheckoutLimit::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pantry_home");

        let created = Config::create(&home).await.unwrap();
        assert!(created.config_path().is_file());
        assert!(created.sqlite_path().is_file());
        assert_eq!(created.default_actor(), DEFAULT_ACTOR);

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert_eq!(loaded.low_stock_threshold(), Decimal::from(5));
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        let err = Config::create(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
        // the directory exists but has no config file
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let original = ConfigFile {
            default_actor: "volunteer".to_string(),
            low_stock_threshold: Decimal::new(25, 1),
            default_limit: CheckoutLimit {
                quantity: Decimal::from(2),
                days: 14,
            },
            ..ConfigFile::default()
        };

        original.save(&path).await.unwrap();
        let loaded = ConfigFile::load(&path).await.unwrap();

        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(&path, r#"{ "app_name": "pantry", "config_version": 1 }"#)
            .await
            .unwrap();

        let config = ConfigFile::load(&path).await.unwrap();

        assert_eq!(config, ConfigFile::default());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        utils::write(&path, r#"{ "app_name": "pantry-old", "config_version": 1 }"#)
            .await
            .unwrap();

        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_import_options() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path()).await.unwrap();

        let options = config.import_options(None);
        assert_eq!(options.actor_id, DEFAULT_ACTOR);
        assert_eq!(options.category, DEFAULT_CATEGORY);
        assert_eq!(options.limit, CheckoutLimit::default());

        assert_eq!(config.import_options(Some("alex")).actor_id, "alex");
    }
}
