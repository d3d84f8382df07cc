//! Configuration file handling for spendly.
//!
//! Everything spendly keeps lives in `$SPENDLY_HOME`: the `config.json` settings file, the
//! `spendly.sqlite` database and, while someone is logged in, `session.json`.

use crate::aggregate::Period;
use crate::db::Db;
use crate::error::{ErrorType, IntoResult, Res};
use crate::identity::Identity;
use crate::sync::Store;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const APP_NAME: &str = "spendly";
const CONFIG_VERSION: u8 = 1;
const CURRENCY_SYMBOL: &str = "R";
const CONFIG_JSON: &str = "config.json";
const SESSION_JSON: &str = "session.json";
const SPENDLY_SQLITE: &str = "spendly.sqlite";

/// The configuration of the app. You instantiate it by providing the path to `$SPENDLY_HOME`, from
/// which it loads `config.json` and opens the database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
    session_path: PathBuf,
}

impl Config {
    /// Creates the spendly home directory, writes a default `config.json` and creates the database.
    ///
    /// # Errors
    /// - A `Config` error if a config file already exists or any file operation fails.
    /// - A `Database` error if the database cannot be created.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let (root, config_path) = create_home(dir.into())
            .await
            .pub_result(ErrorType::Config)?;
        let config_file = ConfigFile::default();
        config_file
            .save(&config_path)
            .await
            .pub_result(ErrorType::Config)?;

        let sqlite_path = root.join(SPENDLY_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")
            .pub_result(ErrorType::Database)?;

        Ok(Self {
            session_path: root.join(SESSION_JSON),
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// Validates that `spendly_home` and its config file exist, loads the config file and opens the
    /// database. Failures to open the database are `Database` errors, everything else is a `Config`
    /// error.
    pub async fn load(spendly_home: impl Into<PathBuf>) -> Result<Self> {
        let (root, config_path, config_file) = load_home(spendly_home.into())
            .await
            .pub_result(ErrorType::Config)?;

        let sqlite_path = root.join(SPENDLY_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")
            .pub_result(ErrorType::Database)?;

        Ok(Self {
            session_path: root.join(SESSION_JSON),
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

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn currency_symbol(&self) -> &str {
        &self.config_file.currency_symbol
    }

    pub fn default_period(&self) -> Period {
        self.config_file.default_period
    }

    /// The database, as the document store for sessions.
    pub(crate) fn store(&self) -> Arc<dyn Store> {
        Arc::new(self.db.clone())
    }

    /// The database, as the identity provider.
    pub(crate) fn identity(&self) -> Arc<dyn Identity> {
        Arc::new(self.db.clone())
    }

    /// Remembers that `user_id` is logged in.
    pub(crate) async fn save_session(&self, user_id: &str, email: &str) -> Res<()> {
        let file = SessionFile {
            user_id: user_id.to_string(),
            email: email.trim().to_string(),
            logged_in_at: Utc::now(),
        };
        utils::serialize(&self.session_path, &file).await
    }

    /// The logged-in user, if any.
    pub(crate) async fn load_session(&self) -> Res<Option<SessionFile>> {
        if !self.session_path.is_file() {
            return Ok(None);
        }
        utils::deserialize(&self.session_path).await.map(Some)
    }

    pub(crate) async fn clear_session(&self) -> Res<()> {
        utils::remove(&self.session_path).await
    }
}

async fn create_home(maybe_relative: PathBuf) -> Res<(PathBuf, PathBuf)> {
    utils::make_dir(&maybe_relative)
        .await
        .context("Unable to create the spendly home directory")?;
    let root = utils::canonicalize(&maybe_relative).await?;

    let config_path = root.join(CONFIG_JSON);
    if config_path.exists() {
        bail!(
            "spendly is already initialized, a config file exists at '{}'",
            config_path.display()
        );
    }
    Ok((root, config_path))
}

async fn load_home(maybe_relative: PathBuf) -> Res<(PathBuf, PathBuf, ConfigFile)> {
    ensure!(
        maybe_relative.is_dir(),
        "The spendly home directory '{}' is missing, run 'spendly init' first",
        maybe_relative.display()
    );
    let root = utils::canonicalize(&maybe_relative).await?;

    let config_path = root.join(CONFIG_JSON);
    if !config_path.is_file() {
        bail!("The config file is missing '{}'", config_path.display())
    }
    let config_file = ConfigFile::load(&config_path).await?;
    Ok((root, config_path, config_file))
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "spendly",
///   "config_version": 1,
///   "currency_symbol": "R",
///   "default_period": "last30"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "spendly"
    app_name: String,

    config_version: u8,

    /// Printed in front of amounts
    #[serde(default = "default_currency_symbol")]
    currency_symbol: String,

    /// The look-back window used by `summary` when `--period` is not given
    #[serde(default)]
    default_period: Period,
}

fn default_currency_symbol() -> String {
    CURRENCY_SYMBOL.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            currency_symbol: default_currency_symbol(),
            default_period: Period::default(),
        }
    }
}

impl ConfigFile {
    async fn load(path: &Path) -> Res<Self> {
        let config: ConfigFile = utils::deserialize(path)
            .await
            .context("Unable to load the config file")?;
        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version <= CONFIG_VERSION,
            "The config file version {} is newer than this version of spendly supports",
            config.config_version
        );
        Ok(config)
    }

    async fn save(&self, path: &Path) -> Res<()> {
        utils::serialize(path, self)
            .await
            .context("Unable to write config file")
    }
}

/// The contents of `session.json`: who is logged in on this machine.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub(crate) struct SessionFile {
    pub(crate) user_id: String,
    pub(crate) email: String,
    pub(crate) logged_in_at: DateTime<Utc>,
}
