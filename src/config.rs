//! Configuration file handling.
//!
//! The configuration file is stored at `$EQCLOSE_HOME/config.json`. Every
//! domain constant the close pipeline uses (entity groups, sheet names,
//! chart-of-accounts strings, the MCP server command) lives here with a
//! default, so a run can be re-pointed at a different ledger structure
//! without rebuilding the program.

use crate::db::Db;
use crate::pipeline::ChartOfAccounts;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "eqclose";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const LEDGER_SQLITE: &str = "eqclose.sqlite";
const PAYLOADS: &str = "payloads";
const REVIEW: &str = "review";

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$EQCLOSE_HOME` and from there it
/// loads `$EQCLOSE_HOME/config.json`, the ledger database and the paths to
/// the payload and review-workbook directories.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
    payloads: PathBuf,
    review: PathBuf,
}

impl Config {
    /// Creates the data directory and its subdirectories, writes an initial
    /// `config.json` with default settings and initializes the ledger
    /// database. Errors if the directory was already initialized.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the eqclose home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            bail!(
                "The directory is already initialized, a config file exists at '{}'",
                config_path.display()
            );
        }

        let payloads = root.join(PAYLOADS);
        utils::make_dir(&payloads).await?;
        let review = root.join(REVIEW);
        utils::make_dir(&review).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(LEDGER_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create the ledger database")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
            payloads,
            review,
        })
    }

    /// Validates that `eqclose_home` and the config file exist, loads the
    /// config file and the ledger database, and returns the loaded
    /// configuration object.
    pub async fn load(eqclose_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = eqclose_home.into();
        let root = utils::canonicalize(&maybe_relative).await?;

        let _ = utils::read_dir(&root)
            .await
            .context("Eqclose home is missing, run `eqclose init` first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(LEDGER_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load the ledger database")?;

        let config = Self {
            root: root.clone(),
            config_path,
            config_file,
            db,
            sqlite_path,
            payloads: root.join(PAYLOADS),
            review: root.join(REVIEW),
        };
        if !config.payloads.is_dir() {
            bail!(
                "The payloads directory is missing '{}'",
                config.payloads.display()
            )
        }
        if !config.review.is_dir() {
            bail!(
                "The review directory is missing '{}'",
                config.review.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    /// Where generated payload JSON files are written.
    pub fn payloads(&self) -> &Path {
        &self.payloads
    }

    /// Where generated review workbooks are written.
    pub fn review(&self) -> &Path {
        &self.review
    }

    pub fn file(&self) -> &ConfigFile {
        &self.config_file
    }

    pub fn mcp_command(&self) -> &str {
        &self.config_file.mcp_command
    }

    pub fn mcp_args(&self) -> &[String] {
        &self.config_file.mcp_args
    }
}

/// One legal-entity group: the entities whose rows roll into one journal
/// entry, and the subsidiary that entry posts to.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    /// Short label used in memos and entry descriptions, e.g. "US".
    label: String,
    /// Full entity names as they appear in the amortization sheet. The first
    /// one is used on the summary line.
    entities: Vec<String>,
    /// The external system's subsidiary id for this group.
    subsidiary: i64,
    /// The entry sheet name in the review workbook.
    sheet_name: String,
    /// The payload JSON file name.
    payload_file: String,
}

impl EntityGroup {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn subsidiary(&self) -> i64 {
        self.subsidiary
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn payload_file(&self) -> &str {
        &self.payload_file
    }
}

/// Represents the serialization and deserialization format of the
/// configuration file. Every field has a default so a minimal file with only
/// `app_name` and `config_version` is valid.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ConfigFile {
    /// Application name, should always be "eqclose"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The amortization sheet name in the source workbook.
    #[serde(default = "default_amortization_sheet")]
    amortization_sheet: String,

    /// Fallback amortization sheet name, used when the primary is absent.
    #[serde(default = "default_amortization_fallback_sheet")]
    amortization_fallback_sheet: String,

    /// The journal-entry sheet name in the source workbook.
    #[serde(default = "default_journal_sheet")]
    journal_sheet: String,

    /// Sheet names in the mapping workbook, one per dimension.
    #[serde(default = "default_account_sheet")]
    account_sheet: String,
    #[serde(default = "default_department_sheet")]
    department_sheet: String,
    #[serde(default = "default_class_sheet")]
    class_sheet: String,
    #[serde(default = "default_location_sheet")]
    location_sheet: String,

    /// The legal-entity groups, one journal entry each.
    #[serde(default = "default_entity_groups")]
    entity_groups: Vec<EntityGroup>,

    /// The fixed accounts and dimensions on generated entries.
    #[serde(default)]
    chart: ChartOfAccounts,

    /// The accounting MCP server command and its arguments.
    #[serde(default = "default_mcp_command")]
    mcp_command: String,
    #[serde(default)]
    mcp_args: Vec<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            amortization_sheet: default_amortization_sheet(),
            amortization_fallback_sheet: default_amortization_fallback_sheet(),
            journal_sheet: default_journal_sheet(),
            account_sheet: default_account_sheet(),
            department_sheet: default_department_sheet(),
            class_sheet: default_class_sheet(),
            location_sheet: default_location_sheet(),
            entity_groups: default_entity_groups(),
            chart: ChartOfAccounts::default(),
            mcp_command: default_mcp_command(),
            mcp_args: Vec::new(),
        }
    }
}

fn default_amortization_sheet() -> String {
    "Expense (Amortization)".to_string()
}

fn default_amortization_fallback_sheet() -> String {
    "Raw".to_string()
}

fn default_journal_sheet() -> String {
    "Expense (Journal Entries)".to_string()
}

fn default_account_sheet() -> String {
    "Account".to_string()
}

fn default_department_sheet() -> String {
    "Department".to_string()
}

fn default_class_sheet() -> String {
    "Class".to_string()
}

fn default_location_sheet() -> String {
    "Location".to_string()
}

fn default_mcp_command() -> String {
    "netsuite-mcp".to_string()
}

fn default_entity_groups() -> Vec<EntityGroup> {
    vec![
        EntityGroup {
            label: "US".to_string(),
            entities: vec![
                "Gusto Inc Global : Gusto Inc US".to_string(),
                "Gusto Inc Global : Gusto Inc US : ZP Insurance LLC".to_string(),
            ],
            subsidiary: 1,
            sheet_name: "Entry - Gusto Inc US".to_string(),
            payload_file: "SBC_Payload_US.json".to_string(),
        },
        EntityGroup {
            label: "Canada".to_string(),
            entities: vec!["Gusto Inc Global : Gusto Canada ULC".to_string()],
            subsidiary: 5,
            sheet_name: "Entry - Canada ($USD)".to_string(),
            payload_file: "SBC_Payload_CA.json".to_string(),
        },
    ]
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    pub fn amortization_sheet(&self) -> &str {
        &self.amortization_sheet
    }

    pub fn amortization_fallback_sheet(&self) -> &str {
        &self.amortization_fallback_sheet
    }

    pub fn journal_sheet(&self) -> &str {
        &self.journal_sheet
    }

    pub fn account_sheet(&self) -> &str {
        &self.account_sheet
    }

    pub fn department_sheet(&self) -> &str {
        &self.department_sheet
    }

    pub fn class_sheet(&self) -> &str {
        &self.class_sheet
    }

    pub fn location_sheet(&self) -> &str {
        &self.location_sheet
    }

    pub fn entity_groups(&self) -> &[EntityGroup] {
        &self.entity_groups
    }

    /// Every entity that belongs to some group; the aggregation filter.
    pub fn target_entities(&self) -> Vec<String> {
        self.entity_groups
            .iter()
            .flat_map(|g| g.entities.iter().cloned())
            .collect()
    }

    pub fn chart(&self) -> &ChartOfAccounts {
        &self.chart
    }
}
