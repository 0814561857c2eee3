//! The persisted approval ledger, stored in SQLite.
//!
//! The ledger has one row per generated batch. The restricted status domains
//! are enforced in the schema with CHECK constraints, so a bad status string
//! can never be written even through ad-hoc SQL.

mod migrations;

use crate::model::{ApprovalStatus, LedgerEntry, PushStatus};
use crate::Result;
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

/// The schema version this build of the program requires.
const TARGET_SCHEMA_VERSION: i32 = 1;

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Creates a new SQLite file at `path` and initializes the schema.
    /// Returns an error if a file already exists there.
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!(
                "A ledger database already exists at '{}'",
                path.display()
            );
        }
        let pool = connect(path, true).await?;

        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to write initial schema version")?;

        migrations::run(&pool, 0, TARGET_SCHEMA_VERSION).await?;
        Ok(Self { pool })
    }

    /// Opens an existing SQLite file at `path`, running migrations if the
    /// schema is out of date.
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The ledger database is missing at '{}'", path.display());
        }
        let pool = connect(path, false).await?;

        let (current,): (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&pool)
            .await
            .context("Failed to read the schema version")?;
        migrations::run(&pool, current, TARGET_SCHEMA_VERSION).await?;
        Ok(Self { pool })
    }

    /// Appends a new ledger row and returns its id.
    pub(crate) async fn append_entry(&self, entry: &LedgerEntry) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO ledger_entries \
             (date, file_name, file_link, approval, payload_us, payload_ca, push_status, response) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.date)
        .bind(&entry.file_name)
        .bind(&entry.file_link)
        .bind(entry.approval.to_string())
        .bind(&entry.payload_us)
        .bind(&entry.payload_ca)
        .bind(entry.push_status.to_string())
        .bind(&entry.response)
        .execute(&self.pool)
        .await
        .context("Failed to append a ledger row")?;
        Ok(result.last_insert_rowid())
    }

    pub(crate) async fn get_entry(&self, id: i64) -> Result<LedgerEntry> {
        let row = sqlx::query("SELECT * FROM ledger_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query the ledger")?;
        match row {
            Some(row) => to_entry(&row),
            None => bail!("No ledger row with id {id}"),
        }
    }

    /// Returns every ledger row, oldest first.
    pub(crate) async fn list_entries(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query("SELECT * FROM ledger_entries ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list the ledger")?;
        rows.iter().map(to_entry).collect()
    }

    /// Sets the human approval decision on one row.
    pub(crate) async fn set_approval(&self, id: i64, status: ApprovalStatus) -> Result<()> {
        let result = sqlx::query("UPDATE ledger_entries SET approval = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update the approval status")?;
        if result.rows_affected() == 0 {
            bail!("No ledger row with id {id}");
        }
        Ok(())
    }

    /// Returns the rows the push step should submit: approved, and not yet
    /// pushed successfully. A previous `Fail` stays eligible for retry.
    pub(crate) async fn approved_unpushed(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM ledger_entries \
             WHERE approval = 'Approved' AND push_status != 'Pass' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query for pushable ledger rows")?;
        rows.iter().map(to_entry).collect()
    }

    /// Records the outcome of the push step for one row.
    pub(crate) async fn record_push(
        &self,
        id: i64,
        status: PushStatus,
        response: &str,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE ledger_entries SET push_status = ?, response = ? WHERE id = ?")
                .bind(status.to_string())
                .bind(response)
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to record the push outcome")?;
        if result.rows_affected() == 0 {
            bail!("No ledger row with id {id}");
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .context("Failed to parse the SQLite connection string")?
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open the SQLite database at {}", path.display()))
}

fn to_entry(row: &SqliteRow) -> Result<LedgerEntry> {
    let approval: String = row.try_get("approval")?;
    let push_status: String = row.try_get("push_status")?;
    Ok(LedgerEntry {
        id: row.try_get("id")?,
        date: row.try_get("date")?,
        file_name: row.try_get("file_name")?,
        file_link: row.try_get("file_link")?,
        approval: ApprovalStatus::from_str(&approval)
            .with_context(|| format!("Unknown approval status '{approval}'"))?,
        payload_us: row.try_get("payload_us")?,
        payload_ca: row.try_get("payload_ca")?,
        push_status: PushStatus::from_str(&push_status)
            .with_context(|| format!("Unknown push status '{push_status}'"))?,
        response: row.try_get("response")?,
    })
}
