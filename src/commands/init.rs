use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory and:
/// - Creates an initial `config.json` file with default settings
/// - Creates the payload and review subdirectories
/// - Initializes the approval ledger database
///
/// # Errors
/// - Returns an error if the directory is already initialized or any file
///   operations fail.
pub async fn init(eqclose_home: &Path) -> Result<Out<()>> {
    let config = Config::create(eqclose_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the eqclose directory at '{}'",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_home() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("eqclose");
        let out = init(&home).await.unwrap();
        assert!(out.message().contains("Successfully created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join("eqclose.sqlite").is_file());
    }
}
