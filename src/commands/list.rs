use crate::commands::Out;
use crate::model::LedgerEntry;
use crate::{Config, Result};
use std::fmt::Write;

/// Prints the approval ledger, oldest batch first.
pub async fn list(config: Config) -> Result<Out<Vec<LedgerEntry>>> {
    let entries = config.db().list_entries().await?;
    if entries.is_empty() {
        return Ok("The ledger is empty; run `eqclose generate` first".into());
    }

    let mut message = String::from("id | date | approval | push | workbook");
    for entry in &entries {
        // Infallible for String, but write! is fallible by signature.
        let _ = write!(
            message,
            "\n{} | {} | {} | {} | {}",
            entry.id, entry.date, entry.approval, entry.push_status, entry.file_name
        );
    }
    Ok(Out::new(message, entries))
}
