//! The `push` command: submits every approved, not-yet-pushed batch to the
//! accounting system and records the outcome on the ledger row.

use crate::api::{self, Mode};
use crate::commands::Out;
use crate::model::{Payload, PushStatus};
use crate::{utils, Config, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Structured output of one push run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PushSummary {
    /// Batch ids whose payloads were all accepted.
    pub pushed: Vec<i64>,
    /// Batch ids where at least one payload was rejected.
    pub failed: Vec<i64>,
}

pub async fn push(config: Config, mode: Mode) -> Result<Out<PushSummary>> {
    let batches = config.db().approved_unpushed().await?;
    if batches.is_empty() {
        return Ok("Nothing to push; no approved batch is waiting".into());
    }

    let mut client = api::journal(&config, mode).await?;
    let mut summary = PushSummary::default();
    for batch in batches {
        let mut outcomes = Vec::new();
        let mut failed = false;
        for path in [&batch.payload_us, &batch.payload_ca] {
            match submit(client.as_mut(), Path::new(path)).await {
                Ok(response) => outcomes.push(response),
                Err(e) => {
                    failed = true;
                    outcomes.push(format!("FAILED: {e:#}"));
                }
            }
        }
        let status = if failed {
            PushStatus::Fail
        } else {
            PushStatus::Pass
        };
        config
            .db()
            .record_push(batch.id, status, &outcomes.join("\n"))
            .await?;
        if failed {
            warn!("Batch {} failed to push; it stays retryable", batch.id);
            summary.failed.push(batch.id);
        } else {
            info!("Pushed batch {}", batch.id);
            summary.pushed.push(batch.id);
        }
    }

    let message = format!(
        "Pushed {} batch(es), {} failed",
        summary.pushed.len(),
        summary.failed.len()
    );
    Ok(Out::new(message, summary))
}

async fn submit(client: &mut (dyn api::Journal + Send), path: &Path) -> Result<String> {
    let payload: Payload = utils::deserialize(path).await?;
    client.create_journal_entry(&payload).await
}
