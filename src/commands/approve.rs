use crate::args::BatchArgs;
use crate::commands::Out;
use crate::model::ApprovalStatus;
use crate::{Config, Result};
use anyhow::Context;

/// Marks a ledger batch as approved so `push` will pick it up.
pub async fn approve(config: Config, args: BatchArgs) -> Result<Out<()>> {
    set(config, args.batch_id(), ApprovalStatus::Approved).await
}

/// Marks a ledger batch as rejected. A rejected batch is never pushed.
pub async fn reject(config: Config, args: BatchArgs) -> Result<Out<()>> {
    set(config, args.batch_id(), ApprovalStatus::Rejected).await
}

async fn set(config: Config, batch_id: i64, status: ApprovalStatus) -> Result<Out<()>> {
    config
        .db()
        .set_approval(batch_id, status)
        .await
        .with_context(|| format!("Unable to update batch {batch_id}"))?;
    Ok(format!("Batch {batch_id} is now {status}").into())
}
