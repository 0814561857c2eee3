//! Row types for the persisted approval/status ledger.
//!
//! The ledger records one row per generated batch and is append-only: the
//! only mutation a row ever sees is the human approval decision and, later,
//! the outcome of the push step.

use serde::{Deserialize, Serialize};

/// Human approval state for a generated batch.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "PascalCase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

serde_plain::derive_display_from_serialize!(ApprovalStatus);
serde_plain::derive_fromstr_from_deserialize!(ApprovalStatus);

/// Outcome of the push step for a batch. `Fail` covers partial failure: if
/// one of the two payloads fails, the whole row is `Fail` even though the
/// other outcome is still recorded in the response text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PushStatus {
    #[default]
    Pending,
    Pass,
    Fail,
}

serde_plain::derive_display_from_serialize!(PushStatus);
serde_plain::derive_fromstr_from_deserialize!(PushStatus);

/// One persisted ledger row. Created once per successful generation run with
/// `approval = Pending`; mutated exactly once by the push step.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Database row id; 0 until persisted.
    pub id: i64,
    /// Run date, `YYYY-MM-DD`.
    pub date: String,
    /// Generated workbook file name.
    pub file_name: String,
    /// Absolute path to the generated workbook.
    pub file_link: String,
    pub approval: ApprovalStatus,
    /// Absolute path to the US payload JSON.
    pub payload_us: String,
    /// Absolute path to the Canada payload JSON.
    pub payload_ca: String,
    pub push_status: PushStatus,
    /// Concatenated per-payload submission outcomes.
    pub response: String,
}
