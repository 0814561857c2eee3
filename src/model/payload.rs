//! The journal-entry payload submitted to the external accounting system.

use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The approval-status literal the external system expects on a new entry.
pub const PENDING_APPROVAL: &str = "Pending Approval";

/// One line of a journal-entry payload. External identifiers are integers
/// with 0 meaning unresolved; `debit` and `credit` are mutually exclusive and
/// rounded to two decimals.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PayloadLine {
    pub account: i64,
    pub debit: Amount,
    pub credit: Amount,
    pub department: i64,
    pub class: i64,
    pub location: i64,
    pub memo: String,
    /// Placeholder; the external system derives the entity from the
    /// subsidiary on the header.
    pub entity: i64,
}

/// A journal-entry document for one subsidiary.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub subsidiary: i64,
    /// Always the last calendar day of the month preceding the run date.
    pub tran_date: NaiveDate,
    pub memo: String,
    pub lines: Vec<PayloadLine>,
    pub approval_status: String,
}

impl Payload {
    pub fn new(subsidiary: i64, tran_date: NaiveDate, memo: impl Into<String>) -> Self {
        Self {
            subsidiary,
            tran_date,
            memo: memo.into(),
            lines: Vec::new(),
            approval_status: PENDING_APPROVAL.to_string(),
        }
    }

    /// Sum of all line debits.
    pub fn total_debit(&self) -> Amount {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of all line credits.
    pub fn total_credit(&self) -> Amount {
        self.lines.iter().map(|l| l.credit).sum()
    }
}
