//! Implements the `Journal` trait using in-memory state for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so
//! that we can run the whole app, top-to-bottom, without an accounting
//! system.

use crate::api::Journal;
use crate::model::Payload;
use crate::Result;
use anyhow::bail;
use std::sync::{Mutex, OnceLock, PoisonError};

/// The shared state behind every `TestJournal`. Tests that inspect it should
/// use distinct payload memos, since the state is process-wide.
#[derive(Debug, Default, Clone)]
pub(crate) struct TestJournalState {
    /// Every payload accepted so far, in submission order.
    pub(crate) submitted: Vec<Payload>,
    /// Memo substrings that cause a simulated rejection.
    pub(crate) fail_memos: Vec<String>,
}

fn state() -> &'static Mutex<TestJournalState> {
    static STATE: OnceLock<Mutex<TestJournalState>> = OnceLock::new();
    STATE.get_or_init(Mutex::default)
}

/// An implementation of the `Journal` trait that records submissions in
/// memory and can be told to reject payloads by memo.
pub(crate) struct TestJournal;

impl TestJournal {
    pub(crate) fn get_state() -> TestJournalState {
        state()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Marks payloads whose memo contains `memo` for simulated rejection.
    pub(crate) fn fail_memo(memo: impl Into<String>) {
        state()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_memos
            .push(memo.into());
    }
}

#[async_trait::async_trait]
impl Journal for TestJournal {
    async fn create_journal_entry(&mut self, payload: &Payload) -> Result<String> {
        let mut state = state().lock().unwrap_or_else(PoisonError::into_inner);
        if state
            .fail_memos
            .iter()
            .any(|memo| payload.memo.contains(memo.as_str()))
        {
            bail!("Simulated rejection of '{}'", payload.memo);
        }
        state.submitted.push(payload.clone());
        Ok(format!(
            "Created journal entry '{}' with {} lines",
            payload.memo,
            payload.lines.len()
        ))
    }
}
