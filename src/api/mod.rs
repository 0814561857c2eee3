//! The client seam for submitting journal entries to the external accounting
//! system. The production implementation talks to an MCP server over a child
//! process; the test implementation records submissions in memory.

mod mcp_client;
mod test_client;

use crate::model::Payload;
use crate::{Config, Result};

pub(crate) use test_client::TestJournal;

/// The MCP tool that creates one journal entry from a payload document.
pub(crate) const CREATE_JOURNAL_ENTRY: &str = "create_journal_entry";

/// Whether we talk to the real accounting MCP server or to the in-memory test
/// journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    Testing,
}

impl Mode {
    /// Returns `Mode::Testing` when `EQCLOSE_IN_TEST_MODE` is set and
    /// non-empty, otherwise `Mode::Live`. This allows running the whole
    /// program end-to-end without an accounting system.
    pub fn from_env() -> Self {
        match std::env::var("EQCLOSE_IN_TEST_MODE") {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Live,
        }
    }
}

/// Submits journal-entry payloads. One implementation per [`Mode`].
#[async_trait::async_trait]
pub(crate) trait Journal {
    /// Submits one payload and returns the server's response text.
    async fn create_journal_entry(&mut self, payload: &Payload) -> Result<String>;
}

/// Creates the `Journal` implementation for `mode`. The live client spawns
/// the configured MCP server process and keeps it alive for the lifetime of
/// the returned client.
pub(crate) async fn journal(config: &Config, mode: Mode) -> Result<Box<dyn Journal + Send>> {
    match mode {
        Mode::Live => Ok(Box::new(
            mcp_client::McpJournal::connect(config.mcp_command(), config.mcp_args()).await?,
        )),
        Mode::Testing => Ok(Box::new(TestJournal)),
    }
}
