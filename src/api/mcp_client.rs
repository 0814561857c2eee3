//! Implements the `Journal` trait against a real accounting MCP server.
//!
//! The server is spawned as a child process speaking MCP over stdio and the
//! single `create_journal_entry` tool is called once per payload.

use crate::api::{Journal, CREATE_JOURNAL_ENTRY};
use crate::model::Payload;
use crate::Result;
use anyhow::{bail, Context};
use rmcp::model::CallToolRequestParam;
use rmcp::service::RunningService;
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use tokio::process::Command;
use tracing::{debug, info};

/// An MCP client holding a running accounting server child process.
pub(super) struct McpJournal {
    service: RunningService<RoleClient, ()>,
}

impl McpJournal {
    /// Spawns the configured MCP server and completes the protocol handshake.
    pub(super) async fn connect(command: &str, args: &[String]) -> Result<Self> {
        info!("Starting accounting MCP server: {command}");
        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(args);
        }))
        .with_context(|| format!("Failed to spawn MCP server process '{command}'"))?;
        let service = ()
            .serve(transport)
            .await
            .context("Failed to initialize the MCP client")?;
        Ok(Self { service })
    }
}

#[async_trait::async_trait]
impl Journal for McpJournal {
    async fn create_journal_entry(&mut self, payload: &Payload) -> Result<String> {
        let arguments = match serde_json::to_value(payload)? {
            serde_json::Value::Object(map) => map,
            other => bail!("Payload serialized to {other:?} instead of a JSON object"),
        };

        debug!(
            "Calling {CREATE_JOURNAL_ENTRY} for '{}' with {} lines",
            payload.memo,
            payload.lines.len()
        );
        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: CREATE_JOURNAL_ENTRY.into(),
                arguments: Some(arguments),
            })
            .await
            .with_context(|| format!("The {CREATE_JOURNAL_ENTRY} tool call failed"))?;

        let response =
            serde_json::to_string(&result).unwrap_or_else(|_| format!("{result:?}"));
        if result.is_error.unwrap_or(false) {
            bail!("The accounting system rejected '{}': {response}", payload.memo);
        }
        Ok(response)
    }
}
