//! cache_purge tool implementation.
//!
//! Deletes one named generation, or every generation except the active one.
//! The active generation is never deleted.

use freshgate_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete this generation.
    pub name: Option<String>,

    /// Delete every generation except the active one.
    #[serde(default)]
    pub all_stale: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Names of the deleted generations.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(gateway: &Gateway, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let active = gateway.generation();

    let deleted = match (params.name, params.all_stale) {
        (Some(_), true) => {
            return Err(Error::InvalidInput("specify either name or all_stale, not both".into()).into());
        }
        (Some(name), false) => {
            if name == active {
                return Err(Error::GenerationActive(name).into());
            }
            if !gateway.db().delete_generation(&name).await? {
                return Err(Error::UnknownGeneration(name).into());
            }
            vec![name]
        }
        (None, true) => gateway.db().delete_generations_except(active).await?,
        (None, false) => {
            return Err(Error::InvalidInput("one of name or all_stale must be specified".into()).into());
        }
    };

    tracing::info!(deleted = ?deleted, "purged generations");

    let output = CachePurgeOutput { deleted };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
