//! cache_generations tool implementation.

use freshgate_core::{Error, GenerationInfo};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    /// Generation the router reads and writes.
    pub active: String,
    pub generations: Vec<GenerationInfo>,
}

/// List stored generations with their entry counts.
pub async fn generations_impl(gateway: &Gateway) -> Result<CallToolResult, McpError> {
    let generations = gateway.db().list_generations().await?;
    let output = CacheGenerationsOutput { active: gateway.generation().to_string(), generations };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
