//! cache_get tool implementation.
//!
//! Looks up one stored response in the active generation.

use freshgate_core::cache::hash::entry_key;
use freshgate_core::{Error, RequestRecord};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL of the stored request, including its version parameter.
    pub url: String,

    /// HTTP method of the stored request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub key: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub inserted_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(gateway: &Gateway, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let request = RequestRecord::new(&params.method, &params.url)?;
    let key = entry_key(request.method(), request.url().as_str());

    let entry = gateway
        .db()
        .generation(gateway.generation())
        .get(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.clone()))?;

    let output = CacheGetOutput {
        generation: gateway.generation().to_string(),
        key: entry.key,
        status: entry.response.status,
        body: entry.response.text(),
        headers: entry.response.headers,
        inserted_at: entry.inserted_at,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{gateway, origin};
    use crate::tools::output_json;

    #[tokio::test]
    async fn test_get_impl_missing() {
        let server = origin().await;
        let gateway = gateway(&server).await;

        let params = CacheGetParams { url: format!("{}/static/nope.js?v=5", server.uri()), method: "GET".into() };
        let err = get_impl(&gateway, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let server = origin().await;
        let gateway = gateway(&server).await;

        let params = CacheGetParams { url: format!("{}/static/app.css?v=5", server.uri()), method: "get".into() };
        let output = output_json(&get_impl(&gateway, params).await.unwrap());

        assert_eq!(output["generation"], "freshgate-5");
        assert_eq!(output["status"], 200);
        assert_eq!(output["body"], "body{}");
    }
}
