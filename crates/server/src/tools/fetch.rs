//! gateway_fetch tool implementation.
//!
//! Dispatches one request description through the fetch policy router and
//! reports the routed response.

use std::collections::BTreeMap;

use freshgate_core::{Error, RequestRecord, ResponseRecord};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::gateway::Gateway;

/// Parameters for the gateway_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GatewayFetchParams {
    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Whether this is a top-level navigation.
    #[serde(default)]
    pub navigate: bool,

    /// Fetch destination such as `document`, `script` or `image`.
    #[serde(default)]
    pub destination: Option<String>,

    /// Request body as text.
    #[serde(default)]
    pub body: Option<String>,

    /// Response the host already obtained through navigation preload.
    /// Ignored unless navigation preload is enabled.
    #[serde(default)]
    pub preload: Option<PreloadResponse>,
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PreloadResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

/// Output from the gateway_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GatewayFetchOutput {
    pub url: String,
    /// Routing category (`document`, `static-versioned`, ...).
    pub category: String,
    /// Where the response came from: network, preload, cache, or fallback.
    pub served_from: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, invalid sequences replaced.
    pub body: String,
    pub body_bytes: usize,
}

/// Build a validated request from tool parameters.
pub fn build_request(gateway: &Gateway, params: GatewayFetchParams) -> Result<RequestRecord, Error> {
    let url = params.url.trim();
    if url.is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }

    let absolute = if url.starts_with('/') {
        gateway
            .router()
            .classifier()
            .origin()
            .join(url)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?
            .to_string()
    } else {
        url.to_string()
    };

    let mut request = RequestRecord::new(&params.method, &absolute)?;
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if params.navigate {
        request = request.navigation();
    }
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(destination);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    match params.preload {
        Some(preload) if gateway.preload_enabled() => {
            let mut response = ResponseRecord::new(preload.status).with_body(preload.body);
            for (name, value) in &preload.headers {
                response.set_header(name, value);
            }
            request = request.with_preload(response);
        }
        Some(_) => tracing::debug!("navigation preload disabled; ignoring preload response"),
        None => {}
    }

    Ok(request)
}

/// Implementation of the gateway_fetch tool.
pub async fn fetch_impl(gateway: &Gateway, params: GatewayFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(gateway, params)?;
    let routed = gateway.dispatch(&request).await;

    let output = GatewayFetchOutput {
        url: request.url().to_string(),
        category: routed.category.as_str().to_string(),
        served_from: routed.served_from.as_str().to_string(),
        status: routed.response.status,
        body: routed.response.text(),
        body_bytes: routed.response.body.len(),
        headers: routed.response.headers,
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
