//! MCP tool implementations.
//!
//! This module contains all tools exposed by the freshgate server.

pub mod cache;
pub mod fetch;
pub mod lifecycle;

/// Parse the JSON text carried by a successful tool result.
#[cfg(test)]
pub(crate) fn output_json(result: &rmcp::model::CallToolResult) -> serde_json::Value {
    let content = serde_json::to_value(&result.content[0]).unwrap();
    let text = content
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
