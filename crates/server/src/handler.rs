//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::gateway::Gateway;
use crate::tools::cache::{CacheGetParams, CachePurgeParams, generations_impl, get_impl, purge_impl};
use crate::tools::fetch::{GatewayFetchParams, fetch_impl};
use crate::tools::lifecycle::status_impl;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for freshgate.
#[derive(Clone)]
pub struct FreshgateServer {
    gateway: Arc<Gateway>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FreshgateServer {
    /// Create a new server handler over a booted gateway.
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway, tool_router: Self::tool_router() }
    }

    /// Dispatch one request description through the fetch policy router.
    #[tool(
        description = "Route one request through the caching layer. Returns the category, where the response was served from, status, headers and body."
    )]
    async fn gateway_fetch(&self, params: Parameters<GatewayFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.gateway, params.0).await
    }

    #[tool(description = "Report the lifecycle state, active generation, host effects, and install/activate reports.")]
    async fn lifecycle_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.gateway).await
    }

    #[tool(description = "Look up a stored response in the active generation by method and absolute URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.gateway, params.0).await
    }

    #[tool(description = "List stored cache generations with their entry counts.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.gateway).await
    }

    /// Delete stale generations. The active generation is refused.
    #[tool(description = "Delete a named non-active generation, or every generation except the active one.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.gateway, params.0).await
    }
}

impl ServerHandler for FreshgateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "freshgate".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{gateway, origin};

    #[tokio::test]
    async fn test_all_tools_registered() {
        let server = origin().await;
        let handler = FreshgateServer::new(Arc::new(gateway(&server).await));

        let mut names: Vec<String> = handler
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["cache_generations", "cache_get", "cache_purge", "gateway_fetch", "lifecycle_status"]
        );
    }
}
