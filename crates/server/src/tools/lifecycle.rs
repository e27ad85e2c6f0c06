//! lifecycle_status tool implementation.

use freshgate_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};

use crate::gateway::Gateway;

/// Report the lifecycle state, host flags, and boot-time reports.
pub async fn status_impl(gateway: &Gateway) -> Result<CallToolResult, McpError> {
    let status = gateway.status().await;
    let json = serde_json::to_string_pretty(&status)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize status: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{gateway, origin};
    use crate::tools::output_json;

    #[tokio::test]
    async fn test_status_reports_active_generation() {
        let server = origin().await;
        let gateway = gateway(&server).await;

        let output = output_json(&status_impl(&gateway).await.unwrap());
        assert_eq!(output["state"], "active");
        assert_eq!(output["generation"], "freshgate-5");
        assert_eq!(output["asset_version"], "5");
        assert_eq!(output["install"]["precached"].as_array().unwrap().len(), 3);
        assert_eq!(output["activate"]["effects"][0]["effect"], "enable_navigation_preload");
    }
}
