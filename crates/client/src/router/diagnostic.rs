//! Diagnostic endpoints rendered as readable pages.

use std::time::Instant;

use freshgate_core::{RequestRecord, ResponseRecord};

use super::{FetchPolicyRouter, ServedFrom, html_response};
use crate::render::{Page, format_diagnostic_body, render_page};

impl FetchPolicyRouter {
    /// Fetch the endpoint as JSON and wrap the result in an HTML page.
    ///
    /// The page keeps the upstream status; a network failure becomes a 503
    /// page carrying the error text instead of a body.
    pub(super) async fn diagnostic(&self, request: &RequestRecord) -> (ResponseRecord, ServedFrom) {
        let probe = request
            .clone()
            .set_header("accept", "application/json")
            .set_header("cache-control", "no-store");

        let started = Instant::now();
        let result = self.network.fetch(&probe).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        let href = self.resolve_return_href().await;
        let title = request.url().path();

        match result {
            Ok(upstream) => {
                let body = format_diagnostic_body(&upstream.body, upstream.content_type(), self.diagnostic_body_limit);
                let html = render_page(&Page {
                    title,
                    status: Some(upstream.status),
                    latency_ms: Some(latency_ms),
                    body: &body,
                    return_href: &href,
                });
                (html_response(upstream.status, html), ServedFrom::Network)
            }
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "diagnostic fetch failed");
                let body = e.to_string();
                let html = render_page(&Page {
                    title,
                    status: None,
                    latency_ms: Some(latency_ms),
                    body: &body,
                    return_href: &href,
                });
                (html_response(503, html), ServedFrom::Fallback)
            }
        }
    }

    /// Link target for fallback pages: the shell when it answers, else `/`.
    ///
    /// Probes with HEAD first and retries with GET for servers that reject
    /// HEAD.
    pub(super) async fn resolve_return_href(&self) -> String {
        for method in ["HEAD", "GET"] {
            let Ok(probe) = RequestRecord::new(method, self.shell_url.as_str()) else {
                continue;
            };
            match self.network.fetch(&probe.set_header("cache-control", "no-store")).await {
                Ok(response) if response.is_success() => return self.shell_path.clone(),
                Ok(response) => tracing::debug!(method, status = response.status, "shell probe rejected"),
                Err(e) => tracing::debug!(method, error = %e, "shell probe failed"),
            }
        }
        "/".to_string()
    }
}
