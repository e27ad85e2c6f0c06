//! Intercepting HTTP proxy.
//!
//! Every inbound request, whatever its path or method, is converted to a
//! [`RequestRecord`] against the configured origin and dispatched through the
//! gateway. The routed response is returned as-is.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use freshgate_core::{Error, RequestRecord, ResponseRecord};

use crate::gateway::Gateway;

/// Connection-scoped headers never copied across the proxy.
const HOP_BY_HOP: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "content-length",
];

/// Build the proxy router: a single fallback handler for every request.
pub fn app(gateway: Arc<Gateway>) -> Router {
    Router::new().fallback(intercept).with_state(gateway)
}

/// Bind `addr` and serve until the listener fails.
pub async fn serve(addr: &str, gateway: Arc<Gateway>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, "proxy listening");
    axum::serve(listener, app(gateway)).await?;
    Ok(())
}

async fn intercept(State(gateway): State<Arc<Gateway>>, request: Request) -> Response {
    match to_record(&gateway, request).await {
        Ok(record) => into_response(gateway.dispatch(&record).await.response),
        Err(e) => {
            tracing::warn!(error = %e, "rejected inbound request");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Translate an inbound request into a request against the origin.
///
/// `sec-fetch-mode: navigate` marks a navigation and `sec-fetch-dest` sets
/// the destination, mirroring what a browser tells its request interceptor.
async fn to_record(gateway: &Gateway, request: Request) -> Result<RequestRecord, Error> {
    let (parts, body) = request.into_parts();

    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = gateway
        .router()
        .classifier()
        .origin()
        .join(target)
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut record = RequestRecord::new(parts.method.as_str(), url.as_str())?;
    for (name, value) in &parts.headers {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        let Ok(value) = value.to_str() else {
            continue;
        };
        record = record.with_header(name.as_str(), value);
    }

    if record.header("sec-fetch-mode") == Some("navigate") {
        record = record.navigation();
    }
    if let Some(dest) = record.header("sec-fetch-dest").map(str::to_string) {
        record = record.with_destination(&dest);
    }

    let bytes = to_bytes(body, gateway.config().max_bytes)
        .await
        .map_err(|e| Error::InvalidRequest(format!("failed to read request body: {e}")))?;
    if !bytes.is_empty() {
        record = record.with_body(bytes);
    }

    Ok(record)
}

fn into_response(record: ResponseRecord) -> Response {
    let status = StatusCode::from_u16(record.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::new(Body::from(record.body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &record.headers {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::debug!(header = %name, "dropping unrepresentable response header"),
        }
    }

    response
}
