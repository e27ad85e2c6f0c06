//! Fetch policy routing.
//!
//! Every intercepted request goes through two steps:
//!
//! 1. [`FetchPolicyRouter::plan`] classifies the request and picks a
//!    strategy. This step is pure and never touches the network or store.
//! 2. [`FetchPolicyRouter::handle`] executes the plan and always returns a
//!    well-formed response, degrading to a fallback when the network fails.
//!
//! | Plan           | Store        | On network failure                 |
//! |----------------|--------------|------------------------------------|
//! | `Document`     | never        | precached shell or offline page    |
//! | `Diagnostic`   | never        | error page with return link        |
//! | `Api`          | never        | retry, then 503 JSON               |
//! | `CacheFirst`   | read + write | 503                                |
//! | `StaleVersion` | never        | 503 `stale-unavailable`, no body   |
//! | `Manifest`     | never        | 503                                |
//! | `NetworkOnly`  | never        | 503                                |

mod diagnostic;

use std::sync::Arc;

use freshgate_core::cache::hash::entry_key;
use freshgate_core::{AppConfig, CacheDb, Error, RequestRecord, ResponseRecord, SOURCE_HEADER, STATUS_HEADER};
use serde::Serialize;
use url::Url;

use crate::classify::{Category, RequestClassifier};
use crate::fetch::{Network, resolve, stamp_version};
use crate::render::offline_page;

const MANIFEST_CONTENT_TYPE: &str = "application/manifest+json; charset=utf-8";

/// Strategy chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Document,
    Diagnostic,
    Manifest,
    Api { attempts: u32 },
    CacheFirst { key: String },
    StaleVersion { requested: String },
    NetworkOnly,
}

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    Network,
    Preload,
    Cache,
    Fallback,
}

impl ServedFrom {
    pub fn as_str(self) -> &'static str {
        match self {
            ServedFrom::Network => "network",
            ServedFrom::Preload => "preload",
            ServedFrom::Cache => "cache",
            ServedFrom::Fallback => "fallback",
        }
    }
}

/// Result of routing one request.
#[derive(Debug, Clone)]
pub struct Routed {
    pub category: Category,
    pub served_from: ServedFrom,
    pub response: ResponseRecord,
}

/// Executes the caching strategy for each request category.
pub struct FetchPolicyRouter {
    classifier: RequestClassifier,
    network: Arc<dyn Network>,
    db: CacheDb,
    asset_version: String,
    generation: String,
    shell_path: String,
    shell_url: Url,
    shell_key: String,
    offline_shell: bool,
    api_retries: u32,
    diagnostic_body_limit: usize,
}

impl FetchPolicyRouter {
    pub fn new(config: &AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let classifier = RequestClassifier::from_config(config)?;
        let shell_url = resolve(classifier.origin(), &config.shell_path)?;
        let stamped_shell = stamp_version(&shell_url, &config.version_param, &config.asset_version);

        Ok(Self {
            network,
            db,
            asset_version: config.asset_version.clone(),
            generation: config.generation_name(),
            shell_path: config.shell_path.clone(),
            shell_key: entry_key("GET", stamped_shell.as_str()),
            shell_url,
            offline_shell: config.offline_shell,
            api_retries: config.api_retries,
            diagnostic_body_limit: config.diagnostic_body_limit,
            classifier,
        })
    }

    /// Name of the generation this router reads and writes.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn classifier(&self) -> &RequestClassifier {
        &self.classifier
    }

    /// Classify a request and choose its strategy.
    pub fn plan(&self, request: &RequestRecord) -> (Category, Plan) {
        let category = self.classifier.classify(request);
        let plan = match &category {
            Category::Document => Plan::Document,
            Category::Diagnostic => Plan::Diagnostic,
            Category::Manifest => Plan::Manifest,
            Category::Api => Plan::Api { attempts: self.api_retries.saturating_add(1) },
            Category::StaticVersioned { version } if *version == self.asset_version => {
                Plan::CacheFirst { key: entry_key(request.method(), request.url().as_str()) }
            }
            Category::StaticVersioned { version } => Plan::StaleVersion { requested: version.clone() },
            Category::StaticUnversioned | Category::Other => Plan::NetworkOnly,
        };
        (category, plan)
    }

    /// Route one request. Never fails: every path yields a response.
    pub async fn handle(&self, request: &RequestRecord) -> Routed {
        let (category, plan) = self.plan(request);

        let (mut response, served_from) = match plan {
            Plan::Document => self.document(request).await,
            Plan::Diagnostic => self.diagnostic(request).await,
            Plan::Manifest => self.manifest(request).await,
            Plan::Api { attempts } => self.api(request, attempts).await,
            Plan::CacheFirst { key } => self.cache_first(request, &key).await,
            Plan::StaleVersion { requested } => self.stale_version(request, &requested).await,
            Plan::NetworkOnly => self.network_only(request).await,
        };

        response.set_header(SOURCE_HEADER, served_from.as_str());
        tracing::debug!(
            method = request.method(),
            url = %request.url(),
            category = category.as_str(),
            source = served_from.as_str(),
            status = response.status,
            "routed request"
        );

        Routed { category, served_from, response }
    }

    async fn document(&self, request: &RequestRecord) -> (ResponseRecord, ServedFrom) {
        if let Some(preloaded) = request.preload() {
            return (no_store(preloaded.clone()), ServedFrom::Preload);
        }

        let fresh = request.clone().set_header("cache-control", "no-store");
        match self.network.fetch(&fresh).await {
            Ok(response) => (no_store(response), ServedFrom::Network),
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "document fetch failed; serving fallback");
                self.document_fallback(request, &e).await
            }
        }
    }

    async fn document_fallback(&self, request: &RequestRecord, err: &Error) -> (ResponseRecord, ServedFrom) {
        if self.offline_shell {
            match self.db.generation(&self.generation).get(&self.shell_key).await {
                Ok(Some(entry)) => return (entry.response, ServedFrom::Cache),
                Ok(None) => tracing::debug!(key = %self.shell_key, "precached shell missing"),
                Err(e) => tracing::warn!(error = %e, "precached shell lookup failed"),
            }
        }

        let href = self.resolve_return_href().await;
        let html = offline_page(request.url().path(), &err.to_string(), &href);
        (html_response(503, html), ServedFrom::Fallback)
    }

    async fn api(&self, request: &RequestRecord, attempts: u32) -> (ResponseRecord, ServedFrom) {
        for attempt in 1..=attempts {
            match self.network.fetch(request).await {
                Ok(response) => return (no_store(response), ServedFrom::Network),
                Err(e) => tracing::warn!(url = %request.url(), attempt, attempts, error = %e, "api fetch failed"),
            }
        }

        let body = serde_json::json!({ "error": "network_unavailable" }).to_string();
        let response = ResponseRecord::new(503)
            .with_header("content-type", "application/json")
            .with_header("cache-control", "no-store")
            .with_body(body);
        (response, ServedFrom::Fallback)
    }

    async fn cache_first(&self, request: &RequestRecord, key: &str) -> (ResponseRecord, ServedFrom) {
        let generation = self.db.generation(&self.generation);

        match generation.get(key).await {
            Ok(Some(entry)) => {
                tracing::debug!(key, "cache hit");
                return (entry.response, ServedFrom::Cache);
            }
            Ok(None) => tracing::debug!(key, "cache miss"),
            Err(e) => tracing::warn!(key, error = %e, "store read failed; treating as miss"),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success()
                    && let Err(e) = generation.put(key, &response).await
                {
                    tracing::warn!(key, error = %e, "failed to persist asset");
                }
                (response, ServedFrom::Network)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "asset fetch failed");
                (unavailable(), ServedFrom::Fallback)
            }
        }
    }

    async fn stale_version(&self, request: &RequestRecord, requested: &str) -> (ResponseRecord, ServedFrom) {
        match self.network.fetch(request).await {
            Ok(response) => (response, ServedFrom::Network),
            Err(e) => {
                tracing::warn!(
                    url = %request.url(),
                    requested,
                    active = %self.asset_version,
                    error = %e,
                    "version-mismatched asset unreachable"
                );
                (unavailable().with_header(STATUS_HEADER, "stale-unavailable"), ServedFrom::Fallback)
            }
        }
    }

    async fn manifest(&self, request: &RequestRecord) -> (ResponseRecord, ServedFrom) {
        match self.network.fetch(request).await {
            Ok(mut response) => {
                if response.is_success() {
                    response.set_header("content-type", MANIFEST_CONTENT_TYPE);
                }
                (response, ServedFrom::Network)
            }
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "manifest fetch failed");
                (unavailable(), ServedFrom::Fallback)
            }
        }
    }

    async fn network_only(&self, request: &RequestRecord) -> (ResponseRecord, ServedFrom) {
        match self.network.fetch(request).await {
            Ok(response) => (response, ServedFrom::Network),
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "fetch failed");
                (unavailable(), ServedFrom::Fallback)
            }
        }
    }
}

fn unavailable() -> ResponseRecord {
    ResponseRecord::new(503)
}

fn no_store(mut response: ResponseRecord) -> ResponseRecord {
    response.set_header("cache-control", "no-store");
    response
}

fn html_response(status: u16, html: String) -> ResponseRecord {
    ResponseRecord::new(status)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_header("cache-control", "no-store")
        .with_body(html)
}
