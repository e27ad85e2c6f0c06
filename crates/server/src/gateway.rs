//! Boot-time assembly of the store, router and lifecycle.
//!
//! A [`Gateway`] is built once at startup: it opens the store, runs install
//! and activation for the configured asset version, and then serves every
//! request through one [`FetchPolicyRouter`]. The MCP handler and the HTTP
//! proxy share it behind an `Arc`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use freshgate_client::{
    ActivateReport, FetchClient, FetchConfig, FetchPolicyRouter, Host, InstallReport, LifecycleController,
    LifecycleState, Network, PrecacheManifest, Routed,
};
use freshgate_core::{AppConfig, CacheDb, Error, RequestRecord};
use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::Mutex;

/// Host facilities as seen by a process that owns its own request loop.
///
/// There are no pre-existing clients to wait for, so every effect succeeds
/// and only records that it happened.
#[derive(Debug, Default)]
pub struct ProcessHost {
    skipped_waiting: AtomicBool,
    preload_enabled: AtomicBool,
    claims: AtomicUsize,
}

#[async_trait]
impl Host for ProcessHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skipped_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn enable_navigation_preload(&self) -> Result<(), Error> {
        self.preload_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<usize, Error> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

impl ProcessHost {
    pub fn preload_enabled(&self) -> bool {
        self.preload_enabled.load(Ordering::SeqCst)
    }

    fn flags(&self) -> HostFlags {
        HostFlags {
            skipped_waiting: self.skipped_waiting.load(Ordering::SeqCst),
            navigation_preload: self.preload_enabled(),
            claimed: self.claims.load(Ordering::SeqCst) > 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct HostFlags {
    pub skipped_waiting: bool,
    pub navigation_preload: bool,
    pub claimed: bool,
}

/// Snapshot reported by the `lifecycle_status` tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LifecycleStatus {
    pub state: LifecycleState,
    pub generation: String,
    pub asset_version: String,
    pub host: HostFlags,
    pub install: InstallReport,
    pub activate: ActivateReport,
}

pub struct Gateway {
    config: AppConfig,
    db: CacheDb,
    router: FetchPolicyRouter,
    host: Arc<ProcessHost>,
    lifecycle: Mutex<LifecycleController>,
    install: InstallReport,
    activate: ActivateReport,
}

impl Gateway {
    /// Open the configured store, build the HTTP client, and boot.
    pub async fn boot(config: AppConfig) -> Result<Self, Error> {
        let db = CacheDb::open(&config.db_path).await?;
        let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
        Self::with_parts(config, db, network).await
    }

    /// Run install and activation against the given store and network.
    pub async fn with_parts(config: AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let host = Arc::new(ProcessHost::default());
        let manifest = PrecacheManifest::from_config(&config)?;

        let mut lifecycle = LifecycleController::new(
            db.clone(),
            Arc::clone(&network),
            host.clone(),
            manifest,
            config.generation_name(),
            config.navigation_preload,
        );
        let install = lifecycle.install().await?;
        let activate = lifecycle.activate().await?;

        let router = FetchPolicyRouter::new(&config, db.clone(), network)?;

        tracing::info!(
            generation = %config.generation_name(),
            precached = install.precached.len(),
            deleted = activate.deleted_generations.len(),
            "gateway ready"
        );

        Ok(Self { config, db, router, host, lifecycle: Mutex::new(lifecycle), install, activate })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn router(&self) -> &FetchPolicyRouter {
        &self.router
    }

    /// Name of the active generation.
    pub fn generation(&self) -> &str {
        self.router.generation()
    }

    /// Whether preloaded document responses are honored.
    pub fn preload_enabled(&self) -> bool {
        self.host.preload_enabled()
    }

    pub async fn dispatch(&self, request: &RequestRecord) -> Routed {
        self.router.handle(request).await
    }

    pub async fn status(&self) -> LifecycleStatus {
        let state = self.lifecycle.lock().await.state();
        LifecycleStatus {
            state,
            generation: self.generation().to_string(),
            asset_version: self.config.asset_version.clone(),
            host: self.host.flags(),
            install: self.install.clone(),
            activate: self.activate.clone(),
        }
    }

    /// Mark the controller superseded on shutdown.
    pub async fn retire(&self) {
        self.lifecycle.lock().await.retire();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use freshgate_core::ResponseRecord;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mock origin answering the default precache manifest for version 5.
    pub(crate) async fn origin() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ui"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>shell</html>", "text/html"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/ui"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/static/app.js"))
            .and(query_param("v", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("console.log(5)", "text/javascript"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/static/app.css"))
            .and(query_param("v", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("body{}", "text/css"))
            .mount(&server)
            .await;
        server
    }

    pub(crate) async fn gateway(server: &MockServer) -> Gateway {
        let config = AppConfig { origin: server.uri(), asset_version: "5".into(), ..Default::default() };
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config)).unwrap());
        Gateway::with_parts(config, db, network).await.unwrap()
    }

    #[tokio::test]
    async fn test_boot_installs_and_activates() {
        let server = origin().await;
        let gateway = gateway(&server).await;

        let status = gateway.status().await;
        assert_eq!(status.state, LifecycleState::Active);
        assert_eq!(status.generation, "freshgate-5");
        assert_eq!(status.install.precached.len(), 3);
        assert!(status.host.skipped_waiting);
        assert!(status.host.navigation_preload);
        assert!(status.host.claimed);
        assert_eq!(gateway.generation(), "freshgate-5");
    }

    #[tokio::test]
    async fn test_boot_drops_previous_generation() {
        let server = origin().await;
        let config = AppConfig { origin: server.uri(), asset_version: "5".into(), ..Default::default() };
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("freshgate-4")
            .await
            .unwrap()
            .put("GET http://old/ui", &ResponseRecord::new(200))
            .await
            .unwrap();

        let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config)).unwrap());
        let gateway = Gateway::with_parts(config, db, network).await.unwrap();

        assert_eq!(gateway.status().await.activate.deleted_generations, vec!["freshgate-4".to_string()]);
        assert!(!gateway.db().has_generation("freshgate-4").await.unwrap());
    }

    #[tokio::test]
    async fn test_precached_asset_served_from_store() {
        let server = origin().await;
        let gateway = gateway(&server).await;

        let request = RequestRecord::new("GET", &format!("{}/static/app.js?v=5", server.uri())).unwrap();
        let routed = gateway.dispatch(&request).await;

        assert_eq!(routed.served_from, freshgate_client::ServedFrom::Cache);
        assert_eq!(routed.response.text(), "console.log(5)");
    }

    #[tokio::test]
    async fn test_retire_marks_redundant() {
        let server = origin().await;
        let gateway = gateway(&server).await;

        gateway.retire().await;
        assert_eq!(gateway.status().await.state, LifecycleState::Redundant);
    }
}
