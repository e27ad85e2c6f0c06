//! Install and activation lifecycle.
//!
//! A controller walks one asset version through
//! `Installing -> Waiting -> Activating -> Active`. Install opens the
//! version's generation and precaches the manifest; activation deletes every
//! other generation and then asks the host to take control.
//!
//! Host effects are best-effort: a failed effect is logged and reported but
//! never aborts the transition.

use std::sync::Arc;

use async_trait::async_trait;
use freshgate_core::cache::hash::entry_key;
use freshgate_core::{CacheDb, Error, RequestRecord};
use serde::Serialize;

use crate::fetch::Network;
use crate::precache::PrecacheManifest;

/// Lifecycle state of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }
}

/// Effects the controller asks of its host environment.
#[async_trait]
pub trait Host: Send + Sync {
    /// Let the new version take over without waiting for old clients to close.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Turn on navigation preload for document requests.
    async fn enable_navigation_preload(&self) -> Result<(), Error>;

    /// Take control of open clients. Returns how many were claimed.
    async fn claim_clients(&self) -> Result<usize, Error>;
}

/// Outcome of one host effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct EffectOutcome {
    pub effect: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EffectOutcome {
    fn from_result<T: ToString>(effect: &str, result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => {
                let detail = value.to_string();
                Self { effect: effect.into(), ok: true, detail: (!detail.is_empty()).then_some(detail) }
            }
            Err(e) => {
                tracing::warn!(effect, error = %e, "host effect failed");
                Self { effect: effect.into(), ok: false, detail: Some(e.to_string()) }
            }
        }
    }
}

/// Precache failure for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    pub skipped_waiting: bool,
    pub precached: Vec<String>,
    pub failures: Vec<PrecacheFailure>,
    pub effects: Vec<EffectOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub generation: String,
    pub deleted_generations: Vec<String>,
    pub effects: Vec<EffectOutcome>,
}

/// Drives one asset version through install and activation.
pub struct LifecycleController {
    db: CacheDb,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    manifest: PrecacheManifest,
    generation: String,
    navigation_preload: bool,
    state: LifecycleState,
}

impl LifecycleController {
    pub fn new(
        db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>, manifest: PrecacheManifest, generation: String,
        navigation_preload: bool,
    ) -> Self {
        Self { db, network, host, manifest, generation, navigation_preload, state: LifecycleState::Installing }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Open the generation, ask to skip waiting, and precache the manifest.
    ///
    /// Individual precache failures are reported, not fatal. Only 2xx
    /// responses are stored.
    pub async fn install(&mut self) -> Result<InstallReport, Error> {
        self.expect_state(LifecycleState::Installing, "install")?;

        let generation = self.db.open_generation(&self.generation).await?;
        let skip = EffectOutcome::from_result("skip_waiting", self.host.skip_waiting().await.map(|()| ""));
        let skipped_waiting = skip.ok;

        let mut precached = Vec::new();
        let mut failures = Vec::new();
        for url in self.manifest.urls() {
            let key = entry_key("GET", url.as_str());
            let outcome = match RequestRecord::new("GET", url.as_str()) {
                Ok(request) => self.network.fetch(&request).await,
                Err(e) => Err(e),
            };

            let reason = match outcome {
                Ok(response) if response.is_success() => match generation.put(&key, &response).await {
                    Ok(()) => {
                        precached.push(url.to_string());
                        continue;
                    }
                    Err(e) => e.to_string(),
                },
                Ok(response) => format!("upstream status {}", response.status),
                Err(e) => e.to_string(),
            };

            tracing::warn!(url = %url, reason = %reason, "precache skipped");
            failures.push(PrecacheFailure { url: url.to_string(), reason });
        }

        self.state = LifecycleState::Waiting;
        tracing::info!(
            generation = %self.generation,
            precached = precached.len(),
            failed = failures.len(),
            "install complete"
        );

        Ok(InstallReport {
            generation: self.generation.clone(),
            skipped_waiting,
            precached,
            failures,
            effects: vec![skip],
        })
    }

    /// Delete stale generations, enable preload, and claim clients.
    ///
    /// A failed cleanup is reported as a `delete_stale_generations` effect;
    /// the host effects still run and the controller still becomes active.
    pub async fn activate(&mut self) -> Result<ActivateReport, Error> {
        self.expect_state(LifecycleState::Waiting, "activate")?;
        self.state = LifecycleState::Activating;

        let mut effects = Vec::new();
        let deleted_generations = match self.db.delete_generations_except(&self.generation).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(generation = %self.generation, error = %e, "stale generation cleanup failed");
                effects.push(EffectOutcome {
                    effect: "delete_stale_generations".into(),
                    ok: false,
                    detail: Some(e.to_string()),
                });
                Vec::new()
            }
        };

        if self.navigation_preload {
            let result = self.host.enable_navigation_preload().await.map(|()| "");
            effects.push(EffectOutcome::from_result("enable_navigation_preload", result));
        }
        effects.push(EffectOutcome::from_result("claim_clients", self.host.claim_clients().await));

        self.state = LifecycleState::Active;
        tracing::info!(
            generation = %self.generation,
            deleted = ?deleted_generations,
            "activation complete"
        );

        Ok(ActivateReport { generation: self.generation.clone(), deleted_generations, effects })
    }

    /// Mark this controller superseded. Valid from any state.
    pub fn retire(&mut self) {
        if self.state != LifecycleState::Redundant {
            tracing::info!(generation = %self.generation, from = self.state.as_str(), "controller retired");
        }
        self.state = LifecycleState::Redundant;
    }

    fn expect_state(&self, expected: LifecycleState, action: &str) -> Result<(), Error> {
        if self.state == expected {
            return Ok(());
        }
        Err(Error::Lifecycle(format!(
            "cannot {action} while {}; expected {}",
            self.state.as_str(),
            expected.as_str()
        )))
    }
}
