//! Client-side caching and freshness for freshgate.
//!
//! This crate provides:
//! - Request classification into routing categories
//! - Fetch policy routing over the versioned store
//! - Install and activation lifecycle with precaching
//! - HTTP fetching and fallback page rendering

pub mod classify;
pub mod fetch;
pub mod lifecycle;
pub mod precache;
pub mod render;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{Category, RequestClassifier};
pub use fetch::{FetchClient, FetchConfig, Network};
pub use lifecycle::{ActivateReport, EffectOutcome, Host, InstallReport, LifecycleController, LifecycleState};
pub use precache::PrecacheManifest;
pub use router::{FetchPolicyRouter, Plan, Routed, ServedFrom};
