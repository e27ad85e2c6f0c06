//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and pruning the response store.

pub mod generations;
pub mod get;
pub mod purge;

pub use generations::generations_impl;
pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
