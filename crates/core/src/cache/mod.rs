//! SQLite-backed response store with versioned generations.
//!
//! This module provides the persistent store behind the fetch router:
//!
//! - Named generations, one per deployed asset version
//! - Entries keyed by method + URL, confined to their generation
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, Generation};
pub use generations::GenerationInfo;
