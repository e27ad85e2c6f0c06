//! Core types and shared functionality for freshgate.
//!
//! This crate provides:
//! - Versioned response store with SQLite backend
//! - Request/response value types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{CacheDb, CacheEntry, Generation, GenerationInfo};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use message::{RequestRecord, ResponseRecord, SOURCE_HEADER, STATUS_HEADER};
