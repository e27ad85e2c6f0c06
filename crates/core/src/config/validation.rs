//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// Upper bound on API retries after the first attempt.
const MAX_API_RETRIES: u32 = 5;

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `asset_version` or `cache_prefix` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - any configured path does not start with `/`
    /// - `diagnostic_paths` does not hold exactly two paths
    /// - `api_retries` exceeds 5
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.asset_version.trim().is_empty() {
            return Err(invalid("asset_version", "must not be empty"));
        }
        if self.cache_prefix.trim().is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }
        if self.version_param.trim().is_empty() {
            return Err(invalid("version_param", "must not be empty"));
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") && origin.has_host() => {}
            _ => return Err(invalid("origin", "must be an absolute http(s) URL")),
        }

        let paths = [
            ("shell_path", std::slice::from_ref(&self.shell_path)),
            ("api_prefix", std::slice::from_ref(&self.api_prefix)),
            ("manifest_path", std::slice::from_ref(&self.manifest_path)),
            ("diagnostic_paths", self.diagnostic_paths.as_slice()),
            ("static_prefixes", self.static_prefixes.as_slice()),
            ("precache_paths", self.precache_paths.as_slice()),
        ];
        for (field, values) in paths {
            if values.iter().any(|p| !p.starts_with('/')) {
                return Err(invalid(field, "paths must start with '/'"));
            }
        }

        if self.diagnostic_paths.len() != 2 {
            return Err(invalid("diagnostic_paths", "must list exactly two paths"));
        }

        if self.api_retries > MAX_API_RETRIES {
            return Err(invalid("api_retries", "must not exceed 5"));
        }

        if self.diagnostic_body_limit == 0 {
            return Err(invalid("diagnostic_body_limit", "must be greater than 0"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.offline_shell && !self.precache_paths.contains(&self.shell_path) {
            tracing::warn!(
                shell_path = %self.shell_path,
                "offline_shell is enabled but the shell path is not precached; \
                 the offline page will be served instead"
            );
        }

        Ok(())
    }
}
