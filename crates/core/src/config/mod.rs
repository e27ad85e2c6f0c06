//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FRESHGATE_*)
//! 2. TOML config file (if FRESHGATE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FRESHGATE_*)
/// 2. TOML config file (if FRESHGATE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via FRESHGATE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the application server whose requests are intercepted.
    ///
    /// Set via FRESHGATE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Deployed asset version. Static requests carrying a different version
    /// are never served from the store.
    ///
    /// Set via FRESHGATE_ASSET_VERSION environment variable.
    #[serde(default = "default_asset_version")]
    pub asset_version: String,

    /// Prefix of cache generation names (`{prefix}-{asset_version}`).
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Path of the application shell.
    #[serde(default = "default_shell_path")]
    pub shell_path: String,

    /// The two document paths wrapped as diagnostic pages.
    #[serde(default = "default_diagnostic_paths")]
    pub diagnostic_paths: Vec<String>,

    /// Reserved API path prefix.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Static asset prefixes, including the favicon/icon paths.
    #[serde(default = "default_static_prefixes")]
    pub static_prefixes: Vec<String>,

    /// Query parameter carrying the asset version.
    #[serde(default = "default_version_param")]
    pub version_param: String,

    /// Path of the web-app manifest.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// Paths precached at install time. Each is stamped with the asset version.
    ///
    /// Set via FRESHGATE_PRECACHE_PATHS environment variable (array syntax,
    /// e.g. `[/ui,/static/app.js]`).
    #[serde(default = "default_precache_paths")]
    pub precache_paths: Vec<String>,

    /// Serve the precached shell instead of the offline page when a document
    /// fetch fails.
    #[serde(default)]
    pub offline_shell: bool,

    /// Whether activation enables navigation preload.
    #[serde(default = "default_true")]
    pub navigation_preload: bool,

    /// Extra network attempts for API requests after the first failure.
    #[serde(default = "default_api_retries")]
    pub api_retries: u32,

    /// Diagnostic bodies longer than this many bytes are truncated.
    #[serde(default = "default_diagnostic_body_limit")]
    pub diagnostic_body_limit: usize,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP transport timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Listen address for the intercepting HTTP proxy. Disabled when unset.
    ///
    /// Set via FRESHGATE_PROXY_LISTEN environment variable.
    #[serde(default)]
    pub proxy_listen: Option<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./freshgate-cache.sqlite")
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_asset_version() -> String {
    "1".into()
}

fn default_cache_prefix() -> String {
    "freshgate".into()
}

fn default_shell_path() -> String {
    "/ui".into()
}

fn default_diagnostic_paths() -> Vec<String> {
    vec!["/health".into(), "/version".into()]
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_static_prefixes() -> Vec<String> {
    vec!["/static/".into(), "/favicon.ico".into(), "/icons/".into()]
}

fn default_version_param() -> String {
    "v".into()
}

fn default_manifest_path() -> String {
    "/manifest.webmanifest".into()
}

fn default_precache_paths() -> Vec<String> {
    vec!["/ui".into(), "/static/app.js".into(), "/static/app.css".into()]
}

fn default_true() -> bool {
    true
}

fn default_api_retries() -> u32 {
    1
}

fn default_diagnostic_body_limit() -> usize {
    64 * 1024
}

fn default_user_agent() -> String {
    "freshgate/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            asset_version: default_asset_version(),
            cache_prefix: default_cache_prefix(),
            shell_path: default_shell_path(),
            diagnostic_paths: default_diagnostic_paths(),
            api_prefix: default_api_prefix(),
            static_prefixes: default_static_prefixes(),
            version_param: default_version_param(),
            manifest_path: default_manifest_path(),
            precache_paths: default_precache_paths(),
            offline_shell: false,
            navigation_preload: true,
            api_retries: default_api_retries(),
            diagnostic_body_limit: default_diagnostic_body_limit(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            proxy_listen: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the cache generation owned by this deployment.
    pub fn generation_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.asset_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FRESHGATE_`
    /// 2. TOML file from `FRESHGATE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FRESHGATE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FRESHGATE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./freshgate-cache.sqlite"));
        assert_eq!(config.shell_path, "/ui");
        assert_eq!(config.diagnostic_paths, vec!["/health", "/version"]);
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.version_param, "v");
        assert_eq!(config.api_retries, 1);
        assert_eq!(config.diagnostic_body_limit, 65_536);
        assert!(config.navigation_preload);
        assert!(!config.offline_shell);
        assert!(config.proxy_listen.is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_generation_name() {
        let config = AppConfig { asset_version: "5".into(), ..Default::default() };
        assert_eq!(config.generation_name(), "freshgate-5");
    }

    #[test]
    fn test_load_layers_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "freshgate.toml",
                r#"
                asset_version = "4"
                origin = "https://rose.example"
                offline_shell = true
                "#,
            )?;
            jail.set_env("FRESHGATE_CONFIG_FILE", "freshgate.toml");
            jail.set_env("FRESHGATE_ASSET_VERSION", "rose-5");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.asset_version, "rose-5");
            assert_eq!(config.origin, "https://rose.example");
            assert!(config.offline_shell);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FRESHGATE_ASSET_VERSION", "");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
