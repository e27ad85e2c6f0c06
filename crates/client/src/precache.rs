//! Precache manifest: the version-stamped URLs stored at install time.

use freshgate_core::{AppConfig, Error};
use url::Url;

use crate::fetch::{parse_origin, resolve, stamp_version};

/// Ordered, de-duplicated list of version-stamped URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheManifest {
    urls: Vec<Url>,
}

impl PrecacheManifest {
    /// Resolve each path against `origin` and stamp it with `param=version`.
    pub fn new(origin: &Url, paths: &[String], param: &str, version: &str) -> Result<Self, Error> {
        let mut urls: Vec<Url> = Vec::with_capacity(paths.len());
        for path in paths {
            let url = stamp_version(&resolve(origin, path)?, param, version);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        Ok(Self { urls })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin)?;
        Self::new(&origin, &config.precache_paths, &config.version_param, &config.asset_version)
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
