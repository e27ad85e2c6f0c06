//! URL helpers for origin resolution and version stamping.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for freshgate_core::Error {
    fn from(err: UrlError) -> Self {
        freshgate_core::Error::InvalidUrl(err.to_string())
    }
}

/// Parse an application origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an http(s) scheme and a host
/// 3. Drop path, query and fragment so only the origin remains
pub fn parse_origin(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
    if !parsed.has_host() {
        return Err(UrlError::InvalidUrl(format!("missing host: {trimmed}")));
    }

    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve an origin-relative path (e.g. `/ui`) against the origin.
pub fn resolve(origin: &Url, path: &str) -> Result<Url, UrlError> {
    if path.trim().is_empty() {
        return Err(UrlError::Empty);
    }
    origin.join(path.trim()).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}

/// Append `param=version` unless the URL already carries `param`.
pub fn stamp_version(url: &Url, param: &str, version: &str) -> Url {
    let mut stamped = url.clone();
    if !url.query_pairs().any(|(k, _)| k == param) {
        stamped.query_pairs_mut().append_pair(param, version);
    }
    stamped
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
