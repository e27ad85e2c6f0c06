//! Request classification.
//!
//! Maps each intercepted request to the category whose caching strategy the
//! router applies. Checks run in a fixed order: document (with the two
//! diagnostic paths split out), manifest, api, static, other.

use freshgate_core::{AppConfig, Error, RequestRecord};
use serde::Serialize;
use url::Url;

use crate::fetch::{parse_origin, same_origin};

/// HTML media types that mark a request as a document request.
const HTML_MEDIA_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Routing category of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Category {
    Document,
    Diagnostic,
    Manifest,
    Api,
    StaticVersioned { version: String },
    StaticUnversioned,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Diagnostic => "diagnostic",
            Category::Manifest => "manifest",
            Category::Api => "api",
            Category::StaticVersioned { .. } => "static-versioned",
            Category::StaticUnversioned => "static-unversioned",
            Category::Other => "other",
        }
    }
}

/// Path rules used to classify requests for one application origin.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    origin: Url,
    diagnostic_paths: Vec<String>,
    manifest_path: String,
    api_prefix: String,
    static_prefixes: Vec<String>,
    version_param: String,
}

impl RequestClassifier {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            origin: parse_origin(&config.origin)?,
            diagnostic_paths: config.diagnostic_paths.clone(),
            manifest_path: config.manifest_path.clone(),
            api_prefix: config.api_prefix.clone(),
            static_prefixes: config.static_prefixes.clone(),
            version_param: config.version_param.clone(),
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn version_param(&self) -> &str {
        &self.version_param
    }

    /// Diagnostic paths are diagnostic only for document requests; a script
    /// `fetch` of `/health` classifies as [`Category::Other`].
    pub fn classify(&self, request: &RequestRecord) -> Category {
        if !same_origin(request.url(), &self.origin) {
            return Category::Other;
        }

        let path = request.url().path();

        if is_document(request) {
            if self.diagnostic_paths.iter().any(|p| p == path) {
                return Category::Diagnostic;
            }
            return Category::Document;
        }

        if request.is_read() && path == self.manifest_path {
            return Category::Manifest;
        }

        if path.starts_with(&self.api_prefix) {
            return Category::Api;
        }

        if request.is_read() && self.static_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return match request.query_param(&self.version_param) {
                Some(version) => Category::StaticVersioned { version },
                None => Category::StaticUnversioned,
            };
        }

        Category::Other
    }
}

fn is_document(request: &RequestRecord) -> bool {
    if request.is_navigation() || request.destination() == Some("document") {
        return true;
    }

    request.accept().is_some_and(|accept| {
        accept.split(',').any(|part| {
            let media = part.split(';').next().unwrap_or("").trim();
            HTML_MEDIA_TYPES.iter().any(|html| media.eq_ignore_ascii_case(html))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> RequestClassifier {
        let config = AppConfig { origin: "https://rose.example".into(), ..Default::default() };
        RequestClassifier::from_config(&config).unwrap()
    }

    fn get(path: &str) -> RequestRecord {
        RequestRecord::new("GET", &format!("https://rose.example{path}")).unwrap()
    }

    #[test]
    fn test_navigation_is_document() {
        assert_eq!(classifier().classify(&get("/ui").navigation()), Category::Document);
    }

    #[test]
    fn test_destination_document() {
        assert_eq!(classifier().classify(&get("/ui").with_destination("Document")), Category::Document);
    }

    #[test]
    fn test_accept_html_is_document() {
        let req = get("/ui").with_header("accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8");
        assert_eq!(classifier().classify(&req), Category::Document);

        let req = get("/ui").with_header("accept", "application/json");
        assert_ne!(classifier().classify(&req), Category::Document);
    }

    #[test]
    fn test_diagnostic_paths() {
        let c = classifier();
        assert_eq!(c.classify(&get("/health").navigation()), Category::Diagnostic);
        assert_eq!(c.classify(&get("/version").with_header("accept", "text/html")), Category::Diagnostic);
        // a script fetching the JSON directly is not wrapped
        assert_eq!(c.classify(&get("/health")), Category::Other);
        assert_eq!(c.classify(&get("/version").with_destination("script")), Category::Other);
    }

    #[test]
    fn test_document_takes_precedence_over_api() {
        assert_eq!(classifier().classify(&get("/api/search").navigation()), Category::Document);
    }

    #[test]
    fn test_api_prefix() {
        let req = RequestRecord::new("POST", "https://rose.example/api/search").unwrap();
        assert_eq!(classifier().classify(&req), Category::Api);
        assert_eq!(classifier().classify(&get("/api/search?q=moss")), Category::Api);
    }

    #[test]
    fn test_static_versioned() {
        assert_eq!(
            classifier().classify(&get("/static/app.js?v=5")),
            Category::StaticVersioned { version: "5".into() }
        );
        assert_eq!(
            classifier().classify(&get("/favicon.ico?v=4")),
            Category::StaticVersioned { version: "4".into() }
        );
    }

    #[test]
    fn test_static_unversioned() {
        assert_eq!(classifier().classify(&get("/static/app.js")), Category::StaticUnversioned);
        assert_eq!(classifier().classify(&get("/icons/192.png")), Category::StaticUnversioned);
    }

    #[test]
    fn test_static_write_is_other() {
        let req = RequestRecord::new("POST", "https://rose.example/static/app.js?v=5").unwrap();
        assert_eq!(classifier().classify(&req), Category::Other);
    }

    #[test]
    fn test_manifest() {
        assert_eq!(classifier().classify(&get("/manifest.webmanifest")), Category::Manifest);
    }

    #[test]
    fn test_cross_origin_is_other() {
        let req = RequestRecord::new("GET", "https://cdn.example/static/app.js?v=5").unwrap();
        assert_eq!(classifier().classify(&req), Category::Other);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::StaticVersioned { version: "5".into() }.as_str(), "static-versioned");
        assert_eq!(Category::Diagnostic.as_str(), "diagnostic");
    }
}
