//! Request and response value types.
//!
//! A [`RequestRecord`] is the validated description of one intercepted
//! request; a [`ResponseRecord`] is what every routing path hands back.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// HTTP methods accepted at the boundary.
const KNOWN_METHODS: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Header name marking where a response was served from.
pub const SOURCE_HEADER: &str = "x-freshgate-source";

/// Header name marking a version-mismatched asset that could not be fetched.
pub const STATUS_HEADER: &str = "x-freshgate-status";

/// Description of one intercepted request.
///
/// Built through [`RequestRecord::new`], which rejects unknown methods and
/// non-http(s) URLs.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    method: String,
    url: Url,
    headers: Vec<(String, String)>,
    navigate: bool,
    destination: Option<String>,
    body: Option<Bytes>,
    preload: Option<ResponseRecord>,
}

impl RequestRecord {
    /// Validate and build a request description.
    pub fn new(method: &str, url: &str) -> Result<Self, Error> {
        let method = method.trim().to_ascii_uppercase();
        if !KNOWN_METHODS.contains(&method.as_str()) {
            return Err(Error::InvalidRequest(format!("unsupported method: {method}")));
        }

        let url = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("unsupported scheme: {}", url.scheme())));
        }

        Ok(Self { method, url, headers: Vec::new(), navigate: false, destination: None, body: None, preload: None })
    }

    /// Add a request header. Names are stored lowercased.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// Replace every value of a request header with a single value.
    pub fn set_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.with_header(name, value)
    }

    /// Mark the request as a top-level navigation.
    pub fn navigation(mut self) -> Self {
        self.navigate = true;
        self
    }

    /// Set the fetch destination (`document`, `script`, `image`, ...).
    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = Some(destination.to_ascii_lowercase());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a response the host already fetched through navigation preload.
    pub fn with_preload(mut self, response: ResponseRecord) -> Self {
        self.preload = Some(response);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn accept(&self) -> Option<&str> {
        self.header("accept")
    }

    pub fn is_navigation(&self) -> bool {
        self.navigate
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn preload(&self) -> Option<&ResponseRecord> {
        self.preload.as_ref()
    }

    /// Whether the method only reads (GET or HEAD).
    pub fn is_read(&self) -> bool {
        matches!(self.method.as_str(), "GET" | "HEAD")
    }

    /// Value of a query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// A response produced by the network, the store, or a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseRecord {
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: Bytes::new() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace every value of `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
