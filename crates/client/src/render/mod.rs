//! Fallback page rendering.
//!
//! Synthesizes the small HTML documents served for diagnostic endpoints and
//! for failed navigations. Rendering is pure: identical input yields
//! identical output. Every interpolated value is entity-escaped.

use std::fmt::Write as _;

/// Input for one rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub title: &'a str,
    /// Upstream status, absent when the network never answered.
    pub status: Option<u16>,
    pub latency_ms: Option<u64>,
    pub body: &'a str,
    pub return_href: &'a str,
}

/// Escape `& < > " '` for use in HTML text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a page: title, metadata line, preformatted body, one return link.
pub fn render_page(page: &Page<'_>) -> String {
    let title = escape_html(page.title);
    let meta = escape_html(&metadata_line(page.status, page.latency_ms));
    let body = escape_html(page.body);
    let href = escape_html(page.return_href);

    let mut html = String::with_capacity(body.len() + 512);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{title}</title>");
    html.push_str(
        "<style>body{font-family:system-ui,sans-serif;margin:2rem;max-width:60rem}\
         pre{background:#f4f4f4;padding:1rem;overflow:auto;white-space:pre-wrap}\
         .meta{color:#555}</style>\n",
    );
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{title}</h1>");
    let _ = writeln!(html, "<p class=\"meta\">{meta}</p>");
    let _ = writeln!(html, "<pre>{body}</pre>");
    let _ = writeln!(html, "<p><a href=\"{href}\">Return to app</a></p>");
    html.push_str("</body>\n</html>\n");
    html
}

fn metadata_line(status: Option<u16>, latency_ms: Option<u64>) -> String {
    let status = status.map_or_else(|| "status: no response".to_string(), |s| format!("status: {s}"));
    match latency_ms {
        Some(ms) => format!("{status} | latency: {ms} ms"),
        None => status,
    }
}

/// Format a diagnostic body for display.
///
/// JSON bodies are pretty-printed. Anything else, including malformed JSON,
/// is shown as text and cut at `limit` bytes on a character boundary.
pub fn format_diagnostic_body(body: &[u8], content_type: Option<&str>, limit: usize) -> String {
    let declared_json = content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
    let looks_json = matches!(body.iter().find(|b| !b.is_ascii_whitespace()), Some(b'{' | b'['));

    if (declared_json || looks_json)
        && let Ok(value) = serde_json::from_slice::<serde_json::Value>(body)
        && let Ok(pretty) = serde_json::to_string_pretty(&value)
    {
        return truncate(&pretty, limit);
    }

    truncate(&String::from_utf8_lossy(body), limit)
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n[truncated: showing {} of {} bytes]", &text[..end], end, text.len())
}

/// Page served when a navigation cannot reach the network.
pub fn offline_page(path: &str, reason: &str, return_href: &str) -> String {
    let body = format!("{path} could not be loaded because the network is unavailable.\n\n{reason}");
    render_page(&Page { title: "Offline", status: None, latency_ms: None, body: &body, return_href })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<'a>(body: &'a str, latency_ms: Option<u64>) -> Page<'a> {
        Page { title: "/health", status: Some(200), latency_ms, body, return_href: "/ui" }
    }

    #[test]
    fn test_escape_html_all_entities() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_contains_chrome() {
        let html = render_page(&page("{}", Some(12)));
        assert!(html.contains("<title>/health</title>"));
        assert!(html.contains("status: 200 | latency: 12 ms"));
        assert!(html.contains("<pre>{}</pre>"));
        assert!(html.contains("<a href=\"/ui\">Return to app</a>"));
    }

    #[test]
    fn test_render_escapes_script_body() {
        let html = render_page(&page("<script>alert('x')</script>", None));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_render_escapes_title_and_href() {
        let html = render_page(&Page {
            title: "<b>t</b>",
            status: None,
            latency_ms: None,
            body: "",
            return_href: "\"><script>",
        });
        assert!(!html.contains("<b>t</b>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("status: no response"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = render_page(&page("{\n  \"ok\": true\n}", Some(3)));
        let b = render_page(&page("{\n  \"ok\": true\n}", Some(3)));
        assert_eq!(a, b);

        let c = render_page(&page("{\n  \"ok\": true\n}", Some(40)));
        assert_eq!(a.replace("3 ms", "40 ms"), c);
    }

    #[test]
    fn test_format_pretty_prints_json() {
        let out = format_diagnostic_body(br#"{"ok":true,"kb_size":3}"#, Some("application/json"), 1024);
        assert_eq!(out, "{\n  \"ok\": true,\n  \"kb_size\": 3\n}");
    }

    #[test]
    fn test_format_sniffs_json_without_content_type() {
        let out = format_diagnostic_body(br#"{"version":"jsonl-2025"}"#, None, 1024);
        assert!(out.contains("\n  \"version\""));
    }

    #[test]
    fn test_format_malformed_json_falls_back_to_text() {
        let out = format_diagnostic_body(br#"{"ok":tru"#, Some("application/json"), 1024);
        assert_eq!(out, r#"{"ok":tru"#);
    }

    #[test]
    fn test_format_truncates_text() {
        let out = format_diagnostic_body("abcdef".as_bytes(), Some("text/plain"), 4);
        assert_eq!(out, "abcd\n[truncated: showing 4 of 6 bytes]");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let out = truncate("ミニバラ", 4);
        assert!(out.starts_with("ミ\n"));
    }

    #[test]
    fn test_offline_page() {
        let html = offline_page("/ui", "FETCH_FAILED: connection refused", "/");
        assert!(html.contains("<title>Offline</title>"));
        assert!(html.contains("/ui could not be loaded"));
        assert!(html.contains("<a href=\"/\">Return to app</a>"));
    }
}
