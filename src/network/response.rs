//! HTTP response types

use std::collections::HashMap;

/// HTTP response as seen by the page cache
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    url: String,
    headers: HashMap<String, String>,
    body: String,
}

impl Response {
    /// Create a new response
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Create a new response with headers
    pub fn with_headers(
        status: u16,
        url: impl Into<String>,
        body: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            status,
            url: url.into(),
            headers,
            body: body.into(),
        }
    }

    /// Get the status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Final URL, after redirects
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if the response was successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the content type from headers
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get a specific header, ignoring the case of its name
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the body can be displayed as a page.
    /// A response without a content type is assumed to be HTML.
    pub fn is_html(&self) -> bool {
        self.content_type()
            .is_none_or(|ct| ct.to_ascii_lowercase().contains("html"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(Response::new(200, "https://a.test/", "").is_success());
        assert!(Response::new(204, "https://a.test/", "").is_success());
        assert!(!Response::new(301, "https://a.test/", "").is_success());
        assert!(!Response::new(404, "https://a.test/", "").is_success());
    }

    #[test]
    fn test_content_type() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        let resp = Response::with_headers(200, "https://a.test/", "<p>", headers);
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.url(), "https://a.test/");
    }

    #[test]
    fn test_header_name_case() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/xhtml+xml".to_string());
        headers.insert("x-frame-options".to_string(), "DENY".to_string());
        let resp = Response::with_headers(200, "https://a.test/", "", headers);
        assert_eq!(resp.content_type(), Some("application/xhtml+xml"));
        assert_eq!(resp.header("X-Frame-Options"), Some("DENY"));
        assert_eq!(resp.header("etag"), None);
        assert!(resp.is_html());
    }

    #[test]
    fn test_is_html() {
        assert!(Response::new(200, "https://a.test/", "").is_html());

        let json = HashMap::from([("content-type".to_string(), "application/json".to_string())]);
        assert!(!Response::with_headers(200, "https://a.test/", "{}", json).is_html());

        let html = HashMap::from([("content-type".to_string(), "Text/HTML; charset=utf-8".to_string())]);
        assert!(Response::with_headers(200, "https://a.test/", "", html).is_html());
    }
}
