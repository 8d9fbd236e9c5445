//! Request descriptors
//!
//! A [`Request`] is the canonical identity of one navigation or prefetch
//! attempt. Its [`key`](Request::key) indexes the page cache.

use std::fmt;
use url::form_urlencoded;

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    /// Parse a method name, case-insensitively. Unknown names are treated as GET,
    /// which is what browsers do with an invalid form `method` attribute.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            _ => Self::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation request descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    body: Option<String>,
    cacheable: bool,
}

impl Request {
    /// Create a new cacheable request without a body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            cacheable: true,
        }
    }

    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a POST request carrying an urlencoded body
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Method::Post, url).body(body)
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replace the URL
    pub fn url_to(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Replace the method
    pub fn method_to(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Mark whether the response may stay in the cache after use
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }

    /// Get the URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Get the body, if any
    pub fn body_str(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    /// Cache key for this request.
    ///
    /// GET and cacheable requests are keyed by URL alone. Non-idempotent requests
    /// that must not be cached are keyed by method and body too, so a POST never
    /// aliases the GET entry for the same URL.
    pub fn key(&self) -> String {
        if self.method == Method::Get || self.cacheable {
            return self.url.clone();
        }
        format!(
            "{} {}\n{}",
            self.method,
            self.url,
            self.body.as_deref().unwrap_or_default()
        )
    }
}

impl From<&str> for Request {
    fn from(url: &str) -> Self {
        Self::get(url)
    }
}

impl From<String> for Request {
    fn from(url: String) -> Self {
        Self::get(url)
    }
}

/// Serialize form fields the way a browser encodes
/// `application/x-www-form-urlencoded` submissions.
pub fn serialize_fields<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::parse("GET"), Method::Get);
        assert_eq!(Method::parse("post"), Method::Post);
        assert_eq!(Method::parse(" Patch "), Method::Patch);
        assert_eq!(Method::parse("bogus"), Method::Get);
        assert_eq!(Method::parse(""), Method::Get);
    }

    #[test]
    fn test_from_str_is_cacheable_get() {
        let req = Request::from("https://example.com/hello.html");
        assert_eq!(req.method(), Method::Get);
        assert_eq!(req.url(), "https://example.com/hello.html");
        assert!(req.is_cacheable());
        assert!(req.body_str().is_none());
    }

    #[test]
    fn test_builder_keeps_explicit_fields() {
        let req = Request::from("https://example.com/hello.html").method_to(Method::Post);
        assert_ne!(req, Request::from("https://example.com/hello.html"));
        assert_eq!(req.method(), Method::Post);
    }

    #[test]
    fn test_key_for_get_is_url() {
        let req = Request::get("https://example.com/a").cacheable(false);
        assert_eq!(req.key(), "https://example.com/a");
    }

    #[test]
    fn test_key_for_uncached_post_includes_body() {
        let req = Request::post("https://example.com/submit", "a=1").cacheable(false);
        assert_eq!(req.key(), "POST https://example.com/submit\na=1");

        let cached = Request::post("https://example.com/submit", "a=1");
        assert_eq!(cached.key(), "https://example.com/submit");
    }

    #[test]
    fn test_serialize_fields() {
        let body = serialize_fields([("q", "x"), ("name", "a b&c")]);
        assert_eq!(body, "q=x&name=a+b%26c");
        assert_eq!(serialize_fields(std::iter::empty()), "");
    }
}
