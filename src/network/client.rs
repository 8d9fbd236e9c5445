//! HTTP client implementation

use super::{Method, Request, Response, Transport};
use crate::utils::{NetworkError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// `reqwest`-backed transport
pub struct NetworkClient {
    client: reqwest::Client,
}

impl NetworkClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("Segue/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl Transport for NetworkClient {
    async fn send(&self, request: &Request) -> Result<Response> {
        let mut req = self
            .client
            .request(to_reqwest(request.method()), request.url())
            .header("accept", "text/html,application/xhtml+xml");

        if let Some(body) = request.body_str() {
            req = req
                .header("content-type", "application/x-www-form-urlencoded")
                .body(body.to_string());
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout
            } else {
                NetworkError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        Ok(Response::with_headers(status, url, body, headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest(Method::Post), reqwest::Method::POST);
        assert_eq!(to_reqwest(Method::Options), reqwest::Method::OPTIONS);
    }

    #[test]
    fn test_client_builds() {
        assert!(NetworkClient::new().is_ok());
    }
}
