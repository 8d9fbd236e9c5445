//! Background page fetching
//!
//! Claims a cache slot, sends the request on a spawned task and stores the
//! parsed page (or the failure) when the response arrives.

use super::{CacheStatus, PageCache, Request, Transport};
use crate::engine::Page;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Invoked once with the final status of a fetch that was actually issued
pub type FetchCallback = Box<dyn FnOnce(CacheStatus) + Send + 'static>;

/// Fetches pages for one container into its cache
#[derive(Clone)]
pub struct Fetcher {
    cache: PageCache,
    transport: Arc<dyn Transport>,
    container_id: String,
}

impl Fetcher {
    pub fn new(cache: PageCache, transport: Arc<dyn Transport>, container_id: impl Into<String>) -> Self {
        Self {
            cache,
            transport,
            container_id: container_id.into(),
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Start fetching `request` unless the cache already has it.
    ///
    /// Returns the handle of the spawned task, or `None` when no request was
    /// issued. In that case `callback` is dropped without being called.
    pub fn fetch(&self, request: &Request, callback: Option<FetchCallback>) -> Option<JoinHandle<()>> {
        if !self.cache.begin(request) {
            log::debug!("{} already cached or in flight", request.url());
            return None;
        }

        log::debug!("fetching {} {}", request.method(), request.url());

        let cache = self.cache.clone();
        let transport = Arc::clone(&self.transport);
        let container_id = self.container_id.clone();
        let request = request.clone();

        Some(tokio::spawn(async move {
            let key = request.key();
            let status = match transport.send(&request).await {
                Ok(response) if response.is_success() && !response.is_html() => {
                    log::debug!(
                        "{} is not a page ({})",
                        request.url(),
                        response.content_type().unwrap_or_default()
                    );
                    cache.store_error(&key);
                    CacheStatus::Error
                }
                Ok(response) if response.is_success() => {
                    match Page::parse(request.url(), response.body(), &container_id) {
                        Ok(page) => {
                            cache.store_loaded(&key, page);
                            CacheStatus::Loaded
                        }
                        Err(e) => {
                            log::warn!("could not parse {}: {}", request.url(), e);
                            cache.store_error(&key);
                            CacheStatus::Error
                        }
                    }
                }
                Ok(response) => {
                    log::debug!("{} answered HTTP {}", request.url(), response.status());
                    cache.store_error(&key);
                    CacheStatus::Error
                }
                Err(e) => {
                    log::debug!("request for {} failed: {}", request.url(), e);
                    cache.store_error(&key);
                    CacheStatus::Error
                }
            };

            if let Some(callback) = callback {
                callback(status);
            }
        }))
    }

    /// Fetch several pages concurrently and wait for all of them.
    /// Returns the resulting status of each request, in order.
    pub async fn fetch_all(&self, requests: &[Request]) -> Vec<Option<CacheStatus>> {
        let handles: Vec<_> = requests.iter().filter_map(|r| self.fetch(r, None)).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                log::warn!("fetch task failed: {}", e);
            }
        }
        requests.iter().map(|r| self.cache.status(&r.key())).collect()
    }
}
