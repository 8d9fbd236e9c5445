//! Network stack for Segue
//!
//! Request descriptors, the transport seam, the page cache and the fetcher
//! that connects them.

mod cache;
mod client;
mod fetcher;
mod request;
mod response;

pub use cache::{CacheRecord, CacheStats, CacheStatus, PageCache};
pub use client::NetworkClient;
pub use fetcher::{FetchCallback, Fetcher};
pub use request::{Method, Request, serialize_fields};
pub use response::Response;

use crate::utils::Result;
use async_trait::async_trait;

/// Performs one HTTP exchange.
///
/// The controller treats the transport as an external collaborator: it only
/// needs a request sent and a response (or error) back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response>;
}
