//! # Segue - Animated Page Transitions
//!
//! Turns ordinary multi-page navigation into in-place content swaps. A
//! controller bound to a container intercepts link clicks and form
//! submissions, fetches the next page in the background, and replaces the
//! container's content through timed start/progress/ready phases while
//! keeping history, the document title and the page cache in sync.
//!
//! ## Architecture
//!
//! - **engine**: the controller, URL classification, transition sequencing
//!   and history synchronisation
//! - **network**: requests, the transport seam, the page cache and fetcher
//! - **renderer**: HTML extraction and the container/element model
//! - **window**: the host environment abstraction and a headless window
//! - **utils**: shared error types

pub mod engine;
pub mod network;
pub mod renderer;
pub mod utils;
pub mod window;

// Re-export main types for convenience
pub use engine::{
    ClickEvent, Controller, Form, Hooks, Interaction, Options, Outcome, Page, Phase, Registry, Settings,
};
pub use network::{CacheStatus, NetworkClient, PageCache, Request, Response, Transport};
pub use renderer::{Container, Element, Fragment};
pub use utils::error::{Result, SegueError};
pub use window::{HeadlessWindow, HistoryState, PopStateEvent, Window};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Segue";
