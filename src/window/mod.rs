//! Host window abstraction
//!
//! Everything the controller needs from the browser environment goes through
//! the [`Window`] trait: location, title, session history, scrolling and full
//! page navigation. [`HeadlessWindow`] is an in-memory implementation.

mod headless;

pub use headless::HeadlessWindow;

use crate::renderer::Container;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State object stored with a session history entry.
///
/// `id` names the container that owns the entry; `extra` carries whatever
/// fields `alter_change_state` adds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }

    /// Builder-style host field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A back/forward traversal, as delivered by the host's `popstate` event
#[derive(Debug, Clone, PartialEq)]
pub struct PopStateEvent {
    /// Location after the traversal
    pub url: String,
    /// State of the entry traversed to; `None` if it never had one
    pub state: Option<HistoryState>,
}

/// Browser environment seen by a controller
pub trait Window: Send + Sync {
    /// Current document URL (absolute)
    fn location(&self) -> String;

    /// Current document title
    fn title(&self) -> String;

    fn set_title(&self, title: &str);

    /// Serialized markup of the current document
    fn document_html(&self) -> String;

    /// Whether push/replace of history entries is available
    fn supports_history(&self) -> bool {
        true
    }

    /// State of the current history entry
    fn history_state(&self) -> Option<HistoryState>;

    fn push_state(&self, state: HistoryState, title: &str, url: &str);

    fn replace_state(&self, state: HistoryState, title: &str, url: &str);

    /// Full, non-intercepted page navigation
    fn assign(&self, url: &str);

    fn scroll_to_top(&self);

    /// Scroll the element with `id` into view
    fn scroll_to_element(&self, id: &str);

    fn add_body_class(&self, class: &str);

    fn remove_body_class(&self, class: &str);

    /// Force a style recalculation of the container
    fn redraw(&self, _container: &Container) {}
}
