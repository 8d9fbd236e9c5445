//! In-memory window
//!
//! Keeps a session history stack and records every side effect a controller
//! asks for, so embedders without a browser (and the test suite) can drive
//! navigation and observe the result.

use super::{HistoryState, PopStateEvent, Window};
use crate::renderer::{Container, HtmlParser};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct HistoryEntry {
    url: String,
    title: String,
    state: Option<HistoryState>,
}

#[derive(Debug)]
struct HeadlessState {
    entries: Vec<HistoryEntry>,
    current: usize,
    title: String,
    document_html: String,
    body_classes: Vec<String>,
    navigations: Vec<String>,
    scroll_top_count: usize,
    scrolled_to: Vec<String>,
    redraws: usize,
}

/// A [`Window`] that lives entirely in memory
#[derive(Debug)]
pub struct HeadlessWindow {
    state: Mutex<HeadlessState>,
    supports_history: bool,
}

impl HeadlessWindow {
    /// Create a window showing an empty document at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                entries: vec![HistoryEntry {
                    url: url.into(),
                    title: String::new(),
                    state: None,
                }],
                current: 0,
                title: String::new(),
                document_html: String::new(),
                body_classes: Vec::new(),
                navigations: Vec::new(),
                scroll_top_count: 0,
                scrolled_to: Vec::new(),
                redraws: 0,
            }),
            supports_history: true,
        }
    }

    /// Load `html` as the current document; the title is taken from its `<title>`
    pub fn with_document(self, html: impl Into<String>) -> Self {
        let html = html.into();
        let title = HtmlParser::new()
            .extract(&html, "")
            .map(|e| e.title)
            .unwrap_or_default();
        if let Ok(mut state) = self.state.lock() {
            state.title = title.clone();
            let current = state.current;
            state.entries[current].title = title;
            state.document_html = html;
        }
        self
    }

    /// Simulate an environment without history manipulation support
    pub fn without_history(mut self) -> Self {
        self.supports_history = false;
        self
    }

    /// Traverse one entry back, returning the event the host would fire
    pub fn back(&self) -> Option<PopStateEvent> {
        self.traverse(-1)
    }

    /// Traverse one entry forward
    pub fn forward(&self) -> Option<PopStateEvent> {
        self.traverse(1)
    }

    fn traverse(&self, delta: isize) -> Option<PopStateEvent> {
        let mut state = self.state.lock().ok()?;
        let target = state.current.checked_add_signed(delta)?;
        let entry = state.entries.get(target)?.clone();
        state.current = target;
        Some(PopStateEvent {
            url: entry.url,
            state: entry.state,
        })
    }

    /// URLs passed to [`Window::assign`], in order
    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().map(|s| s.navigations.clone()).unwrap_or_default()
    }

    pub fn body_classes(&self) -> Vec<String> {
        self.state.lock().map(|s| s.body_classes.clone()).unwrap_or_default()
    }

    pub fn scroll_top_count(&self) -> usize {
        self.state.lock().map(|s| s.scroll_top_count).unwrap_or(0)
    }

    /// Element ids scrolled into view, in order
    pub fn scrolled_to(&self) -> Vec<String> {
        self.state.lock().map(|s| s.scrolled_to.clone()).unwrap_or_default()
    }

    pub fn redraw_count(&self) -> usize {
        self.state.lock().map(|s| s.redraws).unwrap_or(0)
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }
}

impl Window for HeadlessWindow {
    fn location(&self) -> String {
        self.state
            .lock()
            .map(|s| s.entries[s.current].url.clone())
            .unwrap_or_default()
    }

    fn title(&self) -> String {
        self.state.lock().map(|s| s.title.clone()).unwrap_or_default()
    }

    fn set_title(&self, title: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.title = title.to_string();
        }
    }

    fn document_html(&self) -> String {
        self.state.lock().map(|s| s.document_html.clone()).unwrap_or_default()
    }

    fn supports_history(&self) -> bool {
        self.supports_history
    }

    fn history_state(&self) -> Option<HistoryState> {
        let state = self.state.lock().ok()?;
        state.entries[state.current].state.clone()
    }

    fn push_state(&self, history_state: HistoryState, title: &str, url: &str) {
        if let Ok(mut state) = self.state.lock() {
            // Pushing drops the forward entries
            let keep = state.current + 1;
            state.entries.truncate(keep);
            state.entries.push(HistoryEntry {
                url: url.to_string(),
                title: title.to_string(),
                state: Some(history_state),
            });
            state.current = state.entries.len() - 1;
        }
    }

    fn replace_state(&self, history_state: HistoryState, title: &str, url: &str) {
        if let Ok(mut state) = self.state.lock() {
            let current = state.current;
            state.entries[current] = HistoryEntry {
                url: url.to_string(),
                title: title.to_string(),
                state: Some(history_state),
            };
        }
    }

    fn assign(&self, url: &str) {
        log::debug!("full navigation to {}", url);
        if let Ok(mut state) = self.state.lock() {
            state.navigations.push(url.to_string());
        }
    }

    fn scroll_to_top(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.scroll_top_count += 1;
        }
    }

    fn scroll_to_element(&self, id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.scrolled_to.push(id.to_string());
        }
    }

    fn add_body_class(&self, class: &str) {
        if let Ok(mut state) = self.state.lock() {
            if !state.body_classes.iter().any(|c| c == class) {
                state.body_classes.push(class.to_string());
            }
        }
    }

    fn remove_body_class(&self, class: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.body_classes.retain(|c| c != class);
        }
    }

    fn redraw(&self, _container: &Container) {
        if let Ok(mut state) = self.state.lock() {
            state.redraws += 1;
        }
    }
}
