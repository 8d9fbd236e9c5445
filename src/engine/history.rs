//! Session history synchronisation
//!
//! Keeps the window's history entries, the cache records and the displayed
//! content in step. Back/forward traversals arrive through [`Registry`],
//! which routes each [`PopStateEvent`] to the controller that owns the entry.

use super::sequencer::{self, Outcome, Session};
use super::{Controller, Page, Shared};
use super::classify::is_in_page_hash;
use crate::network::Request;
use crate::renderer::Fragment;
use crate::utils::BindError;
use crate::window::{HistoryState, PopStateEvent};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, Weak};

/// Give the current entry a state and cache the document as it is displayed
pub(crate) fn establish(shared: &Shared) {
    let url = shared.window.location();
    let title = shared.window.title();

    let state = match shared.window.history_state() {
        Some(state) => state,
        None => {
            let state = (shared.options.hooks.alter_change_state)(HistoryState::new(&shared.id), &title, &url);
            shared.window.replace_state(state.clone(), &title, &url);
            state
        }
    };

    match Page::parse(url.as_str(), shared.window.document_html(), &shared.id) {
        Ok(page) => {
            let page = page.or_fragment(Fragment::new(shared.container.html()));
            shared.cache.insert_loaded(&url, page, Some(state));
        }
        Err(e) => log::debug!("#{}: initial document not cached: {}", shared.id, e),
    }
}

/// Record a completed navigation as a new history entry
pub(crate) fn push(shared: &Shared, key: &str, title: &str, url: &str) {
    let state = (shared.options.hooks.alter_change_state)(HistoryState::new(&shared.id), title, url);
    shared.window.push_state(state.clone(), title, url);
    shared.cache.set_state(key, state);
}

/// Bring the container in line with the entry the user traversed to
pub(crate) async fn handle_pop_state(shared: &Shared, event: &PopStateEvent) -> Outcome {
    let href = shared.href();

    let Some(state) = &event.state else {
        if is_in_page_hash(&event.url, &href) {
            return Outcome::Unchanged;
        }
        log::debug!("#{}: stateless entry {}, reloading", shared.id, event.url);
        shared.window.assign(&event.url);
        return Outcome::FellBack;
    };

    let diff_url = href != event.url && !is_in_page_hash(&event.url, &href);
    let diff_state = shared.cache.state(&event.url).as_ref() != Some(state);

    if diff_state {
        shared.cache.clear(Some(&event.url));
    }
    if !diff_url && !diff_state {
        return Outcome::Unchanged;
    }

    let session = Session::new(Request::get(event.url.as_str()), false).with_state(state.clone());
    sequencer::run(shared, session).await
}

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

/// Maps container ids to their live controllers
#[derive(Debug, Default)]
pub struct Registry {
    controllers: Mutex<HashMap<String, Weak<Shared>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`Controller::bind`]
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    pub(crate) fn register(&self, id: &str, shared: &Arc<Shared>) -> Result<(), BindError> {
        let Ok(mut controllers) = self.controllers.lock() else {
            return Ok(());
        };
        controllers.retain(|_, weak| weak.strong_count() > 0);
        if controllers.contains_key(id) {
            return Err(BindError::AlreadyBound(id.to_string()));
        }
        controllers.insert(id.to_string(), Arc::downgrade(shared));
        Ok(())
    }

    pub(crate) fn deregister(&self, id: &str) {
        if let Ok(mut controllers) = self.controllers.lock() {
            controllers.remove(id);
        }
    }

    /// Ids of the live controllers, sorted
    pub fn ids(&self) -> Vec<String> {
        let Ok(controllers) = self.controllers.lock() else {
            return Vec::new();
        };
        let mut ids: Vec<String> = controllers
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Look up the live controller for `id`
    pub fn get(&self, id: &str) -> Option<Controller> {
        let controllers = self.controllers.lock().ok()?;
        controllers.get(id)?.upgrade().map(Controller::from_shared)
    }

    /// Deliver a popstate event.
    ///
    /// Events carrying a state go to the controller named by `state.id`;
    /// others go to the first live controller. Returns `None` if no
    /// controller takes the event.
    pub async fn dispatch(&self, event: &PopStateEvent) -> Option<Outcome> {
        let target = match &event.state {
            Some(state) => self.get(&state.id),
            None => self.ids().first().and_then(|id| self.get(id)),
        };

        let Some(controller) = target else {
            log::debug!("no controller for popstate to {}", event.url);
            return None;
        };
        Some(controller.pop_state(event).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{MockTransport, Transport};
    use crate::renderer::{Container, Element};
    use crate::window::{HeadlessWindow, Window};
    use crate::Options;

    fn bind(registry: &Arc<Registry>, id: &str) -> Controller {
        let container = Container::new(Element::new("div").with_attr("id", id));
        let window: Arc<dyn Window> = Arc::new(HeadlessWindow::new("https://site.test/"));
        let transport: Arc<dyn Transport> = Arc::new(MockTransport::new());
        Controller::bind_in(registry, container, window, transport, Options::default()).unwrap()
    }

    #[tokio::test]
    async fn test_second_bind_rejected_while_live() {
        let registry = Arc::new(Registry::new());
        let first = bind(&registry, "main");

        let container = Container::new(Element::new("div").with_attr("id", "main"));
        let window: Arc<dyn Window> = Arc::new(HeadlessWindow::new("https://site.test/"));
        let err = Controller::bind_in(
            &registry,
            container,
            window,
            Arc::new(MockTransport::new()),
            Options::default(),
        )
        .err();
        assert!(matches!(
            err,
            Some(crate::SegueError::Bind(BindError::AlreadyBound(id))) if id == "main"
        ));

        first.unbind();
        assert!(registry.ids().is_empty());
        let _again = bind(&registry, "main");
        assert_eq!(registry.ids(), vec!["main"]);
    }

    #[tokio::test]
    async fn test_dropped_controller_is_pruned() {
        let registry = Arc::new(Registry::new());
        drop(bind(&registry, "side"));
        assert!(registry.ids().is_empty());
        assert!(registry.get("side").is_none());
    }

    #[test]
    fn test_dispatch_unknown_id() {
        let registry = Arc::new(Registry::new());
        let _main = bind(&registry, "main");
        let event = PopStateEvent {
            url: "https://site.test/".to_string(),
            state: Some(HistoryState::new("elsewhere")),
        };
        assert_eq!(tokio_test::block_on(registry.dispatch(&event)), None);
    }

    #[tokio::test]
    async fn test_same_entry_is_unchanged() {
        let registry = Arc::new(Registry::new());
        let main = bind(&registry, "main");
        let state = main.cache().state("https://site.test/");
        assert_eq!(state, Some(HistoryState::new("main")));

        let event = PopStateEvent {
            url: "https://site.test/".to_string(),
            state,
        };
        assert_eq!(registry.dispatch(&event).await, Some(Outcome::Unchanged));
    }

    #[test]
    fn test_stateless_hash_entry_is_ignored() {
        let registry = Arc::new(Registry::new());
        let _main = bind(&registry, "main");
        let event = PopStateEvent {
            url: "https://site.test/#team".to_string(),
            state: None,
        };
        assert_eq!(tokio_test::block_on(registry.dispatch(&event)), Some(Outcome::Unchanged));
    }
}
