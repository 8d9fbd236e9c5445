//! Container controller
//!
//! A [`Controller`] is bound to one container element. It intercepts clicks
//! on qualifying links and form submissions, fetches the target page in the
//! background, and swaps the container's content through a timed transition:
//! 1. Classify the interaction and build the request
//! 2. Fetch into the page cache via the [`Fetcher`]
//! 3. Sequence the start/progress/ready phases
//! 4. Push history and update the document title

pub mod classify;
mod history;
pub mod options;
mod page;
pub mod rate_limit;
pub mod sequencer;

pub use history::Registry;
pub use options::{Hooks, Options, Phase, Settings};
pub use page::Page;
pub use rate_limit::RateLimiter;
pub use sequencer::{Outcome, Session, SessionState, Step};

use crate::network::{FetchCallback, Fetcher, Method, PageCache, Request, Transport, serialize_fields};
use crate::renderer::{Container, Element, SelectorList};
use crate::utils::{BindError, Result};
use crate::window::{PopStateEvent, Window};
use classify::{fragment_id, resolve};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use url::Url;

/// What a controller did with a click or submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Not intercepted; the host should perform its default action
    PassThrough,
    /// Intercepted but dropped because it came too soon after the last one
    RateLimited,
    /// Loaded in place
    Navigated(Outcome),
}

impl Interaction {
    /// Whether the host's default action must be suppressed
    pub fn is_intercepted(&self) -> bool {
        !matches!(self, Interaction::PassThrough)
    }
}

/// A click on an element inside the container
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub target: Element,
    pub meta_key: bool,
    pub ctrl_key: bool,
}

impl ClickEvent {
    pub fn new(target: Element) -> Self {
        Self {
            target,
            meta_key: false,
            ctrl_key: false,
        }
    }

    /// Click with a modifier that opens links elsewhere
    pub fn with_modifier(mut self) -> Self {
        self.meta_key = true;
        self
    }
}

/// A form submission with its successful controls in document order
#[derive(Debug, Clone)]
pub struct Form {
    pub element: Element,
    pub fields: Vec<(String, String)>,
}

impl Form {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// `action` attribute, if present and non-empty
    pub fn action(&self) -> Option<&str> {
        self.element
            .get_attribute("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Submission method, GET when unspecified
    pub fn method(&self) -> Method {
        self.element
            .get_attribute("method")
            .map(Method::parse)
            .unwrap_or_default()
    }

    fn body(&self) -> String {
        serialize_fields(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

#[derive(Debug)]
struct ControllerState {
    href: String,
    /// Sessions between their start phase and their end
    active_sessions: usize,
    limiter: RateLimiter,
}

/// State shared by every handle to one controller
pub(crate) struct Shared {
    pub(crate) id: String,
    pub(crate) container: Container,
    pub(crate) window: Arc<dyn Window>,
    pub(crate) options: Options,
    pub(crate) cache: PageCache,
    pub(crate) fetcher: Fetcher,
    enabled: bool,
    registry: Arc<Registry>,
    state: Mutex<ControllerState>,
}

impl Shared {
    pub(crate) fn href(&self) -> String {
        self.state.lock().map(|s| s.href.clone()).unwrap_or_default()
    }

    pub(crate) fn set_href(&self, href: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.href = href.to_string();
        }
    }

    pub(crate) fn is_transitioning(&self) -> bool {
        self.state.lock().map(|s| s.active_sessions > 0).unwrap_or(false)
    }

    pub(crate) fn begin_transition(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.active_sessions += 1;
        }
    }

    /// Each call must pair with one [`Self::begin_transition`]
    pub(crate) fn end_transition(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.active_sessions = state.active_sessions.saturating_sub(1);
        }
    }

    fn try_acquire(&self) -> bool {
        self.state
            .lock()
            .map(|mut s| s.limiter.try_acquire())
            .unwrap_or(true)
    }
}

/// Page transition controller for one container
#[derive(Clone)]
pub struct Controller {
    shared: Arc<Shared>,
}

impl Controller {
    /// Bind a controller to `container`, registering it in the global
    /// [`Registry`] so popstate events reach it.
    ///
    /// Fails if the container has no id or is the `body`/`html` element. In
    /// an environment without history support the controller is returned
    /// disabled.
    pub fn bind(
        container: Container,
        window: Arc<dyn Window>,
        transport: Arc<dyn Transport>,
        options: Options,
    ) -> Result<Self> {
        Self::bind_in(&Registry::global(), container, window, transport, options)
    }

    /// Bind against an explicit registry
    pub fn bind_in(
        registry: &Arc<Registry>,
        container: Container,
        window: Arc<dyn Window>,
        transport: Arc<dyn Transport>,
        options: Options,
    ) -> Result<Self> {
        let Some(id) = container.id().map(String::from) else {
            if options.debug {
                log::warn!("container has no id; transitions are disabled");
            }
            return Err(BindError::MissingId.into());
        };

        let tag = container.tag_name().to_string();
        if tag == "body" || tag == "html" {
            if options.debug {
                log::warn!("#{} is a <{}>; bind to an element inside the body instead", id, tag);
            }
            return Err(BindError::UnsupportedTag(tag).into());
        }

        let enabled = window.supports_history();
        let cache = PageCache::new(options.cache_length);
        let fetcher = Fetcher::new(cache.clone(), transport, id.as_str());
        let state = ControllerState {
            href: window.location(),
            active_sessions: 0,
            limiter: RateLimiter::new(options.repeat_delay),
        };

        let shared = Arc::new(Shared {
            id,
            container,
            window,
            options,
            cache,
            fetcher,
            enabled,
            registry: Arc::clone(registry),
            state: Mutex::new(state),
        });

        if enabled {
            registry.register(&shared.id, &shared)?;
            history::establish(&shared);
            log::debug!("bound #{} at {}", shared.id, shared.href());
        } else {
            log::debug!("history not supported, #{} left to full page loads", shared.id);
        }

        Ok(Self { shared })
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Handle a click inside the container
    pub async fn click(&self, event: &ClickEvent) -> Interaction {
        let shared = &self.shared;
        if !shared.enabled || event.meta_key || event.ctrl_key {
            return Interaction::PassThrough;
        }

        let anchor = &event.target;
        if !shared.options.anchors.as_ref().is_some_and(|a| a.matches(anchor)) {
            return Interaction::PassThrough;
        }
        let Some(url) = self.navigable_url(anchor, &shared.options.blacklist) else {
            return Interaction::PassThrough;
        };

        if !shared.try_acquire() {
            log::debug!("#{}: click on {} rate limited", shared.id, url);
            return Interaction::RateLimited;
        }

        let request = (shared.options.hooks.alter_request)(Request::get(url.as_str()));
        (shared.options.hooks.on_before)(anchor, &shared.container);

        let session = Session::new(request, true).scroll_to(fragment_id(&url));
        Interaction::Navigated(sequencer::run(shared, session).await)
    }

    /// Prefetch on hover/touch. Returns true if a request was issued.
    pub fn hover(&self, event_name: &str, anchor: &Element) -> bool {
        let shared = &self.shared;
        let options = &shared.options;
        if !shared.enabled || !options.prefetch || !options.prefetch_on.iter().any(|e| e == event_name) {
            return false;
        }
        if !options.anchors.as_ref().is_some_and(|a| a.matches(anchor))
            || options.prefetch_blacklist.matches(anchor)
            || shared.is_transitioning()
        {
            return false;
        }
        let Some(url) = self.navigable_url(anchor, &options.blacklist) else {
            return false;
        };

        let request = (options.hooks.alter_request)(Request::get(url));
        shared.fetcher.fetch(&request, None).is_some()
    }

    /// Handle a form submission inside the container
    pub async fn submit(&self, form: &Form) -> Interaction {
        let shared = &self.shared;
        let options = &shared.options;
        if !shared.enabled
            || !options.forms.as_ref().is_some_and(|f| f.matches(&form.element))
            || options.blacklist.matches(&form.element)
        {
            return Interaction::PassThrough;
        }

        if !shared.try_acquire() {
            log::debug!("#{}: submit rate limited", shared.id);
            return Interaction::RateLimited;
        }

        let current = shared.window.location();
        let action = form
            .action()
            .and_then(|a| resolve(a, &current))
            .unwrap_or(current);

        let request = Request::new(form.method(), action)
            .body(form.body())
            .cacheable(options.allow_form_caching);
        let request = query_for_get((options.hooks.alter_request)(request));

        (options.hooks.on_before)(&form.element, &shared.container);
        Interaction::Navigated(sequencer::run(shared, Session::new(request, true)).await)
    }

    /// Load `request` and push a history entry
    pub async fn load(&self, request: impl Into<Request>) -> Outcome {
        self.load_with(request, true, true).await
    }

    /// Load `request`, optionally without pushing history or keeping the
    /// response cached
    pub async fn load_with(&self, request: impl Into<Request>, push: bool, cacheable: bool) -> Outcome {
        let request = self.absolute(request.into()).cacheable(cacheable);
        if !self.shared.enabled {
            self.shared.window.assign(request.url());
            return Outcome::FellBack;
        }

        let target = fragment_id(request.url()).map(String::from);
        let session = Session::new(request, push).scroll_to(target.as_deref());
        sequencer::run(&self.shared, session).await
    }

    /// Fetch `request` into the cache without displaying it.
    ///
    /// Returns the handle of the background task, or `None` when the page is
    /// already cached or in flight.
    pub fn fetch(&self, request: impl Into<Request>, callback: Option<FetchCallback>) -> Option<JoinHandle<()>> {
        let request = self.absolute(request.into());
        self.shared.fetcher.fetch(&request, callback)
    }

    /// Handle a back/forward traversal
    pub async fn pop_state(&self, event: &PopStateEvent) -> Outcome {
        if !self.shared.enabled {
            return Outcome::Unchanged;
        }
        history::handle_pop_state(&self.shared, event).await
    }

    /// Remove one cached page (relative URLs allowed), or all of them
    pub fn clear(&self, url: Option<&str>) {
        match url {
            Some(url) => {
                let key = resolve(url, &self.shared.window.location()).unwrap_or_else(|| url.to_string());
                self.shared.cache.clear(Some(&key));
            }
            None => self.shared.cache.clear(None),
        }
    }

    /// Replay the container's CSS animations by dropping and restoring its
    /// classes around a forced redraw
    pub fn restart_css_animations(&self) {
        let container = &self.shared.container;
        let classes = container.replace_classes(Vec::new());
        self.shared.window.redraw(container);
        container.replace_classes(classes);
    }

    /// URL of the content currently displayed
    pub fn href(&self) -> String {
        self.shared.href()
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn cache(&self) -> &PageCache {
        &self.shared.cache
    }

    pub fn container(&self) -> &Container {
        &self.shared.container
    }

    pub fn options(&self) -> &Options {
        &self.shared.options
    }

    /// False when the environment lacks history support
    pub fn is_enabled(&self) -> bool {
        self.shared.enabled
    }

    /// True while any session of this controller is running
    pub fn is_transitioning(&self) -> bool {
        self.shared.is_transitioning()
    }

    /// Stop receiving popstate events
    pub fn unbind(&self) {
        self.shared.registry.deregister(&self.shared.id);
        log::debug!("unbound #{}", self.shared.id);
    }

    fn absolute(&self, request: Request) -> Request {
        match resolve(request.url(), &self.shared.window.location()) {
            Some(url) => request.url_to(url),
            None => request,
        }
    }

    fn navigable_url(&self, anchor: &Element, exclude: &SelectorList) -> Option<String> {
        let href = anchor.get_attribute("href")?;
        let current = self.shared.window.location();
        let url = resolve(href, &current)?;
        let has_target = anchor.get_attribute("target").is_some_and(|t| !t.trim().is_empty());

        classify::is_navigable(
            &url,
            &current,
            exclude.matches(anchor),
            has_target,
            self.shared.options.href_regex.as_ref(),
        )
        .then_some(url)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.shared.id)
            .field("enabled", &self.shared.enabled)
            .field("href", &self.shared.href())
            .finish()
    }
}

/// Move a GET body into the query string, as a browser does for GET forms
fn query_for_get(request: Request) -> Request {
    if request.method() != Method::Get {
        return request;
    }
    let query = request.body_str().unwrap_or_default().to_string();
    let Ok(mut url) = Url::parse(request.url()) else {
        return request;
    };
    url.set_query(Some(query.as_str()).filter(|q| !q.is_empty()));

    Request::get(String::from(url)).cacheable(request.is_cacheable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MockTransport;
    use crate::window::HeadlessWindow;

    fn controller(registry: &Arc<Registry>, window: Arc<HeadlessWindow>) -> Controller {
        let container = Container::new(Element::new("div").with_attr("id", "main").with_attr("class", "scene"));
        Controller::bind_in(
            registry,
            container,
            window,
            Arc::new(MockTransport::new()),
            Options::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_query_for_get() {
        let request = query_for_get(Request::get("https://site.test/search").body("q=x"));
        assert_eq!(request.url(), "https://site.test/search?q=x");
        assert_eq!(request.body_str(), None);

        let request = query_for_get(Request::post("https://site.test/search", "q=x"));
        assert_eq!(request.url(), "https://site.test/search");
        assert_eq!(request.body_str(), Some("q=x"));
    }

    #[test]
    fn test_form_defaults() {
        let form = Form::new(Element::new("form")).field("q", "a b");
        assert_eq!(form.action(), None);
        assert_eq!(form.method(), Method::Get);
        assert_eq!(form.body(), "q=a+b");

        let form = Form::new(Element::new("form").with_attr("method", "POST").with_attr("action", "/send"));
        assert_eq!(form.action(), Some("/send"));
        assert_eq!(form.method(), Method::Post);
    }

    #[tokio::test]
    async fn test_bind_seeds_history_and_cache() {
        let registry = Arc::new(Registry::new());
        let window = Arc::new(
            HeadlessWindow::new("https://site.test/")
                .with_document("<title>Home</title><div id='main'><p>Home</p></div>"),
        );
        let main = controller(&registry, Arc::clone(&window));

        assert!(main.is_enabled());
        assert_eq!(main.href(), "https://site.test/");
        assert_eq!(window.history_state().map(|s| s.id), Some("main".to_string()));
        let page = main.cache().page("https://site.test/").unwrap();
        assert_eq!(page.title(), "Home");
        assert_eq!(page.fragment().map(|f| f.html()), Some("<p>Home</p>"));
    }

    #[tokio::test]
    async fn test_restart_css_animations() {
        let registry = Arc::new(Registry::new());
        let window = Arc::new(HeadlessWindow::new("https://site.test/"));
        let main = controller(&registry, Arc::clone(&window));

        main.restart_css_animations();
        assert_eq!(window.redraw_count(), 1);
        assert_eq!(main.container().classes(), vec!["scene"]);
    }

    #[tokio::test]
    async fn test_clear_resolves_relative_urls() {
        let registry = Arc::new(Registry::new());
        let window = Arc::new(HeadlessWindow::new("https://site.test/"));
        let main = controller(&registry, window);

        assert!(main.cache().contains("https://site.test/"));
        main.clear(Some("/"));
        assert!(main.cache().is_empty());
    }

    #[tokio::test]
    async fn test_modifier_click_passes_through() {
        let registry = Arc::new(Registry::new());
        let window = Arc::new(HeadlessWindow::new("https://site.test/"));
        let main = controller(&registry, window);

        let anchor = Element::new("a").with_attr("href", "/about");
        let event = ClickEvent::new(anchor).with_modifier();
        assert_eq!(main.click(&event).await, Interaction::PassThrough);
        assert!(!Interaction::PassThrough.is_intercepted());
    }
}
