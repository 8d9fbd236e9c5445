//! Controller configuration
//!
//! [`Options`] holds every recognised setting with an independent default.
//! Hooks are plain `Arc<dyn Fn>` values and can only be set in code;
//! [`Settings`] is the serde-friendly subset used to load the rest from JSON.

use crate::network::Request;
use crate::renderer::{Container, Element, Fragment, SelectorList};
use crate::utils::ConfigError;
use crate::window::HistoryState;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type BeforeHook = Arc<dyn Fn(&Element, &Container) + Send + Sync>;
pub type RenderHook = Arc<dyn Fn(&Container) + Send + Sync>;
pub type ContentHook = Arc<dyn Fn(&Container, &Fragment) + Send + Sync>;
pub type AlterRequest = Arc<dyn Fn(Request) -> Request + Send + Sync>;
pub type AlterChangeState = Arc<dyn Fn(HistoryState, &str, &str) -> HistoryState + Send + Sync>;

/// A timed lifecycle phase: the render hook runs when the phase starts, and
/// the sequencer waits `duration` before moving on
#[derive(Clone)]
pub struct Phase<R> {
    pub duration: Duration,
    pub render: R,
}

impl<R> Phase<R> {
    pub fn new(duration: Duration, render: R) -> Self {
        Self { duration, render }
    }
}

/// Host-supplied lifecycle hooks
#[derive(Clone)]
pub struct Hooks {
    /// Rewrites every request before it is issued
    pub alter_request: AlterRequest,
    /// Rewrites the state stored with each history entry
    pub alter_change_state: AlterChangeState,
    /// Runs before a click or submit starts a session
    pub on_before: BeforeHook,
    pub on_start: Phase<RenderHook>,
    /// Runs only if the page is still loading when the start phase ends
    pub on_progress: Phase<RenderHook>,
    /// Receives the new content; the default swaps it into the container
    pub on_ready: Phase<ContentHook>,
    /// Runs once the ready phase has elapsed
    pub on_after: ContentHook,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            alter_request: Arc::new(|request| request),
            alter_change_state: Arc::new(|state, _title, _url| state),
            on_before: Arc::new(|_, _| {}),
            on_start: Phase::new(Duration::ZERO, Arc::new(|_| {})),
            on_progress: Phase::new(Duration::ZERO, Arc::new(|_| {})),
            on_ready: Phase::new(
                Duration::ZERO,
                Arc::new(|container: &Container, fragment: &Fragment| {
                    container.set_html(fragment.html())
                }),
            ),
            on_after: Arc::new(|_, _| {}),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_start", &self.on_start.duration)
            .field("on_progress", &self.on_progress.duration)
            .field("on_ready", &self.on_ready.duration)
            .finish_non_exhaustive()
    }
}

/// Per-controller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Log diagnostics instead of falling back to a full page load
    pub debug: bool,
    /// Anchors to intercept; `None` disables link handling
    pub anchors: Option<SelectorList>,
    /// Only hrefs matching this pattern are loaded in place
    pub href_regex: Option<Regex>,
    /// Forms to intercept; `None` disables form handling
    pub forms: Option<SelectorList>,
    /// Keep form responses in the cache
    pub allow_form_caching: bool,
    /// Minimum time between accepted clicks/submits
    pub repeat_delay: Option<Duration>,
    /// Anchors and forms that are never intercepted
    pub blacklist: SelectorList,
    /// Fetch pages on hover before they are clicked
    pub prefetch: bool,
    /// Event names that trigger a prefetch
    pub prefetch_on: Vec<String>,
    /// Anchors that are never prefetched
    pub prefetch_blacklist: SelectorList,
    /// Number of pages kept in memory
    pub cache_length: usize,
    /// Body class present while a page is loading
    pub loading_class: Option<String>,
    /// Scroll to top after the start phase and to the target fragment at the end
    pub scroll: bool,
    pub hooks: Hooks,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            anchors: Some(SelectorList::parse("a").unwrap_or_default()),
            href_regex: None,
            forms: Some(SelectorList::parse("form").unwrap_or_default()),
            allow_form_caching: false,
            repeat_delay: Some(Duration::from_millis(500)),
            blacklist: SelectorList::parse(".no-smoothState").unwrap_or_default(),
            prefetch: false,
            prefetch_on: vec!["mouseover".to_string(), "touchstart".to_string()],
            prefetch_blacklist: SelectorList::parse(".no-prefetch").unwrap_or_default(),
            cache_length: 0,
            loading_class: Some("is-loading".to_string()),
            scroll: true,
            hooks: Hooks::default(),
        }
    }
}

impl Options {
    pub fn on_before(mut self, f: impl Fn(&Element, &Container) + Send + Sync + 'static) -> Self {
        self.hooks.on_before = Arc::new(f);
        self
    }

    pub fn on_start(mut self, duration: Duration, f: impl Fn(&Container) + Send + Sync + 'static) -> Self {
        self.hooks.on_start = Phase::new(duration, Arc::new(f));
        self
    }

    pub fn on_progress(mut self, duration: Duration, f: impl Fn(&Container) + Send + Sync + 'static) -> Self {
        self.hooks.on_progress = Phase::new(duration, Arc::new(f));
        self
    }

    pub fn on_ready(
        mut self,
        duration: Duration,
        f: impl Fn(&Container, &Fragment) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_ready = Phase::new(duration, Arc::new(f));
        self
    }

    pub fn on_after(mut self, f: impl Fn(&Container, &Fragment) + Send + Sync + 'static) -> Self {
        self.hooks.on_after = Arc::new(f);
        self
    }

    pub fn alter_request(mut self, f: impl Fn(Request) -> Request + Send + Sync + 'static) -> Self {
        self.hooks.alter_request = Arc::new(f);
        self
    }

    pub fn alter_change_state(
        mut self,
        f: impl Fn(HistoryState, &str, &str) -> HistoryState + Send + Sync + 'static,
    ) -> Self {
        self.hooks.alter_change_state = Arc::new(f);
        self
    }
}

/// Serializable option subset
///
/// ```
/// let settings: segue::Settings = serde_json::from_str(
///     r#"{ "prefetch": true, "cacheLength": 4, "repeatDelay": null }"#,
/// ).unwrap();
/// let options = settings.into_options().unwrap();
/// assert!(options.prefetch);
/// assert_eq!(options.repeat_delay, None);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub debug: bool,
    pub anchors: Option<String>,
    pub href_regex: Option<String>,
    pub forms: Option<String>,
    pub allow_form_caching: bool,
    /// Milliseconds; `null` disables rate limiting
    pub repeat_delay: Option<u64>,
    pub blacklist: String,
    pub prefetch: bool,
    /// Space separated event names
    pub prefetch_on: String,
    pub prefetch_blacklist: String,
    pub cache_length: usize,
    pub loading_class: Option<String>,
    pub scroll: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            anchors: Some("a".to_string()),
            href_regex: None,
            forms: Some("form".to_string()),
            allow_form_caching: false,
            repeat_delay: Some(500),
            blacklist: ".no-smoothState".to_string(),
            prefetch: false,
            prefetch_on: "mouseover touchstart".to_string(),
            prefetch_blacklist: ".no-prefetch".to_string(),
            cache_length: 0,
            loading_class: Some("is-loading".to_string()),
            scroll: true,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate selectors and patterns, producing options with default hooks
    pub fn into_options(self) -> Result<Options, ConfigError> {
        let selector = |s: Option<String>| -> Result<Option<SelectorList>, ConfigError> {
            match s.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => SelectorList::parse(s).map(Some),
            }
        };
        let exclusion = |s: &str| -> Result<SelectorList, ConfigError> {
            if s.trim().is_empty() {
                Ok(SelectorList::none())
            } else {
                SelectorList::parse(s)
            }
        };

        let href_regex = match self.href_regex.as_deref() {
            None | Some("") => None,
            Some(pattern) => Some(Regex::new(pattern)?),
        };

        Ok(Options {
            debug: self.debug,
            anchors: selector(self.anchors)?,
            href_regex,
            forms: selector(self.forms)?,
            allow_form_caching: self.allow_form_caching,
            repeat_delay: self.repeat_delay.map(Duration::from_millis),
            blacklist: exclusion(&self.blacklist)?,
            prefetch: self.prefetch,
            prefetch_on: self.prefetch_on.split_whitespace().map(String::from).collect(),
            prefetch_blacklist: exclusion(&self.prefetch_blacklist)?,
            cache_length: self.cache_length,
            loading_class: self.loading_class.filter(|c| !c.is_empty()),
            scroll: self.scroll,
            hooks: Hooks::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(!options.debug);
        assert_eq!(options.repeat_delay, Some(Duration::from_millis(500)));
        assert_eq!(options.cache_length, 0);
        assert_eq!(options.prefetch_on, vec!["mouseover", "touchstart"]);
        assert!(options.blacklist.matches(&Element::new("a").with_attr("class", "no-smoothState")));
        assert!(options.anchors.unwrap().matches(&Element::new("a")));
    }

    #[test]
    fn test_default_ready_replaces_content() {
        let container = Container::new(Element::new("div").with_attr("id", "main")).with_html("old");
        let hooks = Hooks::default();
        (hooks.on_ready.render)(&container, &Fragment::new("<p>new</p>"));
        assert_eq!(container.html(), "<p>new</p>");
    }

    #[test]
    fn test_settings_roundtrip_defaults() {
        let options = Settings::from_json("{}").unwrap().into_options().unwrap();
        let defaults = Options::default();
        assert_eq!(options.repeat_delay, defaults.repeat_delay);
        assert_eq!(options.blacklist, defaults.blacklist);
        assert_eq!(options.anchors, defaults.anchors);
        assert_eq!(options.loading_class, defaults.loading_class);
    }

    #[test]
    fn test_settings_overrides() {
        let settings = Settings::from_json(
            r#"{
                "debug": true,
                "forms": "",
                "hrefRegex": "^https://site\\.test/blog",
                "prefetch": true,
                "prefetchOn": "mouseover",
                "blacklist": "",
                "cacheLength": 3,
                "loadingClass": null,
                "repeatDelay": 250
            }"#,
        )
        .unwrap();
        let options = settings.into_options().unwrap();
        assert!(options.debug);
        assert!(options.forms.is_none());
        assert!(options.href_regex.unwrap().is_match("https://site.test/blog/x"));
        assert_eq!(options.prefetch_on, vec!["mouseover"]);
        assert!(options.blacklist.is_empty());
        assert_eq!(options.cache_length, 3);
        assert_eq!(options.loading_class, None);
        assert_eq!(options.repeat_delay, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_settings_validation() {
        let bad_selector = Settings {
            anchors: Some("a[href".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_selector.into_options(), Err(ConfigError::InvalidSelector(_))));

        let bad_pattern = Settings {
            href_regex: Some("(".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_pattern.into_options(), Err(ConfigError::InvalidPattern(_))));

        assert!(matches!(
            Settings::from_json(r#"{ "cacheLength": -1 }"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
