//! Transition sequencing
//!
//! A session drives one navigation through `Idle → Started → (Progressing)? →
//! Ready → Idle`, running the render hooks and waiting out each phase's
//! duration. The branching is in [`decide`] and [`SessionState::advance`];
//! [`run`] only adds the timers and side effects.

use super::{Shared, history};
use crate::network::{CacheStatus, Request};
use crate::renderer::Fragment;
use crate::window::HistoryState;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};

/// How often the cache is polled while a page is still loading
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a navigation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// New content is displayed
    Completed,
    /// Nothing to do: the target is already displayed
    Unchanged,
    /// The page could not be loaded in place; a full navigation was issued
    FellBack,
    /// The page could not be loaded in place and debug mode is on
    Failed,
    /// The cache entry was cleared while the session waited for it
    Abandoned,
}

/// Lifecycle position of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Started,
    Progressing,
    Ready,
}

impl SessionState {
    /// Whether `self → next` is a valid transition.
    /// Started and Progressing may drop back to Idle when a session aborts.
    pub fn can_advance(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Started)
                | (Started, Progressing)
                | (Started, Ready)
                | (Progressing, Ready)
                | (Ready, Idle)
                | (Started, Idle)
                | (Progressing, Idle)
        )
    }

    /// Move to `next`, leaving the state untouched if the transition is invalid
    pub fn advance(&mut self, next: SessionState) -> bool {
        if !self.can_advance(next) {
            log::debug!("rejected session transition {:?} -> {:?}", self, next);
            return false;
        }
        *self = next;
        true
    }
}

/// What to do after checking the cache record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Wait,
    Ready,
    Abort,
    Vanished,
}

/// Map the target's cache status to the next step
pub fn decide(status: Option<CacheStatus>) -> Step {
    match status {
        Some(CacheStatus::Fetching) => Step::Wait,
        Some(CacheStatus::Loaded) => Step::Ready,
        Some(CacheStatus::Error) => Step::Abort,
        None => Step::Vanished,
    }
}

/// One navigation request in flight
#[derive(Debug, Clone)]
pub struct Session {
    pub request: Request,
    /// Push a history entry when the content is ready
    pub push: bool,
    /// Element id to scroll to once the content is in place
    pub scroll_target: Option<String>,
    /// State of the history entry being restored, for sessions that do not push
    pub state: Option<HistoryState>,
}

impl Session {
    pub fn new(request: Request, push: bool) -> Self {
        Self {
            request,
            push,
            scroll_target: None,
            state: None,
        }
    }

    /// Record `state` against the page once it is displayed
    pub fn with_state(mut self, state: HistoryState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn scroll_to(mut self, id: Option<&str>) -> Self {
        self.scroll_target = id.map(String::from);
        self
    }
}

/// Run a session to completion
pub(crate) async fn run(shared: &Shared, session: Session) -> Outcome {
    let Session {
        request,
        push,
        scroll_target,
        state: entry_state,
    } = session;
    let key = request.key();
    let url = request.url().to_string();
    let hooks = &shared.options.hooks;
    let mut state = SessionState::Idle;

    if !shared.cache.contains(&key) {
        shared.fetcher.fetch(&request, None);
    }

    shared.begin_transition();
    state.advance(SessionState::Started);
    log::debug!("#{}: loading {}", shared.id, url);

    (hooks.on_start.render)(&shared.container);
    sleep(hooks.on_start.duration).await;
    if shared.options.scroll {
        shared.window.scroll_to_top();
    }

    let mut progress_deadline = None;
    let page = loop {
        match decide(shared.cache.status(&key)) {
            Step::Wait => {
                if progress_deadline.is_none() {
                    state.advance(SessionState::Progressing);
                    if let Some(class) = &shared.options.loading_class {
                        shared.window.add_body_class(class);
                    }
                    (hooks.on_progress.render)(&shared.container);
                    progress_deadline = Some(Instant::now() + hooks.on_progress.duration);
                }
                sleep(POLL_INTERVAL).await;
            }
            Step::Ready => match shared.cache.page(&key) {
                Some(page) if page.fragment().is_some() => break page,
                _ => {
                    state.advance(SessionState::Idle);
                    return fail(shared, &key, &url, "response has no content for the container");
                }
            },
            Step::Abort => {
                state.advance(SessionState::Idle);
                return fail(shared, &key, &url, "request failed");
            }
            Step::Vanished => {
                state.advance(SessionState::Idle);
                log::debug!("#{}: cache entry for {} was cleared, abandoning", shared.id, url);
                finish(shared);
                return Outcome::Abandoned;
            }
        }
    };

    state.advance(SessionState::Ready);
    let fragment: Fragment = page.fragment().cloned().unwrap_or_default();
    let title = page.title().to_string();

    if push {
        history::push(shared, &key, &title, &url);
    } else if let Some(entry_state) = entry_state {
        shared.cache.set_state(&key, entry_state);
    }

    if let Some(deadline) = progress_deadline {
        sleep_until(deadline).await;
    }

    shared.window.set_title(&title);
    shared.set_href(&url);
    if let Some(class) = &shared.options.loading_class {
        shared.window.remove_body_class(class);
    }

    (hooks.on_ready.render)(&shared.container, &fragment);
    sleep(hooks.on_ready.duration).await;

    shared.end_transition();
    state.advance(SessionState::Idle);
    (hooks.on_after)(&shared.container, &fragment);

    if shared.options.scroll {
        if let Some(id) = scroll_target.as_deref() {
            if Fragment::new(shared.container.html()).contains_id(id) {
                shared.window.scroll_to_element(id);
            }
        }
    }

    if !request.is_cacheable() {
        shared.cache.clear(Some(&key));
    }

    log::debug!("#{}: displayed {}", shared.id, url);
    Outcome::Completed
}

fn finish(shared: &Shared) {
    shared.end_transition();
    if let Some(class) = &shared.options.loading_class {
        shared.window.remove_body_class(class);
    }
}

fn fail(shared: &Shared, key: &str, url: &str, reason: &str) -> Outcome {
    finish(shared);
    // Forget the failure so the next attempt refetches
    shared.cache.clear(Some(key));

    if shared.options.debug {
        log::warn!("#{}: could not load {}: {}", shared.id, url, reason);
        return Outcome::Failed;
    }
    log::debug!("#{}: {} for {}, falling back to full navigation", shared.id, reason, url);
    shared.window.assign(url);
    Outcome::FellBack
}
