//! Interaction rate limiting

use std::time::Duration;
use tokio::time::Instant;

/// Rejects interactions that arrive before `delay` has passed since the last
/// accepted one
#[derive(Debug, Clone)]
pub struct RateLimiter {
    delay: Option<Duration>,
    next_allowed: Option<Instant>,
}

impl RateLimiter {
    /// `None` disables limiting
    pub fn new(delay: Option<Duration>) -> Self {
        Self {
            delay,
            next_allowed: None,
        }
    }

    /// Accept or reject an interaction happening now. Accepting restarts the window.
    pub fn try_acquire(&mut self) -> bool {
        let Some(delay) = self.delay else {
            return true;
        };

        let now = Instant::now();
        if self.next_allowed.is_some_and(|next| now <= next) {
            return false;
        }
        self.next_allowed = Some(now + delay);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_on_accept() {
        let mut limiter = RateLimiter::new(Some(Duration::from_millis(500)));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_millis(201)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_disabled() {
        let mut limiter = RateLimiter::new(None);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
    }
}
