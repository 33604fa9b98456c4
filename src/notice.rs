//! Transient operator notices ("negotiation unavailable", ...).

use std::time::{Duration, Instant};

/// How long a notice stays up unless configured otherwise
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(3);

/// A single message with a fixed lifetime. Posting replaces the current one
/// and restarts the lifetime.
#[derive(Debug, Clone)]
pub struct Notice {
    message: Option<String>,
    expires_at: Option<Instant>,
    duration: Duration,
}

impl Notice {
    pub fn new(duration: Duration) -> Self {
        Self {
            message: None,
            expires_at: None,
            duration,
        }
    }

    pub fn post(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some(message.into());
        self.expires_at = Some(now + self.duration);
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.expires_at = None;
    }

    /// Drop the message once its lifetime is over. Returns true if it expired.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) if now >= at => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Default for Notice {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_lifetime() {
        let start = Instant::now();
        let mut notice = Notice::default();
        notice.post("hello", start);

        assert!(!notice.expire(start + Duration::from_millis(2999)));
        assert_eq!(notice.message(), Some("hello"));

        assert!(notice.expire(start + Duration::from_secs(3)));
        assert_eq!(notice.message(), None);
        assert!(!notice.expire(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_repost_restarts_lifetime() {
        let start = Instant::now();
        let mut notice = Notice::new(Duration::from_secs(3));
        notice.post("first", start);
        notice.post("second", start + Duration::from_secs(2));

        assert!(!notice.expire(start + Duration::from_secs(4)));
        assert_eq!(notice.message(), Some("second"));
        assert!(notice.expire(start + Duration::from_secs(5)));
    }
}
