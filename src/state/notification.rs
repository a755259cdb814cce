//! Single-slot error notification.
//!
//! Every user-visible error lands here and only one message is shown at a
//! time. Transient messages are dismissed after a timeout; held ones stay
//! until cleared. The core never spawns timers: raising a transient message
//! records a deadline and the host calls [`Notification::dismiss_expired`]
//! from its own tick.

use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct Notification {
    /// Text currently shown, empty when nothing is
    message: String,

    /// Set while an auto-dismiss is pending
    dismiss_scheduled: bool,

    /// When the pending auto-dismiss elapses
    dismiss_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message`, scheduling a dismiss unless `hold` is set.
    pub fn raise(&mut self, message: impl Into<String>, hold: bool, timeout: Duration) {
        self.raise_at(message, hold, timeout, Utc::now());
    }

    /// [`Notification::raise`] with an explicit clock.
    ///
    /// A dismiss already pending is left alone, so overlapping messages
    /// share the first deadline instead of stacking timers.
    pub fn raise_at(
        &mut self,
        message: impl Into<String>,
        hold: bool,
        timeout: Duration,
        now: DateTime<Utc>,
    ) {
        self.message = message.into();
        tracing::debug!(message = %self.message, hold, "error notification raised");

        if self.dismiss_scheduled || hold {
            return;
        }
        let delay =
            chrono::Duration::from_std(timeout).unwrap_or_else(|_| chrono::Duration::days(1));
        self.dismiss_at = now.checked_add_signed(delay);
        self.dismiss_scheduled = true;
    }

    /// Clear the message and any pending dismiss. No-op when nothing is shown.
    pub fn clear(&mut self) {
        if self.message.is_empty() {
            return;
        }
        self.message.clear();
        self.dismiss_scheduled = false;
        self.dismiss_at = None;
    }

    /// Run the pending dismiss if its deadline has passed.
    ///
    /// Returns `true` if a message was cleared.
    pub fn dismiss_expired(&mut self, now: DateTime<Utc>) -> bool {
        match self.dismiss_at {
            Some(deadline) if deadline <= now => {
                let had_message = self.is_showing();
                self.clear();
                self.dismiss_at = None;
                had_message
            }
            _ => false,
        }
    }

    /// Current message, if any.
    pub fn message(&self) -> Option<&str> {
        if self.message.is_empty() {
            None
        } else {
            Some(&self.message)
        }
    }

    pub fn is_showing(&self) -> bool {
        !self.message.is_empty()
    }

    pub fn is_dismiss_scheduled(&self) -> bool {
        self.dismiss_scheduled
    }

    pub fn dismiss_at(&self) -> Option<DateTime<Utc>> {
        self.dismiss_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(3);

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_transient_dismisses() {
        let mut note = Notification::new();
        note.raise_at("Bad packet", false, TIMEOUT, at(0));

        assert_eq!(note.message(), Some("Bad packet"));
        assert!(note.is_dismiss_scheduled());

        assert!(!note.dismiss_expired(at(2)));
        assert!(note.is_showing());

        assert!(note.dismiss_expired(at(3)));
        assert_eq!(note.message(), None);
        assert!(!note.is_dismiss_scheduled());
    }

    #[test]
    fn test_held_stays() {
        let mut note = Notification::new();
        note.raise_at("Connection lost", true, TIMEOUT, at(0));

        assert!(!note.is_dismiss_scheduled());
        assert!(!note.dismiss_expired(at(60)));
        assert_eq!(note.message(), Some("Connection lost"));

        note.clear();
        assert_eq!(note.message(), None);
    }

    #[test]
    fn test_overlapping_do_not_restack() {
        let mut note = Notification::new();
        note.raise_at("first", false, TIMEOUT, at(0));
        note.raise_at("second", false, TIMEOUT, at(2));

        assert_eq!(note.message(), Some("second"));
        assert_eq!(note.dismiss_at(), Some(at(3)));

        assert!(note.dismiss_expired(at(3)));
        assert!(!note.is_showing());
    }

    #[test]
    fn test_clear_when_empty_is_noop() {
        let mut note = Notification::new();
        note.clear();
        assert!(!note.is_showing());
        assert!(!note.is_dismiss_scheduled());
    }
}
