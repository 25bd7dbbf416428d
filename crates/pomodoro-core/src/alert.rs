//! Alerting the user when an interval finishes.
//!
//! Sinks may fail (no permission, no audio device, notifier missing).
//! [`dispatch`] is the boundary: it logs those failures and never returns
//! them, so nothing an alert does can affect the timer.

use crate::error::AlertError;
use crate::timer::{Completion, Mode};

/// Title used for notifications.
pub const ALERT_TITLE: &str = "Pomodoro Timer";

/// Something that can get the user's attention.
pub trait AlertSink {
    /// # Errors
    ///
    /// Returns an [`AlertError`] if the notification could not be delivered.
    fn alert(&mut self, title: &str, message: &str) -> Result<(), AlertError>;
}

impl<A: AlertSink + ?Sized> AlertSink for Box<A> {
    fn alert(&mut self, title: &str, message: &str) -> Result<(), AlertError> {
        (**self).alert(title, message)
    }
}

/// Message announcing what comes after `completion`.
pub fn alert_message(completion: &Completion) -> &'static str {
    match completion.next {
        Mode::ShortBreak => "Time for a short break!",
        Mode::LongBreak => "Time for a long break!",
        Mode::Focus => "Break is over. Time to focus!",
    }
}

/// Alert every sink about `completion`. Returns how many succeeded.
pub fn dispatch(sinks: &mut [Box<dyn AlertSink>], completion: &Completion) -> usize {
    let message = alert_message(completion);
    let mut delivered = 0;
    for sink in sinks.iter_mut() {
        match sink.alert(ALERT_TITLE, message) {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(error = %e, "failed to deliver alert"),
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recording(Vec<String>);

    impl AlertSink for Recording {
        fn alert(&mut self, _title: &str, message: &str) -> Result<(), AlertError> {
            self.0.push(message.to_string());
            Ok(())
        }
    }

    struct Denied;

    impl AlertSink for Denied {
        fn alert(&mut self, _title: &str, _message: &str) -> Result<(), AlertError> {
            Err(AlertError::PermissionDenied("notifications blocked".into()))
        }
    }

    fn completion(previous: Mode, next: Mode) -> Completion {
        Completion {
            previous,
            next,
            completed_focus_count: 1,
        }
    }

    #[test]
    fn messages_follow_the_next_mode() {
        assert_eq!(
            alert_message(&completion(Mode::Focus, Mode::ShortBreak)),
            "Time for a short break!"
        );
        assert_eq!(
            alert_message(&completion(Mode::Focus, Mode::LongBreak)),
            "Time for a long break!"
        );
        assert_eq!(
            alert_message(&completion(Mode::ShortBreak, Mode::Focus)),
            "Break is over. Time to focus!"
        );
    }

    #[test]
    fn dispatch_swallows_failures() {
        let mut sinks: Vec<Box<dyn AlertSink>> =
            vec![Box::new(Denied), Box::new(Recording(Vec::new()))];
        let delivered = dispatch(&mut sinks, &completion(Mode::Focus, Mode::ShortBreak));
        assert_eq!(delivered, 1);
    }

    #[test]
    fn dispatch_with_no_sinks_is_fine() {
        assert_eq!(dispatch(&mut [], &completion(Mode::LongBreak, Mode::Focus)), 0);
    }
}
