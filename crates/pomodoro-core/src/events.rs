use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Completion, DisplayUpdate, Mode, TimerObserver};

/// Every state change in the timer can be described as an Event.
/// The CLI prints them as JSON lines; tests record them with [`EventLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimeAdded {
        delta_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    DisplayUpdated {
        mode: Mode,
        remaining_secs: u64,
        running: bool,
        at: DateTime<Utc>,
    },
    IntervalCompleted {
        previous: Mode,
        next: Mode,
        completed_focus_count: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        remaining_secs: u64,
        nominal_secs: u64,
        running: bool,
        completed_focus_count: u64,
        at: DateTime<Utc>,
    },
}

impl From<&DisplayUpdate> for Event {
    fn from(update: &DisplayUpdate) -> Self {
        Event::DisplayUpdated {
            mode: update.mode,
            remaining_secs: update.remaining_secs,
            running: update.running,
            at: Utc::now(),
        }
    }
}

impl From<&Completion> for Event {
    fn from(completion: &Completion) -> Self {
        Event::IntervalCompleted {
            previous: completion.previous,
            next: completion.next,
            completed_focus_count: completion.completed_focus_count,
            at: Utc::now(),
        }
    }
}

/// Observer that keeps every callback as an [`Event`].
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn display_updates(&self) -> Vec<DisplayUpdate> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::DisplayUpdated {
                    mode,
                    remaining_secs,
                    running,
                    ..
                } => Some(DisplayUpdate {
                    mode: *mode,
                    remaining_secs: *remaining_secs,
                    running: *running,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn display_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::DisplayUpdated { .. }))
            .count()
    }

    pub fn last_display(&self) -> Option<DisplayUpdate> {
        self.display_updates().pop()
    }

    pub fn completions(&self) -> Vec<Completion> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::IntervalCompleted {
                    previous,
                    next,
                    completed_focus_count,
                    ..
                } => Some(Completion {
                    previous: *previous,
                    next: *next,
                    completed_focus_count: *completed_focus_count,
                }),
                _ => None,
            })
            .collect()
    }
}

impl TimerObserver for EventLog {
    fn display(&mut self, update: &DisplayUpdate) {
        self.events.push(update.into());
    }

    fn completed(&mut self, completion: &Completion) {
        self.events.push(completion.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::IntervalCompleted {
            previous: Mode::Focus,
            next: Mode::ShortBreak,
            completed_focus_count: 1,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "IntervalCompleted");
        assert_eq!(json["previous"], "focus");
        assert_eq!(json["next"], "short_break");
    }

    #[test]
    fn event_log_splits_callbacks() {
        let mut log = EventLog::new();
        log.display(&DisplayUpdate {
            mode: Mode::Focus,
            remaining_secs: 10,
            running: true,
        });
        log.completed(&Completion {
            previous: Mode::Focus,
            next: Mode::LongBreak,
            completed_focus_count: 4,
        });

        assert_eq!(log.events().len(), 2);
        assert_eq!(log.display_count(), 1);
        assert_eq!(log.last_display().unwrap().remaining_secs, 10);
        assert_eq!(log.completions()[0].next, Mode::LongBreak);

        log.clear();
        assert!(log.events().is_empty());
    }
}
