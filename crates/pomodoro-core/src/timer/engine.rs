//! Timer engine implementation.
//!
//! The engine is a countdown state machine over three modes. It owns no
//! thread: `start()` registers a repeating subscription with a
//! [`TickScheduler`], and whoever receives the scheduler's ticks hands them
//! back through [`TimerEngine::on_tick`].
//!
//! ## Interval completion
//!
//! ```text
//! Focus      --0s--> ShortBreak   (completed % N != 0)
//! Focus      --0s--> LongBreak    (completed % N == 0)
//! ShortBreak --0s--> Focus
//! LongBreak  --0s--> Focus
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(EngineSettings::default(), scheduler, observer);
//! engine.start();
//! // For every tick the scheduler delivers:
//! engine.on_tick(tick); // Returns Some(Completion) when an interval finishes
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::mode::{EngineSettings, Mode};
use super::observer::{Completion, DisplayUpdate, TimerObserver};
use super::scheduler::{SubscriptionId, Tick, TickScheduler, TICK_PERIOD};
use crate::error::{CoreError, Result};
use crate::events::Event;

/// Live state of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: Mode,
    pub remaining_secs: u64,
    pub running: bool,
    pub completed_focus_count: u64,
}

impl TimerState {
    /// Fresh state: Focus with its full duration, not running.
    pub fn initial(settings: &EngineSettings) -> Self {
        Self {
            mode: Mode::Focus,
            remaining_secs: settings.nominal(Mode::Focus),
            running: false,
            completed_focus_count: 0,
        }
    }
}

/// Core timer engine.
pub struct TimerEngine<S, O> {
    settings: EngineSettings,
    state: TimerState,
    /// Present only while running.
    subscription: Option<SubscriptionId>,
    next_subscription: SubscriptionId,
    scheduler: S,
    observer: O,
}

impl<S: TickScheduler, O: TimerObserver> TimerEngine<S, O> {
    pub fn new(settings: EngineSettings, scheduler: S, observer: O) -> Self {
        let state = TimerState::initial(&settings);
        Self::from_state(settings, state, scheduler, observer)
    }

    /// Build an engine around an existing state.
    ///
    /// The state is always taken as not running; call `start()` to resume.
    pub fn from_state(settings: EngineSettings, state: TimerState, scheduler: S, observer: O) -> Self {
        Self {
            settings,
            state: TimerState {
                running: false,
                ..state
            },
            subscription: None,
            next_subscription: 1,
            scheduler,
            observer,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn completed_focus_count(&self) -> u64 {
        self.state.completed_focus_count
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The active tick subscription, if running.
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Consume the engine, keeping only its observer.
    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            nominal_secs: self.settings.nominal(self.state.mode),
            running: self.state.running,
            completed_focus_count: self.state.completed_focus_count,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting down. Returns `false` if already running or if there
    /// is no time left to count.
    pub fn start(&mut self) -> bool {
        if self.state.running {
            return false;
        }
        if self.state.remaining_secs == 0 {
            tracing::debug!(mode = ?self.state.mode, "start ignored: no time remaining");
            return false;
        }

        let id = self.next_subscription;
        self.next_subscription += 1;
        self.scheduler.schedule(id, TICK_PERIOD);
        self.subscription = Some(id);
        self.state.running = true;
        tracing::debug!(
            mode = ?self.state.mode,
            remaining_secs = self.state.remaining_secs,
            subscription = id,
            "timer started"
        );
        self.notify_display();
        true
    }

    /// Stop counting down, keeping mode and remaining time. Returns `false`
    /// if the timer was not running.
    pub fn pause(&mut self) -> bool {
        if !self.state.running {
            return false;
        }
        self.cancel_subscription();
        self.state.running = false;
        tracing::debug!(remaining_secs = self.state.remaining_secs, "timer paused");
        self.notify_display();
        true
    }

    /// Stop and restore the current mode's nominal duration.
    pub fn reset(&mut self) {
        self.stop_silently();
        self.state.remaining_secs = self.settings.nominal(self.state.mode);
        tracing::debug!(mode = ?self.state.mode, "timer reset");
        self.notify_display();
    }

    /// Stop and switch to `mode` with its nominal duration. The focus count
    /// is left alone.
    pub fn set_mode(&mut self, mode: Mode) {
        self.stop_silently();
        self.state.mode = mode;
        self.state.remaining_secs = self.settings.nominal(mode);
        tracing::debug!(?mode, "mode changed");
        self.notify_display();
    }

    /// Extend the current interval by `delta_secs`, running or not.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `delta_secs` is not positive; the state
    /// is left untouched.
    pub fn add_time(&mut self, delta_secs: i64) -> Result<()> {
        if delta_secs <= 0 {
            return Err(CoreError::invalid_argument(
                "delta_secs",
                format!("must be positive, got {delta_secs}"),
            ));
        }
        self.state.remaining_secs = self
            .state
            .remaining_secs
            .saturating_add(delta_secs.unsigned_abs());
        tracing::debug!(delta_secs, remaining_secs = self.state.remaining_secs, "time added");
        self.notify_display();
        Ok(())
    }

    /// Re-send the current state to the display callback.
    pub fn refresh(&mut self) {
        self.notify_display();
    }

    /// Handle a tick delivered by the scheduler.
    ///
    /// Ticks from a subscription that is no longer active are dropped.
    pub fn on_tick(&mut self, tick: Tick) -> Option<Completion> {
        if self.subscription != Some(tick.subscription) {
            tracing::trace!(subscription = tick.subscription, "stale tick dropped");
            return None;
        }
        self.tick()
    }

    /// Count down one second.
    ///
    /// Returns the completion when this tick brought the interval to zero.
    /// A tick with nothing left to count is a no-op.
    pub fn tick(&mut self) -> Option<Completion> {
        if self.state.remaining_secs == 0 {
            return None;
        }
        self.state.remaining_secs -= 1;
        self.notify_display();

        if self.state.remaining_secs > 0 {
            return None;
        }

        self.cancel_subscription();
        self.state.running = false;
        let completion = self.complete_interval();
        self.notify_display();
        tracing::info!(
            previous = ?completion.previous,
            next = ?completion.next,
            completed_focus_count = completion.completed_focus_count,
            "interval completed"
        );
        self.observer.completed(&completion);

        if self.settings.auto_continue {
            self.start();
        }
        Some(completion)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_interval(&mut self) -> Completion {
        let previous = self.state.mode;
        if previous == Mode::Focus {
            self.state.completed_focus_count += 1;
        }
        let next = self
            .settings
            .next_mode(previous, self.state.completed_focus_count);
        self.state.mode = next;
        self.state.remaining_secs = self.settings.nominal(next);
        Completion {
            previous,
            next,
            completed_focus_count: self.state.completed_focus_count,
        }
    }

    /// Pause without a display callback; the caller sends one afterwards.
    fn stop_silently(&mut self) {
        if self.state.running {
            self.cancel_subscription();
            self.state.running = false;
        }
    }

    fn cancel_subscription(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.scheduler.cancel(id);
        }
    }

    fn notify_display(&mut self) {
        let update = DisplayUpdate {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            running: self.state.running,
        };
        self.observer.display(&update);
    }
}

impl<S, O> std::fmt::Debug for TimerEngine<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::timer::{Durations, ManualScheduler};

    type TestEngine = TimerEngine<ManualScheduler, EventLog>;

    fn engine() -> TestEngine {
        TimerEngine::new(EngineSettings::default(), ManualScheduler::new(), EventLog::new())
    }

    fn short_engine() -> TestEngine {
        let durations = Durations {
            focus_secs: 3,
            short_break_secs: 2,
            long_break_secs: 4,
        };
        let settings = EngineSettings::new(durations, 4, false).unwrap();
        TimerEngine::new(settings, ManualScheduler::new(), EventLog::new())
    }

    fn run_to_completion(engine: &mut TestEngine) -> Completion {
        engine.start();
        loop {
            if let Some(done) = engine.tick() {
                return done;
            }
        }
    }

    #[test]
    fn new_engine_is_idle_focus() {
        let engine = engine();
        assert_eq!(engine.mode(), Mode::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_focus_count(), 0);
        assert_eq!(engine.subscription(), None);
    }

    #[test]
    fn start_registers_one_subscription_and_displays() {
        let mut engine = engine();
        assert!(engine.start());
        assert!(engine.is_running());
        assert_eq!(engine.scheduler().active_count(), 1);
        assert_eq!(engine.observer().display_count(), 1);

        assert!(!engine.start());
        assert_eq!(engine.scheduler().active_count(), 1);
        assert_eq!(engine.scheduler().scheduled_total(), 1);
    }

    #[test]
    fn pause_cancels_and_keeps_time() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        engine.tick();
        assert!(engine.pause());
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_secs(), 1498);
        assert_eq!(engine.scheduler().active_count(), 0);
        assert!(!engine.pause());
    }

    #[test]
    fn stale_tick_after_pause_is_dropped() {
        let mut engine = engine();
        engine.start();
        let old = engine.subscription().unwrap();
        engine.pause();

        assert!(engine.on_tick(Tick { subscription: old }).is_none());
        assert_eq!(engine.remaining_secs(), 1500);

        engine.start();
        let current = engine.subscription().unwrap();
        assert_ne!(old, current);
        engine.on_tick(Tick { subscription: old });
        assert_eq!(engine.remaining_secs(), 1500);
        engine.on_tick(Tick { subscription: current });
        assert_eq!(engine.remaining_secs(), 1499);
    }

    #[test]
    fn focus_completion_goes_to_short_break() {
        let mut engine = short_engine();
        let done = run_to_completion(&mut engine);
        assert_eq!(done.previous, Mode::Focus);
        assert_eq!(done.next, Mode::ShortBreak);
        assert_eq!(engine.completed_focus_count(), 1);
        assert_eq!(engine.remaining_secs(), 2);
        assert!(!engine.is_running());
        assert_eq!(engine.scheduler().active_count(), 0);
        assert_eq!(engine.observer().completions().len(), 1);
    }

    #[test]
    fn break_completion_returns_to_focus_without_counting() {
        let mut engine = short_engine();
        engine.set_mode(Mode::LongBreak);
        let done = run_to_completion(&mut engine);
        assert_eq!(done.previous, Mode::LongBreak);
        assert_eq!(done.next, Mode::Focus);
        assert_eq!(engine.completed_focus_count(), 0);
        assert_eq!(engine.remaining_secs(), 3);
    }

    #[test]
    fn completion_displays_zero_then_new_interval() {
        let mut engine = short_engine();
        run_to_completion(&mut engine);
        let updates = engine.observer().display_updates();
        let tail = &updates[updates.len() - 2..];
        assert_eq!(tail[0].remaining_secs, 0);
        assert_eq!(tail[0].mode, Mode::Focus);
        assert_eq!(tail[1].remaining_secs, 2);
        assert_eq!(tail[1].mode, Mode::ShortBreak);
        assert!(!tail[1].running);
    }

    #[test]
    fn tick_at_zero_is_noop() {
        let state = TimerState {
            mode: Mode::Focus,
            remaining_secs: 0,
            running: false,
            completed_focus_count: 2,
        };
        let mut engine =
            TimerEngine::from_state(EngineSettings::default(), state, ManualScheduler::new(), EventLog::new());
        assert!(engine.tick().is_none());
        assert!(!engine.start());
        assert_eq!(engine.completed_focus_count(), 2);
    }

    #[test]
    fn from_state_never_restores_running() {
        let state = TimerState {
            mode: Mode::ShortBreak,
            remaining_secs: 42,
            running: true,
            completed_focus_count: 1,
        };
        let engine = TimerEngine::from_state(EngineSettings::default(), state, ManualScheduler::new(), ());
        assert!(!engine.is_running());
        assert_eq!(engine.remaining_secs(), 42);
    }

    #[test]
    fn add_time_rejects_non_positive_delta() {
        let mut engine = engine();
        let err = engine.add_time(0).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
        assert!(engine.add_time(-5).is_err());
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.observer().display_count(), 0);
    }

    #[test]
    fn add_time_while_running_keeps_running() {
        let mut engine = engine();
        engine.start();
        engine.add_time(300).unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.remaining_secs(), 1800);
    }

    #[test]
    fn add_time_saturates() {
        let state = TimerState {
            mode: Mode::Focus,
            remaining_secs: u64::MAX - 1,
            running: false,
            completed_focus_count: 0,
        };
        let mut engine = TimerEngine::from_state(EngineSettings::default(), state, ManualScheduler::new(), ());
        engine.add_time(10).unwrap();
        assert_eq!(engine.remaining_secs(), u64::MAX);
    }

    #[test]
    fn auto_continue_starts_next_interval() {
        let durations = Durations {
            focus_secs: 2,
            short_break_secs: 1,
            long_break_secs: 1,
        };
        let settings = EngineSettings::new(durations, 4, true).unwrap();
        let mut engine = TimerEngine::new(settings, ManualScheduler::new(), EventLog::new());
        engine.start();
        engine.tick();
        let done = engine.tick().unwrap();
        assert_eq!(done.next, Mode::ShortBreak);
        assert!(engine.is_running());
        assert_eq!(engine.scheduler().active_count(), 1);
        assert_eq!(engine.scheduler().scheduled_total(), 2);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = engine();
        match engine.snapshot() {
            Event::StateSnapshot {
                mode,
                remaining_secs,
                nominal_secs,
                running,
                ..
            } => {
                assert_eq!(mode, Mode::Focus);
                assert_eq!(remaining_secs, 1500);
                assert_eq!(nominal_secs, 1500);
                assert!(!running);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
