mod engine;
mod mode;
mod observer;
mod scheduler;

pub use engine::{TimerEngine, TimerState};
pub use mode::{
    Durations, EngineSettings, Mode, DEFAULT_FOCUS_SECS, DEFAULT_INTERVALS_BEFORE_LONG_BREAK,
    DEFAULT_LONG_BREAK_SECS, DEFAULT_SHORT_BREAK_SECS,
};
pub use observer::{Completion, DisplayUpdate, TimerObserver};
pub use scheduler::{
    ManualScheduler, SubscriptionId, Tick, TickScheduler, TokioScheduler, TICK_PERIOD,
};
