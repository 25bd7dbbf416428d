//! # Pomodoro Core Library
//!
//! Business logic for the Pomodoro timer: alternating focus intervals with
//! short and long breaks, counting completed focus intervals, and telling a
//! caller when to alert the user. Front ends (the terminal CLI, or anything
//! else) plug in through small traits.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a countdown state machine. It registers a repeating
//!   tick subscription with a [`TickScheduler`] and reports changes to a
//!   [`TimerObserver`]
//! - **Display**: `MM:SS` and window title formatting
//! - **Alerts**: completion messages and a failure-swallowing dispatch to
//!   [`AlertSink`]s
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TokioScheduler`]: tick source built on `tokio::time::interval`
//! - [`Config`]: Application configuration management

pub mod alert;
pub mod display;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use alert::{AlertSink, ALERT_TITLE};
pub use display::{format_mmss, window_title, TitleFormat, DEFAULT_TITLE};
pub use error::{AlertError, ConfigError, CoreError};
pub use events::{Event, EventLog};
pub use storage::Config;
pub use timer::{
    Completion, DisplayUpdate, Durations, EngineSettings, ManualScheduler, Mode, Tick,
    TickScheduler, TimerEngine, TimerObserver, TimerState, TokioScheduler,
};
