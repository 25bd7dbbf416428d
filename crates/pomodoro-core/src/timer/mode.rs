use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const DEFAULT_FOCUS_SECS: u64 = 25 * 60;
pub const DEFAULT_SHORT_BREAK_SECS: u64 = 5 * 60;
pub const DEFAULT_LONG_BREAK_SECS: u64 = 15 * 60;
pub const DEFAULT_INTERVALS_BEFORE_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Focus => "Focus",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Mode::ShortBreak | Mode::LongBreak)
    }

    /// Parse a mode name as typed by a user.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "focus" | "pomodoro" | "pomo" | "f" => Some(Mode::Focus),
            "short" | "short-break" | "short_break" | "sb" => Some(Mode::ShortBreak),
            "long" | "long-break" | "long_break" | "lb" => Some(Mode::LongBreak),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Nominal length of each mode, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub focus_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
}

impl Durations {
    pub fn nominal(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Focus => self.focus_secs,
            Mode::ShortBreak => self.short_break_secs,
            Mode::LongBreak => self.long_break_secs,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            focus_secs: DEFAULT_FOCUS_SECS,
            short_break_secs: DEFAULT_SHORT_BREAK_SECS,
            long_break_secs: DEFAULT_LONG_BREAK_SECS,
        }
    }
}

/// Everything the engine needs to know besides its live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub durations: Durations,
    /// A long break follows every Nth completed focus interval.
    pub intervals_before_long_break: u32,
    /// Start the next interval automatically after a completion.
    pub auto_continue: bool,
}

impl EngineSettings {
    /// Build validated settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any duration or the long break interval is zero.
    pub fn new(
        durations: Durations,
        intervals_before_long_break: u32,
        auto_continue: bool,
    ) -> Result<Self> {
        let settings = Self {
            durations,
            intervals_before_long_break,
            auto_continue,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns `InvalidArgument` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for mode in Mode::ALL {
            if self.durations.nominal(mode) == 0 {
                return Err(CoreError::invalid_argument(
                    "durations",
                    format!("{} duration must be greater than zero", mode.label()),
                ));
            }
        }
        if self.intervals_before_long_break == 0 {
            return Err(CoreError::invalid_argument(
                "intervals_before_long_break",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn nominal(&self, mode: Mode) -> u64 {
        self.durations.nominal(mode)
    }

    /// Where a finished interval leads, given the focus count after it.
    pub fn next_mode(&self, finished: Mode, completed_focus_count: u64) -> Mode {
        match finished {
            Mode::Focus => {
                // Fields are public; never divide by an unvalidated zero.
                let cadence = u64::from(self.intervals_before_long_break.max(1));
                if completed_focus_count % cadence == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            durations: Durations::default(),
            intervals_before_long_break: DEFAULT_INTERVALS_BEFORE_LONG_BREAK,
            auto_continue: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations_match_classic_pomodoro() {
        let d = Durations::default();
        assert_eq!(d.nominal(Mode::Focus), 1500);
        assert_eq!(d.nominal(Mode::ShortBreak), 300);
        assert_eq!(d.nominal(Mode::LongBreak), 900);
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(Mode::parse("focus"), Some(Mode::Focus));
        assert_eq!(Mode::parse("Pomodoro"), Some(Mode::Focus));
        assert_eq!(Mode::parse("short"), Some(Mode::ShortBreak));
        assert_eq!(Mode::parse("lb"), Some(Mode::LongBreak));
        assert_eq!(Mode::parse("nap"), None);
    }

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&Mode::ShortBreak).unwrap();
        assert_eq!(json, "\"short_break\"");
    }

    #[test]
    fn next_mode_follows_long_break_cadence() {
        let settings = EngineSettings::default();
        assert_eq!(settings.next_mode(Mode::Focus, 1), Mode::ShortBreak);
        assert_eq!(settings.next_mode(Mode::Focus, 3), Mode::ShortBreak);
        assert_eq!(settings.next_mode(Mode::Focus, 4), Mode::LongBreak);
        assert_eq!(settings.next_mode(Mode::Focus, 8), Mode::LongBreak);
        assert_eq!(settings.next_mode(Mode::ShortBreak, 1), Mode::Focus);
        assert_eq!(settings.next_mode(Mode::LongBreak, 4), Mode::Focus);
    }

    #[test]
    fn every_focus_is_followed_by_a_long_break_when_n_is_one() {
        let settings = EngineSettings::new(Durations::default(), 1, false).unwrap();
        assert_eq!(settings.next_mode(Mode::Focus, 1), Mode::LongBreak);
        assert_eq!(settings.next_mode(Mode::Focus, 2), Mode::LongBreak);
    }

    #[test]
    fn validate_rejects_zero_values() {
        let zero_focus = Durations {
            focus_secs: 0,
            ..Durations::default()
        };
        assert!(EngineSettings::new(zero_focus, 4, false).is_err());
        assert!(EngineSettings::new(Durations::default(), 0, false).is_err());
    }
}
