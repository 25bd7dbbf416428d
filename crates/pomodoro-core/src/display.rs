//! Formatting helpers for display sinks.
//!
//! The engine hands out raw seconds; sinks render them as `MM:SS` and may
//! mirror the value into a window or terminal title.

use serde::{Deserialize, Serialize};

use crate::timer::DisplayUpdate;

/// Title shown whenever the timer is not counting down.
pub const DEFAULT_TITLE: &str = "Pomodoro Timer";

/// Zero-padded `MM:SS`. Minutes keep growing past 99.
pub fn format_mmss(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleFormat {
    /// `MM:SS - Pomodoro Timer`
    #[default]
    Plain,
    /// `(MM:SS) - Pomodoro Timer`
    Parenthesized,
}

impl TitleFormat {
    pub fn render(&self, remaining_secs: u64) -> String {
        let time = format_mmss(remaining_secs);
        match self {
            TitleFormat::Plain => format!("{time} - {DEFAULT_TITLE}"),
            TitleFormat::Parenthesized => format!("({time}) - {DEFAULT_TITLE}"),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Some(TitleFormat::Plain),
            "parenthesized" | "paren" => Some(TitleFormat::Parenthesized),
            _ => None,
        }
    }
}

/// The title to show for `update`: the countdown while running, otherwise
/// [`DEFAULT_TITLE`].
pub fn window_title(format: TitleFormat, update: &DisplayUpdate) -> String {
    if update.running {
        format.render(update.remaining_secs)
    } else {
        DEFAULT_TITLE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Mode;

    fn update(remaining_secs: u64, running: bool) -> DisplayUpdate {
        DisplayUpdate {
            mode: Mode::Focus,
            remaining_secs,
            running,
        }
    }

    #[test]
    fn format_mmss_pads_both_fields() {
        assert_eq!(format_mmss(90), "01:30");
        assert_eq!(format_mmss(1500), "25:00");
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(59), "00:59");
    }

    #[test]
    fn format_mmss_grows_past_two_digit_minutes() {
        assert_eq!(format_mmss(6000), "100:00");
    }

    #[test]
    fn title_formats() {
        assert_eq!(TitleFormat::Plain.render(90), "01:30 - Pomodoro Timer");
        assert_eq!(
            TitleFormat::Parenthesized.render(90),
            "(01:30) - Pomodoro Timer"
        );
    }

    #[test]
    fn window_title_reverts_when_not_running() {
        assert_eq!(
            window_title(TitleFormat::Plain, &update(1499, true)),
            "24:59 - Pomodoro Timer"
        );
        assert_eq!(
            window_title(TitleFormat::Parenthesized, &update(1499, false)),
            DEFAULT_TITLE
        );
    }

    #[test]
    fn title_format_parse() {
        assert_eq!(TitleFormat::parse("Plain"), Some(TitleFormat::Plain));
        assert_eq!(TitleFormat::parse("paren"), Some(TitleFormat::Parenthesized));
        assert_eq!(TitleFormat::parse("fancy"), None);
    }
}
