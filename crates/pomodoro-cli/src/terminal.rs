//! Terminal display and alert sinks.

use std::io::{IsTerminal, Write};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use pomodoro_core::alert::{self, AlertSink};
use pomodoro_core::{
    format_mmss, window_title, AlertError, Completion, Config, DisplayUpdate, Event, TimerObserver,
    TitleFormat, DEFAULT_TITLE,
};

/// Ring the terminal bell on stderr.
pub struct BellAlert;

impl AlertSink for BellAlert {
    fn alert(&mut self, _title: &str, _message: &str) -> Result<(), AlertError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

/// Run an external notifier as `<command> <title> <message>`.
///
/// Each child is reaped on its own thread so a slow notifier never holds up
/// the countdown. Launch failures are returned from `alert`; a failed wait or
/// a non-zero exit is logged the next time the sink is used.
pub struct CommandAlert {
    command: String,
    pending: Vec<JoinHandle<Result<(), AlertError>>>,
}

impl CommandAlert {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            pending: Vec::new(),
        }
    }

    /// Block until every launched notifier has exited, returning their failures.
    #[cfg(test)]
    fn wait_all(&mut self) -> Vec<AlertError> {
        self.pending
            .drain(..)
            .filter_map(|handle| join_notifier(handle).err())
            .collect()
    }

    fn log_finished(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|handle| handle.is_finished());
        self.pending = running;
        for handle in finished {
            if let Err(e) = join_notifier(handle) {
                tracing::warn!(error = %e, "notifier command failed");
            }
        }
    }
}

fn join_notifier(handle: JoinHandle<Result<(), AlertError>>) -> Result<(), AlertError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(AlertError::Playback("notifier reaper panicked".into())))
}

fn reap(command: String, mut child: Child) -> Result<(), AlertError> {
    let status = child.wait().map_err(|e| AlertError::Command {
        command: command.clone(),
        message: e.to_string(),
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(AlertError::Command {
            command,
            message: format!("exited with {status}"),
        })
    }
}

impl AlertSink for CommandAlert {
    fn alert(&mut self, title: &str, message: &str) -> Result<(), AlertError> {
        self.log_finished();
        let child = Command::new(&self.command)
            .arg(title)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AlertError::Command {
                command: self.command.clone(),
                message: e.to_string(),
            })?;
        let command = self.command.clone();
        self.pending.push(std::thread::spawn(move || reap(command, child)));
        Ok(())
    }
}

/// Alert sinks enabled by the configuration.
pub fn alert_sinks(config: &Config) -> Vec<Box<dyn AlertSink>> {
    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    if !config.notifications.enabled {
        return sinks;
    }
    if config.notifications.bell {
        sinks.push(Box::new(BellAlert));
    }
    if let Some(command) = config.notifier_command() {
        sinks.push(Box::new(CommandAlert::new(command)));
    }
    sinks
}

/// How the session renders to its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// Redraw a single status line in place.
    Interactive,
    /// One line per update.
    Lines,
    /// One JSON event per line.
    Json,
}

/// Observer rendering the timer to a terminal.
pub struct TerminalObserver<W: Write> {
    out: W,
    style: OutputStyle,
    title: Option<TitleFormat>,
    last_title: Option<String>,
    alerts: Vec<Box<dyn AlertSink>>,
}

impl TerminalObserver<std::io::Stdout> {
    /// Render to stdout. Titles are only emitted when stdout is a terminal.
    pub fn stdout(json: bool, title: Option<TitleFormat>, alerts: Vec<Box<dyn AlertSink>>) -> Self {
        let out = std::io::stdout();
        let tty = out.is_terminal();
        let style = match (json, tty) {
            (true, _) => OutputStyle::Json,
            (false, true) => OutputStyle::Interactive,
            (false, false) => OutputStyle::Lines,
        };
        Self::new(out, style, title.filter(|_| tty), alerts)
    }
}

impl<W: Write> TerminalObserver<W> {
    pub fn new(
        out: W,
        style: OutputStyle,
        title: Option<TitleFormat>,
        alerts: Vec<Box<dyn AlertSink>>,
    ) -> Self {
        Self {
            out,
            style,
            title,
            last_title: None,
            alerts,
        }
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print a lifecycle event (JSON mode only).
    pub fn event(&mut self, event: &Event) {
        if self.style == OutputStyle::Json {
            self.write_json(event);
        }
    }

    /// Print a free-form line, or a JSON event in JSON mode.
    pub fn message(&mut self, text: &str, event: Option<&Event>) {
        match (self.style, event) {
            (OutputStyle::Json, Some(event)) => self.write_json(event),
            (OutputStyle::Json, None) => {}
            (OutputStyle::Interactive, _) => self.write(&format!("\r\x1b[2K{text}\n")),
            (OutputStyle::Lines, _) => self.write(&format!("{text}\n")),
        }
    }

    /// Put the title back to its default.
    pub fn restore_title(&mut self) {
        if self.title.is_some() && self.last_title.as_deref() != Some(DEFAULT_TITLE) {
            self.write(&format!("\x1b]0;{DEFAULT_TITLE}\x07"));
            self.last_title = Some(DEFAULT_TITLE.to_string());
        }
    }

    fn write_json(&mut self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(json) => self.write(&format!("{json}\n")),
            Err(e) => tracing::warn!(error = %e, "failed to serialize event"),
        }
    }

    fn write(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

/// `Focus 24:59`, with a marker when paused.
pub fn status_line(update: &DisplayUpdate) -> String {
    let state = if update.running { "" } else { " (paused)" };
    format!(
        "{} {}{state}",
        update.mode.label(),
        format_mmss(update.remaining_secs)
    )
}

impl<W: Write> TimerObserver for TerminalObserver<W> {
    fn display(&mut self, update: &DisplayUpdate) {
        match self.style {
            OutputStyle::Json => self.write_json(&Event::from(update)),
            OutputStyle::Interactive => self.write(&format!("\r\x1b[2K{}", status_line(update))),
            OutputStyle::Lines => self.write(&format!("{}\n", status_line(update))),
        }

        if let Some(format) = self.title {
            let title = window_title(format, update);
            if self.last_title.as_ref() != Some(&title) {
                self.write(&format!("\x1b]0;{title}\x07"));
                self.last_title = Some(title);
            }
        }
    }

    fn completed(&mut self, completion: &Completion) {
        let text = alert::alert_message(completion);
        self.message(text, Some(&Event::from(completion)));
        alert::dispatch(&mut self.alerts, completion);
    }
}
