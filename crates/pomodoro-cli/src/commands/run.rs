use chrono::Utc;
use clap::Args;
use pomodoro_core::{Config, Event, Mode, TimerEngine, TokioScheduler};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::terminal::{self, TerminalObserver};

type Engine = TimerEngine<TokioScheduler, TerminalObserver<std::io::Stdout>>;

#[derive(Args)]
pub struct RunArgs {
    /// Mode to begin in (focus, short, long)
    #[arg(long, default_value = "focus", value_parser = parse_mode)]
    mode: Mode,
    /// Start counting down immediately
    #[arg(long)]
    start: bool,
    /// Start the next interval automatically after each completion.
    /// With input closed, the session still ends after the current interval.
    #[arg(long)]
    auto_continue: bool,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
    /// Do not mirror the countdown into the terminal title
    #[arg(long)]
    no_title: bool,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    Mode::parse(s).ok_or_else(|| format!("unknown mode '{s}' (expected focus, short or long)"))
}

/// A line typed during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Pause,
    Toggle,
    Reset,
    SetMode(Mode),
    AddTime(i64),
    Status,
    Help,
    Quit,
}

const HELP: &str = "commands: start | pause | toggle | reset | focus | short | long | add [SECONDS|Nm] | status | quit";

impl SessionCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str, default_add_secs: u64) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(None);
        };

        let command = match word.to_lowercase().as_str() {
            "start" | "s" => SessionCommand::Start,
            "pause" | "p" => SessionCommand::Pause,
            "toggle" | "t" => SessionCommand::Toggle,
            "reset" | "r" => SessionCommand::Reset,
            "add" | "a" | "+" => match words.next() {
                Some(amount) => SessionCommand::AddTime(parse_seconds(amount)?),
                None => SessionCommand::AddTime(i64::try_from(default_add_secs).unwrap_or(i64::MAX)),
            },
            "status" | "st" => SessionCommand::Status,
            "help" | "h" | "?" => SessionCommand::Help,
            "quit" | "q" | "exit" => SessionCommand::Quit,
            other => match Mode::parse(other) {
                Some(mode) => SessionCommand::SetMode(mode),
                None => return Err(format!("unknown command '{other}'")),
            },
        };
        Ok(Some(command))
    }
}

/// `90`, `90s` or `5m`. Negative values parse so the engine can reject them.
fn parse_seconds(s: &str) -> Result<i64, String> {
    let invalid = || format!("invalid amount '{s}'");
    let (digits, factor) = if let Some(d) = s.strip_suffix('m') {
        (d, 60)
    } else if let Some(d) = s.strip_suffix('s') {
        (d, 1)
    } else {
        (s, 1)
    };
    let n: i64 = digits.parse().map_err(|_| invalid())?;
    n.checked_mul(factor).ok_or_else(invalid)
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(session(args, config));
    // A pending stdin read must not hold up exit.
    runtime.shutdown_background();
    result
}

async fn session(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = config.engine_settings()?;
    if args.auto_continue {
        settings.auto_continue = true;
    }
    let title = (config.display.title && !args.no_title).then_some(config.display.title_format);
    let observer = TerminalObserver::stdout(args.json, title, terminal::alert_sinks(&config));

    let (tick_tx, mut ticks) = mpsc::unbounded_channel();
    let mut engine: Engine = TimerEngine::new(settings, TokioScheduler::new(tick_tx), observer);
    tracing::info!(?settings, "session started");

    if args.mode == Mode::Focus {
        engine.refresh();
    } else {
        engine.set_mode(args.mode);
    }
    if args.start {
        start(&mut engine);
    }

    // Raw segments so a line that is not UTF-8 is reported, not fatal.
    let mut input = BufReader::new(tokio::io::stdin()).split(b'\n');
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                let completed = engine.on_tick(tick).is_some();
                if completed && engine.is_running() {
                    announce_start(&mut engine);
                }
                // Once input has closed, the session ends with the current interval.
                if !stdin_open && (completed || !engine.is_running()) {
                    break;
                }
            }
            segment = input.next_segment(), if stdin_open => {
                match segment {
                    Ok(Some(bytes)) => {
                        let line = String::from_utf8_lossy(&bytes);
                        match SessionCommand::parse(&line, config.timer.add_time_secs) {
                            Ok(Some(SessionCommand::Quit)) => break,
                            Ok(Some(command)) => apply(&mut engine, command),
                            Ok(None) => {}
                            Err(message) => report_error(&mut engine, &message),
                        }
                    }
                    Ok(None) => {
                        stdin_open = false;
                        if !engine.is_running() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "reading session input failed");
                        report_error(&mut engine, &format!("cannot read input: {e}"));
                        stdin_open = false;
                        if !engine.is_running() {
                            break;
                        }
                    }
                }
            }
            else => break,
        }
    }

    pause(&mut engine);
    engine.observer_mut().restore_title();
    tracing::info!(
        completed_focus_count = engine.completed_focus_count(),
        "session ended"
    );
    Ok(())
}

fn apply(engine: &mut Engine, command: SessionCommand) {
    match command {
        SessionCommand::Start => start(engine),
        SessionCommand::Pause => pause(engine),
        SessionCommand::Toggle => {
            if engine.is_running() {
                pause(engine);
            } else {
                start(engine);
            }
        }
        SessionCommand::Reset => {
            engine.reset();
            let event = Event::TimerReset {
                mode: engine.mode(),
                remaining_secs: engine.remaining_secs(),
                at: Utc::now(),
            };
            engine.observer_mut().event(&event);
        }
        SessionCommand::SetMode(mode) => {
            engine.set_mode(mode);
            let event = Event::ModeChanged {
                mode,
                remaining_secs: engine.remaining_secs(),
                at: Utc::now(),
            };
            engine.observer_mut().event(&event);
        }
        SessionCommand::AddTime(delta) => match engine.add_time(delta) {
            Ok(()) => {
                let event = Event::TimeAdded {
                    delta_secs: delta.unsigned_abs(),
                    remaining_secs: engine.remaining_secs(),
                    at: Utc::now(),
                };
                engine.observer_mut().event(&event);
            }
            Err(e) => report_error(engine, &e.to_string()),
        },
        SessionCommand::Status => {
            let snapshot = engine.snapshot();
            let text = format!(
                "{} | completed focus intervals: {}",
                terminal::status_line(&pomodoro_core::DisplayUpdate {
                    mode: engine.mode(),
                    remaining_secs: engine.remaining_secs(),
                    running: engine.is_running(),
                }),
                engine.completed_focus_count()
            );
            engine.observer_mut().message(&text, Some(&snapshot));
        }
        SessionCommand::Help => engine.observer_mut().message(HELP, None),
        SessionCommand::Quit => {}
    }
}

fn start(engine: &mut Engine) {
    if engine.start() {
        announce_start(engine);
    }
}

/// Report a manual or auto-continued start as a `TimerStarted` event.
fn announce_start(engine: &mut Engine) {
    let event = Event::TimerStarted {
        mode: engine.mode(),
        remaining_secs: engine.remaining_secs(),
        at: Utc::now(),
    };
    engine.observer_mut().event(&event);
}

fn pause(engine: &mut Engine) {
    if engine.pause() {
        let event = Event::TimerPaused {
            mode: engine.mode(),
            remaining_secs: engine.remaining_secs(),
            at: Utc::now(),
        };
        engine.observer_mut().event(&event);
    }
}

fn report_error(engine: &mut Engine, message: &str) {
    tracing::debug!(message, "session command rejected");
    if engine.observer().style() == terminal::OutputStyle::Json {
        eprintln!("error: {message}");
    } else {
        engine.observer_mut().message(&format!("error: {message}"), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_commands() {
        assert_eq!(SessionCommand::parse("start", 300), Ok(Some(SessionCommand::Start)));
        assert_eq!(SessionCommand::parse("  P ", 300), Ok(Some(SessionCommand::Pause)));
        assert_eq!(SessionCommand::parse("q", 300), Ok(Some(SessionCommand::Quit)));
        assert_eq!(SessionCommand::parse("", 300), Ok(None));
        assert!(SessionCommand::parse("dance", 300).is_err());
    }

    #[test]
    fn parse_mode_switches() {
        assert_eq!(
            SessionCommand::parse("short", 300),
            Ok(Some(SessionCommand::SetMode(Mode::ShortBreak)))
        );
        assert_eq!(
            SessionCommand::parse("long", 300),
            Ok(Some(SessionCommand::SetMode(Mode::LongBreak)))
        );
        assert_eq!(
            SessionCommand::parse("focus", 300),
            Ok(Some(SessionCommand::SetMode(Mode::Focus)))
        );
    }

    #[test]
    fn parse_add_amounts() {
        assert_eq!(SessionCommand::parse("add", 300), Ok(Some(SessionCommand::AddTime(300))));
        assert_eq!(SessionCommand::parse("add 90", 300), Ok(Some(SessionCommand::AddTime(90))));
        assert_eq!(SessionCommand::parse("add 5m", 300), Ok(Some(SessionCommand::AddTime(300))));
        assert_eq!(SessionCommand::parse("+ 45s", 300), Ok(Some(SessionCommand::AddTime(45))));
        assert_eq!(SessionCommand::parse("add -10", 300), Ok(Some(SessionCommand::AddTime(-10))));
        assert!(SessionCommand::parse("add soon", 300).is_err());
    }

    #[test]
    fn parse_mode_arg() {
        assert_eq!(parse_mode("long"), Ok(Mode::LongBreak));
        assert!(parse_mode("nap").is_err());
    }
}
