//! Line-oriented playback commands read from stdin.

use std::fmt;
use std::str::FromStr;

use tapedeck::engine::{ControlError, Controls};
use tapedeck::timeline::SEEK_SCALE;

/// One parsed control line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Pause,
    Resume,
    /// Seek to a position in `1..10000`.
    Seek(u32),
    Rate(f64),
    Loop(bool),
    Skip(bool),
    Status,
    Help,
    Quit,
}

/// A line that is not a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseCommandError(pub String);

impl fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseCommandError {}

fn on_off(word: Option<&str>) -> Result<bool, ParseCommandError> {
    match word {
        Some("on") | Some("true") | Some("1") => Ok(true),
        Some("off") | Some("false") | Some("0") => Ok(false),
        _ => Err(ParseCommandError("expected 'on' or 'off'".into())),
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ParseCommandError("empty command".into()));
        };
        let arg = words.next();
        let command = match verb.to_ascii_lowercase().as_str() {
            "start" | "play" => Self::Start,
            "stop" => Self::Stop,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "seek" => {
                let position = arg
                    .and_then(|a| a.parse().ok())
                    .ok_or_else(|| ParseCommandError(format!("usage: seek <1..{SEEK_SCALE}>")))?;
                Self::Seek(position)
            }
            "rate" => {
                let rate = arg
                    .and_then(|a| a.parse().ok())
                    .ok_or_else(|| ParseCommandError("usage: rate <multiplier>".into()))?;
                Self::Rate(rate)
            }
            "loop" => Self::Loop(on_off(arg)?),
            "skip" => Self::Skip(on_off(arg)?),
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseCommandError(format!("unknown command '{other}'"))),
        };
        if words.next().is_some() {
            return Err(ParseCommandError(format!("too many arguments for '{verb}'")));
        }
        Ok(command)
    }
}

impl Command {
    /// Apply to a running player. `Status`, `Help` and `Quit` are handled
    /// by the caller and are no-ops here.
    pub fn apply(self, controls: &Controls) -> Result<(), ControlError> {
        match self {
            Self::Start => controls.start(),
            Self::Stop => controls.stop(),
            Self::Pause => controls.pause(),
            Self::Resume => controls.resume(),
            Self::Seek(position) => {
                if !controls.seek(position) {
                    tracing::warn!(position, "seek position out of range, ignored");
                }
            }
            Self::Rate(rate) => controls.set_rate(rate)?,
            Self::Loop(on) => controls.set_loop(on),
            Self::Skip(on) => controls.set_skip_stops(on),
            Self::Status | Self::Help | Self::Quit => {}
        }
        Ok(())
    }
}

/// Shown for `help`.
pub const HELP: &str = "\
commands:
  start | stop | pause | resume
  seek <1..9999>     jump to a position on a 10000-step scale
  rate <r>           playback speed multiplier (0 stalls)
  loop on|off        restart at the end of the timeline
  skip on|off        elide stop regions
  status             print the playhead
  quit";
