use crate::kernel::settings::DEFAULT_RATE_STEP;

/// The operation set exposed to the presentation layer, as messages for the reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Reset,
    Seek(i64),
    Step(i64),
    SetRate(u32),
    AdjustRate(i32),
    SetChunkSize(usize),
    SetPauseOnPunctuation(bool),
    SetShowContext(bool),
    LoadText(String),
}

impl Command {
    /// Parses one console line using the default rate step.
    pub fn parse(line: &str) -> Option<Self> {
        Self::parse_with_step(line, DEFAULT_RATE_STEP)
    }

    /// Parses one console line. Bare keys follow the reader's keyboard shortcuts:
    /// space toggles, `r` resets, up/down change the rate, left/right step one token.
    pub fn parse_with_step(line: &str, rate_step: u32) -> Option<Self> {
        let step = i32::try_from(rate_step).unwrap_or(i32::MAX);
        let line = line.trim();
        if line.is_empty() {
            return Some(Command::Toggle);
        }

        let mut parts = line.split_whitespace();
        let head = parts.next()?.to_ascii_lowercase();
        let arg = parts.next();
        if parts.next().is_some() {
            return None;
        }

        match (head.as_str(), arg) {
            ("space" | "toggle", None) => Some(Command::Toggle),
            ("play", None) => Some(Command::Play),
            ("pause", None) => Some(Command::Pause),
            ("r" | "reset", None) => Some(Command::Reset),
            ("up" | "+" | "faster", None) => Some(Command::AdjustRate(step)),
            ("down" | "-" | "slower", None) => Some(Command::AdjustRate(-step)),
            ("left" | "<" | "back", None) => Some(Command::Step(-1)),
            ("right" | ">" | "forward", None) => Some(Command::Step(1)),
            ("seek", Some(n)) => n.parse().ok().map(Command::Seek),
            ("rate" | "wpm", Some(n)) => parse_rate(n),
            ("chunk", Some(n)) => n.parse().ok().map(Command::SetChunkSize),
            ("punct", Some(flag)) => parse_flag(flag).map(Command::SetPauseOnPunctuation),
            ("context", Some(flag)) => parse_flag(flag).map(Command::SetShowContext),
            _ => None,
        }
    }
}

// "rate 400" is absolute, "rate +50" / "rate -50" relative.
fn parse_rate(arg: &str) -> Option<Command> {
    if arg.starts_with('+') || arg.starts_with('-') {
        return arg.parse().ok().map(Command::AdjustRate);
    }
    arg.parse().ok().map(Command::SetRate)
}

fn parse_flag(arg: &str) -> Option<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
