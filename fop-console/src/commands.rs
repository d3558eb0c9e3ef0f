//! Console command parsing

use libfop::events::majority;
use libfop::{FopError, FopEventKind, Result};

pub const HELP: &str = "\
commands:
    break [secs]            start an intermission (default length from config)
    resume                  end the intermission
    announce                announcer calls the current athlete
    start | stop            timekeeper starts or stops the clock
    force <ms>              timekeeper sets the remaining time
    time-over               clock ran out
    down                    down signal
    decision <v> <v> <v>    referee votes: g(ood), n(o lift) or - (absent)
    reset                   clear the decision board
    weight <lot> <kg>       change the next requested weight
    status                  print the platform snapshot
    help                    show this text
    quit                    stop the console";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fop(FopEventKind),
    Weight { lot: u32, kg: u32 },
    Status,
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = words.collect();

    let command = match (verb.as_str(), args.as_slice()) {
        ("break", []) => Command::Fop(FopEventKind::IntermissionStarted { break_millis: None }),
        ("break", [secs]) => Command::Fop(FopEventKind::IntermissionStarted {
            break_millis: Some(number::<u64>(secs, "break length")? * 1_000),
        }),
        ("resume", []) => Command::Fop(FopEventKind::IntermissionDone),
        ("announce", []) => Command::Fop(FopEventKind::AthleteAnnounced),
        ("start", []) => Command::Fop(FopEventKind::TimeStartedManually),
        ("stop", []) => Command::Fop(FopEventKind::TimeStoppedManually),
        ("force", [millis]) => Command::Fop(FopEventKind::ForceTime {
            millis: number(millis, "time")?,
        }),
        ("time-over", []) => Command::Fop(FopEventKind::TimeOver),
        ("down", []) => Command::Fop(FopEventKind::DownSignal),
        ("decision", [v1, v2, v3]) => {
            let (ref1, ref2, ref3) = (vote(v1)?, vote(v2)?, vote(v3)?);
            Command::Fop(FopEventKind::RefereeDecision {
                success: majority(ref1, ref2, ref3, false),
                ref1,
                ref2,
                ref3,
            })
        }
        ("reset", []) => Command::Fop(FopEventKind::DecisionReset),
        ("weight", [lot, kg]) => Command::Weight {
            lot: number(lot, "lot number")?,
            kg: number(kg, "weight")?,
        },
        ("status", []) => Command::Status,
        ("help", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => {
            return Err(FopError::InvalidInput(format!(
                "unrecognized command: '{}' (try 'help')",
                line
            )))
        }
    };

    Ok(Some(command))
}

fn number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| FopError::InvalidInput(format!("invalid {}: '{}'", what, value)))
}

fn vote(value: &str) -> Result<Option<bool>> {
    match value.to_lowercase().as_str() {
        "g" | "good" | "w" | "white" => Ok(Some(true)),
        "n" | "no" | "r" | "red" => Ok(Some(false)),
        "-" => Ok(None),
        _ => Err(FopError::InvalidInput(format!("invalid vote: '{}'", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("# warmup room").unwrap(), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(
            parse("announce").unwrap(),
            Some(Command::Fop(FopEventKind::AthleteAnnounced))
        );
        assert_eq!(
            parse("  Time-Over ").unwrap(),
            Some(Command::Fop(FopEventKind::TimeOver))
        );
        assert_eq!(parse("quit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_break_length_in_seconds() {
        assert_eq!(
            parse("break 600").unwrap(),
            Some(Command::Fop(FopEventKind::IntermissionStarted {
                break_millis: Some(600_000)
            }))
        );
        assert_eq!(
            parse("break").unwrap(),
            Some(Command::Fop(FopEventKind::IntermissionStarted { break_millis: None }))
        );
    }

    #[test]
    fn test_decision_votes() {
        assert_eq!(
            parse("decision g n g").unwrap(),
            Some(Command::Fop(FopEventKind::RefereeDecision {
                success: true,
                ref1: Some(true),
                ref2: Some(false),
                ref3: Some(true),
            }))
        );
        assert_eq!(
            parse("decision red red -").unwrap(),
            Some(Command::Fop(FopEventKind::RefereeDecision {
                success: false,
                ref1: Some(false),
                ref2: Some(false),
                ref3: None,
            }))
        );
    }

    #[test]
    fn test_weight_change() {
        assert_eq!(
            parse("weight 12 117").unwrap(),
            Some(Command::Weight { lot: 12, kg: 117 })
        );
    }

    #[test]
    fn test_invalid_input() {
        for line in ["jump", "force soon", "decision g g", "decision g g maybe", "weight 12"] {
            let err = parse(line).unwrap_err();
            assert!(matches!(err, FopError::InvalidInput(_)), "{line}");
            assert_eq!(err.exit_code(), 3);
        }
    }
}
