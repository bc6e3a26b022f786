//! Shell command parsing.

use crate::cpu::{MemoryError, MEMORY_SIZE};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Finish the in-flight instruction, or execute one.
    Step,
    /// Execute `count` instructions.
    Continue { count: u64 },
    /// Advance one clock cycle.
    Clock,
    /// Print one cell, or the inclusive range `start..=end`.
    ReadMemory { start: u8, end: Option<u8> },
    WriteMemory { addr: u8, value: u8 },
    Registers,
    Stats,
    /// Zero the machine and reload the startup image.
    Reset,
    Save { path: PathBuf },
    Restore { path: PathBuf },
    Help,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandName {
    Step,
    Continue,
    Clock,
    ReadMemory,
    WriteMemory,
    Registers,
    Stats,
    Reset,
    Save,
    Restore,
    Help,
    Quit,
}

impl CommandName {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "s" | "si" => Self::Step,
            "c" => Self::Continue,
            "sc" => Self::Clock,
            "rm" => Self::ReadMemory,
            "wm" => Self::WriteMemory,
            "rr" => Self::Registers,
            "ps" => Self::Stats,
            "x" | "reset" => Self::Reset,
            "save" => Self::Save,
            "restore" => Self::Restore,
            "h" | "help" => Self::Help,
            "q" | "quit" => Self::Quit,
            _ => return None,
        })
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => write!(f, "si"),
            Self::Continue => write!(f, "c"),
            Self::Clock => write!(f, "sc"),
            Self::ReadMemory => write!(f, "rm"),
            Self::WriteMemory => write!(f, "wm"),
            Self::Registers => write!(f, "rr"),
            Self::Stats => write!(f, "ps"),
            Self::Reset => write!(f, "x"),
            Self::Save => write!(f, "save"),
            Self::Restore => write!(f, "restore"),
            Self::Help => write!(f, "h"),
            Self::Quit => write!(f, "q"),
        }
    }
}

/// Error parsing a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}` (try `h`)")]
    Unknown(String),

    #[error("`{command}` expects an argument <{argument}>")]
    MissingArgument {
        command: CommandName,
        argument: &'static str,
    },

    #[error("`{command}` takes at most {expected} argument(s)")]
    TooManyArguments { command: CommandName, expected: usize },

    #[error("invalid number `{text}` for <{argument}>")]
    InvalidNumber { argument: &'static str, text: String },

    #[error(transparent)]
    Address(#[from] MemoryError),

    #[error("value {0} does not fit in a byte (-128 to 255)")]
    ValueOutOfRange(i64),
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let name = CommandName::lookup(name)
            .ok_or_else(|| CommandError::Unknown(name.to_string()))?;
        let args: Vec<&str> = words.collect();

        let command = match name {
            CommandName::Step => {
                expect_at_most(name, &args, 0)?;
                Command::Step
            }
            CommandName::Continue => {
                expect_at_most(name, &args, 1)?;
                let count = parse_number(required(name, &args, 0, "count")?, "count")?;
                let count = u64::try_from(count).map_err(|_| CommandError::InvalidNumber {
                    argument: "count",
                    text: args[0].to_string(),
                })?;
                Command::Continue { count }
            }
            CommandName::Clock => {
                expect_at_most(name, &args, 0)?;
                Command::Clock
            }
            CommandName::ReadMemory => {
                expect_at_most(name, &args, 2)?;
                let start = parse_address(required(name, &args, 0, "addr")?)?;
                let end = args.get(1).map(|text| parse_address(text)).transpose()?;
                Command::ReadMemory { start, end }
            }
            CommandName::WriteMemory => {
                expect_at_most(name, &args, 2)?;
                let addr = parse_address(required(name, &args, 0, "addr")?)?;
                let value = parse_value(required(name, &args, 1, "value")?)?;
                Command::WriteMemory { addr, value }
            }
            CommandName::Registers => {
                expect_at_most(name, &args, 0)?;
                Command::Registers
            }
            CommandName::Stats => {
                expect_at_most(name, &args, 0)?;
                Command::Stats
            }
            CommandName::Reset => {
                expect_at_most(name, &args, 0)?;
                Command::Reset
            }
            CommandName::Save => {
                expect_at_most(name, &args, 1)?;
                let path = PathBuf::from(required(name, &args, 0, "path")?);
                Command::Save { path }
            }
            CommandName::Restore => {
                expect_at_most(name, &args, 1)?;
                let path = PathBuf::from(required(name, &args, 0, "path")?);
                Command::Restore { path }
            }
            CommandName::Help => {
                expect_at_most(name, &args, 0)?;
                Command::Help
            }
            CommandName::Quit => {
                expect_at_most(name, &args, 0)?;
                Command::Quit
            }
        };

        Ok(Some(command))
    }
}

fn expect_at_most(command: CommandName, args: &[&str], expected: usize) -> Result<(), CommandError> {
    if args.len() > expected {
        return Err(CommandError::TooManyArguments { command, expected });
    }
    Ok(())
}

fn required<'a>(
    command: CommandName,
    args: &[&'a str],
    index: usize,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or(CommandError::MissingArgument { command, argument })
}

/// Decimal, `0x` hex, or `0b` binary, optionally negative.
fn parse_number(text: &str, argument: &'static str) -> Result<i64, CommandError> {
    let invalid = || CommandError::InvalidNumber {
        argument,
        text: text.to_string(),
    };
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (radix, digits) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(bin) = digits.strip_prefix("0b") {
        (2, bin)
    } else {
        (10, digits)
    };
    // `from_str_radix` takes its own sign; only the one leading `-` is ours.
    if digits.starts_with(|c: char| c == '+' || c == '-') {
        return Err(invalid());
    }
    let value = i64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    Ok(if negative { -value } else { value })
}

fn parse_address(text: &str) -> Result<u8, CommandError> {
    let value = parse_number(text, "addr")?;
    let addr = usize::try_from(value).map_err(|_| CommandError::InvalidNumber {
        argument: "addr",
        text: text.to_string(),
    })?;
    if addr >= MEMORY_SIZE {
        return Err(MemoryError::AddressOutOfRange(addr).into());
    }
    Ok(addr as u8)
}

/// Negative values are stored in two's complement.
fn parse_value(text: &str) -> Result<u8, CommandError> {
    let value = parse_number(text, "value")?;
    match value {
        0..=255 => Ok(value as u8),
        -128..=-1 => Ok((value as i8) as u8),
        _ => Err(CommandError::ValueOutOfRange(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(Command::parse("s"), Ok(Some(Command::Step)));
        assert_eq!(Command::parse("  si  "), Ok(Some(Command::Step)));
        assert_eq!(Command::parse("sc"), Ok(Some(Command::Clock)));
        assert_eq!(Command::parse("c 10"), Ok(Some(Command::Continue { count: 10 })));
        assert_eq!(Command::parse("q"), Ok(Some(Command::Quit)));
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn test_parse_memory_commands() {
        assert_eq!(
            Command::parse("rm 3"),
            Ok(Some(Command::ReadMemory { start: 3, end: None }))
        );
        assert_eq!(
            Command::parse("rm 0x10 0x1f"),
            Ok(Some(Command::ReadMemory { start: 16, end: Some(31) }))
        );
        assert_eq!(
            Command::parse("wm 255 65"),
            Ok(Some(Command::WriteMemory { addr: 255, value: 65 }))
        );
        assert_eq!(
            Command::parse("wm 3 -3"),
            Ok(Some(Command::WriteMemory { addr: 3, value: 253 }))
        );
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            Command::parse("rm 256"),
            Err(CommandError::Address(MemoryError::AddressOutOfRange(256)))
        );
        assert_eq!(
            Command::parse("wm 1 300"),
            Err(CommandError::ValueOutOfRange(300))
        );
        assert!(matches!(
            Command::parse("rm -1"),
            Err(CommandError::InvalidNumber { argument: "addr", .. })
        ));
    }

    #[test]
    fn test_argument_errors() {
        assert_eq!(
            Command::parse("c"),
            Err(CommandError::MissingArgument {
                command: CommandName::Continue,
                argument: "count",
            })
        );
        assert_eq!(
            Command::parse("wm 4"),
            Err(CommandError::MissingArgument {
                command: CommandName::WriteMemory,
                argument: "value",
            })
        );
        assert_eq!(
            Command::parse("rr 1"),
            Err(CommandError::TooManyArguments {
                command: CommandName::Registers,
                expected: 0,
            })
        );
        assert_eq!(
            Command::parse("jump 4"),
            Err(CommandError::Unknown("jump".into()))
        );
        assert!(matches!(
            Command::parse("c ten"),
            Err(CommandError::InvalidNumber { argument: "count", .. })
        ));
    }

    #[test]
    fn test_rejects_doubled_signs() {
        for line in ["wm 1 --5", "wm 1 -+5", "wm 1 +5", "wm 1 -0x-5", "wm 1 0b+1"] {
            assert!(
                matches!(
                    Command::parse(line),
                    Err(CommandError::InvalidNumber { argument: "value", .. })
                ),
                "{line} should be rejected"
            );
        }
        assert!(matches!(
            Command::parse("rm +3"),
            Err(CommandError::InvalidNumber { argument: "addr", .. })
        ));
        assert_eq!(
            Command::parse("wm 1 -0x5"),
            Ok(Some(Command::WriteMemory { addr: 1, value: 251 }))
        );
    }

    #[test]
    fn test_help_and_quit_take_no_arguments() {
        assert_eq!(Command::parse("h"), Ok(Some(Command::Help)));
        assert_eq!(
            Command::parse("h foo"),
            Err(CommandError::TooManyArguments {
                command: CommandName::Help,
                expected: 0,
            })
        );
        assert_eq!(
            Command::parse("q now"),
            Err(CommandError::TooManyArguments {
                command: CommandName::Quit,
                expected: 0,
            })
        );
    }
}
