//! Special commands parser for the interactive chat
//!
//! Lines starting with `/` manage sessions and show status instead of being
//! sent as questions. Commands are case-insensitive; `exit` and `quit` also
//! work without the slash.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new session and make it current
    NewSession,

    /// List sessions, newest first
    ListSessions,

    /// Make the n-th listed session current (1-based)
    SwitchSession(usize),

    /// Delete the n-th listed session (1-based)
    DeleteSession(usize),

    /// Reprint the current session's messages
    ShowHistory,

    /// Show remaining questions
    ShowUsage,

    /// Display help information
    Help,

    /// Exit the chat
    Exit,

    /// Not a special command
    None,
}

/// Parse a user input line into a special command
///
/// # Errors
///
/// Returns `CommandError` for unknown commands and bad or missing session
/// numbers.
///
/// # Examples
///
/// ```
/// use astravaani::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewSession);
/// assert_eq!(parse_special_command("/switch 2").unwrap(), SpecialCommand::SwitchSession(2));
/// assert_eq!(
///     parse_special_command("Will Jupiter's transit help my studies?").unwrap(),
///     SpecialCommand::None
/// );
/// assert!(parse_special_command("/switch zero").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = lower.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();
    if let Some(extra) = parts.next() {
        return Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: extra.to_string(),
        });
    }

    match (command, arg) {
        ("/new", None) => Ok(SpecialCommand::NewSession),
        ("/sessions" | "/list", None) => Ok(SpecialCommand::ListSessions),
        ("/switch", arg) => parse_index("/switch", arg).map(SpecialCommand::SwitchSession),
        ("/delete", arg) => parse_index("/delete", arg).map(SpecialCommand::DeleteSession),
        ("/history", None) => Ok(SpecialCommand::ShowHistory),
        ("/usage", None) => Ok(SpecialCommand::ShowUsage),
        ("/help" | "/?", None) => Ok(SpecialCommand::Help),
        ("exit" | "quit" | "/exit" | "/quit", None) => Ok(SpecialCommand::Exit),

        (
            "/new" | "/sessions" | "/list" | "/history" | "/usage" | "/help" | "/?" | "exit"
            | "quit" | "/exit" | "/quit",
            Some(arg),
        ) => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),

        _ => Err(CommandError::UnknownCommand(command.to_string())),
    }
}

fn parse_index(command: &str, arg: Option<&str>) -> Result<usize, CommandError> {
    let Some(arg) = arg else {
        return Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: format!("{} <number from /sessions>", command),
        });
    };

    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Chat Commands
=============

SESSIONS:
  /new            - Start a new conversation
  /sessions       - List conversations (newest first)
  /list           - Same as /sessions
  /switch <n>     - Continue conversation number n
  /delete <n>     - Delete conversation number n
  /history        - Show the current conversation again

ACCOUNT:
  /usage          - Show remaining questions

OTHER:
  /help           - Show this help message
  /?              - Same as /help
  exit            - Leave the chat
  quit            - Same as exit

NOTES:
  - Commands are case-insensitive
  - Anything else you type is asked as a question
  - Conversations are saved on this machine for your account only
"#
    );
}
