//! Special commands parser for interactive chat mode
//!
//! Commands are prefixed with `/` and are case-insensitive. Anything else
//! typed at the prompt is a follow-up question for the session.

use std::path::PathBuf;
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

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Re-send the last failed question
    Retry,

    /// Dismiss the current error, keeping the conversation
    ClearError,

    /// Start a new conversation (the current one stays in history)
    NewConversation,

    /// Attach a different image, starting a new conversation
    AttachImage(PathBuf),

    /// List saved conversations
    ListHistory,

    /// Print a saved conversation by its position in `/history`
    ShowHistory(usize),

    /// Display session status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the session
    Exit,

    /// Not a command; send the input as a question
    None,
}

/// Parse a line typed at the chat prompt
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands or bad arguments
///
/// # Examples
///
/// ```
/// use scanchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/retry").unwrap(), SpecialCommand::Retry);
/// assert_eq!(parse_special_command("Any abnormalities?").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command.to_lowercase(), arg.trim()),
        None => (lower.clone(), ""),
    };

    match command.as_str() {
        "/retry" => Ok(SpecialCommand::Retry),
        "/clear" | "/dismiss" => Ok(SpecialCommand::ClearError),
        "/new" => Ok(SpecialCommand::NewConversation),
        "/image" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/image".to_string(),
                    usage: "/image <path>".to_string(),
                })
            } else {
                Ok(SpecialCommand::AttachImage(PathBuf::from(arg)))
            }
        }
        "/history" => Ok(SpecialCommand::ListHistory),
        "/show" => {
            if arg.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/show".to_string(),
                    usage: "/show <number>".to_string(),
                });
            }
            match arg.parse::<usize>() {
                Ok(n) if n > 0 => Ok(SpecialCommand::ShowHistory(n)),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/show".to_string(),
                    arg: arg.to_string(),
                }),
            }
        }
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the list of special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

CONVERSATION:
  /retry          - Re-send the last question after a failure
  /clear          - Dismiss the current error
  /new            - Start a new conversation (attach an image next)
  /image <path>   - Analyse a different image

HISTORY:
  /history        - List conversations saved in this session
  /show <number>  - Print a saved conversation

OTHER:
  /status         - Show session status
  /help           - Show this help message
  /exit, /quit    - Exit interactive mode

Anything else is sent as a follow-up question about the current image.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("Is there a fracture?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_retry_and_clear() {
        assert_eq!(parse_special_command("/retry").unwrap(), SpecialCommand::Retry);
        assert_eq!(parse_special_command("/CLEAR").unwrap(), SpecialCommand::ClearError);
        assert_eq!(parse_special_command("/dismiss").unwrap(), SpecialCommand::ClearError);
    }

    #[test]
    fn test_parse_image_keeps_path_case() {
        assert_eq!(
            parse_special_command("/image  Scans/Chest CT.png ").unwrap(),
            SpecialCommand::AttachImage(PathBuf::from("Scans/Chest CT.png"))
        );
    }

    #[test]
    fn test_parse_image_requires_path() {
        let err = parse_special_command("/image").unwrap_err();
        assert!(matches!(err, CommandError::MissingArgument { .. }));
    }

    #[test]
    fn test_parse_show() {
        assert_eq!(parse_special_command("/show 2").unwrap(), SpecialCommand::ShowHistory(2));
        assert!(matches!(
            parse_special_command("/show zero"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
        assert!(parse_special_command("/show 0").is_err());
        assert!(parse_special_command("/show").is_err());
    }

    #[test]
    fn test_parse_exit_variants() {
        for input in ["exit", "QUIT", "/exit", "/quit"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_special_command("/mode write").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/mode write".to_string()));
        assert!(err.to_string().contains("/help"));
    }

    #[test]
    fn test_parse_history_status_help() {
        assert_eq!(parse_special_command("/history").unwrap(), SpecialCommand::ListHistory);
        assert_eq!(parse_special_command("/status").unwrap(), SpecialCommand::ShowStatus);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }
}
