//! Parsing of typed player commands into wire messages

use shared::{Action, ClientMessage};
use thiserror::Error;

pub const USAGE: &str = "commands: ready | catch keep <slot> | catch pass | swap <src> <dst> | \
item <item> <target> | evolve <target> | attack <src> <skill> <target> | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(ClientMessage),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a slot number")]
    BadIndex(String),
}

fn index(word: &str) -> Result<usize, CommandError> {
    word.parse()
        .map_err(|_| CommandError::BadIndex(word.to_string()))
}

fn action(payload: Action) -> Command {
    Command::Send(ClientMessage::Action { payload })
}

/// Parses one input line. Verbs are case-insensitive, arguments are not.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((verb, args)) = words.split_first() else {
        return Err(CommandError::Empty);
    };

    match (verb.to_ascii_lowercase().as_str(), args) {
        ("ready", []) => Ok(Command::Send(ClientMessage::Ready)),
        ("quit" | "exit", []) => Ok(Command::Quit),
        ("catch", [mode]) if mode.eq_ignore_ascii_case("pass") => Ok(action(Action::Catch {
            keep: false,
            replace_index: None,
        })),
        ("catch", [mode, slot]) if mode.eq_ignore_ascii_case("keep") => {
            Ok(action(Action::Catch {
                keep: true,
                replace_index: Some(index(slot)?),
            }))
        }
        ("catch", _) => Err(CommandError::Usage("catch keep <slot> | catch pass")),
        ("swap", [src, dst]) => Ok(action(Action::Swap {
            src_index: Some(index(src)?),
            dst_index: Some(index(dst)?),
        })),
        ("swap", _) => Err(CommandError::Usage("swap <src> <dst>")),
        ("item", [item, target]) => Ok(action(Action::Item {
            item_index: Some(index(item)?),
            target_index: Some(index(target)?),
        })),
        ("item", _) => Err(CommandError::Usage("item <item> <target>")),
        ("evolve", [target]) => Ok(action(Action::Evolve {
            target_index: Some(index(target)?),
        })),
        ("evolve", _) => Err(CommandError::Usage("evolve <target>")),
        ("attack", [src, skill, target]) => Ok(action(Action::Attack {
            src_index: index(src)?,
            skill_id: skill.to_string(),
            target_index: index(target)?,
        })),
        ("attack", _) => Err(CommandError::Usage("attack <src> <skill> <target>")),
        ("ready" | "quit" | "exit", _) => Err(CommandError::Usage(USAGE)),
        (other, _) => Err(CommandError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(line: &str) -> ClientMessage {
        match parse_command(line).unwrap() {
            Command::Send(message) => message,
            Command::Quit => panic!("expected a message for '{}'", line),
        }
    }

    #[test]
    fn test_ready_and_quit() {
        assert_eq!(sent("ready"), ClientMessage::Ready);
        assert_eq!(sent("  READY "), ClientMessage::Ready);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_catch_variants() {
        assert_eq!(
            sent("catch keep 3"),
            ClientMessage::Action {
                payload: Action::Catch {
                    keep: true,
                    replace_index: Some(3)
                }
            }
        );
        assert_eq!(
            sent("Catch PASS"),
            ClientMessage::Action {
                payload: Action::Catch {
                    keep: false,
                    replace_index: None
                }
            }
        );
        assert!(matches!(
            parse_command("catch keep"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn test_tactics_commands() {
        assert_eq!(
            sent("swap 0 4"),
            ClientMessage::Action {
                payload: Action::Swap {
                    src_index: Some(0),
                    dst_index: Some(4)
                }
            }
        );
        assert_eq!(
            sent("item 1 0"),
            ClientMessage::Action {
                payload: Action::Item {
                    item_index: Some(1),
                    target_index: Some(0)
                }
            }
        );
        assert_eq!(
            sent("evolve 2"),
            ClientMessage::Action {
                payload: Action::Evolve {
                    target_index: Some(2)
                }
            }
        );
        assert_eq!(
            sent("attack 1 thunderbolt 0"),
            ClientMessage::Action {
                payload: Action::Attack {
                    src_index: 1,
                    skill_id: "thunderbolt".to_string(),
                    target_index: 0
                }
            }
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(
            parse_command("dance 1"),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert_eq!(
            parse_command("swap one 2"),
            Err(CommandError::BadIndex("one".to_string()))
        );
        assert_eq!(
            parse_command("evolve -1"),
            Err(CommandError::BadIndex("-1".to_string()))
        );
        assert!(matches!(
            parse_command("attack 0 0"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            parse_command("ready now"),
            Err(CommandError::Usage(_))
        ));
    }
}
