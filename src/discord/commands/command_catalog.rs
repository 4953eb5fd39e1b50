// Discord commands module.
//
// Every command the bot answers to is listed once in `CommandKind`; main.rs
// registers `CommandKind::ALL` with poise, which does the string-to-handler
// lookup, argument parsing and error reporting.

pub mod emoji;

pub mod help;

pub mod misc;

pub mod presence;

pub mod stock;

pub mod thumbnail;

pub mod timezones;

use crate::discord::{Data, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Emoji,
    Raw,
    Choose,
    Time,
    Stock,
    Thumbnail,
    Clean,
    Bye,
    Help,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::Emoji,
        CommandKind::Raw,
        CommandKind::Choose,
        CommandKind::Time,
        CommandKind::Stock,
        CommandKind::Thumbnail,
        CommandKind::Clean,
        CommandKind::Bye,
        CommandKind::Help,
    ];

    pub fn command(self) -> poise::Command<Data, Error> {
        match self {
            CommandKind::Emoji => emoji::emoji(),
            CommandKind::Raw => misc::raw(),
            CommandKind::Choose => misc::choose(),
            CommandKind::Time => timezones::time(),
            CommandKind::Stock => stock::stock(),
            CommandKind::Thumbnail => thumbnail::thumbnail(),
            CommandKind::Clean => misc::clean(),
            CommandKind::Bye => misc::bye(),
            CommandKind::Help => help::help(),
        }
    }
}

pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    CommandKind::ALL.iter().map(|kind| kind.command()).collect()
}

/// Splits `content` into (prefix as typed, rest) when it starts with `prefix`.
///
/// Whitespace between the prefix and the command is part of the prefix, so
/// `$ emoji` and `$emoji` both reach the `emoji` command.
pub fn split_prefix<'a>(content: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let rest = content.strip_prefix(prefix)?;
    let command = rest.trim_start();
    let prefix_len = content.len() - command.len();
    Some(content.split_at(prefix_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_without_space() {
        assert_eq!(split_prefix("$emoji", "$"), Some(("$", "emoji")));
    }

    #[test]
    fn prefix_with_spaces_is_tolerated() {
        assert_eq!(split_prefix("$   time 21:00", "$"), Some(("$   ", "time 21:00")));
    }

    #[test]
    fn other_messages_are_ignored() {
        assert_eq!(split_prefix("hello $emoji", "$"), None);
        assert_eq!(split_prefix("!emoji", "$"), None);
    }

    #[test]
    fn every_kind_is_listed_once() {
        let mut kinds = CommandKind::ALL.to_vec();
        kinds.dedup();
        assert_eq!(kinds.len(), CommandKind::ALL.len());
    }
}
