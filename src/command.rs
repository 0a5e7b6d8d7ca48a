//! # Console Commands
//!
//! Lines starting with `:` are console commands rather than queries:
//!
//! | Command                                       | Effect                                  |
//! |-----------------------------------------------|-----------------------------------------|
//! | `:connect ADDRESS`                            | Connect to a server and fetch its schema |
//! | `:use INDEX`                                  | Select the index queries run against    |
//! | `:create {index\|frame} NAME [key=value ...]` | Create an object, failing if it exists  |
//! | `:ensure {index\|frame} NAME [key=value ...]` | Create an object unless it exists       |
//! | `:delete {index\|frame} NAME ...`             | Delete each named object                |
//! | `:schema [INDEX\|*]`                          | Refresh and show the schema             |
//! | `:save`                                       | Write the session transcript to disk    |
//! | `:load SESSION`                               | Replay a saved session                  |
//! | `:session [NAME]`                             | Start a new session transcript          |
//! | `:help`                                       | List commands                           |
//! | `:exit`                                       | Leave the console                       |
//!
//! Parsing only splits the line on whitespace and resolves the keyword;
//! argument checks belong to each handler.

use crate::error::{usage, ConsoleError, ConsoleResult};

pub const COMMAND_MARKER: char = ':';
pub const EXIT_COMMAND: &str = ":exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Connect,
    Use,
    Create,
    Ensure,
    Delete,
    Schema,
    Save,
    Load,
    Session,
    Help,
}

impl Keyword {
    pub const ALL: [Keyword; 10] = [
        Keyword::Connect,
        Keyword::Use,
        Keyword::Create,
        Keyword::Ensure,
        Keyword::Delete,
        Keyword::Schema,
        Keyword::Save,
        Keyword::Load,
        Keyword::Session,
        Keyword::Help,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Keyword::Connect => ":connect",
            Keyword::Use => ":use",
            Keyword::Create => ":create",
            Keyword::Ensure => ":ensure",
            Keyword::Delete => ":delete",
            Keyword::Schema => ":schema",
            Keyword::Save => ":save",
            Keyword::Load => ":load",
            Keyword::Session => ":session",
            Keyword::Help => ":help",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|keyword| keyword.token() == token)
    }

    pub fn usage(self) -> &'static str {
        match self {
            Keyword::Connect => ":connect pilosa-address",
            Keyword::Use => ":use index-name",
            Keyword::Create => ":create {index | frame} name [option1=value1 ...]",
            Keyword::Ensure => ":ensure {index | frame} name [option1=value1 ...]",
            Keyword::Delete => ":delete {index | frame} name1 [name2 ...]",
            Keyword::Schema => ":schema [index-name | *]",
            Keyword::Save => ":save",
            Keyword::Load => ":load session-name",
            Keyword::Session => ":session [session-name]",
            Keyword::Help => ":help",
        }
    }

    pub fn usage_error(self) -> ConsoleError {
        usage(self.usage())
    }

    fn verb(self) -> &'static str {
        &self.token()[1..]
    }
}

/// A parsed `:keyword arg1 arg2 ...` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub keyword: Keyword,
    pub args: Vec<String>,
}

impl Command {
    pub fn parse(line: &str) -> ConsoleResult<Self> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().unwrap_or_default();
        let keyword =
            Keyword::from_token(first).ok_or_else(|| ConsoleError::InvalidCommand(first.to_string()))?;
        Ok(Self {
            keyword,
            args: tokens.map(str::to_string).collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Index,
    Frame,
}

impl ObjectKind {
    pub fn parse(kind: &str, keyword: Keyword) -> ConsoleResult<Self> {
        match kind {
            "index" => Ok(ObjectKind::Index),
            "frame" => Ok(ObjectKind::Frame),
            other => Err(ConsoleError::InvalidArgument(format!(
                "Don't know how to {} {}",
                keyword.verb(),
                other
            ))),
        }
    }
}

pub fn help_text() -> String {
    let mut text = String::from("Commands:\n");
    for keyword in Keyword::ALL {
        text.push_str(&format!("  {}\n", keyword.usage()));
    }
    text.push_str("  :exit\n\n");
    text.push_str("Any other line is sent as a query to the selected index.\n");
    text.push_str("End a line with \\ to continue it on the next line; _ shows the last response.\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keyword_and_arguments() {
        let command = Command::parse(":ensure  frame tags\trow=id").unwrap();
        assert_eq!(command.keyword, Keyword::Ensure);
        assert_eq!(command.args, vec!["frame", "tags", "row=id"]);
    }

    #[test]
    fn unknown_keyword_names_the_token() {
        let err = Command::parse(":conect localhost").unwrap_err();
        assert_eq!(err.to_string(), "Invalid command: :conect");
    }

    #[test]
    fn every_keyword_round_trips_through_its_token() {
        for keyword in Keyword::ALL {
            assert_eq!(Keyword::from_token(keyword.token()), Some(keyword));
        }
    }

    #[test]
    fn unknown_kind_mentions_the_verb() {
        let err = ObjectKind::parse("table", Keyword::Delete).unwrap_err();
        assert_eq!(err.to_string(), "Don't know how to delete table");
        assert_eq!(ObjectKind::parse("frame", Keyword::Create).unwrap(), ObjectKind::Frame);
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for keyword in Keyword::ALL {
            assert!(help.contains(keyword.token()));
        }
        assert!(help.contains(":exit"));
    }
}
