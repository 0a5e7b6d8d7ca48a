use rustyline::error::ReadlineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("You must :connect to a server")]
    NotConnected,

    #[error("You must :use an index")]
    NoIndexSelected,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidOption(String),

    #[error("{0}")]
    Transport(String),

    #[error("Session directory was not set")]
    SessionsUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line editor error: {0}")]
    Readline(#[from] ReadlineError),
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        ConsoleError::Transport(err.to_string())
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Shorthand for a usage error.
pub fn usage(text: &str) -> ConsoleError {
    ConsoleError::InvalidArgument(format!("Usage: {}", text))
}
