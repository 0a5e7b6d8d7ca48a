//! Session transcripts.
//!
//! A transcript records every successfully executed console line except the
//! ones that manage transcripts themselves, so replaying a saved session never
//! saves, loads or restarts a session.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{ConsoleError, ConsoleResult};
use crate::reader::{continued_rows, Continuation};

const SESSION_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Lines starting with one of these are never recorded.
pub const TRANSCRIPT_COMMANDS: &[&str] = &[":save", ":load", ":session", ":help"];

pub fn auto_session_name() -> String {
    Local::now().format(SESSION_NAME_FORMAT).to_string()
}

pub fn is_transcript_command(line: &str) -> bool {
    TRANSCRIPT_COMMANDS.iter().any(|prefix| line.starts_with(prefix))
}

/// Session names become file names inside the sessions directory.
pub fn validate_session_name(name: &str) -> ConsoleResult<()> {
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\' || c.is_control());
    if is_plain {
        Ok(())
    } else {
        Err(ConsoleError::InvalidArgument(format!("Invalid session name: {}", name)))
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    name: String,
    lines: Vec<String>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            name: auto_session_name(),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn record(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    /// Starts a new transcript, named `name` or after the current time.
    pub fn reset(&mut self, name: Option<&str>) -> ConsoleResult<()> {
        self.name = match name {
            Some(name) => {
                validate_session_name(name)?;
                name.to_string()
            }
            None => auto_session_name(),
        };
        self.lines.clear();
        Ok(())
    }

    /// Writes the transcript to `<dir>/<name>`, replacing any existing file.
    /// Multi-line entries are written as rows ending in `\\`.
    pub fn save(&self, dir: &Path) -> ConsoleResult<PathBuf> {
        let path = dir.join(&self.name);
        let mut writer = BufWriter::new(File::create(&path)?);
        for line in &self.lines {
            writeln!(writer, "{}", continued_rows(line))?;
        }
        writer.flush()?;
        info!("Saved {} line(s) to {}", self.lines.len(), path.display());
        Ok(path)
    }
}

/// Reads the logical lines of a saved session, skipping blanks and comments.
/// Rows ending in `\\` are joined with the row after them.
pub fn load_session(dir: &Path, name: &str) -> ConsoleResult<Vec<String>> {
    validate_session_name(name)?;
    let path = dir.join(name);
    let content = fs::read_to_string(&path)?;
    info!("Loaded session {}", path.display());

    let mut continuation = Continuation::default();
    let rows: Vec<String> = content.lines().filter_map(|row| continuation.push(row)).collect();
    Ok(rows
        .into_iter()
        .chain(continuation.finish())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect())
}
