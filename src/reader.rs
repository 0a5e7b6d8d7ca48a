use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Context, Editor, Event, EventContext, EventHandler, KeyEvent, RepeatCount,
};
use rustyline_derive::{Helper, Highlighter, Hinter, Validator};
use tracing::{debug, warn};

use crate::command::{Keyword, EXIT_COMMAND};
use crate::error::ConsoleResult;

const QUERY_CALLS: &[&str] = &[
    "Bitmap(",
    "ClearBit(",
    "Count(",
    "Difference(",
    "Intersect(",
    "Range(",
    "SetBit(",
    "SetColumnAttrs(",
    "SetRowAttrs(",
    "TopN(",
    "Union(",
];

const OBJECT_KINDS: &[&str] = &["index", "frame"];

const CONTINUATION_MARKER: char = '\\';

/// Outcome of reading one line from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Line(String),
    /// Ctrl-C, carrying whatever was in the edit buffer.
    Interrupted(String),
    Eof,
}

/// Joins lines ending in `\` into one logical line.
#[derive(Debug, Default)]
pub struct Continuation {
    pending: Vec<String>,
}

impl Continuation {
    /// Takes one raw line; returns the logical line once it is complete.
    pub fn push(&mut self, raw: &str) -> Option<String> {
        let line = raw.trim();
        if line.ends_with(CONTINUATION_MARKER) {
            self.pending.push(line.trim_end_matches(CONTINUATION_MARKER).to_string());
            return None;
        }
        if self.pending.is_empty() {
            return Some(line.to_string());
        }
        self.pending.push(line.to_string());
        self.finish()
    }

    /// Joins whatever is still buffered, for input that ends mid-line.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let joined = self.pending.join("\n");
        self.pending.clear();
        Some(joined)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Splits a logical line back into rows that [`Continuation`] rejoins.
pub fn continued_rows(line: &str) -> String {
    line.split('\n').collect::<Vec<_>>().join("\\\n")
}

pub trait LineReader {
    /// Reads a line, pre-filling the edit buffer with `initial`.
    fn read_line(&mut self, prompt: &str, initial: &str) -> ConsoleResult<Signal>;

    /// Index names offered by completion.
    fn update_indexes(&mut self, _indexes: Vec<String>) {}
}

/// Tab completion for console commands and query calls.
#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct ConsoleHelper {
    indexes: Vec<String>,
    history_file: Option<PathBuf>,
}

impl ConsoleHelper {
    pub fn new(history_file: Option<PathBuf>) -> Self {
        Self {
            indexes: Vec::new(),
            history_file,
        }
    }

    /// Addresses passed to `:connect` in earlier sessions.
    fn known_addresses(&self) -> Vec<String> {
        let Some(path) = &self.history_file else {
            return Vec::new();
        };
        let Ok(content) = fs::read_to_string(path) else {
            return Vec::new();
        };
        let addresses: BTreeSet<String> = content
            .lines()
            .filter(|line| line.starts_with(":connect "))
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(str::to_string)
            .collect();
        addresses.into_iter().collect()
    }

    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let before = &line[..pos];
        let start = before
            .char_indices()
            .rfind(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let word = &before[start..];
        let previous: Vec<&str> = before[..start].split_whitespace().collect();

        let options: Vec<String> = match previous.as_slice() {
            [] => std::iter::once(EXIT_COMMAND)
                .chain(Keyword::ALL.iter().map(|keyword| keyword.token()))
                .chain(QUERY_CALLS.iter().copied())
                .map(str::to_string)
                .collect(),
            [":use"] => self.indexes.clone(),
            [":schema"] => std::iter::once("*".to_string()).chain(self.indexes.iter().cloned()).collect(),
            [":connect"] => self.known_addresses(),
            [":create"] | [":ensure"] | [":delete"] => OBJECT_KINDS.iter().map(|s| s.to_string()).collect(),
            _ => Vec::new(),
        };

        let matches = options.into_iter().filter(|option| option.starts_with(word)).collect();
        (start, matches)
    }
}

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(line, pos);
        let pairs = matches
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, pairs))
    }
}

/// Keeps the edit buffer seen when Ctrl-C is pressed.
struct InterruptCapture {
    buffer: Arc<Mutex<String>>,
}

impl ConditionalEventHandler for InterruptCapture {
    fn handle(&self, _evt: &Event, _n: RepeatCount, _positive: bool, ctx: &EventContext) -> Option<Cmd> {
        if let Ok(mut buffer) = self.buffer.lock() {
            *buffer = ctx.line().to_string();
        }
        Some(Cmd::Interrupt)
    }
}

/// Terminal line reader with persistent history.
pub struct RustylineReader {
    editor: Editor<ConsoleHelper, DefaultHistory>,
    history_file: Option<PathBuf>,
    interrupted: Arc<Mutex<String>>,
}

impl RustylineReader {
    pub fn new(history_file: Option<PathBuf>) -> ConsoleResult<Self> {
        let config = Config::builder().auto_add_history(false).build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(ConsoleHelper::new(history_file.clone())));

        let interrupted = Arc::new(Mutex::new(String::new()));
        editor.bind_sequence(
            KeyEvent::ctrl('C'),
            EventHandler::Conditional(Box::new(InterruptCapture {
                buffer: interrupted.clone(),
            })),
        );

        if let Some(path) = &history_file {
            if let Err(err) = editor.load_history(path) {
                debug!("No history loaded from {}: {}", path.display(), err);
            }
        }

        Ok(Self {
            editor,
            history_file,
            interrupted,
        })
    }

    pub fn save_history(&mut self) {
        if let Some(path) = &self.history_file {
            if let Err(err) = self.editor.save_history(path) {
                warn!("Cannot save history to {}: {}", path.display(), err);
            }
        }
    }
}

impl LineReader for RustylineReader {
    fn read_line(&mut self, prompt: &str, initial: &str) -> ConsoleResult<Signal> {
        if let Ok(mut buffer) = self.interrupted.lock() {
            buffer.clear();
        }
        match self.editor.readline_with_initial(prompt, (initial, "")) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Signal::Line(line))
            }
            Err(ReadlineError::Interrupted) => {
                let text = self
                    .interrupted
                    .lock()
                    .map(|buffer| buffer.clone())
                    .unwrap_or_default();
                Ok(Signal::Interrupted(text))
            }
            Err(ReadlineError::Eof) => Ok(Signal::Eof),
            Err(err) => Err(err.into()),
        }
    }

    fn update_indexes(&mut self, indexes: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.indexes = indexes;
        }
    }
}
