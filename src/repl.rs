use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::command::{help_text, Command, Keyword, ObjectKind, COMMAND_MARKER, EXIT_COMMAND};
use crate::connection::Uri;
use crate::error::{ConsoleError, ConsoleResult};
use crate::executor::{Connector, Executor};
use crate::formatter::{error_text, render_schema, success_text, warning_text, Response, SchemaFilter};
use crate::options::{FrameOptions, IndexOptions, RawOptions};
use crate::reader::{Continuation, LineReader, Signal};
use crate::schema::{validate_frame_name, validate_index_name};
use crate::session::{is_transcript_command, load_session, Transcript};
use crate::state::ConsoleState;

const CONTINUATION_PROMPT: &str = ">>> ";
const COMMENT_MARKER: char = '#';
const COMMENT_STUB: &str = "# ";
const REPLAY_LAST: &str = "_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateMode {
    Create,
    Ensure,
}

/// A complete logical line, classified.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Exit,
    Comment,
    Command(&'a str),
    ReplayLast,
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    if line.is_empty() {
        Input::Empty
    } else if line == EXIT_COMMAND {
        Input::Exit
    } else if line.starts_with(COMMENT_MARKER) {
        Input::Comment
    } else if line.starts_with(COMMAND_MARKER) {
        Input::Command(line)
    } else if line == REPLAY_LAST {
        Input::ReplayLast
    } else {
        Input::Query(line)
    }
}

/// The console: connection state, session transcript and the read-eval loop.
///
/// Everything runs in program order on one task; output goes to `out`.
pub struct Console<K: Connector, W: Write> {
    connector: K,
    client: Option<K::Client>,
    state: ConsoleState,
    transcript: Transcript,
    sessions_dir: Option<PathBuf>,
    continuation: Continuation,
    stub: Option<String>,
    out: W,
}

impl<K: Connector, W: Write> Console<K, W> {
    pub fn new(connector: K, out: W, sessions_dir: Option<PathBuf>) -> Self {
        Self {
            connector,
            client: None,
            state: ConsoleState::default(),
            transcript: Transcript::new(),
            sessions_dir,
            continuation: Continuation::default(),
            stub: None,
            out,
        }
    }

    pub async fn run<R: LineReader>(&mut self, reader: &mut R) -> ConsoleResult<()> {
        loop {
            reader.update_indexes(self.state.index_names());
            let prompt = self.prompt();
            let initial = self.stub.take().unwrap_or_default();

            match reader.read_line(&prompt, &initial)? {
                Signal::Line(line) => {
                    if self.feed(&line).await? == Step::Exit {
                        break;
                    }
                }
                Signal::Interrupted(text) if text.trim().is_empty() && self.continuation.is_empty() => break,
                Signal::Interrupted(_) => {
                    debug!("Discarding edited text and {} continued line(s)", self.continuation.len());
                    self.continuation.clear();
                }
                Signal::Eof => break,
            }
        }
        Ok(())
    }

    pub fn prompt(&self) -> String {
        if self.continuation.is_empty() {
            self.state.prompt().render()
        } else {
            CONTINUATION_PROMPT.to_string()
        }
    }

    /// Feeds one raw input line. Lines ending in `\` are buffered until a
    /// line without one completes the logical line.
    pub async fn feed(&mut self, raw: &str) -> ConsoleResult<Step> {
        match self.continuation.push(raw) {
            Some(logical) => self.process(&logical).await,
            None => Ok(Step::Continue),
        }
    }

    async fn process(&mut self, line: &str) -> ConsoleResult<Step> {
        match classify(line) {
            Input::Empty => {}
            Input::Exit => return Ok(Step::Exit),
            Input::Comment => self.stub = Some(COMMENT_STUB.to_string()),
            Input::ReplayLast => {
                if let Some(response) = &self.state.last_response {
                    match response.render() {
                        Ok(text) => write!(self.out, "{}", text)?,
                        Err(err) => writeln!(self.out, "{}", error_text(err))?,
                    }
                }
            }
            Input::Command(text) => {
                let result = match Command::parse(text) {
                    Ok(command) if command.keyword == Keyword::Load => self.replay_session(&command.args).await,
                    Ok(command) => self.execute_command(command).await,
                    Err(err) => Err(err),
                };
                self.report(line, result)?;
            }
            Input::Query(query) => {
                let result = self.execute_query(query).await;
                self.report(line, result)?;
            }
        }
        Ok(Step::Continue)
    }

    /// Shows a failure, or records a successful line in the transcript.
    fn report(&mut self, line: &str, result: ConsoleResult<()>) -> ConsoleResult<()> {
        match result {
            Ok(()) => {
                if !is_transcript_command(line) {
                    self.transcript.record(line);
                }
            }
            Err(err) => writeln!(self.out, "{}", error_text(err))?,
        }
        Ok(())
    }

    async fn execute_command(&mut self, command: Command) -> ConsoleResult<()> {
        let args = command.args.as_slice();
        match command.keyword {
            Keyword::Connect => self.connect(args).await,
            Keyword::Use => self.use_index(args),
            Keyword::Create => self.create_or_ensure(CreateMode::Create, args).await,
            Keyword::Ensure => self.create_or_ensure(CreateMode::Ensure, args).await,
            Keyword::Delete => self.delete(args).await,
            Keyword::Schema => self.show_schema(args).await,
            Keyword::Save => self.save(args),
            Keyword::Session => self.start_session(args),
            Keyword::Help => {
                write!(self.out, "{}", help_text())?;
                Ok(())
            }
            Keyword::Load => Err(ConsoleError::InvalidArgument(
                "Sessions cannot be loaded while replaying a session".to_string(),
            )),
        }
    }

    async fn connect(&mut self, args: &[String]) -> ConsoleResult<()> {
        let [address] = args else {
            return Err(Keyword::Connect.usage_error());
        };
        let uri = Uri::from_address(address)?;
        if let Some(previous) = self.state.server_address() {
            debug!("Dropping connection to {}", previous);
        }
        let attempt = match self.connector.connect(&uri) {
            Ok(client) => {
                let schema = client.schema().await;
                schema.map(|schema| (client, schema))
            }
            Err(err) => Err(err),
        };
        match attempt {
            Ok((client, schema)) => {
                info!("Connected to {}", uri);
                self.client = Some(client);
                self.state.connected(uri.host_port(), schema);
                Ok(())
            }
            Err(err) => {
                self.client = None;
                self.state.disconnect();
                Err(err)
            }
        }
    }

    fn use_index(&mut self, args: &[String]) -> ConsoleResult<()> {
        let [index] = args else {
            return Err(Keyword::Use.usage_error());
        };
        if self.client.is_none() {
            return Err(ConsoleError::NotConnected);
        }
        validate_index_name(index)?;
        self.state.select_index(index);
        Ok(())
    }

    async fn create_or_ensure(&mut self, mode: CreateMode, args: &[String]) -> ConsoleResult<()> {
        let keyword = match mode {
            CreateMode::Create => Keyword::Create,
            CreateMode::Ensure => Keyword::Ensure,
        };
        let client = self.client.as_ref().ok_or(ConsoleError::NotConnected)?;
        if args.len() < 2 {
            return Err(keyword.usage_error());
        }
        let raw = RawOptions::parse(&args[2..])?;
        let name = args[1].as_str();

        match ObjectKind::parse(&args[0], keyword)? {
            ObjectKind::Index => {
                let options = IndexOptions::from_raw(&raw)?;
                validate_index_name(name)?;
                match mode {
                    CreateMode::Create => client.create_index(name, &options).await?,
                    CreateMode::Ensure => client.ensure_index(name, &options).await?,
                }
                self.state.select_index(name);
            }
            ObjectKind::Frame => {
                let index = self.state.selected_index().ok_or(ConsoleError::NoIndexSelected)?;
                let options = FrameOptions::from_raw(&raw)?;
                validate_frame_name(name)?;
                match mode {
                    CreateMode::Create => client.create_frame(index, name, &options).await?,
                    CreateMode::Ensure => client.ensure_frame(index, name, &options).await?,
                }
            }
        }
        self.refresh_schema().await
    }

    /// Deletes every named object; one failure does not stop the rest.
    async fn delete(&mut self, args: &[String]) -> ConsoleResult<()> {
        let client = self.client.as_ref().ok_or(ConsoleError::NotConnected)?;
        if args.len() < 2 {
            return Err(Keyword::Delete.usage_error());
        }
        let names = &args[1..];

        match ObjectKind::parse(&args[0], Keyword::Delete)? {
            ObjectKind::Index => {
                for name in names {
                    if let Err(err) = validate_index_name(name) {
                        writeln!(self.out, "{}", warning_text(format!("Skipping invalid index `{}`: {}", name, err)))?;
                        continue;
                    }
                    if let Err(err) = client.delete_index(name).await {
                        writeln!(self.out, "{}", error_text(format!("Error deleting index `{}`: {}", name, err)))?;
                        continue;
                    }
                    if self.state.selected_index() == Some(name.as_str()) {
                        self.state.clear_index();
                    }
                }
                self.refresh_schema().await
            }
            ObjectKind::Frame => {
                let index = self.state.selected_index().ok_or(ConsoleError::NoIndexSelected)?;
                for name in names {
                    if let Err(err) = validate_frame_name(name) {
                        writeln!(self.out, "{}", warning_text(format!("Skipping invalid frame `{}`: {}", name, err)))?;
                        continue;
                    }
                    if let Err(err) = client.delete_frame(index, name).await {
                        writeln!(self.out, "{}", error_text(format!("Error deleting frame `{}`: {}", name, err)))?;
                    }
                }
                Ok(())
            }
        }
    }

    async fn show_schema(&mut self, args: &[String]) -> ConsoleResult<()> {
        if args.len() > 1 {
            return Err(Keyword::Schema.usage_error());
        }
        self.refresh_schema().await?;

        let filter = match args.first().map(String::as_str) {
            Some("*") => SchemaFilter::All,
            Some(name) => SchemaFilter::Only(name),
            None => match self.state.selected_index() {
                Some(name) => SchemaFilter::Only(name),
                None => return Ok(()),
            },
        };
        if let Some(schema) = self.state.schema() {
            write!(self.out, "{}", render_schema(schema, filter))?;
        }
        Ok(())
    }

    fn save(&mut self, args: &[String]) -> ConsoleResult<()> {
        if !args.is_empty() {
            return Err(Keyword::Save.usage_error());
        }
        let dir = self.sessions_dir.as_ref().ok_or(ConsoleError::SessionsUnavailable)?;
        let path = self.transcript.save(dir)?;
        writeln!(self.out, "{}", success_text(format!("Saved session to {}", path.display())))?;
        Ok(())
    }

    fn start_session(&mut self, args: &[String]) -> ConsoleResult<()> {
        match args {
            [] => self.transcript.reset(None)?,
            [name] => self.transcript.reset(Some(name.as_str()))?,
            _ => return Err(Keyword::Session.usage_error()),
        }
        writeln!(self.out, "{}", success_text(format!("Started session {}", self.transcript.name())))?;
        Ok(())
    }

    /// Runs each line of a saved session as if it had been typed.
    async fn replay_session(&mut self, args: &[String]) -> ConsoleResult<()> {
        let [name] = args else {
            return Err(Keyword::Load.usage_error());
        };
        let dir = self.sessions_dir.as_ref().ok_or(ConsoleError::SessionsUnavailable)?;
        let lines = load_session(dir, name)?;

        for line in lines {
            writeln!(self.out, "{}", line)?;
            let result = if line.starts_with(COMMAND_MARKER) {
                match Command::parse(&line) {
                    Ok(command) => self.execute_command(command).await,
                    Err(err) => Err(err),
                }
            } else {
                self.execute_query(&line).await
            };
            self.report(&line, result)?;
        }
        Ok(())
    }

    async fn execute_query(&mut self, query: &str) -> ConsoleResult<()> {
        let client = self.client.as_ref().ok_or(ConsoleError::NotConnected)?;
        let index = self.state.selected_index().ok_or(ConsoleError::NoIndexSelected)?;
        let body = client.query(index, query).await?;

        let response = Response::from_body(&body);
        let text = response.render()?;
        write!(self.out, "{}", text)?;
        self.state.last_response = Some(response);
        Ok(())
    }

    async fn refresh_schema(&mut self) -> ConsoleResult<()> {
        let client = self.client.as_ref().ok_or(ConsoleError::NotConnected)?;
        let schema = client.schema().await?;
        self.state.replace_schema(schema);
        Ok(())
    }
}
