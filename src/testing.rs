//! In-memory stand-ins for the index server and the terminal.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::connection::Uri;
use crate::error::{ConsoleError, ConsoleResult};
use crate::executor::{Connector, Executor};
use crate::options::{FrameOptions, IndexOptions};
use crate::reader::{LineReader, Signal};
use crate::schema::{FrameInfo, IndexInfo, Schema};

#[derive(Default)]
struct Service {
    indexes: BTreeMap<String, (IndexOptions, BTreeMap<String, FrameOptions>)>,
    queries: Vec<(String, String)>,
    query_body: Option<String>,
    unreachable: bool,
}

fn conflict(what: &str) -> ConsoleError {
    ConsoleError::Transport(format!("409 Conflict: {} already exists", what))
}

fn not_found(what: &str) -> ConsoleError {
    ConsoleError::Transport(format!("404 Not Found: {} not found", what))
}

#[derive(Clone, Default)]
pub struct MockConnector {
    service: Arc<Mutex<Service>>,
}

impl MockConnector {
    fn service(&self) -> MutexGuard<'_, Service> {
        self.service.lock().unwrap()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.service().unreachable = unreachable;
    }

    pub fn set_query_body(&self, body: &str) {
        self.service().query_body = Some(body.to_string());
    }

    pub fn add_index(&self, name: &str) {
        self.service()
            .indexes
            .insert(name.to_string(), (IndexOptions::default(), BTreeMap::new()));
    }

    pub fn index_names(&self) -> Vec<String> {
        self.service().indexes.keys().cloned().collect()
    }

    pub fn frame_names(&self, index: &str) -> Vec<String> {
        self.service()
            .indexes
            .get(index)
            .map(|(_, frames)| frames.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn index_options(&self, index: &str) -> Option<IndexOptions> {
        self.service().indexes.get(index).map(|(options, _)| options.clone())
    }

    pub fn frame_options(&self, index: &str, frame: &str) -> Option<FrameOptions> {
        self.service()
            .indexes
            .get(index)
            .and_then(|(_, frames)| frames.get(frame).cloned())
    }

    pub fn queries(&self) -> Vec<(String, String)> {
        self.service().queries.clone()
    }
}

impl Connector for MockConnector {
    type Client = MockClient;

    fn connect(&self, _uri: &Uri) -> ConsoleResult<MockClient> {
        Ok(MockClient {
            service: self.service.clone(),
        })
    }
}

pub struct MockClient {
    service: Arc<Mutex<Service>>,
}

impl MockClient {
    fn service(&self) -> ConsoleResult<MutexGuard<'_, Service>> {
        let service = self.service.lock().unwrap();
        if service.unreachable {
            return Err(ConsoleError::Transport("connection refused".to_string()));
        }
        Ok(service)
    }

    fn add_index(&self, index: &str, options: &IndexOptions, idempotent: bool) -> ConsoleResult<()> {
        let mut service = self.service()?;
        if service.indexes.contains_key(index) {
            return if idempotent { Ok(()) } else { Err(conflict("index")) };
        }
        service
            .indexes
            .insert(index.to_string(), (options.clone(), BTreeMap::new()));
        Ok(())
    }

    fn add_frame(&self, index: &str, frame: &str, options: &FrameOptions, idempotent: bool) -> ConsoleResult<()> {
        let mut service = self.service()?;
        let (_, frames) = service.indexes.get_mut(index).ok_or_else(|| not_found("index"))?;
        if frames.contains_key(frame) {
            return if idempotent { Ok(()) } else { Err(conflict("frame")) };
        }
        frames.insert(frame.to_string(), options.clone());
        Ok(())
    }
}

impl Executor for MockClient {
    async fn schema(&self) -> ConsoleResult<Schema> {
        let service = self.service()?;
        let indexes = service
            .indexes
            .iter()
            .map(|(name, (_, frames))| IndexInfo {
                name: name.clone(),
                frames: frames.keys().map(|name| FrameInfo { name: name.clone() }).collect(),
            })
            .collect();
        Ok(Schema { indexes })
    }

    async fn create_index(&self, index: &str, options: &IndexOptions) -> ConsoleResult<()> {
        self.add_index(index, options, false)
    }

    async fn ensure_index(&self, index: &str, options: &IndexOptions) -> ConsoleResult<()> {
        self.add_index(index, options, true)
    }

    async fn delete_index(&self, index: &str) -> ConsoleResult<()> {
        let mut service = self.service()?;
        service.indexes.remove(index).map(|_| ()).ok_or_else(|| not_found("index"))
    }

    async fn create_frame(&self, index: &str, frame: &str, options: &FrameOptions) -> ConsoleResult<()> {
        self.add_frame(index, frame, options, false)
    }

    async fn ensure_frame(&self, index: &str, frame: &str, options: &FrameOptions) -> ConsoleResult<()> {
        self.add_frame(index, frame, options, true)
    }

    async fn delete_frame(&self, index: &str, frame: &str) -> ConsoleResult<()> {
        let mut service = self.service()?;
        let (_, frames) = service.indexes.get_mut(index).ok_or_else(|| not_found("index"))?;
        frames.remove(frame).map(|_| ()).ok_or_else(|| not_found("frame"))
    }

    async fn query(&self, index: &str, query: &str) -> ConsoleResult<String> {
        let mut service = self.service()?;
        service.queries.push((index.to_string(), query.to_string()));
        Ok(service
            .query_body
            .clone()
            .unwrap_or_else(|| r#"{"results":[]}"#.to_string()))
    }
}

/// Replays a fixed list of terminal signals, then reports end of input.
pub struct ScriptedReader {
    signals: VecDeque<Signal>,
    pub prompts: Vec<String>,
    pub initials: Vec<String>,
}

impl ScriptedReader {
    pub fn new(lines: &[&str]) -> Self {
        Self::from_signals(lines.iter().map(|line| Signal::Line(line.to_string())).collect())
    }

    pub fn from_signals(signals: Vec<Signal>) -> Self {
        Self {
            signals: signals.into(),
            prompts: Vec::new(),
            initials: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.signals.len()
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, prompt: &str, initial: &str) -> ConsoleResult<Signal> {
        self.prompts.push(prompt.to_string());
        self.initials.push(initial.to_string());
        Ok(self.signals.pop_front().unwrap_or(Signal::Eof))
    }
}
