use colored::*;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{ConsoleError, ConsoleResult};
use crate::schema::Schema;

/// A single query result. Variants are checked in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Bitmap {
        attrs: Vec<(String, JsonValue)>,
        bits: Vec<u64>,
    },
    CountItems(Vec<CountItem>),
    Count(u64),
    /// Anything else the server returns, e.g. the boolean of `SetBit`.
    Other(JsonValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountItem {
    pub id: u64,
    pub count: u64,
}

impl CountItem {
    fn from_value(value: &JsonValue) -> Option<Self> {
        Some(Self {
            id: value.get("id")?.as_u64()?,
            count: value.get("count")?.as_u64()?,
        })
    }
}

impl QueryResult {
    pub fn from_value(value: JsonValue) -> Self {
        if let Some(bitmap) = Self::bitmap(&value) {
            return bitmap;
        }
        let items = value
            .as_array()
            .and_then(|items| items.iter().map(CountItem::from_value).collect::<Option<Vec<_>>>());
        if let Some(items) = items {
            return QueryResult::CountItems(items);
        }
        if let Some(count) = value.as_u64() {
            return QueryResult::Count(count);
        }
        QueryResult::Other(value)
    }

    fn bitmap(value: &JsonValue) -> Option<Self> {
        let map = value.as_object()?;
        if !(map.contains_key("attrs") || map.contains_key("bits") || map.contains_key("columns")) {
            return None;
        }
        let attrs = map
            .get("attrs")
            .and_then(JsonValue::as_object)
            .map(|attrs| attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        let bits = map
            .get("bits")
            .or_else(|| map.get("columns"))
            .and_then(JsonValue::as_array)
            .map(|bits| bits.iter().filter_map(JsonValue::as_u64).collect())
            .unwrap_or_default();
        Some(QueryResult::Bitmap { attrs, bits })
    }

    /// Body lines for this result; empty when there is nothing worth showing.
    fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self {
            QueryResult::Bitmap { attrs, bits } => {
                if !attrs.is_empty() {
                    let pairs: Vec<String> = attrs
                        .iter()
                        .map(|(key, value)| format!("{}={}", key, attr_value(value)))
                        .collect();
                    lines.push(pairs.join(", "));
                }
                if !bits.is_empty() {
                    let bits: Vec<String> = bits.iter().map(u64::to_string).collect();
                    lines.push(bits.join(", "));
                }
            }
            QueryResult::CountItems(items) => {
                for item in items {
                    lines.push(format!("Count({}) = {}", item.id, item.count));
                }
            }
            QueryResult::Count(count) => {
                if *count > 0 {
                    lines.push(count.to_string());
                }
            }
            QueryResult::Other(_) => {}
        }
        lines
    }
}

fn attr_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Deserialize)]
struct WireResponse {
    results: Option<Vec<JsonValue>>,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub results: Vec<QueryResult>,
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn render(&self) -> ConsoleResult<String> {
        if let Some(error) = &self.error {
            return Err(ConsoleError::Transport(error.clone()));
        }
        let bodies: Vec<Vec<String>> = self.results.iter().map(QueryResult::render_lines).collect();
        if bodies.iter().all(Vec::is_empty) {
            return Ok(String::new());
        }
        let width = header_width(bodies.len());
        let mut output = String::new();
        for (i, lines) in bodies.into_iter().enumerate() {
            output.push_str(&format!("{}\n", format!("[{:>width$}]", i, width = width).bold()));
            for line in lines {
                output.push_str(&line);
                output.push('\n');
            }
        }
        Ok(output)
    }
}

fn header_width(count: usize) -> usize {
    if count <= 1 {
        1
    } else {
        ((count as f64).log10().ceil() as usize).max(1)
    }
}

/// Body of a query call, either understood as results or kept as text.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Results(QueryResponse),
    Text(String),
}

impl Response {
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<WireResponse>(body) {
            Ok(WireResponse { results, error }) if results.is_some() || error.is_some() => {
                Response::Results(QueryResponse {
                    results: results
                        .unwrap_or_default()
                        .into_iter()
                        .map(QueryResult::from_value)
                        .collect(),
                    error,
                })
            }
            _ => Response::Text(body.to_string()),
        }
    }

    pub fn render(&self) -> ConsoleResult<String> {
        match self {
            Response::Results(response) => response.render(),
            Response::Text(text) => {
                let mut text = prettify_json(text);
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                Ok(text)
            }
        }
    }
}

/// Pretty-prints `text` if it is JSON, otherwise returns it unchanged.
pub fn prettify_json(text: &str) -> String {
    serde_json::from_str::<JsonValue>(text)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| text.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFilter<'a> {
    All,
    Only(&'a str),
}

pub fn render_schema(schema: &Schema, filter: SchemaFilter<'_>) -> String {
    let mut output = String::new();
    for index in &schema.indexes {
        let frames = index.frame_names().join(", ");
        match filter {
            SchemaFilter::All => {
                output.push_str(&format!("{} [{}]\n", index.name.cyan(), frames));
            }
            SchemaFilter::Only(name) if name == index.name => {
                output.push_str(&format!("[{}]\n", frames));
            }
            SchemaFilter::Only(_) => {}
        }
    }
    output
}

pub fn error_text(message: impl std::fmt::Display) -> String {
    format!("{}", message.to_string().red())
}

pub fn warning_text(message: impl std::fmt::Display) -> String {
    format!("{}", message.to_string().yellow())
}

pub fn success_text(message: impl std::fmt::Display) -> String {
    format!("{}", message.to_string().green())
}
