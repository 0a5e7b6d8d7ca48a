use serde::{Deserialize, Deserializer};

use crate::error::{ConsoleError, ConsoleResult};

const MAX_NAME_LENGTH: usize = 64;

/// Server schema as returned by `GET /schema`. Replaced wholesale on refresh.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Schema {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub indexes: Vec<IndexInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub frames: Vec<FrameInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FrameInfo {
    pub name: String,
}

impl Schema {
    pub fn index(&self, name: &str) -> Option<&IndexInfo> {
        self.indexes.iter().find(|index| index.name == name)
    }

    pub fn index_names(&self) -> Vec<String> {
        self.indexes.iter().map(|index| index.name.clone()).collect()
    }
}

impl IndexInfo {
    pub fn frame_names(&self) -> Vec<&str> {
        self.frames.iter().map(|frame| frame.name.as_str()).collect()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    name.len() <= MAX_NAME_LENGTH
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

pub fn validate_index_name(name: &str) -> ConsoleResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ConsoleError::InvalidArgument(format!("Invalid index name: {}", name)))
    }
}

pub fn validate_frame_name(name: &str) -> ConsoleResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ConsoleError::InvalidArgument(format!("Invalid frame name: {}", name)))
    }
}
