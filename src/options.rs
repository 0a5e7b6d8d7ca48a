//! Creation options for indexes and frames.
//!
//! Options arrive as `key=value` tokens after the object name, e.g.
//! `:ensure frame tags row=id inverse=t`. Every logical option has several
//! spellings; they are resolved through [`ALIASES`] before validation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKey {
    ColumnLabel,
    RowLabel,
    TimeQuantum,
    InverseEnabled,
}

const ALIASES: &[(&str, OptionKey)] = &[
    ("column_label", OptionKey::ColumnLabel),
    ("columnLabel", OptionKey::ColumnLabel),
    ("col", OptionKey::ColumnLabel),
    ("c", OptionKey::ColumnLabel),
    ("row_label", OptionKey::RowLabel),
    ("rowLabel", OptionKey::RowLabel),
    ("row", OptionKey::RowLabel),
    ("r", OptionKey::RowLabel),
    ("time_quantum", OptionKey::TimeQuantum),
    ("timeQuantum", OptionKey::TimeQuantum),
    ("time", OptionKey::TimeQuantum),
    ("t", OptionKey::TimeQuantum),
    ("inverse_enabled", OptionKey::InverseEnabled),
    ("inverseEnabled", OptionKey::InverseEnabled),
    ("inverse", OptionKey::InverseEnabled),
    ("i", OptionKey::InverseEnabled),
];

const TIME_QUANTUMS: &[&str] = &["", "Y", "YM", "YMD", "YMDH", "M", "MD", "MDH", "D", "DH", "H"];

fn resolve(key: &str) -> Option<OptionKey> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}

/// Unvalidated `key=value` pairs, split on the first `=`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawOptions(BTreeMap<String, String>);

impl RawOptions {
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> ConsoleResult<Self> {
        let mut options = BTreeMap::new();
        for token in tokens {
            let token = token.as_ref();
            let (key, value) = token.split_once('=').ok_or_else(|| {
                ConsoleError::InvalidOption(format!("Expected key=value, got: {}", token))
            })?;
            options.insert(key.to_string(), value.to_string());
        }
        Ok(Self(options))
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimeQuantum(String);

impl TimeQuantum {
    pub fn parse(value: &str) -> ConsoleResult<Self> {
        if TIME_QUANTUMS.contains(&value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ConsoleError::InvalidOption(format!(
                "Invalid time quantum: {}. Try one of {}",
                value,
                TIME_QUANTUMS[1..].join("/")
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_quantum: Option<TimeQuantum>,
}

impl IndexOptions {
    pub fn from_raw(raw: &RawOptions) -> ConsoleResult<Self> {
        let mut options = Self::default();
        for (key, value) in raw.iter() {
            match resolve(key) {
                Some(OptionKey::ColumnLabel) => options.column_label = Some(value.to_string()),
                Some(OptionKey::TimeQuantum) => options.time_quantum = Some(TimeQuantum::parse(value)?),
                _ => {
                    return Err(ConsoleError::InvalidOption(format!("Invalid index option: {}", key)))
                }
            }
        }
        Ok(options)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_quantum: Option<TimeQuantum>,
    pub inverse_enabled: bool,
}

impl FrameOptions {
    pub fn from_raw(raw: &RawOptions) -> ConsoleResult<Self> {
        let mut options = Self::default();
        for (key, value) in raw.iter() {
            match resolve(key) {
                Some(OptionKey::RowLabel) => options.row_label = Some(value.to_string()),
                Some(OptionKey::TimeQuantum) => options.time_quantum = Some(TimeQuantum::parse(value)?),
                Some(OptionKey::InverseEnabled) => options.inverse_enabled = parse_bool(value)?,
                _ => {
                    return Err(ConsoleError::InvalidOption(format!("Invalid frame option: {}", key)))
                }
            }
        }
        Ok(options)
    }
}

pub fn parse_bool(value: &str) -> ConsoleResult<bool> {
    match value {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(ConsoleError::InvalidOption(format!(
            "Invalid boolean value: {}. Try one of true/t/1 or false/f/0",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(tokens: &[&str]) -> RawOptions {
        RawOptions::parse(tokens).unwrap()
    }

    #[test]
    fn splits_on_first_equals() {
        let options = raw(&["row=a=b"]);
        let frame = FrameOptions::from_raw(&options).unwrap();
        assert_eq!(frame.row_label.as_deref(), Some("a=b"));
    }

    #[test]
    fn token_without_equals_is_rejected() {
        let tokens: &[&str] = &["row"];
        let err = RawOptions::parse(tokens).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidOption(msg) if msg.contains("row")));
    }

    #[test]
    fn row_label_aliases_resolve_to_the_same_option() {
        for key in ["row_label", "rowLabel", "row", "r"] {
            let token = format!("{}=id", key);
            let frame = FrameOptions::from_raw(&raw(&[token.as_str()])).unwrap();
            assert_eq!(frame.row_label.as_deref(), Some("id"), "alias {}", key);
        }
    }

    #[test]
    fn index_options_accept_column_label_and_time_quantum() {
        let index = IndexOptions::from_raw(&raw(&["col=user", "time=YMD"])).unwrap();
        assert_eq!(index.column_label.as_deref(), Some("user"));
        assert_eq!(index.time_quantum.unwrap().as_str(), "YMD");
    }

    #[test]
    fn frame_key_is_not_an_index_option() {
        let err = IndexOptions::from_raw(&raw(&["row=id"])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid index option: row");
    }

    #[test]
    fn unknown_frame_key_names_the_key() {
        let err = FrameOptions::from_raw(&raw(&["colour=blue"])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid frame option: colour");
    }

    #[test]
    fn booleans_accept_listed_literals_only() {
        for value in ["true", "t", "1"] {
            assert!(parse_bool(value).unwrap());
        }
        for value in ["false", "f", "0"] {
            assert!(!parse_bool(value).unwrap());
        }
        let err = parse_bool("TRUE").unwrap_err();
        assert!(err.to_string().contains("TRUE"));
    }

    #[test]
    fn inverse_option_rejects_malformed_boolean() {
        let err = FrameOptions::from_raw(&raw(&["inverse=yes"])).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidOption(_)));
    }

    #[test]
    fn invalid_time_quantum_is_rejected() {
        assert!(TimeQuantum::parse("YMDHS").is_err());
        assert!(TimeQuantum::parse("").is_ok());
    }

    #[test]
    fn frame_options_serialize_with_server_field_names() {
        let frame = FrameOptions::from_raw(&raw(&["r=id", "i=1"])).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json, serde_json::json!({"rowLabel": "id", "inverseEnabled": true}));
    }
}
