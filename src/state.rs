use colored::*;

use crate::formatter::Response;
use crate::schema::Schema;

pub const NOT_CONNECTED_LABEL: &str = "(not connected)";
pub const NO_INDEX_LABEL: &str = "(no index)";

/// What the prompt shows. Recomputed on every change to address or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInfo {
    pub address: String,
    pub index_label: String,
}

impl Default for PromptInfo {
    fn default() -> Self {
        Self {
            address: NOT_CONNECTED_LABEL.to_string(),
            index_label: NO_INDEX_LABEL.to_string(),
        }
    }
}

impl PromptInfo {
    pub fn render(&self) -> String {
        format!("{}/{}> ", self.address.cyan(), self.index_label.green().bold())
    }
}

/// Connection and selection state of a console.
///
/// Only mutated after a command succeeded. The schema is a cache: it is as
/// fresh as the last successful refresh and is never updated behind the
/// operator's back.
#[derive(Debug, Default)]
pub struct ConsoleState {
    server_address: Option<String>,
    selected_index: Option<String>,
    schema: Option<Schema>,
    pub last_response: Option<Response>,
    prompt: PromptInfo,
}

impl ConsoleState {
    pub fn server_address(&self) -> Option<&str> {
        self.server_address.as_deref()
    }

    pub fn selected_index(&self) -> Option<&str> {
        self.selected_index.as_deref()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn prompt(&self) -> &PromptInfo {
        &self.prompt
    }

    pub fn connected(&mut self, address: String, schema: Schema) {
        self.prompt.address = address.clone();
        self.server_address = Some(address);
        self.schema = Some(schema);
    }

    pub fn disconnect(&mut self) {
        self.server_address = None;
        self.prompt.address = NOT_CONNECTED_LABEL.to_string();
    }

    pub fn select_index(&mut self, name: &str) {
        self.selected_index = Some(name.to_string());
        self.prompt.index_label = name.to_string();
    }

    pub fn clear_index(&mut self) {
        self.selected_index = None;
        self.prompt.index_label = NO_INDEX_LABEL.to_string();
    }

    pub fn replace_schema(&mut self, schema: Schema) {
        self.schema = Some(schema);
    }

    /// Index names from the cached schema, for completion.
    pub fn index_names(&self) -> Vec<String> {
        self.schema.as_ref().map(Schema::index_names).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IndexInfo;

    #[test]
    fn initial_prompt_labels() {
        let state = ConsoleState::default();
        assert_eq!(state.prompt().address, "(not connected)");
        assert_eq!(state.prompt().index_label, "(no index)");
        assert!(state.server_address().is_none());
        assert!(state.index_names().is_empty());
    }

    #[test]
    fn prompt_follows_connection_and_selection() {
        let mut state = ConsoleState::default();
        let schema = Schema {
            indexes: vec![IndexInfo { name: "docs".to_string(), frames: vec![] }],
        };
        state.connected("127.0.0.1:10101".to_string(), schema);
        state.select_index("docs");
        assert_eq!(state.prompt().address, "127.0.0.1:10101");
        assert_eq!(state.prompt().index_label, "docs");
        assert_eq!(state.index_names(), vec!["docs"]);

        state.clear_index();
        state.disconnect();
        assert_eq!(state.prompt(), &PromptInfo::default());
        assert!(state.selected_index().is_none());
    }
}
