// Wire types for the tool protocol

use crate::error::{ErrorCode, McpError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category assigned to tools registered without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Open string-keyed argument map passed to a handler, one per call.
pub type Arguments = Map<String, Value>;

/// A named, schema-described unit of capability exposed by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "supportsStreaming", skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            category: None,
            supports_streaming: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_streaming(mut self, supports_streaming: bool) -> Self {
        self.supports_streaming = Some(supports_streaming);
        self
    }

    /// The category bucket this tool belongs to.
    pub fn effective_category(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }

    pub fn streams(&self) -> bool {
        self.supports_streaming.unwrap_or(false)
    }
}

/// Restricted JSON-Schema-like shape for tool parameters.
///
/// `type` must be `"object"`; the registry rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl InputSchema {
    /// An empty `type: "object"` schema.
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Map::new(),
            required: None,
        }
    }

    pub fn property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn require(mut self, names: &[&str]) -> Self {
        self.required = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }
}

// Helper functions for building property schemas

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_object(description: &str) -> Value {
    serde_json::json!({
        "type": "object",
        "description": description
    })
}

pub fn json_schema_array(items: Value, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

/// Tool execution input: name plus arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl ToolInput {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of a tool execution.
///
/// Success carries an opaque `content` payload; failure carries a message and
/// a code from the closed taxonomy. `is_error == true` implies `content` is
/// absent, which the constructors enforce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(rename = "errorCode", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl ToolResult {
    pub fn ok(content: Value) -> Self {
        Self {
            content: Some(content),
            is_error: false,
            error_message: None,
            error_code: None,
        }
    }

    pub fn error(err: McpError) -> Self {
        Self {
            content: None,
            is_error: true,
            error_message: Some(err.message),
            error_code: Some(err.code),
        }
    }
}

/// Incremental fragment of a streaming tool's output.
///
/// `index` is assigned by the receiving side in strict arrival order; a
/// sender-supplied value is discarded on re-emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultChunk {
    pub content: String,
    pub done: bool,
    #[serde(default)]
    pub index: u64,
}

impl ToolResultChunk {
    pub fn new(content: impl Into<String>, done: bool) -> Self {
        Self {
            content: content.into(),
            done,
            index: 0,
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }
}

/// Response of the tool discovery endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<Tool>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Read-only server introspection payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    #[serde(rename = "toolCount")]
    pub tool_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_serializes_with_wire_field_names() {
        let tool = Tool::new(
            "http_request",
            "Make HTTP requests",
            InputSchema::object()
                .property("url", json_schema_string("The URL to fetch"))
                .require(&["url"]),
        )
        .with_category("network")
        .with_streaming(false);

        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["inputSchema"]["type"], "object");
        assert_eq!(json["inputSchema"]["required"][0], "url");
        assert_eq!(json["supportsStreaming"], false);
        assert_eq!(json["category"], "network");
    }

    #[test]
    fn optional_tool_fields_are_omitted() {
        let tool = Tool::new("t", "d", InputSchema::object());
        let json = serde_json::to_value(&tool).unwrap();
        assert!(json.get("category").is_none());
        assert!(json.get("supportsStreaming").is_none());
        assert_eq!(tool.effective_category(), UNCATEGORIZED);
        assert!(!tool.streams());
    }

    #[test]
    fn error_result_has_no_content() {
        let result = ToolResult::error(McpError::tool_not_found("x"));
        assert!(result.is_error);
        assert!(result.content.is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["errorCode"], -32000);
        assert!(json.get("content").is_none());
    }

    #[test]
    fn ok_result_round_trips() {
        let result = ToolResult::ok(serde_json::json!({"rows": []}));
        let json = serde_json::to_string(&result).unwrap();
        let back: ToolResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(!back.is_error);
    }

    #[test]
    fn chunk_parses_without_index() {
        let chunk: ToolResultChunk =
            serde_json::from_str(r#"{"content":"a","done":false}"#).unwrap();
        assert_eq!(chunk.content, "a");
        assert!(!chunk.done);
        assert_eq!(chunk.index, 0);
    }

    #[test]
    fn tool_input_defaults_arguments() {
        let input: ToolInput = serde_json::from_str(r#"{"name":"t"}"#).unwrap();
        assert!(input.arguments.is_empty());
    }
}
