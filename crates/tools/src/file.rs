// Sandboxed file operation tool

use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use toolbus_core::{
    json_schema_enum, json_schema_string, Arguments, InputSchema, McpError, Tool, ToolHandler,
    ToolRegistration,
};

/// Tool definition for `file_operation`.
pub fn file_operation_tool() -> Tool {
    Tool::new(
        "file_operation",
        "Perform sandboxed file operations including read, write, list, and stat. All operations are restricted to allowed directories.",
        InputSchema::object()
            .property(
                "operation",
                json_schema_enum(
                    &["read", "write", "list", "exists", "stat"],
                    "File operation to perform",
                ),
            )
            .property(
                "path",
                json_schema_string("File or directory path (must be within a sandbox root)"),
            )
            .property(
                "content",
                json_schema_string("Content to write (for write operation)"),
            )
            .property(
                "encoding",
                json_schema_enum(&["utf-8", "base64"], "File encoding"),
            )
            .require(&["operation", "path"]),
    )
    .with_category("filesystem")
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FileOperation {
    Read,
    Write,
    List,
    Exists,
    Stat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
enum FileEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

#[derive(Debug, Deserialize)]
struct FileOperationArgs {
    operation: FileOperation,
    path: String,
    content: Option<String>,
    #[serde(default)]
    encoding: FileEncoding,
}

/// Handler for `file_operation`, confined to the configured sandbox roots.
pub struct FileOperationHandler {
    sandbox_roots: Vec<PathBuf>,
}

impl FileOperationHandler {
    pub fn new(sandbox_roots: Vec<PathBuf>) -> Self {
        Self { sandbox_roots }
    }

    /// Paths must be absolute, free of traversal sequences, and under one of
    /// the sandbox roots.
    fn is_path_sandboxed(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");

        if normalized.contains("..") {
            return false;
        }

        self.sandbox_roots.iter().any(|root| {
            let root = root.to_string_lossy().replace('\\', "/");
            normalized.starts_with(&root)
        })
    }

    fn sandbox_error(&self) -> McpError {
        let roots: Vec<String> = self
            .sandbox_roots
            .iter()
            .map(|r| r.display().to_string())
            .collect();
        McpError::permission_denied(format!(
            "Access denied: Path must be within sandbox directories: {}",
            roots.join(", ")
        ))
    }
}

#[async_trait::async_trait]
impl ToolHandler for FileOperationHandler {
    async fn call(&self, arguments: Arguments) -> Result<Value> {
        let args: FileOperationArgs = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| {
                McpError::invalid_params(format!("Invalid arguments for file_operation: {}", e))
            })?;

        if !self.is_path_sandboxed(&args.path) {
            return Err(self.sandbox_error().into());
        }

        let path = PathBuf::from(&args.path);
        match args.operation {
            FileOperation::Read => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let data = match args.encoding {
                    FileEncoding::Utf8 => Value::String(
                        String::from_utf8(bytes).context("File is not valid UTF-8")?,
                    ),
                    FileEncoding::Base64 => Value::String(
                        base64::engine::general_purpose::STANDARD.encode(bytes),
                    ),
                };
                Ok(json!({"success": true, "data": data}))
            }
            FileOperation::Write => {
                let content = args.content.ok_or_else(|| {
                    McpError::invalid_params("content is required for the write operation")
                })?;
                let bytes = match args.encoding {
                    FileEncoding::Utf8 => content.into_bytes(),
                    FileEncoding::Base64 => base64::engine::general_purpose::STANDARD
                        .decode(content)
                        .map_err(|e| {
                            McpError::invalid_params(format!("Invalid base64 content: {}", e))
                        })?,
                };
                let written = bytes.len();
                tokio::fs::write(&path, bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(json!({"success": true, "data": {"bytesWritten": written}}))
            }
            FileOperation::List => {
                let mut entries = tokio::fs::read_dir(&path)
                    .await
                    .with_context(|| format!("Failed to list {}", path.display()))?;
                let mut names = Vec::new();
                while let Some(entry) = entries.next_entry().await? {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
                names.sort();
                Ok(json!({"success": true, "data": names}))
            }
            FileOperation::Exists => {
                let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
                Ok(json!({"success": true, "data": exists}))
            }
            FileOperation::Stat => {
                let metadata = tokio::fs::metadata(&path)
                    .await
                    .with_context(|| format!("Failed to stat {}", path.display()))?;
                let modified = metadata
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
                let created = metadata
                    .created()
                    .ok()
                    .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
                Ok(json!({
                    "success": true,
                    "data": {
                        "size": metadata.len(),
                        "isFile": metadata.is_file(),
                        "isDirectory": metadata.is_dir(),
                        "created": created,
                        "modified": modified,
                    }
                }))
            }
        }
    }
}

/// Registration for the built-in file operation tool.
pub fn file_operation_registration(sandbox_roots: Vec<PathBuf>) -> ToolRegistration {
    ToolRegistration::new(
        file_operation_tool(),
        Arc::new(FileOperationHandler::new(sandbox_roots)),
    )
}
