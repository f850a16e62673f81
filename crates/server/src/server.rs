// Tool execution engine: registration, admission control, timeouts, streaming

use crate::config::McpServerConfig;
use futures::StreamExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Semaphore;
use toolbus_core::{
    ChunkStream, McpError, ServerInfo, StreamingToolHandler, Tool, ToolHandler, ToolInput,
    ToolRegistration, ToolRegistry, ToolResult, ToolResultChunk,
};
use uuid::Uuid;

/// Tool server: owns the registry, binds handlers to tool names, and
/// enforces admission control and timeouts during execution.
pub struct McpServer {
    config: McpServerConfig,
    registry: RwLock<ToolRegistry>,
    handlers: RwLock<HashMap<String, Arc<dyn ToolHandler>>>,
    streaming_handlers: RwLock<HashMap<String, Arc<dyn StreamingToolHandler>>>,
    permits: Arc<Semaphore>,
}

impl McpServer {
    pub fn new(config: McpServerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            config,
            registry: RwLock::new(ToolRegistry::new()),
            handlers: RwLock::new(HashMap::new()),
            streaming_handlers: RwLock::new(HashMap::new()),
            permits,
        }
    }

    pub fn config(&self) -> &McpServerConfig {
        &self.config
    }

    /// Register a tool definition together with its handlers.
    pub fn register_tool(&self, registration: ToolRegistration) -> Result<(), McpError> {
        let ToolRegistration {
            tool,
            handler,
            streaming_handler,
        } = registration;
        let name = tool.name.clone();

        self.registry.write().unwrap().register(tool)?;
        self.handlers.write().unwrap().insert(name.clone(), handler);
        if let Some(streaming) = streaming_handler {
            self.streaming_handlers
                .write()
                .unwrap()
                .insert(name.clone(), streaming);
        }

        tracing::debug!(tool = %name, "registered tool");
        Ok(())
    }

    /// Register a batch of tools sequentially.
    ///
    /// A failure partway through leaves earlier registrations in place.
    pub fn register_tools(
        &self,
        registrations: Vec<ToolRegistration>,
    ) -> Result<(), McpError> {
        for registration in registrations {
            self.register_tool(registration)?;
        }
        Ok(())
    }

    /// Remove a tool and its handlers. Returns whether anything was removed.
    pub fn unregister_tool(&self, name: &str) -> bool {
        let removed = self.registry.write().unwrap().unregister(name);
        if removed {
            self.handlers.write().unwrap().remove(name);
            self.streaming_handlers.write().unwrap().remove(name);
        }
        removed
    }

    /// Execute a tool to completion.
    ///
    /// Every failure mode is encoded in the returned [`ToolResult`]; the
    /// signature is infallible so one bad call can never poison the server.
    pub async fn execute_tool(&self, input: ToolInput) -> ToolResult {
        if input.name.is_empty() {
            return ToolResult::error(McpError::invalid_params(
                "Invalid tool input: name must not be empty",
            ));
        }

        // Admission control: hard backpressure, no queueing. The permit is
        // held for the whole execution and released on every exit path.
        let _permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(tool = %input.name, "rejecting execution at concurrency limit");
                return ToolResult::error(McpError::rate_limited(
                    "Maximum concurrent executions reached",
                ));
            }
        };

        let handler = {
            let registry = self.registry.read().unwrap();
            if !registry.has(&input.name) {
                return ToolResult::error(McpError::tool_not_found(&input.name));
            }
            match self.handlers.read().unwrap().get(&input.name) {
                Some(handler) => handler.clone(),
                // Registry and handler map are updated together; a definition
                // without a handler means that invariant broke.
                None => {
                    return ToolResult::error(McpError::internal(format!(
                        "Handler not found for tool: {}",
                        input.name
                    )))
                }
            }
        };

        let execution_id = Uuid::new_v4();
        tracing::debug!(tool = %input.name, %execution_id, "executing tool");

        // Losing the race drops the handler future, cancelling it outright.
        match tokio::time::timeout(self.config.default_timeout(), handler.call(input.arguments))
            .await
        {
            Ok(Ok(content)) => ToolResult::ok(content),
            Ok(Err(err)) => {
                let err = match err.downcast::<McpError>() {
                    Ok(mcp) => mcp,
                    Err(other) => McpError::execution(other.to_string()),
                };
                tracing::debug!(
                    tool = %input.name,
                    %execution_id,
                    code = %err.code,
                    "tool execution failed: {}",
                    err.message
                );
                ToolResult::error(err)
            }
            Err(_) => {
                tracing::warn!(tool = %input.name, %execution_id, "tool execution timed out");
                ToolResult::error(McpError::execution(format!(
                    "Tool execution timed out: {}",
                    input.name
                )))
            }
        }
    }

    /// Execute a tool as a lazy chunk sequence terminated by `done == true`.
    ///
    /// Errors raised before the first chunk come back as `Err`. Chunk indices
    /// are assigned here in emission order regardless of what the handler
    /// set. Tools without a streaming handler fall back to [`execute_tool`]
    /// and yield the result as a single terminal chunk. Not restartable.
    pub async fn execute_tool_streaming(
        &self,
        input: ToolInput,
    ) -> Result<ChunkStream, McpError> {
        if input.name.is_empty() {
            return Err(McpError::invalid_params(
                "Invalid tool input: name must not be empty",
            ));
        }

        let tool = {
            let registry = self.registry.read().unwrap();
            match registry.get(&input.name) {
                Some(tool) => tool.clone(),
                None => return Err(McpError::tool_not_found(&input.name)),
            }
        };

        let streaming = self
            .streaming_handlers
            .read()
            .unwrap()
            .get(&input.name)
            .cloned();

        match streaming {
            Some(handler) => {
                tracing::debug!(tool = %input.name, "streaming tool execution");
                let chunks = handler
                    .stream(input.arguments)
                    .enumerate()
                    .map(|(index, chunk)| chunk.with_index(index as u64))
                    .boxed();
                Ok(chunks)
            }
            None => {
                if tool.streams() {
                    tracing::warn!(
                        tool = %input.name,
                        "tool advertises streaming but has no streaming handler; falling back to unary execution"
                    );
                }
                let result = self.execute_tool(input).await;
                let content = serde_json::to_string(&result.content.unwrap_or(Value::Null))
                    .unwrap_or_else(|_| "null".to_string());
                Ok(futures::stream::once(async move {
                    ToolResultChunk::new(content, true)
                })
                .boxed())
            }
        }
    }

    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.read().unwrap().list()
    }

    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.config.name.clone(),
            version: self.config.version.clone(),
            tool_count: self.registry.read().unwrap().len(),
        }
    }
}
