// Handler contract binding tool definitions to executable behavior

use crate::types::{Arguments, Tool, ToolResultChunk};
use anyhow::Result;
use futures::stream::BoxStream;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Executable implementation bound to a tool name on the server.
///
/// An error that downcasts to [`McpError`](crate::McpError) keeps its code on
/// the wire; any other error is reported as `ToolExecutionError` with its
/// stringified message.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Arguments) -> Result<Value>;
}

/// Finite sequence of result chunks produced by a streaming handler,
/// terminated by a chunk with `done == true`.
pub type ChunkStream = BoxStream<'static, ToolResultChunk>;

/// Streaming variant of the handler contract.
///
/// Implementations yield `{content, done}` chunks; the server reassigns
/// indices in emission order, so handlers may leave `index` at zero.
pub trait StreamingToolHandler: Send + Sync {
    fn stream(&self, arguments: Arguments) -> ChunkStream;
}

struct FnHandler<F>(F);

#[async_trait::async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn call(&self, arguments: Arguments) -> Result<Value> {
        (self.0)(arguments).await
    }
}

/// Wrap an async closure as a [`ToolHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

struct FnStreamingHandler<F>(F);

impl<F> StreamingToolHandler for FnStreamingHandler<F>
where
    F: Fn(Arguments) -> ChunkStream + Send + Sync,
{
    fn stream(&self, arguments: Arguments) -> ChunkStream {
        (self.0)(arguments)
    }
}

/// Wrap a closure returning a chunk stream as a [`StreamingToolHandler`].
pub fn streaming_handler_fn<F>(f: F) -> Arc<dyn StreamingToolHandler>
where
    F: Fn(Arguments) -> ChunkStream + Send + Sync + 'static,
{
    Arc::new(FnStreamingHandler(f))
}

/// A tool definition bound to its executable handlers.
#[derive(Clone)]
pub struct ToolRegistration {
    pub tool: Tool,
    pub handler: Arc<dyn ToolHandler>,
    pub streaming_handler: Option<Arc<dyn StreamingToolHandler>>,
}

impl ToolRegistration {
    pub fn new(tool: Tool, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            tool,
            handler,
            streaming_handler: None,
        }
    }

    pub fn with_streaming(mut self, streaming_handler: Arc<dyn StreamingToolHandler>) -> Self {
        self.streaming_handler = Some(streaming_handler);
        self
    }
}
