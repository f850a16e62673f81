// Contract layer for the Toolbus tool-invocation runtime

pub mod error;
pub mod handler;
pub mod registry;
pub mod types;

pub use error::{ErrorCode, McpError};
pub use handler::{
    handler_fn, streaming_handler_fn, ChunkStream, StreamingToolHandler, ToolHandler,
    ToolRegistration,
};
pub use registry::ToolRegistry;
pub use types::*;
