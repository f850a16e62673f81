//! # Toolbus SDK
//!
//! Rust client for Toolbus tool servers: discovery, invocation with
//! retry/backoff, and streamed result consumption.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toolbus_sdk::{McpClient, ClientResult};
//! use toolbus_core::Arguments;
//!
//! #[tokio::main]
//! async fn main() -> ClientResult<()> {
//!     // Build client
//!     let client = McpClient::builder()
//!         .server_url("http://localhost:3001")
//!         .build()?;
//!
//!     // Discover tools
//!     let tools = client.discover_tools().await?;
//!     println!("Found {} tools", tools.len());
//!
//!     // Call a tool
//!     let mut args = Arguments::new();
//!     args.insert("url".into(), "https://example.com".into());
//!     let result = client.call_tool("http_request", args).await?;
//!     if result.is_error {
//!         println!("tool failed: {:?}", result.error_message);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use toolbus_core::{Arguments, ToolInput};
//! # async fn example(client: toolbus_sdk::McpClient) -> toolbus_sdk::ClientResult<()> {
//! let input = ToolInput::new("log_tail", Arguments::new());
//! let mut chunks = std::pin::pin!(client.execute_tool_streaming(input).await?);
//!
//! while let Some(chunk) = chunks.next().await {
//!     print!("{}", chunk.content);
//!     if chunk.done {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

// Re-export main client
pub use client::{McpClient, McpClientBuilder};
pub use config::{ClientConfig, RetryConfig, DEFAULT_SERVER_URL};
pub use error::{ClientError, ClientResult};

// Re-export core types for convenience
pub use toolbus_core::{
    Arguments, ErrorCode, InputSchema, McpError, Tool, ToolInput, ToolListResponse, ToolResult,
    ToolResultChunk,
};
