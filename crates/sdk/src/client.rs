//! Main client for the Toolbus SDK.

use crate::config::{ClientConfig, RetryConfig, DEFAULT_SERVER_URL};
use crate::error::ClientResult;
use crate::transport::HttpTransport;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use toolbus_core::{Arguments, Tool, ToolInput, ToolListResponse, ToolResult, ToolResultChunk};
use url::Url;

/// Client for discovering and invoking tools on a remote server.
///
/// The discovered tool list is cached after the first successful fetch and
/// invalidated only by [`refresh_tools`](McpClient::refresh_tools).
#[derive(Clone)]
pub struct McpClient {
    http: HttpTransport,
    cached_tools: Arc<RwLock<Option<Vec<Tool>>>>,
}

impl McpClient {
    /// Create a new client builder.
    pub fn builder() -> McpClientBuilder {
        McpClientBuilder::new()
    }

    /// Create a client from configuration.
    fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let http = HttpTransport::new(Arc::new(config))?;
        Ok(Self {
            http,
            cached_tools: Arc::new(RwLock::new(None)),
        })
    }

    /// Discover available tools, memoizing the list after the first call.
    pub async fn discover_tools(&self) -> ClientResult<Vec<Tool>> {
        if let Some(tools) = self.cached_tools.read().await.clone() {
            return Ok(tools);
        }

        let response: ToolListResponse = self
            .http
            .post_with_retry("tools/list", &serde_json::json!({}))
            .await?;

        *self.cached_tools.write().await = Some(response.tools.clone());
        Ok(response.tools)
    }

    /// List all available tools (alias for [`discover_tools`](Self::discover_tools)).
    pub async fn list_tools(&self) -> ClientResult<Vec<Tool>> {
        self.discover_tools().await
    }

    /// Read the cached tool list without touching the network.
    ///
    /// Returns `None` until the cache has been populated by a discovery.
    pub async fn get_available_tools(&self) -> Option<Vec<Tool>> {
        self.cached_tools.read().await.clone()
    }

    /// Invalidate the cache and re-discover.
    pub async fn refresh_tools(&self) -> ClientResult<Vec<Tool>> {
        *self.cached_tools.write().await = None;
        self.discover_tools().await
    }

    /// Check whether the server exposes a tool with this name.
    pub async fn has_tool(&self, name: &str) -> ClientResult<bool> {
        Ok(self
            .discover_tools()
            .await?
            .iter()
            .any(|tool| tool.name == name))
    }

    /// Fetch a specific tool definition by name.
    pub async fn get_tool(&self, name: &str) -> ClientResult<Option<Tool>> {
        Ok(self
            .discover_tools()
            .await?
            .into_iter()
            .find(|tool| tool.name == name))
    }

    /// Call a tool by name with the given arguments.
    pub async fn call_tool(&self, name: &str, arguments: Arguments) -> ClientResult<ToolResult> {
        self.execute_tool(ToolInput::new(name, arguments)).await
    }

    /// Execute a tool with a full input object.
    ///
    /// A logical failure (`ToolResult::is_error`) comes back as `Ok` data for
    /// the caller to interpret; only transport failures are `Err`, and only
    /// after the retry budget is exhausted.
    pub async fn execute_tool(&self, input: ToolInput) -> ClientResult<ToolResult> {
        self.http.post_with_retry("tools/call", &input).await
    }

    /// Execute a tool and consume its streamed result chunks.
    ///
    /// Chunk indices are reassigned here in strict receive order; whatever
    /// the server put in `index` is discarded. Malformed lines are dropped
    /// silently. A connection lost mid-stream ends the sequence early, so a
    /// sequence without a final `done == true` chunk is an abnormal
    /// termination.
    pub async fn execute_tool_streaming(
        &self,
        input: ToolInput,
    ) -> ClientResult<impl Stream<Item = ToolResultChunk>> {
        let response = self.http.post_stream("tools/call/stream", &input).await?;

        Ok(async_stream::stream! {
            let mut body = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut index: u64 = 0;

            while let Some(next) = body.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        tracing::debug!("stream ended early: {}", err);
                        break;
                    }
                };
                buffer.extend_from_slice(&bytes);

                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = &line[..line.len() - 1];
                    if line.iter().all(u8::is_ascii_whitespace) {
                        continue;
                    }
                    match serde_json::from_slice::<ToolResultChunk>(line) {
                        Ok(chunk) => {
                            yield chunk.with_index(index);
                            index += 1;
                        }
                        Err(err) => {
                            tracing::debug!("skipping malformed stream line: {}", err);
                        }
                    }
                }
            }
        })
    }
}

/// Builder for creating an [`McpClient`].
pub struct McpClientBuilder {
    server_url: Option<String>,
    timeout: Duration,
    retries: u32,
    retry: RetryConfig,
}

impl McpClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            server_url: None,
            timeout: Duration::from_secs(30),
            retries: 3,
            retry: RetryConfig::default(),
        }
    }

    /// Set the tool server URL.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the total attempt budget.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the retry backoff configuration.
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the client.
    pub fn build(self) -> ClientResult<McpClient> {
        let server_url = Url::parse(
            self.server_url
                .as_deref()
                .unwrap_or(DEFAULT_SERVER_URL),
        )?;

        let config = ClientConfig {
            server_url,
            timeout: self.timeout,
            retries: self.retries,
            retry: self.retry,
        };

        McpClient::from_config(config)
    }
}

impl Default for McpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use serde_json::json;
    use toolbus_core::ErrorCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> McpClient {
        McpClient::builder()
            .server_url(base_url)
            .retries(1)
            .build()
            .unwrap()
    }

    fn tool_list_body() -> serde_json::Value {
        json!({
            "tools": [
                {
                    "name": "http_request",
                    "description": "Make HTTP requests to external APIs",
                    "inputSchema": {"type": "object", "properties": {}},
                    "category": "network"
                },
                {
                    "name": "database_query",
                    "description": "Execute read-only SQL queries",
                    "inputSchema": {"type": "object", "properties": {}}
                }
            ]
        })
    }

    #[tokio::test]
    async fn discovery_is_memoized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_list_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri());
        assert!(client.get_available_tools().await.is_none());

        let first = client.discover_tools().await.unwrap();
        let second = client.discover_tools().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(client.get_available_tools().await.is_some());
    }

    #[tokio::test]
    async fn refresh_forces_one_more_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_list_body()))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server.uri());
        client.discover_tools().await.unwrap();
        client.refresh_tools().await.unwrap();
        client.discover_tools().await.unwrap();
    }

    #[tokio::test]
    async fn tool_lookups_derive_from_discovery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_list_body()))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        assert!(client.has_tool("http_request").await.unwrap());
        assert!(!client.has_tool("nope").await.unwrap());

        let tool = client.get_tool("database_query").await.unwrap().unwrap();
        assert_eq!(tool.effective_category(), "uncategorized");
        assert!(client.get_tool("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logical_tool_failures_come_back_as_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isError": true,
                "errorMessage": "Tool not found: nope",
                "errorCode": -32000
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let result = client.call_tool("nope", Arguments::new()).await.unwrap();
        assert!(result.is_error);
        assert_eq!(result.error_code, Some(ErrorCode::ToolNotFound));
    }

    #[tokio::test]
    async fn successful_calls_deserialize_the_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": {"answer": 42},
                "isError": false
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let result = client
            .execute_tool(ToolInput::new("calc", Arguments::new()))
            .await
            .unwrap();
        assert_eq!(result.content, Some(json!({"answer": 42})));
    }

    #[tokio::test]
    async fn streamed_chunks_are_reindexed_in_receive_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                // Server-supplied indices are deliberately wrong.
                "{\"content\":\"a\",\"done\":false,\"index\":9}\n{\"content\":\"b\",\"done\":true,\"index\":9}\n",
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let chunks: Vec<ToolResultChunk> = client
            .execute_tool_streaming(ToolInput::new("ticker", Arguments::new()))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "a");
        assert_eq!(chunks[0].index, 0);
        assert!(!chunks[0].done);
        assert_eq!(chunks[1].content, "b");
        assert_eq!(chunks[1].index, 1);
        assert!(chunks[1].done);
    }

    #[tokio::test]
    async fn malformed_stream_lines_are_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "{\"content\":\"a\",\"done\":false}\nnot json\n{\"content\":\"b\",\"done\":true}\n",
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let chunks: Vec<ToolResultChunk> = client
            .execute_tool_streaming(ToolInput::new("ticker", Arguments::new()))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].index, 1);
    }

    #[tokio::test]
    async fn stream_errors_before_first_chunk_are_thrown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call/stream"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "Tool not found: x", "code": -32000})),
            )
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let err = client
            .execute_tool_streaming(ToolInput::new("x", Arguments::new()))
            .await
            .err()
            .expect("expected an error before the first chunk");
        match err {
            ClientError::Protocol { status, error } => {
                assert_eq!(status, 404);
                assert_eq!(error.code, ErrorCode::ToolNotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stream_without_terminal_chunk_just_ends() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tools/call/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "{\"content\":\"a\",\"done\":false}\n",
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let chunks: Vec<ToolResultChunk> = client
            .execute_tool_streaming(ToolInput::new("ticker", Arguments::new()))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(chunks.len(), 1);
        assert!(!chunks.last().unwrap().done);
    }

    #[tokio::test]
    async fn invalid_server_url_fails_at_build_time() {
        let err = McpClient::builder()
            .server_url("not a url")
            .build()
            .err()
            .expect("expected a build error");
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }
}
