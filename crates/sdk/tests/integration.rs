// End-to-end tests: a real server on an ephemeral port, driven by the SDK.

use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use toolbus_core::{
    handler_fn, streaming_handler_fn, Arguments, ErrorCode, InputSchema, Tool, ToolInput,
    ToolRegistration, ToolResultChunk,
};
use toolbus_sdk::McpClient;
use toolbus_server::{api, McpServer, McpServerConfig};

async fn spawn_server() -> String {
    let server = Arc::new(McpServer::new(McpServerConfig {
        name: "e2e-server".to_string(),
        ..McpServerConfig::default()
    }));

    server
        .register_tool(ToolRegistration::new(
            Tool::new("echo", "Echoes the value argument", InputSchema::object()),
            handler_fn(|args: Arguments| async move {
                Ok(args.get("value").cloned().unwrap_or(Value::Null))
            }),
        ))
        .unwrap();

    server
        .register_tool(
            ToolRegistration::new(
                Tool::new("ticker", "Streams two ticks", InputSchema::object())
                    .with_streaming(true),
                handler_fn(|_| async { Ok(Value::Null) }),
            )
            .with_streaming(streaming_handler_fn(|_| {
                futures::stream::iter(vec![
                    ToolResultChunk::new("tick ", false),
                    ToolResultChunk::new("tock", true),
                ])
                .boxed()
            })),
        )
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::router(server)).await.unwrap();
    });

    format!("http://{}", addr)
}

fn args(value: Value) -> Arguments {
    match value {
        Value::Object(map) => map,
        _ => Arguments::new(),
    }
}

#[tokio::test]
async fn discovers_and_executes_tools() {
    let url = spawn_server().await;
    let client = McpClient::builder().server_url(&url).build().unwrap();

    let tools = client.discover_tools().await.unwrap();
    assert_eq!(tools.len(), 2);
    assert!(client.has_tool("echo").await.unwrap());

    let result = client
        .call_tool("echo", args(json!({"value": "round trip"})))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(result.content, Some(json!("round trip")));
}

#[tokio::test]
async fn unknown_tool_is_a_logical_error_not_a_thrown_one() {
    let url = spawn_server().await;
    let client = McpClient::builder().server_url(&url).build().unwrap();

    let result = client.call_tool("missing", Arguments::new()).await.unwrap();
    assert!(result.is_error);
    assert_eq!(result.error_code, Some(ErrorCode::ToolNotFound));
}

#[tokio::test]
async fn streams_chunks_end_to_end() {
    let url = spawn_server().await;
    let client = McpClient::builder().server_url(&url).build().unwrap();

    let chunks: Vec<ToolResultChunk> = client
        .execute_tool_streaming(ToolInput::new("ticker", Arguments::new()))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].index, 0);
    assert_eq!(chunks[1].index, 1);
    assert!(chunks[1].done);

    let combined: String = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(combined, "tick tock");
}

#[tokio::test]
async fn streaming_a_unary_tool_falls_back_to_one_terminal_chunk() {
    let url = spawn_server().await;
    let client = McpClient::builder().server_url(&url).build().unwrap();

    let chunks: Vec<ToolResultChunk> = client
        .execute_tool_streaming(ToolInput::new("echo", args(json!({"value": 1}))))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].done);
    assert_eq!(chunks[0].content, "1");
}
