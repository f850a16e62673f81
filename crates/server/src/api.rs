// HTTP surface for the tool server

use crate::server::McpServer;
use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use toolbus_core::{ErrorCode, McpError, ToolInput, ToolListResponse, ToolResult};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Bind and serve the tool API.
pub async fn serve(addr: &str, server: Arc<McpServer>) -> Result<()> {
    let app = router(server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Tool server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router.
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools/list", post(list_tools))
        .route("/tools/call", post(call_tool))
        .route("/tools/call/stream", post(call_tool_stream))
        .fallback(unknown_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(server)
}

async fn health(State(server): State<Arc<McpServer>>) -> impl IntoResponse {
    let info = server.info();
    Json(serde_json::json!({
        "status": "ok",
        "name": info.name,
        "version": info.version,
        "toolCount": info.tool_count,
    }))
}

async fn list_tools(State(server): State<Arc<McpServer>>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: server.list_tools(),
        next_cursor: None,
    })
}

/// Unary execution. Logical tool failures travel inside the `ToolResult`
/// body with a 200 status; only transport-level problems produce non-2xx.
async fn call_tool(
    State(server): State<Arc<McpServer>>,
    Json(input): Json<ToolInput>,
) -> Json<ToolResult> {
    Json(server.execute_tool(input).await)
}

/// Streaming execution as newline-delimited JSON chunks.
async fn call_tool_stream(
    State(server): State<Arc<McpServer>>,
    Json(input): Json<ToolInput>,
) -> Response {
    match server.execute_tool_streaming(input).await {
        Ok(chunks) => {
            let body = Body::from_stream(chunks.map(|chunk| {
                let mut line = serde_json::to_string(&chunk).unwrap_or_else(|_| "{}".to_string());
                line.push('\n');
                Ok::<_, Infallible>(Bytes::from(line))
            }));
            (
                [(header::CONTENT_TYPE, "application/x-ndjson")],
                body,
            )
                .into_response()
        }
        Err(err) => ApiError(err).into_response(),
    }
}

async fn unknown_route(uri: Uri) -> Response {
    ApiError(McpError::method_not_found(uri.path())).into_response()
}

/// Protocol error mapped onto an HTTP status with a `{message, code}` body.
pub struct ApiError(pub McpError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::InvalidRequest | ErrorCode::InvalidParams | ErrorCode::ValidationError => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::MethodNotFound | ErrorCode::ToolNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError | ErrorCode::ToolExecutionError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(self.0)).into_response()
    }
}
