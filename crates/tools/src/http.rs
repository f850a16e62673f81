// HTTP request tool

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use toolbus_core::{
    json_schema_enum, json_schema_number, json_schema_object, json_schema_string, Arguments,
    InputSchema, McpError, Tool, ToolHandler, ToolRegistration,
};
use url::Url;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Tool definition for `http_request`.
pub fn http_request_tool() -> Tool {
    Tool::new(
        "http_request",
        "Make HTTP requests to external APIs and services. Supports GET, POST, PUT, PATCH, DELETE methods with custom headers and body.",
        InputSchema::object()
            .property("url", json_schema_string("The URL to send the request to"))
            .property(
                "method",
                json_schema_enum(
                    ALLOWED_METHODS,
                    "HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS)",
                ),
            )
            .property(
                "headers",
                json_schema_object("Request headers as key-value pairs"),
            )
            .property("body", json_schema_object("Request body (for POST, PUT, PATCH)"))
            .property(
                "timeout",
                json_schema_number("Request timeout in milliseconds"),
            )
            .require(&["url"]),
    )
    .with_category("network")
}

#[derive(Debug, Deserialize)]
struct HttpRequestArgs {
    url: String,
    method: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
    body: Option<Value>,
    timeout: Option<u64>,
}

/// Handler for `http_request`.
pub struct HttpRequestHandler {
    client: reqwest::Client,
}

impl HttpRequestHandler {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpRequestHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ToolHandler for HttpRequestHandler {
    async fn call(&self, arguments: Arguments) -> Result<Value> {
        let args: HttpRequestArgs = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| McpError::invalid_params(format!("Invalid arguments for http_request: {}", e)))?;

        let url = Url::parse(&args.url)
            .map_err(|_| McpError::invalid_params(format!("Invalid URL: {}", args.url)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(McpError::invalid_params(format!(
                "Only HTTP/HTTPS URLs are supported, got: {}",
                url.scheme()
            ))
            .into());
        }

        let method_name = args.method.as_deref().unwrap_or("GET").to_uppercase();
        if !ALLOWED_METHODS.contains(&method_name.as_str()) {
            return Err(McpError::invalid_params(format!(
                "Unsupported HTTP method: {}",
                method_name
            ))
            .into());
        }
        let method = reqwest::Method::from_bytes(method_name.as_bytes())
            .map_err(|_| McpError::invalid_params(format!("Unsupported HTTP method: {}", method_name)))?;

        let timeout = Duration::from_millis(args.timeout.unwrap_or(DEFAULT_TIMEOUT_MS));

        let mut request = self.client.request(method, url).timeout(timeout);
        for (name, value) in &args.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &args.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| McpError::execution(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<non-utf8>").to_string(),
                )
            })
            .collect();

        let content_type = headers
            .get("content-type")
            .cloned()
            .unwrap_or_default();
        let body: Value = if content_type.contains("application/json") {
            response.json().await.unwrap_or(Value::Null)
        } else {
            Value::String(response.text().await.unwrap_or_default())
        };

        Ok(json!({
            "status": status.as_u16(),
            "statusText": status.canonical_reason().unwrap_or(""),
            "headers": headers,
            "body": body,
        }))
    }
}

/// Registration for the built-in HTTP request tool.
pub fn http_request_registration() -> ToolRegistration {
    ToolRegistration::new(http_request_tool(), Arc::new(HttpRequestHandler::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbus_core::ErrorCode;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    fn as_mcp(err: anyhow::Error) -> McpError {
        err.downcast::<McpError>().expect("expected protocol error")
    }

    #[tokio::test]
    async fn performs_get_request_and_parses_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let handler = HttpRequestHandler::new();
        let out = handler
            .call(args(json!({"url": format!("{}/data", server.uri())})))
            .await
            .unwrap();

        assert_eq!(out["status"], 200);
        assert_eq!(out["body"]["ok"], true);
    }

    #[tokio::test]
    async fn posts_json_body_with_custom_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("x-custom", "yes"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .mount(&server)
            .await;

        let handler = HttpRequestHandler::new();
        let out = handler
            .call(args(json!({
                "url": format!("{}/submit", server.uri()),
                "method": "POST",
                "headers": {"x-custom": "yes"},
                "body": {"a": 1},
            })))
            .await
            .unwrap();

        assert_eq!(out["status"], 201);
        assert_eq!(out["body"], "created");
    }

    #[tokio::test]
    async fn invalid_url_is_invalid_params() {
        let handler = HttpRequestHandler::new();
        let err = handler
            .call(args(json!({"url": "not a url"})))
            .await
            .unwrap_err();
        assert_eq!(as_mcp(err).code, ErrorCode::InvalidParams);
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let handler = HttpRequestHandler::new();
        let err = handler
            .call(args(json!({"url": "ftp://example.com/file"})))
            .await
            .unwrap_err();
        assert_eq!(as_mcp(err).code, ErrorCode::InvalidParams);
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected() {
        let handler = HttpRequestHandler::new();
        let err = handler
            .call(args(json!({"url": "http://example.com", "method": "TRACE"})))
            .await
            .unwrap_err();
        assert_eq!(as_mcp(err).code, ErrorCode::InvalidParams);
    }

    #[test]
    fn tool_definition_requires_url() {
        let tool = http_request_tool();
        assert_eq!(tool.name, "http_request");
        assert_eq!(tool.effective_category(), "network");
        assert_eq!(tool.input_schema.required.as_deref(), Some(&["url".to_string()][..]));
    }
}
