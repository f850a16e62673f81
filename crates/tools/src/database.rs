// Read-only database query tool

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use toolbus_core::{
    json_schema_array, json_schema_number, json_schema_string, Arguments, InputSchema, McpError,
    Tool, ToolHandler, ToolRegistration,
};

/// Statement prefixes that are allowed through the read-only gate.
const ALLOWED_PREFIXES: &[&str] = &["SELECT", "WITH", "EXPLAIN"];

/// Keywords that mark a statement as mutating.
///
/// The match is substring-level over the uppercased statement, so identifiers
/// that embed a keyword (e.g. `created_at` contains `CREATE`) are rejected
/// too. That is the contract: anything containing a mutating keyword anywhere
/// in the text is refused.
const DANGEROUS_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "EXEC", "EXECUTE",
];

/// Tool definition for `database_query`.
pub fn database_query_tool() -> Tool {
    Tool::new(
        "database_query",
        "Execute read-only SQL queries against the configured database. Only SELECT statements are allowed for safety.",
        InputSchema::object()
            .property("query", json_schema_string("SQL query to execute (SELECT only)"))
            .property(
                "params",
                json_schema_array(
                    json_schema_string("parameter value"),
                    "Query parameters for parameterized queries",
                ),
            )
            .property(
                "database",
                json_schema_string("Database name to query (uses default if not specified)"),
            )
            .property("timeout", json_schema_number("Query timeout in milliseconds"))
            .require(&["query"]),
    )
    .with_category("data")
}

/// Check that a statement is read-only.
pub fn is_read_only_query(query: &str) -> bool {
    let trimmed = query.trim().to_uppercase();

    let starts_with_allowed = ALLOWED_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix));
    let contains_dangerous = DANGEROUS_KEYWORDS
        .iter()
        .any(|keyword| trimmed.contains(keyword));

    starts_with_allowed && !contains_dangerous
}

/// Execution backend for the database tool.
///
/// The protocol core carries no database driver; embedders inject whatever
/// connection pool they run against.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(&self, query: &str, params: &[Value], database: Option<&str>)
        -> Result<QueryOutput>;
}

/// Rows returned by a query execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOutput {
    pub rows: Vec<Value>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DatabaseQueryArgs {
    query: String,
    #[serde(default)]
    params: Vec<Value>,
    database: Option<String>,
}

/// Handler for `database_query`: validates the statement, then delegates to
/// the injected executor.
pub struct DatabaseQueryHandler {
    executor: Arc<dyn QueryExecutor>,
}

impl DatabaseQueryHandler {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait::async_trait]
impl ToolHandler for DatabaseQueryHandler {
    async fn call(&self, arguments: Arguments) -> Result<Value> {
        let args: DatabaseQueryArgs = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| {
                McpError::invalid_params(format!("Invalid arguments for database_query: {}", e))
            })?;

        if !is_read_only_query(&args.query) {
            return Err(McpError::permission_denied(
                "Only read-only queries (SELECT, WITH, EXPLAIN) are allowed",
            )
            .into());
        }

        let output = self
            .executor
            .query(&args.query, &args.params, args.database.as_deref())
            .await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Registration for the built-in database query tool.
pub fn database_query_registration(executor: Arc<dyn QueryExecutor>) -> ToolRegistration {
    ToolRegistration::new(
        database_query_tool(),
        Arc::new(DatabaseQueryHandler::new(executor)),
    )
}
