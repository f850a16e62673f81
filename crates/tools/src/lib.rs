// Built-in tool handlers for the Toolbus runtime

pub mod database;
pub mod file;
pub mod http;

pub use database::{
    database_query_registration, database_query_tool, DatabaseQueryHandler, QueryExecutor,
    QueryOutput,
};
pub use file::{file_operation_registration, file_operation_tool, FileOperationHandler};
pub use http::{http_request_registration, http_request_tool, HttpRequestHandler};
