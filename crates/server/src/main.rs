use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use toolbus_server::{api, McpServer, McpServerConfig};

#[derive(Parser, Debug)]
#[command(name = "toolbus")]
#[command(about = "Toolbus - schema-described tool invocation server", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "toolbus.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolbus=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = McpServerConfig::load(&args.config)?;
    tracing::info!("Starting {} v{}", config.name, config.version);

    let sandbox_roots: Vec<PathBuf> = config
        .tools
        .sandbox_roots
        .iter()
        .map(PathBuf::from)
        .collect();

    let server = Arc::new(McpServer::new(config));
    server.register_tools(vec![
        toolbus_tools::http_request_registration(),
        toolbus_tools::file_operation_registration(sandbox_roots),
    ])?;

    tracing::info!("Registered {} built-in tools", server.info().tool_count);

    let addr = format!("{}:{}", args.host, args.port);
    api::serve(&addr, server).await
}
