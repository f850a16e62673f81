use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Hard cap on concurrently running tool executions. At the cap new
    /// calls are rejected, not queued.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Server-wide execution timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directories the file_operation tool may touch.
    #[serde(default = "default_sandbox_roots")]
    pub sandbox_roots: Vec<String>,
}

fn default_name() -> String {
    "toolbus-server".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_max_concurrent() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_sandbox_roots() -> Vec<String> {
    vec![
        "/tmp/toolbus-sandbox".to_string(),
        "/var/toolbus/files".to_string(),
    ]
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sandbox_roots: default_sandbox_roots(),
        }
    }
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            max_concurrent: default_max_concurrent(),
            default_timeout_ms: default_timeout_ms(),
            tools: ToolsConfig::default(),
        }
    }
}

impl McpServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
