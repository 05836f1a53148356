use anyhow::Context as _;
use clap::Parser;
use qarnot_client::Connection;
use qarnot_mcp::stdio;
use qarnot_mcp::tools::QarnotTools;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "qarnot-mcp", version, about = "MCP server for the Qarnot compute platform")]
struct Cli {
    /// Qarnot API token.
    #[arg(long, env = "QARNOT_TOKEN", hide_env_values = true)]
    token: String,

    /// Base URL of the Qarnot REST API.
    #[arg(long, env = "QARNOT_API_URL", default_value = qarnot_client::DEFAULT_API_URL)]
    api_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let connection = Connection::with_base_url(&cli.token, &cli.api_url)
        .context("failed to build Qarnot connection")?;

    tracing::info!(api_url = %cli.api_url, "serving Qarnot tools over stdio");
    stdio::serve(QarnotTools::new(Arc::new(connection))).await
}
