//! LDTflow Server - HTTP ingestion endpoint for LDT lab-result deliveries
//!
//! This binary runs the secured webhook endpoint, the ingestion pipeline,
//! and the export/review surfaces.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
