//! `seomagic serve` — Start the HTTP gateway.

use std::path::Path;
use tracing::info;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        info!(port, "Port overridden from command line");
        config.gateway.port = port;
    }

    println!("seomagic gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);
    println!("   Static:    {}", config.gateway.static_dir);

    seomagic_gateway::start(config).await?;

    Ok(())
}
