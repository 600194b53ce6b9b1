//! `cardwise gateway` — Start the HTTP API server.

use cardwise_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Cardwise Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.provider.model);
    match config.sessions.ttl_minutes {
        Some(minutes) => println!("   Sessions:  expire after {minutes} min idle"),
        None => println!("   Sessions:  kept until cleared"),
    }

    cardwise_gateway::start(config).await?;

    Ok(())
}
