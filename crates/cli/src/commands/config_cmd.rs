//! `cardwise config` — Configuration commands.

use cardwise_config::AppConfig;

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.to_redacted_toml());
    Ok(())
}

pub fn path() {
    println!("{}", config_path().display());
}

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warning: {w}");
                }
            }

            println!();
            println!("   Endpoint:        {}", config.provider.base_url);
            println!("   Model:           {}", config.provider.model);
            println!("   Max iterations:  {}", config.agent.max_iterations);
            println!(
                "   Gateway:         {}:{}",
                config.gateway.host, config.gateway.port
            );
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}

/// Problems that do not stop loading but will bite at runtime.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    let base_url = &config.provider.base_url;
    let local = base_url.contains("://localhost") || base_url.contains("://127.0.0.1");

    if !config.has_api_key() && !local {
        warnings.push("No API key set (set CARDWISE_API_KEY or OPENAI_API_KEY)");
    }
    if config.agent.history_window == 0 {
        warnings.push("agent.history_window is 0; the model will not see earlier messages");
    }
    if config.gateway.host == "0.0.0.0" {
        warnings.push("Gateway bound to 0.0.0.0; the API has no authentication");
    }
    warnings
}
