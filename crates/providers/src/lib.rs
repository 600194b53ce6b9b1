//! Model completion providers for Cardwise.
//!
//! All providers implement the `cardwise_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use cardwise_config::AppConfig;
use cardwise_core::Provider;
use cardwise_core::error::ProviderError;
use std::sync::Arc;
use std::time::Duration;

/// Build the completion provider described by the configuration.
///
/// Fails with [`ProviderError::NotConfigured`] when no API key is available
/// for a remote endpoint. Local endpoints (localhost) accept any key.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let base_url = &config.provider.base_url;
    let api_key = match &config.api_key {
        Some(key) => key.clone(),
        None if is_local(base_url) => "local".to_string(),
        None => {
            return Err(ProviderError::NotConfigured(
                "no API key; set CARDWISE_API_KEY or OPENAI_API_KEY".into(),
            ));
        }
    };

    let provider = OpenAiCompatProvider::new(
        provider_name(base_url),
        base_url,
        api_key,
        Duration::from_secs(config.provider.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

fn is_local(base_url: &str) -> bool {
    base_url.contains("://localhost") || base_url.contains("://127.0.0.1")
}

/// A short provider name derived from the endpoint host.
fn provider_name(base_url: &str) -> &'static str {
    if base_url.contains("openai.com") {
        "openai"
    } else if base_url.contains("openrouter.ai") {
        "openrouter"
    } else if base_url.contains(":11434") {
        "ollama"
    } else {
        "openai-compatible"
    }
}
