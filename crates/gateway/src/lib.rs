//! HTTP gateway for the Cardwise agent.
//!
//! A thin axum transport over [`AgentService`]: chat, conversation
//! inspection and reset, session listing, trace logs and a health check.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use cardwise_agent::AgentService;
use cardwise_config::AppConfig;
use cardwise_core::error::ProviderError;
use cardwise_core::event::EventBus;
use cardwise_core::session::SessionStore;
use cardwise_memory::InMemorySessionStore;

/// How often expired sessions are swept when a TTL is configured.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// The session store described by the configuration.
pub fn session_store(config: &AppConfig) -> InMemorySessionStore {
    match config.sessions.ttl_minutes {
        Some(minutes) => InMemorySessionStore::with_ttl(Duration::from_secs(minutes * 60)),
        None => InMemorySessionStore::new(),
    }
}

/// Wire provider, tools and `store` into an agent service.
pub fn build_agent_service(
    config: &AppConfig,
    store: Arc<dyn SessionStore>,
) -> Result<AgentService, ProviderError> {
    let provider = cardwise_providers::build_from_config(config)?;
    let tools = Arc::new(cardwise_tools::default_registry());
    let event_bus = Arc::new(EventBus::default());
    Ok(AgentService::from_config(
        config, provider, tools, store, event_bus,
    ))
}

/// Build the full router.
///
/// Layers applied:
/// - CORS for browser front ends
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(agent: Arc<AgentService>, max_body_bytes: usize) -> Router {
    let api_state = Arc::new(api::ApiState { agent });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/agent", api::agent_router(api_state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = session_store(&config);
    if config.sessions.ttl_minutes.is_some() {
        let sweeper = store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PURGE_INTERVAL);
            loop {
                interval.tick().await;
                let purged = sweeper.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Expired sessions removed");
                }
            }
        });
    }

    let agent = Arc::new(build_agent_service(&config, Arc::new(store))?);
    let app = build_router(agent, config.gateway.max_body_bytes);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
