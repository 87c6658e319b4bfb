//! Weather chat - LLM chat backend with a weather lookup tool
//!
//! Proxies chat messages to Anthropic's Messages API and lets the model call
//! `get_weather` while it works out an answer.

mod api;
mod config;
mod conversation;
mod llm;
mod tools;
mod turn;

use api::{create_router, AppState};
use config::AppConfig;
use llm::{AnthropicService, LlmService, LoggingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tools::{ToolRegistry, WeatherConfig};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turn::TurnResolver;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // LLM service is optional at startup; chat requests fail until it is configured
    let llm: Option<Arc<dyn LlmService>> = match &config.anthropic_api_key {
        Some(key) => {
            let service = AnthropicService::new(
                key.clone(),
                config.model().to_string(),
                config.anthropic_base_url.as_deref(),
            )?;
            Some(Arc::new(LoggingService::new(Arc::new(service))))
        }
        None => None,
    };

    if config.weather_api_key.is_none() {
        tracing::warn!("OPENWEATHERMAP_API_KEY not set; weather lookups will report an error to the model");
    }

    let tools = ToolRegistry::standard(WeatherConfig {
        api_key: config.weather_api_key.clone(),
        base_url: config.weather_base_url.clone(),
    })?;

    let turn_config = config.turn_config();
    let resolver = TurnResolver::new(llm, Arc::new(tools), turn_config);

    if resolver.is_configured() {
        tracing::info!(
            model = %config.model(),
            max_tool_rounds = turn_config.max_tool_rounds,
            history_limit = turn_config.history_limit,
            "Chat model configured"
        );
    } else {
        tracing::warn!("ANTHROPIC_API_KEY not set; chat requests will fail until it is configured");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(resolver))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    tracing::info!("Weather chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
