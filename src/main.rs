use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_evaluator::config::{Config, LogFormat};
use resume_evaluator::services::AnthropicClient;
use resume_evaluator::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting Resume Evaluator Service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Max file size: {}MB", config.max_file_size_mb);

    let llm = AnthropicClient::from_config(&config)?;
    tracing::info!("LLM client initialized (model: {})", llm.model());

    let addr = config.bind_address();
    let app = create_router(AppState::new(config, Arc::new(llm)));

    tracing::info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Runs before Config::from_env so configuration loading is logged too
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "resume_evaluator=debug,tower_http=debug,axum::rejection=trace".into());

    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
}
