mod handlers;
mod routes;
mod state;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use traduki::db::{self, Database};
use traduki::worker::pool::WorkerPool;
use traduki::{
    JobProcessor, JobQueue, OpenAiTranslator, RecordStore, TranslationProvider,
    TranslationService,
};

use state::AppState;

fn init_tracing() {
    // Bridge `log` records from the library into tracing.
    let _ = tracing_log::LogTracer::init();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "traduki=info,traduki_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration
    let config_path =
        std::env::var("TRADUKI_CONFIG").unwrap_or_else(|_| "traduki.json".to_string());
    let config = traduki::load_config(&config_path)
        .with_context(|| format!("Could not load config from {}", config_path))?;
    info!("Loaded configuration from: {}", config_path);

    // Open the database
    let db_path = match config.database.path.clone() {
        Some(path) => path,
        None => db::default_database_path()
            .context("Could not determine the default database path")?,
    };
    let database = Database::open(&db_path)?;

    // Build the provider client from explicit configuration
    let api_key = config
        .provider
        .resolve_api_key()
        .context("Could not resolve the provider API key")?;
    let provider: Arc<dyn TranslationProvider> =
        Arc::new(OpenAiTranslator::new(config.provider.to_provider_config(api_key))?);

    // Wire the queue, store, service and worker pool
    let queue = JobQueue::new(database.clone(), config.worker.queue_config());
    let record_store = RecordStore::new(database.clone());
    let processor = Arc::new(JobProcessor::new(
        record_store.clone(),
        queue.clone(),
        provider,
        config.worker.attempt_timeout(),
    ));
    let pool = WorkerPool::start(processor, queue.clone(), config.worker.worker_count());

    let service = Arc::new(TranslationService::new(database, record_store, queue));
    let app_state = AppState::new(service);

    // Build application
    let app = routes::create_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid server address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    info!("Starting traduki server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain workers before exiting.
    pool.shutdown();
    pool.wait().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
