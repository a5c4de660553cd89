use crate::cli::ServeArgs;
use crate::infra::{select_tutor, AppState};
use crate::routes::{app_router, AppDependencies};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lingo_tutor::admin::AdminRepository;
use lingo_tutor::chat::TutorClient;
use lingo_tutor::config::AppConfig;
use lingo_tutor::error::AppError;
use lingo_tutor::progression::{BadgeDefinition, ProgressionEngine};
use lingo_tutor::storage::{MemoryStore, SqliteStore, Store};
use lingo_tutor::telemetry;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let telemetry_guard = telemetry::init(&config.telemetry)?;
    let log_dir = telemetry_guard.log_dir().map(PathBuf::from);

    let engine = Arc::new(ProgressionEngine::new(config.progression.clone())?);
    let tutor = select_tutor(&config.tutor);

    let result = match config.storage.database_url.clone() {
        Some(url) => {
            let store = Arc::new(SqliteStore::connect(&url).await?);
            serve(&config, store, engine, tutor, log_dir).await
        }
        None => {
            warn!("APP_DATABASE_URL is not set; learner data is kept in memory only");
            serve(&config, Arc::new(MemoryStore::new()), engine, tutor, log_dir).await
        }
    };

    telemetry_guard.shutdown();
    result
}

async fn serve<S>(
    config: &AppConfig,
    store: Arc<S>,
    engine: Arc<ProgressionEngine>,
    tutor: Arc<dyn TutorClient>,
    log_dir: Option<PathBuf>,
) -> Result<(), AppError>
where
    S: Store,
{
    let catalog: Vec<BadgeDefinition> = engine
        .badge_rules()
        .iter()
        .map(|rule| rule.badge.clone())
        .collect();
    let seeded = store.seed_badges(&catalog).await?;
    info!(seeded, "badge catalog synchronized");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = app_router(AppDependencies {
        store,
        engine,
        tutor,
        log_dir,
    })
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "language tutor ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("language tutor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
