//! API server entry point.

use api::config::{Config, LogFormat};
use domain::LedgerService;
use event_store::{EventStore, InMemoryEventStore, PostgresEventStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Restores the ledger from `event_store`, brings the read models up to date
/// and serves until shutdown.
async fn serve<S: EventStore + Clone + 'static>(
    event_store: S,
    config: &Config,
    metrics_handle: PrometheusHandle,
) {
    let ledger = LedgerService::open(event_store.clone(), config.ledger())
        .await
        .expect("failed to restore ledger");
    tracing::info!(
        sequence = %ledger.current_sequence().await,
        "ledger restored"
    );

    let state = api::build_state(ledger, event_store);

    // Subscribe before catch-up so no commit falls between the two
    let receiver = state.ledger.subscribe();
    let processor = state.projection_processor.clone();
    processor.run_catch_up().await.expect("catch-up failed");

    tokio::spawn(async move {
        if let Err(e) = processor.run_live(receiver).await {
            tracing::error!(error = %e, "live projection feed stopped");
        }
    });

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    init_tracing(&config);

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    tracing::info!(
        transition_policy = %config.transition_policy,
        snapshot_interval = config.snapshot_interval,
        "configuration loaded"
    );

    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresEventStore::connect(url)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using postgres event store");
            serve(store, &config, metrics_handle).await;
        }
        None => {
            tracing::info!("using in-memory event store");
            serve(InMemoryEventStore::new(), &config, metrics_handle).await;
        }
    }
}
