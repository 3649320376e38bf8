use {
    arcade_pay::{
        AppState,
        adapters::{http, stripe_processor::StripeProcessor},
        domain::{
            diag::ErrorReporter, identity::IdentityProvider, processor::PaymentProcessor,
            store::RecordStore,
        },
        infra::postgres::{
            diag_repo::PgDiagnosticSink, identity_repo::PgIdentityProvider, store::PgRecordStore,
        },
        services::{account_link::AccountLinker, purchase_pipeline::PaymentPipeline, worker},
    },
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, sync::Arc, time::Duration},
    tokio::{signal, sync::watch},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let stripe_secret = env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY must be set");
    let landing_url = env::var("OAUTH_LANDING_URL").expect("OAUTH_LANDING_URL must be set");
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    // All clients are constructed here and injected; nothing reaches for
    // ambient module state.
    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool.clone()));
    let processor: Arc<dyn PaymentProcessor> = Arc::new(StripeProcessor::new(&stripe_secret));
    let identity: Arc<dyn IdentityProvider> = Arc::new(PgIdentityProvider::new(pool.clone()));
    let reporter = ErrorReporter::new(Arc::new(PgDiagnosticSink::new(pool.clone())));

    let pipeline = Arc::new(PaymentPipeline::new(
        store.clone(),
        processor.clone(),
        reporter.clone(),
    ));
    let linker = Arc::new(AccountLinker::new(
        store.clone(),
        processor,
        identity,
        reporter,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(worker::run_worker(
        pool.clone(),
        pipeline,
        shutdown_rx.clone(),
    ));
    let reaper_handle = tokio::spawn(worker::run_reaper(pool.clone(), shutdown_rx));

    let state = AppState {
        pool,
        store,
        linker,
        landing_url: landing_url.into(),
    };

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/oauth", get(http::oauth_return))
        .route("/users/{user_id}/payments", post(http::create_payment))
        .route(
            "/users/{user_id}/payments/{purchase_id}",
            get(http::get_payment),
        )
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    shutdown_tx.send(true).ok();
    let _ = worker_handle.await;
    let _ = reaper_handle.await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
