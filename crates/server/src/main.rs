//! Proplet server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use fred::prelude::*;
use proplet_api::{middleware::AppState, router as api_router};
use proplet_common::{CodeStore, Config};
use proplet_core::{
    AccessGate, AlertService, AuditService, ContactVerificationService, ListingService,
    RestPaymentClient, UnlockService, VerificationService, email_sender_from_config,
    whatsapp_sender_from_config,
};
use proplet_db::repositories::{
    AlertRepository, AuditRepository, PropertyRepository, UnlockRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proplet=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting proplet server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = proplet_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    proplet_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis for the verification-code store
    let fred_config = fred::types::config::Config::from_url(&config.redis.url)
        .expect("Failed to parse Redis URL");
    let fred_client = fred::clients::Client::new(fred_config, None, None, None);
    fred_client.connect();
    fred_client
        .wait_for_connect()
        .await
        .expect("Failed to connect to Redis");
    let fred_client = Arc::new(fred_client);
    info!("Connected to Redis");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let property_repo = PropertyRepository::new(Arc::clone(&db));
    let unlock_repo = UnlockRepository::new(Arc::clone(&db));
    let alert_repo = AlertRepository::new(Arc::clone(&db));
    let audit_repo = AuditRepository::new(Arc::clone(&db));

    // Initialize outbound transports
    let email_sender = email_sender_from_config(config.email.as_ref())?;
    let whatsapp_sender = whatsapp_sender_from_config(config.whatsapp.as_ref())?;
    let payment_client = Arc::new(RestPaymentClient::new(config.payment.clone())?);

    // Initialize services
    let code_store = CodeStore::new(Arc::clone(&fred_client), &config.redis.prefix);
    let verification_service = VerificationService::new(user_repo.clone(), audit_repo.clone());
    let contact_service = ContactVerificationService::new(
        code_store,
        user_repo.clone(),
        Arc::clone(&email_sender),
        Arc::clone(&whatsapp_sender),
    );
    let access_gate = AccessGate::new(unlock_repo.clone());
    let unlock_service = UnlockService::new(
        unlock_repo.clone(),
        property_repo.clone(),
        payment_client,
        config.payment.clone(),
    );
    let alert_service = AlertService::new(alert_repo, email_sender, whatsapp_sender);
    let listing_service = ListingService::new(
        property_repo.clone(),
        audit_repo.clone(),
        alert_service.clone(),
    );
    let audit_service = AuditService::new(audit_repo);

    // Create app state
    let state = AppState {
        user_repo: user_repo.clone(),
        property_repo,
        verification_service,
        contact_service,
        access_gate,
        unlock_service,
        alert_service,
        listing_service,
        audit_service,
    };

    // Periodic sweep so the stored subscription flag tracks expiry. The
    // access gate re-checks the timestamp on every request regardless.
    let sweep_repo = user_repo;
    let sweep_interval = config.server.subscription_sweep_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));
        interval.tick().await;
        loop {
            interval.tick().await;
            match sweep_repo.sweep_expired_subscriptions().await {
                Ok(swept) if swept > 0 => {
                    info!(swept = swept, "Deactivated expired subscriptions");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Subscription sweep failed"),
            }
        }
    });

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            proplet_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
