use anyhow::Result;
use pay_gate::{
    config::Config,
    middleware::PaymentGate,
    routes::{build_router, AppServices},
    services::{Analytics, ChallengeBuilder, PaymentVerifier, ReplayGuard},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting pay-gate v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    // One replay guard per process, shared by every verification
    let replay = Arc::new(ReplayGuard::new());
    let analytics = Arc::new(Analytics::new());
    let verifier = Arc::new(PaymentVerifier::from_config(&config, replay.clone())?);

    let gate = Arc::new(
        PaymentGate::new(
            verifier,
            ChallengeBuilder::new(config.assets.clone()),
            config.wallets.clone(),
            config.price_usdc,
            analytics.clone(),
        )
        .with_description(format!("{} USDC per request", config.price_usdc)),
    );

    let app = build_router(AppServices {
        gate,
        replay,
        analytics,
        environment: format!("{:?}", config.environment).to_lowercase(),
    });

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!(
        "Accepting USDC on solana ({}) and base ({})",
        config.wallets.solana,
        config.wallets.base
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}
