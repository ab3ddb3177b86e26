use crate::{
    handlers::*,
    middleware::{x402_middleware_layer, PaymentGate},
    services::{Analytics, ReplayGuard},
};
use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Shared components the router hands to handlers and middleware.
#[derive(Clone)]
pub struct AppServices {
    pub gate: Arc<PaymentGate>,
    pub replay: Arc<ReplayGuard>,
    pub analytics: Arc<Analytics>,
    pub environment: String,
}

pub fn build_router(services: AppServices) -> Router {
    let health_state = HealthState {
        replay: services.replay.clone(),
        analytics: services.analytics.clone(),
        environment: services.environment.clone(),
    };

    Router::new()
        // Public endpoints (no payment required)
        .route("/health", get(health_check))
        .with_state(health_state)
        .route("/stats", get(get_stats))
        .with_state(services.analytics.clone())
        // Protected endpoints (payment required)
        .route(
            "/api/paid/ping",
            get(paid_ping).layer(axum_middleware::from_fn_with_state(
                services.gate.clone(),
                x402_middleware_layer,
            )),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
