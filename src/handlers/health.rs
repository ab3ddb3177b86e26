use crate::{
    models::HealthStatus,
    services::{Analytics, ReplayGuard},
};
use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct HealthState {
    pub replay: Arc<ReplayGuard>,
    pub analytics: Arc<Analytics>,
    pub environment: String,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.environment.clone(),
        consumed_references: state.replay.len(),
        uptime_seconds: state.analytics.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
