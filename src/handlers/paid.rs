use crate::models::{ApiResponse, VerificationOutcome};
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

/// Protected ping: answers only after the payment gate accepted a payment,
/// and echoes what was verified.
pub async fn paid_ping(
    Extension(payment): Extension<VerificationOutcome>,
) -> Json<ApiResponse<VerificationOutcome>> {
    Json(ApiResponse {
        success: true,
        data: payment,
        timestamp: Utc::now(),
        request_id: Uuid::new_v4().to_string(),
    })
}
