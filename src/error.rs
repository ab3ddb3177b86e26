use crate::models::{ChallengeDescriptor, ErrorKind, VerificationOutcome};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Failures inside a chain verifier. Never crosses the verifier boundary:
/// the orchestrator turns every one of these into a `VerificationError` outcome.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("RPC provider error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    Decode(String),
}

impl VerifyError {
    pub fn decode(detail: impl Into<String>) -> Self {
        VerifyError::Decode(detail.into())
    }
}

impl From<serde_json::Error> for VerifyError {
    fn from(err: serde_json::Error) -> Self {
        VerifyError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Payment required: {} USDC", .0.price)]
    PaymentRequired(Box<ChallengeDescriptor>),

    #[error("Payment verification failed: {}", describe_outcome(.0))]
    PaymentVerificationFailed(Box<VerificationOutcome>),
}

fn describe_outcome(outcome: &VerificationOutcome) -> String {
    let kind = outcome
        .error_kind
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    match &outcome.error_detail {
        Some(detail) => format!("{}: {}", kind, detail),
        None => kind,
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_required: Option<ChallengeDescriptor>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationOutcome>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let error = self.to_string();

        let (status, error_code, retryable, payment_required, verification) = match self {
            GatewayError::PaymentRequired(challenge) => (
                StatusCode::PAYMENT_REQUIRED,
                "PAYMENT_REQUIRED",
                None,
                Some(*challenge),
                None,
            ),
            GatewayError::PaymentVerificationFailed(outcome) => {
                let kind = outcome.error_kind.unwrap_or(ErrorKind::VerificationError);
                let status = match kind {
                    ErrorKind::VerificationError => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::PAYMENT_REQUIRED,
                };
                (status, kind.code(), Some(kind.is_retryable()), None, Some(*outcome))
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %error, error_code = error_code, request_id = %request_id, "Request failed");
        } else {
            tracing::warn!(error = %error, error_code = error_code, request_id = %request_id, "Request rejected");
        }

        let body = ErrorResponse {
            success: false,
            error,
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
            retryable,
            payment_required,
            verification,
        };

        (status, Json(body)).into_response()
    }
}
