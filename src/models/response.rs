use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub consumed_references: usize,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub challenges_issued: u64,
    pub payments_verified: u64,
    pub rejections: RejectionStats,
    pub uptime_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RejectionStats {
    pub not_found: u64,
    pub execution_failed: u64,
    pub no_matching_transfer: u64,
    pub replay: u64,
    pub verification_error: u64,
}
