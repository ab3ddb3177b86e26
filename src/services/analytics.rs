use crate::models::{ErrorKind, RejectionStats, Stats, VerificationOutcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// In-process counters for the payment gate.
pub struct Analytics {
    challenges: AtomicU64,
    verified: AtomicU64,
    not_found: AtomicU64,
    execution_failed: AtomicU64,
    no_matching_transfer: AtomicU64,
    replay: AtomicU64,
    verification_error: AtomicU64,
    start_time: Instant,
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            challenges: AtomicU64::new(0),
            verified: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            execution_failed: AtomicU64::new(0),
            no_matching_transfer: AtomicU64::new(0),
            replay: AtomicU64::new(0),
            verification_error: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_challenge(&self, resource: &str) {
        self.challenges.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Payment challenge issued for {}", resource);
    }

    pub fn record_outcome(&self, outcome: &VerificationOutcome, resource: &str) {
        let counter = match outcome.error_kind {
            None if outcome.valid => &self.verified,
            None | Some(ErrorKind::VerificationError) => &self.verification_error,
            Some(ErrorKind::NotFound) => &self.not_found,
            Some(ErrorKind::ExecutionFailed) => &self.execution_failed,
            Some(ErrorKind::NoMatchingTransfer) => &self.no_matching_transfer,
            Some(ErrorKind::Replay) => &self.replay,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if outcome.valid {
            tracing::info!(
                "Payment recorded: {} USDC from {} for {}",
                outcome.amount.unwrap_or_default(),
                outcome.sender.as_deref().unwrap_or("unknown"),
                resource
            );
        }
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            challenges_issued: self.challenges.load(Ordering::Relaxed),
            payments_verified: self.verified.load(Ordering::Relaxed),
            rejections: RejectionStats {
                not_found: self.not_found.load(Ordering::Relaxed),
                execution_failed: self.execution_failed.load(Ordering::Relaxed),
                no_matching_transfer: self.no_matching_transfer.load(Ordering::Relaxed),
                replay: self.replay.load(Ordering::Relaxed),
                verification_error: self.verification_error.load(Ordering::Relaxed),
            },
            uptime_seconds: self.uptime_seconds(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}
