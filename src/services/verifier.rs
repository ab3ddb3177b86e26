use crate::{
    config::Config,
    error::VerifyError,
    models::{Chain, ErrorKind, ExpectedPayment, PaymentReference, VerificationOutcome},
    services::{EvmVerifier, ReplayGuard, SolanaVerifier},
};
use anyhow::{ensure, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

pub const DEFAULT_TOLERANCE_PERCENT: Decimal = Decimal::TWO;

/// Confirms on one chain that a transaction paid the expected recipient.
///
/// Implementations report on-chain facts through the returned outcome
/// (`NotFound`, `ExecutionFailed`, `NoMatchingTransfer` or success) and
/// infrastructure trouble through `Err`.
#[async_trait]
pub trait ChainVerifier: Send + Sync {
    fn chain(&self) -> Chain;

    async fn verify(
        &self,
        reference: &str,
        expected: &ExpectedPayment,
    ) -> Result<VerificationOutcome, VerifyError>;
}

/// Entry point for every protected route: replay check, chain dispatch,
/// replay commit.
pub struct PaymentVerifier {
    replay: Arc<ReplayGuard>,
    solana: Arc<dyn ChainVerifier>,
    base: Arc<dyn ChainVerifier>,
    default_tolerance: Decimal,
}

impl PaymentVerifier {
    pub fn new(
        replay: Arc<ReplayGuard>,
        solana: Arc<dyn ChainVerifier>,
        base: Arc<dyn ChainVerifier>,
    ) -> Result<Self> {
        for (slot, verifier) in [(Chain::Solana, &solana), (Chain::Base, &base)] {
            ensure!(
                verifier.chain() == slot,
                "{} verifier registered in the {} slot",
                verifier.chain(),
                slot
            );
        }

        Ok(Self {
            replay,
            solana,
            base,
            default_tolerance: DEFAULT_TOLERANCE_PERCENT,
        })
    }

    pub fn from_config(config: &Config, replay: Arc<ReplayGuard>) -> Result<Self> {
        let solana = SolanaVerifier::new(
            &config.solana_rpc_url,
            config.assets.solana.clone(),
            config.rpc_timeout,
        )?;
        let base = EvmVerifier::new(&config.base_rpc_url, config.assets.base.clone(), config.rpc_timeout)?;

        tracing::info!(
            "Payment verifier initialized (solana={}, base={}, tolerance={}%)",
            config.solana_rpc_url,
            config.base_rpc_url,
            config.tolerance_percent
        );

        Ok(Self::new(replay, Arc::new(solana), Arc::new(base))?.with_tolerance(config.tolerance_percent))
    }

    pub fn with_tolerance(mut self, tolerance_percent: Decimal) -> Self {
        self.default_tolerance = tolerance_percent;
        self
    }

    /// Verifies with the configured default tolerance.
    pub async fn verify(
        &self,
        payment: &PaymentReference,
        recipient: &str,
        amount: Decimal,
    ) -> VerificationOutcome {
        self.verify_with_tolerance(payment, recipient, amount, self.default_tolerance)
            .await
    }

    pub async fn verify_with_tolerance(
        &self,
        payment: &PaymentReference,
        recipient: &str,
        amount: Decimal,
        tolerance_percent: Decimal,
    ) -> VerificationOutcome {
        // Every spelling of one transaction shares this key
        let Some(reference) = payment.canonical() else {
            tracing::warn!(reference = %payment.reference, chain = %payment.chain, "Malformed payment reference");
            return VerificationOutcome::rejected(ErrorKind::VerificationError)
                .with_detail(format!("not a {} transaction reference: {}", payment.chain, payment.reference));
        };
        let reference = reference.as_str();

        if self.replay.has_been_used(reference) {
            tracing::warn!(reference, chain = %payment.chain, "Rejected replayed payment reference");
            return VerificationOutcome::rejected(ErrorKind::Replay);
        }

        let expected = ExpectedPayment::new(recipient, amount, tolerance_percent);
        let verifier = self.verifier_for(payment.chain);

        let outcome = match verifier.verify(reference, &expected).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(reference, chain = %payment.chain, error = %e, "Payment verification errored");
                return VerificationOutcome::rejected(ErrorKind::VerificationError).with_detail(e.to_string());
            }
        };

        if !outcome.valid {
            tracing::warn!(
                reference,
                chain = %payment.chain,
                kind = ?outcome.error_kind,
                detail = outcome.error_detail.as_deref().unwrap_or(""),
                "Payment rejected"
            );
            return outcome;
        }

        // Commit before handing the outcome back; losing the insert means a
        // concurrent request with the same reference already won.
        if !self.replay.mark_used(reference) {
            tracing::warn!(reference, chain = %payment.chain, "Concurrent replay of payment reference");
            return VerificationOutcome::rejected(ErrorKind::Replay);
        }

        tracing::info!(
            reference,
            chain = %payment.chain,
            amount = ?outcome.amount,
            sender = outcome.sender.as_deref().unwrap_or(""),
            "Payment verified"
        );

        outcome
    }

    fn verifier_for(&self, chain: Chain) -> &Arc<dyn ChainVerifier> {
        match chain {
            Chain::Solana => &self.solana,
            Chain::Base => &self.base,
        }
    }
}
