use crate::{
    error::GatewayError,
    middleware::extract::extract_payment,
    models::{PaymentWallets, VerificationOutcome},
    services::{Analytics, ChallengeBuilder, PaymentVerifier},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Everything a protected route needs to demand and check payment.
pub struct PaymentGate {
    verifier: Arc<PaymentVerifier>,
    challenges: ChallengeBuilder,
    wallets: PaymentWallets,
    price: Decimal,
    description: String,
    analytics: Arc<Analytics>,
}

impl PaymentGate {
    pub fn new(
        verifier: Arc<PaymentVerifier>,
        challenges: ChallengeBuilder,
        wallets: PaymentWallets,
        price: Decimal,
        analytics: Arc<Analytics>,
    ) -> Self {
        Self {
            verifier,
            challenges,
            wallets,
            price,
            description: "Pay-per-call API access".to_string(),
            analytics,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Extract, then challenge or verify. `Ok` only for a freshly verified payment.
    pub async fn check(
        &self,
        resource: &str,
        headers: &axum::http::HeaderMap,
    ) -> Result<VerificationOutcome, GatewayError> {
        let Some(payment) = extract_payment(headers) else {
            self.analytics.record_challenge(resource);
            let challenge = self
                .challenges
                .build(resource, &self.description, self.price, &self.wallets, None);
            return Err(GatewayError::PaymentRequired(Box::new(challenge)));
        };

        let recipient = self.wallets.for_chain(payment.chain);
        let outcome = self.verifier.verify(&payment, recipient, self.price).await;
        self.analytics.record_outcome(&outcome, resource);

        if outcome.valid {
            Ok(outcome)
        } else {
            Err(GatewayError::PaymentVerificationFailed(Box::new(outcome)))
        }
    }
}

// Axum middleware function
pub async fn x402_middleware_layer(
    State(gate): State<Arc<PaymentGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let resource = request.uri().path().to_string();
    let outcome = gate.check(&resource, request.headers()).await?;

    // Handlers can read the verified payment from extensions
    request.extensions_mut().insert(outcome);

    Ok(next.run(request).await)
}
