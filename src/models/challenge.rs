use crate::models::Chain;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of a "payment required" response: what to pay, where, and how to
/// present the proof on retry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDescriptor {
    pub x402_version: u8,
    pub error: String,
    pub resource: String,
    pub description: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    pub accepts: Vec<PaymentOption>,
    pub headers: AcceptedHeaders,
}

impl ChallengeDescriptor {
    pub fn option_for(&self, chain: Chain) -> Option<&PaymentOption> {
        self.accepts.iter().find(|option| option.chain == chain)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    pub scheme: String,
    pub network: String,
    pub chain: Chain,
    pub pay_to: String,
    pub asset: String,
    pub decimals: u32,
    /// Required amount in the asset's atomic units.
    pub max_amount_required: String,
    pub max_timeout_seconds: u64,
    pub extra: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedHeaders {
    /// Either name carries the transaction reference.
    pub payment: Vec<String>,
    /// Chain hint; inferred from the reference format when absent.
    pub optional: Vec<String>,
}
