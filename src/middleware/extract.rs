//! Reads the payment reference a client attached to a request.

use crate::models::{is_base58, Chain, PaymentReference};
use axum::http::HeaderMap;

pub const PAYMENT_HEADER: &str = "X-Payment";
pub const PAYMENT_HEADER_ALIAS: &str = "X-Payment-Proof";
pub const CHAIN_HEADER: &str = "X-Payment-Chain";

/// Returns `None` when no reference is present or its chain cannot be told.
pub fn extract_payment(headers: &HeaderMap) -> Option<PaymentReference> {
    let reference = header_value(headers, PAYMENT_HEADER).or_else(|| header_value(headers, PAYMENT_HEADER_ALIAS))?;

    let hinted = header_value(headers, CHAIN_HEADER).and_then(|hint| hint.parse::<Chain>().ok());
    let chain = hinted.or_else(|| infer_chain(reference))?;

    Some(PaymentReference::new(reference, chain))
}

/// Chain implied by the shape of a reference alone.
pub fn infer_chain(reference: &str) -> Option<Chain> {
    if reference.starts_with("0x") && reference.len() == 66 {
        return Some(Chain::Base);
    }
    if (86..=88).contains(&reference.len()) && is_base58(reference) {
        return Some(Chain::Solana);
    }
    None
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
