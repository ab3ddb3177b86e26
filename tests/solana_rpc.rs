mod common;

use common::*;
use mockito::Matcher;
use pay_gate::{
    models::{Chain, ErrorKind, ExpectedPayment, PaymentReference},
    services::{ChainVerifier, EvmVerifier, PaymentVerifier, ReplayGuard, SolanaVerifier},
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn expected() -> ExpectedPayment {
    ExpectedPayment::new(SERVICE_SOLANA_WALLET, Decimal::new(1, 2), Decimal::from(2))
}

fn solana(url: &str, timeout: Duration) -> SolanaVerifier {
    SolanaVerifier::new(url, solana_usdc(), timeout).unwrap()
}

fn orchestrator(solana_url: &str, replay: Arc<ReplayGuard>) -> PaymentVerifier {
    let base = EvmVerifier::new("http://127.0.0.1:1", base_usdc(), Duration::from_secs(1)).unwrap();
    PaymentVerifier::new(
        replay,
        Arc::new(solana(solana_url, Duration::from_secs(5))),
        Arc::new(base),
    )
    .unwrap()
}

async fn mock_get_transaction(server: &mut mockito::ServerGuard, body: String) -> mockito::Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": "getTransaction" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_transfer_to_service_token_account() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_get_transaction(&mut server, rpc_result(solana_transfer(SERVICE_TOKEN_ACCOUNT, 10_000))).await;

    let outcome = solana(&server.url(), Duration::from_secs(5))
        .verify(SIGNATURE, &expected())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(outcome.valid);
    assert_eq!(outcome.amount, Some(Decimal::new(1, 2)));
    assert_eq!(outcome.sender.as_deref(), Some(PAYER_TOKEN_ACCOUNT));
    assert_eq!(outcome.recipient.as_deref(), Some(SERVICE_SOLANA_WALLET));
}

#[tokio::test]
async fn test_transfer_to_unrelated_token_account() {
    let mut server = mockito::Server::new_async().await;
    mock_get_transaction(&mut server, rpc_result(solana_transfer(STRANGER_TOKEN_ACCOUNT, 10_000))).await;

    let outcome = solana(&server.url(), Duration::from_secs(5))
        .verify(SIGNATURE, &expected())
        .await
        .unwrap();

    assert!(!outcome.valid);
    assert_eq!(outcome.error_kind, Some(ErrorKind::NoMatchingTransfer));
}

#[tokio::test]
async fn test_amount_threshold() {
    for (raw, valid) in [(9_799u64, false), (9_800, true), (10_000, true), (250_000, true)] {
        let mut server = mockito::Server::new_async().await;
        mock_get_transaction(&mut server, rpc_result(solana_transfer(SERVICE_TOKEN_ACCOUNT, raw))).await;

        let outcome = solana(&server.url(), Duration::from_secs(5))
            .verify(SIGNATURE, &expected())
            .await
            .unwrap();

        assert_eq!(outcome.valid, valid, "raw amount {}", raw);
        if !valid {
            assert_eq!(outcome.error_kind, Some(ErrorKind::NoMatchingTransfer));
        }
    }
}

#[tokio::test]
async fn test_unknown_signature() {
    let mut server = mockito::Server::new_async().await;
    mock_get_transaction(&mut server, rpc_result(Value::Null)).await;

    let outcome = solana(&server.url(), Duration::from_secs(5))
        .verify(SIGNATURE, &expected())
        .await
        .unwrap();

    assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_failed_on_chain() {
    let mut tx = solana_transfer(SERVICE_TOKEN_ACCOUNT, 10_000);
    tx["meta"]["err"] = json!({ "InstructionError": [0, { "Custom": 1 }] });

    let mut server = mockito::Server::new_async().await;
    mock_get_transaction(&mut server, rpc_result(tx)).await;

    let outcome = solana(&server.url(), Duration::from_secs(5))
        .verify(SIGNATURE, &expected())
        .await
        .unwrap();

    assert_eq!(outcome.error_kind, Some(ErrorKind::ExecutionFailed));
}

#[tokio::test]
async fn test_rpc_error_becomes_verification_error() {
    let mut server = mockito::Server::new_async().await;
    mock_get_transaction(&mut server, rpc_error(-32602, "Invalid param: WrongSize")).await;

    let replay = Arc::new(ReplayGuard::new());
    let outcome = orchestrator(&server.url(), replay.clone())
        .verify(&PaymentReference::new(SIGNATURE, Chain::Solana), SERVICE_SOLANA_WALLET, Decimal::new(1, 2))
        .await;

    assert!(!outcome.valid);
    assert_eq!(outcome.error_kind, Some(ErrorKind::VerificationError));
    assert!(outcome.error_detail.unwrap().contains("WrongSize"));
    assert!(!replay.has_been_used(SIGNATURE));
}

#[tokio::test]
async fn test_garbage_payload_becomes_verification_error() {
    let mut server = mockito::Server::new_async().await;
    mock_get_transaction(&mut server, rpc_result(json!({ "slot": "not-a-number" }))).await;

    let outcome = orchestrator(&server.url(), Arc::new(ReplayGuard::new()))
        .verify(&PaymentReference::new(SIGNATURE, Chain::Solana), SERVICE_SOLANA_WALLET, Decimal::new(1, 2))
        .await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::VerificationError));
}

#[tokio::test]
async fn test_second_use_is_replay_without_rpc() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rpc_result(solana_transfer(SERVICE_TOKEN_ACCOUNT, 10_000)))
        .expect(1)
        .create_async()
        .await;

    let verifier = orchestrator(&server.url(), Arc::new(ReplayGuard::new()));
    let payment = PaymentReference::new(SIGNATURE, Chain::Solana);

    let first = verifier.verify(&payment, SERVICE_SOLANA_WALLET, Decimal::new(1, 2)).await;
    let second = verifier.verify(&payment, SERVICE_SOLANA_WALLET, Decimal::new(1, 2)).await;

    assert!(first.valid);
    assert!(!second.valid);
    assert_eq!(second.error_kind, Some(ErrorKind::Replay));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_timeout_is_retryable() {
    let url = silent_rpc_endpoint().await;
    let replay = Arc::new(ReplayGuard::new());
    let base = EvmVerifier::new("http://127.0.0.1:1", base_usdc(), Duration::from_secs(1)).unwrap();
    let verifier = PaymentVerifier::new(
        replay.clone(),
        Arc::new(solana(&url, Duration::from_millis(200))),
        Arc::new(base),
    )
    .unwrap();

    let outcome = verifier
        .verify(&PaymentReference::new(SIGNATURE, Chain::Solana), SERVICE_SOLANA_WALLET, Decimal::new(1, 2))
        .await;

    assert_eq!(outcome.error_kind, Some(ErrorKind::VerificationError));
    assert!(outcome.error_kind.unwrap().is_retryable());
    assert!(!replay.has_been_used(SIGNATURE));
}

#[tokio::test]
async fn test_per_call_tolerance() {
    let cases = [
        (9_800u64, Decimal::ZERO, false),
        (9_600, Decimal::from(5), true),
        (9_499, Decimal::from(5), false),
    ];

    for (raw, tolerance, valid) in cases {
        let mut server = mockito::Server::new_async().await;
        mock_get_transaction(&mut server, rpc_result(solana_transfer(SERVICE_TOKEN_ACCOUNT, raw))).await;

        let outcome = orchestrator(&server.url(), Arc::new(ReplayGuard::new()))
            .verify_with_tolerance(
                &PaymentReference::new(SIGNATURE, Chain::Solana),
                SERVICE_SOLANA_WALLET,
                Decimal::new(1, 2),
                tolerance,
            )
            .await;

        assert_eq!(outcome.valid, valid, "raw {} at {}%", raw, tolerance);
        if !valid {
            assert_eq!(outcome.error_kind, Some(ErrorKind::NoMatchingTransfer));
        }
    }
}
