use crate::{
    error::VerifyError,
    models::{AssetDescriptor, Chain, ErrorKind, ExpectedPayment, VerificationOutcome},
    services::ChainVerifier,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    types::{Address, Log, TransactionReceipt, H256},
    utils::{keccak256, to_checksum},
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";

pub struct EvmVerifier {
    provider: Provider<Http>,
    asset: AssetDescriptor,
    token: Address,
    transfer_topic: H256,
}

impl EvmVerifier {
    pub fn new(rpc_url: &str, asset: AssetDescriptor, timeout: Duration) -> Result<Self> {
        let url = Url::parse(rpc_url).with_context(|| format!("Invalid Base RPC URL: {}", rpc_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Base RPC client")?;
        let provider = Provider::new(Http::new_with_client(url, client));

        let token = parse_address(&asset.address)
            .with_context(|| format!("Invalid token contract address: {}", asset.address))?;

        Ok(Self {
            provider,
            asset,
            token,
            transfer_topic: H256::from(keccak256(TRANSFER_EVENT)),
        })
    }

    pub async fn get_receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>, VerifyError> {
        tracing::debug!(tx_hash = ?tx_hash, "Fetching Base transaction receipt");
        Ok(self.provider.get_transaction_receipt(tx_hash).await?)
    }

    /// Looks for an ERC-20 Transfer log in `receipt` that pays `expected`.
    pub fn find_payment(
        &self,
        receipt: &TransactionReceipt,
        expected: &ExpectedPayment,
    ) -> Result<VerificationOutcome, VerifyError> {
        if receipt.block_number.is_none() {
            return Ok(VerificationOutcome::rejected(ErrorKind::NotFound).with_detail("transaction is still pending"));
        }

        if receipt.status != Some(1.into()) {
            return Ok(VerificationOutcome::rejected(ErrorKind::ExecutionFailed).with_detail("transaction reverted"));
        }

        let recipient = parse_address(&expected.recipient)
            .ok_or_else(|| VerifyError::decode(format!("invalid recipient address: {}", expected.recipient)))?;
        let minimum = expected.minimum_amount();

        for log in receipt.logs.iter().filter(|log| self.is_token_transfer(log)) {
            let transfer = self.decode_transfer(log)?;

            if transfer.amount < minimum {
                tracing::debug!(amount = %transfer.amount, %minimum, "Skipping transfer below minimum");
                continue;
            }
            if transfer.to != recipient {
                continue;
            }

            return Ok(VerificationOutcome::verified(
                transfer.amount,
                to_checksum(&transfer.from, None),
                to_checksum(&transfer.to, None),
            ));
        }

        Ok(VerificationOutcome::rejected(ErrorKind::NoMatchingTransfer).with_detail(format!(
            "no transfer of at least {} {} to {}",
            minimum,
            self.asset.symbol,
            to_checksum(&recipient, None)
        )))
    }

    fn is_token_transfer(&self, log: &Log) -> bool {
        log.address == self.token && log.topics.first() == Some(&self.transfer_topic)
    }

    fn decode_transfer(&self, log: &Log) -> Result<TokenTransfer, VerifyError> {
        if log.topics.len() != 3 {
            return Err(VerifyError::decode(format!(
                "Transfer log with {} topics",
                log.topics.len()
            )));
        }
        if log.data.len() != 32 {
            return Err(VerifyError::decode(format!(
                "Transfer log with {} data bytes",
                log.data.len()
            )));
        }

        let from = Address::from(log.topics[1]);
        let to = Address::from(log.topics[2]);
        let raw = U256::from_big_endian(&log.data);

        let amount = to_u128(raw)
            .and_then(|raw| self.asset.to_decimal(raw))
            .ok_or_else(|| VerifyError::decode(format!("transfer amount out of range: {}", raw)))?;

        Ok(TokenTransfer { from, to, amount })
    }
}

#[async_trait]
impl ChainVerifier for EvmVerifier {
    fn chain(&self) -> Chain {
        Chain::Base
    }

    async fn verify(
        &self,
        reference: &str,
        expected: &ExpectedPayment,
    ) -> Result<VerificationOutcome, VerifyError> {
        let tx_hash = H256::from_str(reference.strip_prefix("0x").unwrap_or(reference))
            .map_err(|e| VerifyError::decode(format!("invalid transaction hash: {}", e)))?;

        let Some(receipt) = self.get_receipt(tx_hash).await? else {
            return Ok(VerificationOutcome::rejected(ErrorKind::NotFound));
        };

        self.find_payment(&receipt, expected)
    }
}

#[derive(Debug)]
struct TokenTransfer {
    from: Address,
    to: Address,
    amount: Decimal,
}

fn parse_address(value: &str) -> Option<Address> {
    Address::from_str(value.trim_start_matches("0x")).ok()
}

fn to_u128(value: U256) -> Option<u128> {
    (value.bits() <= 128).then(|| value.as_u128())
}
