//! Payment verification on Solana.
//!
//! Token transfers move funds between token accounts, not wallets, so the
//! destination of every transfer instruction is resolved to its owning wallet
//! through the transaction's post-execution token balances before it is
//! compared with the expected recipient.

use crate::{
    error::VerifyError,
    models::{AssetDescriptor, Chain, ErrorKind, ExpectedPayment, VerificationOutcome},
    services::ChainVerifier,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Program labels the RPC's JSON parser assigns to the SPL token programs.
const TOKEN_PROGRAMS: [&str; 2] = ["spl-token", "spl-token-2022"];

pub struct SolanaVerifier {
    client: reqwest::Client,
    rpc_url: Url,
    asset: AssetDescriptor,
}

impl SolanaVerifier {
    pub fn new(rpc_url: &str, asset: AssetDescriptor, timeout: Duration) -> Result<Self> {
        let rpc_url = Url::parse(rpc_url).with_context(|| format!("Invalid Solana RPC URL: {}", rpc_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Solana RPC client")?;

        Ok(Self {
            client,
            rpc_url,
            asset,
        })
    }

    /// Fetches a confirmed transaction with JSON-parsed instructions.
    /// `None` when the signature is unknown or not yet confirmed.
    pub async fn get_transaction(&self, signature: &str) -> Result<Option<SolanaTransaction>, VerifyError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTransaction",
            "params": [
                signature,
                {
                    "encoding": "jsonParsed",
                    "commitment": "confirmed",
                    "maxSupportedTransactionVersion": 0
                }
            ]
        });

        tracing::debug!(signature, rpc = %self.rpc_url, "Fetching Solana transaction");

        let body = self
            .client
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        match serde_json::from_slice::<JsonRpcResponse>(&body)? {
            JsonRpcResponse::Failure { error } => Err(VerifyError::Rpc {
                code: error.code,
                message: error.message,
            }),
            JsonRpcResponse::Success { result } if result.is_null() => Ok(None),
            JsonRpcResponse::Success { result } => Ok(Some(serde_json::from_value(result)?)),
        }
    }

    /// Looks for a token transfer in `tx` that pays `expected`.
    pub fn find_payment(
        &self,
        tx: &SolanaTransaction,
        expected: &ExpectedPayment,
    ) -> Result<VerificationOutcome, VerifyError> {
        let meta = tx
            .meta
            .as_ref()
            .ok_or_else(|| VerifyError::decode("transaction has no status metadata"))?;

        if let Some(err) = &meta.err {
            return Ok(VerificationOutcome::rejected(ErrorKind::ExecutionFailed).with_detail(err.to_string()));
        }

        let owners = self.token_account_owners(tx, meta)?;
        let minimum = expected.minimum_amount();

        for instruction in tx.all_instructions() {
            let Some(transfer) = TokenTransfer::from_instruction(instruction)? else {
                continue;
            };

            if let Some(mint) = &transfer.mint {
                if mint != &self.asset.address {
                    tracing::debug!(mint = %mint, "Skipping transfer of another asset");
                    continue;
                }
            }

            let amount = transfer.amount(&self.asset)?;
            if amount < minimum {
                tracing::debug!(%amount, %minimum, "Skipping transfer below minimum");
                continue;
            }

            let owner = owners
                .get(transfer.destination.as_str())
                .copied()
                .unwrap_or(transfer.destination.as_str());

            if owner == expected.recipient {
                return Ok(VerificationOutcome::verified(amount, transfer.source, owner));
            }
        }

        Ok(VerificationOutcome::rejected(ErrorKind::NoMatchingTransfer).with_detail(format!(
            "no transfer of at least {} {} to {}",
            minimum, self.asset.symbol, expected.recipient
        )))
    }

    /// Token account -> owning wallet, for accounts holding the expected asset.
    fn token_account_owners<'a>(
        &self,
        tx: &'a SolanaTransaction,
        meta: &'a TransactionMeta,
    ) -> Result<HashMap<&'a str, &'a str>, VerifyError> {
        let keys = &tx.transaction.message.account_keys;
        let mut owners = HashMap::new();

        for balance in meta.post_token_balances.iter().flatten() {
            if balance.mint != self.asset.address {
                continue;
            }
            let Some(owner) = balance.owner.as_deref() else {
                continue;
            };
            let account = keys.get(balance.account_index).ok_or_else(|| {
                VerifyError::decode(format!(
                    "token balance references account index {} of {}",
                    balance.account_index,
                    keys.len()
                ))
            })?;
            owners.insert(account.pubkey(), owner);
        }

        Ok(owners)
    }
}

#[async_trait]
impl ChainVerifier for SolanaVerifier {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    async fn verify(
        &self,
        reference: &str,
        expected: &ExpectedPayment,
    ) -> Result<VerificationOutcome, VerifyError> {
        let Some(tx) = self.get_transaction(reference).await? else {
            return Ok(VerificationOutcome::rejected(ErrorKind::NotFound));
        };

        self.find_payment(&tx, expected)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonRpcResponse {
    Failure { error: RpcErrorObject },
    Success { result: serde_json::Value },
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// `getTransaction` result in `jsonParsed` encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaTransaction {
    pub meta: Option<TransactionMeta>,
    pub transaction: UiTransaction,
}

impl SolanaTransaction {
    /// Top-level instructions followed by every inner instruction.
    pub fn all_instructions(&self) -> impl Iterator<Item = &UiInstruction> {
        let inner = self
            .meta
            .iter()
            .flat_map(|meta| meta.inner_instructions.iter().flatten())
            .flat_map(|set| set.instructions.iter());

        self.transaction.message.instructions.iter().chain(inner)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    pub err: Option<serde_json::Value>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<InnerInstructions>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalance>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InnerInstructions {
    pub instructions: Vec<UiInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: usize,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiTransaction {
    pub message: UiMessage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub account_keys: Vec<AccountKey>,
    pub instructions: Vec<UiInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AccountKey {
    Parsed { pubkey: String },
    Raw(String),
}

impl AccountKey {
    pub fn pubkey(&self) -> &str {
        match self {
            AccountKey::Parsed { pubkey } => pubkey,
            AccountKey::Raw(pubkey) => pubkey,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UiInstruction {
    Parsed(ParsedInstruction),
    /// Instructions of programs the RPC cannot parse; never a token transfer.
    PartiallyDecoded(serde::de::IgnoredAny),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    pub program: String,
    pub parsed: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ParsedBody {
    #[serde(rename = "type")]
    kind: String,
    info: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TransferInfo {
    source: String,
    destination: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferCheckedInfo {
    source: String,
    destination: String,
    mint: String,
    token_amount: UiTokenAmount,
}

/// A decoded `transfer` or `transferChecked` token instruction.
#[derive(Debug, Clone, PartialEq)]
struct TokenTransfer {
    source: String,
    destination: String,
    /// Only the checked variant names its mint.
    mint: Option<String>,
    raw_amount: Option<String>,
    ui_amount: Option<String>,
}

impl TokenTransfer {
    fn from_instruction(instruction: &UiInstruction) -> Result<Option<Self>, VerifyError> {
        let UiInstruction::Parsed(parsed) = instruction else {
            return Ok(None);
        };
        if !TOKEN_PROGRAMS.contains(&parsed.program.as_str()) {
            return Ok(None);
        }

        let body: ParsedBody = serde_json::from_value(parsed.parsed.clone())
            .map_err(|e| VerifyError::decode(format!("token instruction: {}", e)))?;

        match body.kind.as_str() {
            "transfer" => {
                let info: TransferInfo = serde_json::from_value(body.info)
                    .map_err(|e| VerifyError::decode(format!("transfer instruction: {}", e)))?;
                Ok(Some(Self {
                    source: info.source,
                    destination: info.destination,
                    mint: None,
                    raw_amount: Some(info.amount),
                    ui_amount: None,
                }))
            }
            "transferChecked" => {
                let info: TransferCheckedInfo = serde_json::from_value(body.info)
                    .map_err(|e| VerifyError::decode(format!("transferChecked instruction: {}", e)))?;
                Ok(Some(Self {
                    source: info.source,
                    destination: info.destination,
                    mint: Some(info.mint),
                    raw_amount: info.token_amount.amount,
                    ui_amount: info.token_amount.ui_amount_string,
                }))
            }
            _ => Ok(None),
        }
    }

    fn amount(&self, asset: &AssetDescriptor) -> Result<Decimal, VerifyError> {
        if let Some(raw) = &self.raw_amount {
            let raw: u128 = raw
                .parse()
                .map_err(|_| VerifyError::decode(format!("invalid token amount: {}", raw)))?;
            return asset
                .to_decimal(raw)
                .ok_or_else(|| VerifyError::decode(format!("token amount out of range: {}", raw)));
        }

        match &self.ui_amount {
            Some(ui) => Decimal::from_str(ui).map_err(|_| VerifyError::decode(format!("invalid token amount: {}", ui))),
            None => Err(VerifyError::decode("transfer carries no amount")),
        }
    }
}
