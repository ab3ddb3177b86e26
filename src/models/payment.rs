use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two ledgers a payment can be presented on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Account-model chain: references are base58 transaction signatures.
    Solana,
    /// EVM chain: references are `0x`-prefixed 32-byte transaction hashes.
    Base,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Solana, Chain::Base];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Base => "base",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solana" => Ok(Chain::Solana),
            "base" => Ok(Chain::Base),
            other => Err(format!("Unsupported chain: {}", other)),
        }
    }
}

/// Transaction reference presented by a client as proof of payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReference {
    pub reference: String,
    pub chain: Chain,
}

impl PaymentReference {
    pub fn new(reference: impl Into<String>, chain: Chain) -> Self {
        Self {
            reference: reference.into(),
            chain,
        }
    }

    /// The one spelling of this reference used as its replay key and sent to the RPC.
    ///
    /// Base hashes take at most one `0x` prefix and any hex case, and come out as
    /// lowercase `0x` + 64 hex digits. Solana signatures are case-sensitive base58
    /// and are kept as given. `None` when the reference cannot name a transaction
    /// on its chain.
    pub fn canonical(&self) -> Option<String> {
        let reference = self.reference.trim();
        match self.chain {
            Chain::Base => {
                let hex = reference.strip_prefix("0x").unwrap_or(reference);
                (hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| format!("0x{}", hex.to_ascii_lowercase()))
            }
            Chain::Solana => (!reference.is_empty() && is_base58(reference)).then(|| reference.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown to the chain or not yet confirmed.
    NotFound,
    /// Confirmed, but reverted or errored on-chain.
    ExecutionFailed,
    /// Confirmed, but no transfer satisfies recipient, amount and asset.
    NoMatchingTransfer,
    /// Already consumed by an earlier successful verification.
    Replay,
    /// RPC timeout, transport failure or a payload that failed to decode.
    VerificationError,
}

impl ErrorKind {
    /// Whether the same reference may succeed if presented again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::NotFound | ErrorKind::VerificationError)
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "PAYMENT_NOT_FOUND",
            ErrorKind::ExecutionFailed => "PAYMENT_EXECUTION_FAILED",
            ErrorKind::NoMatchingTransfer => "PAYMENT_NO_MATCHING_TRANSFER",
            ErrorKind::Replay => "PAYMENT_REPLAYED",
            ErrorKind::VerificationError => "PAYMENT_VERIFICATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "transaction not found or not yet confirmed",
            ErrorKind::ExecutionFailed => "transaction failed on-chain",
            ErrorKind::NoMatchingTransfer => "no qualifying transfer in transaction",
            ErrorKind::Replay => "payment reference already used",
            ErrorKind::VerificationError => "payment could not be verified",
        };
        f.write_str(s)
    }
}

/// Result of one verification attempt. Never mutated after it is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl VerificationOutcome {
    pub fn verified(amount: Decimal, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            valid: true,
            amount: Some(amount),
            sender: Some(sender.into()),
            recipient: Some(recipient.into()),
            error_kind: None,
            error_detail: None,
        }
    }

    pub fn rejected(kind: ErrorKind) -> Self {
        Self {
            valid: false,
            amount: None,
            sender: None,
            recipient: None,
            error_kind: Some(kind),
            error_detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.error_detail = Some(detail.into());
        self
    }
}

/// What a transaction must contain to pay for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedPayment {
    pub recipient: String,
    pub amount: Decimal,
    pub tolerance_percent: Decimal,
}

impl ExpectedPayment {
    pub fn new(recipient: impl Into<String>, amount: Decimal, tolerance_percent: Decimal) -> Self {
        Self {
            recipient: recipient.into(),
            amount,
            tolerance_percent,
        }
    }

    /// Smallest amount still accepted: `amount * (1 - tolerance / 100)`.
    pub fn minimum_amount(&self) -> Decimal {
        self.amount * (Decimal::ONE - self.tolerance_percent / Decimal::ONE_HUNDRED)
    }

    pub fn is_sufficient(&self, received: Decimal) -> bool {
        received >= self.minimum_amount()
    }
}

/// A stablecoin deployment on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub chain: Chain,
    /// Mint address on Solana, ERC-20 contract address on Base.
    pub address: String,
    pub decimals: u32,
    pub symbol: String,
}

impl AssetDescriptor {
    pub fn new(chain: Chain, address: impl Into<String>, decimals: u32) -> Self {
        Self {
            chain,
            address: address.into(),
            decimals,
            symbol: "USDC".to_string(),
        }
    }

    /// Decimal value of `raw` atomic units. `None` when it cannot be represented.
    pub fn to_decimal(&self, raw: u128) -> Option<Decimal> {
        let raw = i128::try_from(raw).ok()?;
        Decimal::try_from_i128_with_scale(raw, self.decimals).ok()
    }

    /// Atomic units for a decimal amount, truncating anything below one unit.
    pub fn to_atomic(&self, amount: Decimal) -> Option<u128> {
        let scale = Decimal::from(10u64.checked_pow(self.decimals)?);
        amount.checked_mul(scale)?.trunc().to_u128()
    }
}

/// Bitcoin-style base58 alphabet used by Solana keys and signatures.
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

pub fn is_base58(value: &str) -> bool {
    value.chars().all(|c| BASE58_ALPHABET.contains(c))
}

pub const SOLANA_USDC_MAINNET: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const SOLANA_USDC_DEVNET: &str = "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU";
pub const BASE_USDC_MAINNET: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
pub const BASE_USDC_SEPOLIA: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";
pub const BASE_MAINNET_CHAIN_ID: u64 = 8453;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

/// The stablecoin accepted on each chain, plus EVM chain id for clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedAssets {
    pub solana: AssetDescriptor,
    pub base: AssetDescriptor,
    pub base_chain_id: u64,
}

impl SupportedAssets {
    pub fn mainnet() -> Self {
        Self {
            solana: AssetDescriptor::new(Chain::Solana, SOLANA_USDC_MAINNET, 6),
            base: AssetDescriptor::new(Chain::Base, BASE_USDC_MAINNET, 6),
            base_chain_id: BASE_MAINNET_CHAIN_ID,
        }
    }

    pub fn testnet() -> Self {
        Self {
            solana: AssetDescriptor::new(Chain::Solana, SOLANA_USDC_DEVNET, 6),
            base: AssetDescriptor::new(Chain::Base, BASE_USDC_SEPOLIA, 6),
            base_chain_id: BASE_SEPOLIA_CHAIN_ID,
        }
    }

    pub fn for_chain(&self, chain: Chain) -> &AssetDescriptor {
        match chain {
            Chain::Solana => &self.solana,
            Chain::Base => &self.base,
        }
    }
}

/// Service wallet that receives payments on each chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentWallets {
    pub solana: String,
    pub base: String,
}

impl PaymentWallets {
    pub fn for_chain(&self, chain: Chain) -> &str {
        match chain {
            Chain::Solana => &self.solana,
            Chain::Base => &self.base,
        }
    }
}
