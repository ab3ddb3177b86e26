use crate::models::{is_base58, PaymentWallets, SupportedAssets};
use anyhow::{bail, Context, Result};
use ethers::types::Address;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

impl Environment {
    pub fn assets(&self) -> SupportedAssets {
        match self {
            Environment::Production => SupportedAssets::mainnet(),
            Environment::Development | Environment::Testnet => SupportedAssets::testnet(),
        }
    }

    fn default_solana_rpc(&self) -> &'static str {
        match self {
            Environment::Production => "https://api.mainnet-beta.solana.com",
            Environment::Development | Environment::Testnet => "https://api.devnet.solana.com",
        }
    }

    fn default_base_rpc(&self) -> &'static str {
        match self {
            Environment::Production => "https://mainnet.base.org",
            Environment::Development | Environment::Testnet => "https://sepolia.base.org",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Chain RPC endpoints (read-only)
    pub solana_rpc_url: String,
    pub base_rpc_url: String,
    pub rpc_timeout: Duration,

    // Where payments go and what they must carry
    pub wallets: PaymentWallets,
    pub assets: SupportedAssets,
    pub price_usdc: Decimal,
    pub tolerance_percent: Decimal,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = Self::parse_environment(&var("ENVIRONMENT", "development"))?;

        let base_recipient = lookup("BASE_RECIPIENT_ADDRESS").context("BASE_RECIPIENT_ADDRESS required")?;
        Address::from_str(base_recipient.trim_start_matches("0x"))
            .with_context(|| format!("Invalid address for BASE_RECIPIENT_ADDRESS: {}", base_recipient))?;

        let config = Self {
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "8080").parse().context("Invalid PORT")?,

            solana_rpc_url: var("SOLANA_RPC_URL", environment.default_solana_rpc()),
            base_rpc_url: var("BASE_RPC_URL", environment.default_base_rpc()),
            rpc_timeout: Duration::from_secs(
                var("RPC_TIMEOUT_SECS", "30")
                    .parse()
                    .context("Invalid RPC_TIMEOUT_SECS")?,
            ),

            wallets: PaymentWallets {
                solana: lookup("SOLANA_RECIPIENT_ADDRESS").context("SOLANA_RECIPIENT_ADDRESS required")?,
                base: base_recipient,
            },
            assets: environment.assets(),
            price_usdc: Decimal::from_str(&var("PRICE_USDC", "0.01")).context("Invalid PRICE_USDC")?,
            tolerance_percent: Decimal::from_str(&var("PAYMENT_TOLERANCE_PERCENT", "2"))
                .context("Invalid PAYMENT_TOLERANCE_PERCENT")?,

            environment,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment(env: &str) -> Result<Environment> {
        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        check_rpc_url("SOLANA_RPC_URL", &self.solana_rpc_url)?;
        check_rpc_url("BASE_RPC_URL", &self.base_rpc_url)?;

        let solana = &self.wallets.solana;
        if !(32..=44).contains(&solana.len()) || !is_base58(solana) {
            bail!("SOLANA_RECIPIENT_ADDRESS must be a base58 public key");
        }

        if self.price_usdc <= Decimal::ZERO {
            bail!("PRICE_USDC must be positive");
        }
        if self.tolerance_percent < Decimal::ZERO || self.tolerance_percent >= Decimal::ONE_HUNDRED {
            bail!("PAYMENT_TOLERANCE_PERCENT must be within [0, 100)");
        }
        if self.rpc_timeout.is_zero() {
            bail!("RPC_TIMEOUT_SECS must be positive");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}

fn check_rpc_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("Invalid URL for {}: {}", name, value))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{} must be an HTTP(S) URL, got scheme {}", name, url.scheme());
    }
    Ok(())
}
