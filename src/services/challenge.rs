use crate::{
    middleware::extract::{CHAIN_HEADER, PAYMENT_HEADER, PAYMENT_HEADER_ALIAS},
    models::{
        AcceptedHeaders, Chain, ChallengeDescriptor, PaymentOption, PaymentWallets, SupportedAssets,
    },
};
use rust_decimal::Decimal;
use serde_json::json;

/// How long a client has to land its payment before retrying.
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Builds "payment required" descriptors. Holds only constant configuration.
#[derive(Debug, Clone)]
pub struct ChallengeBuilder {
    assets: SupportedAssets,
}

impl ChallengeBuilder {
    pub fn new(assets: SupportedAssets) -> Self {
        Self { assets }
    }

    pub fn build(
        &self,
        resource_id: &str,
        description: &str,
        price: Decimal,
        wallets: &PaymentWallets,
        output_schema: Option<serde_json::Value>,
    ) -> ChallengeDescriptor {
        let accepts = Chain::ALL
            .iter()
            .map(|chain| self.payment_option(*chain, price, wallets.for_chain(*chain)))
            .collect();

        ChallengeDescriptor {
            x402_version: 1,
            error: format!("{} header is required", PAYMENT_HEADER),
            resource: resource_id.to_string(),
            description: description.to_string(),
            price,
            output_schema,
            accepts,
            headers: AcceptedHeaders {
                payment: vec![PAYMENT_HEADER.to_string(), PAYMENT_HEADER_ALIAS.to_string()],
                optional: vec![CHAIN_HEADER.to_string()],
            },
        }
    }

    fn payment_option(&self, chain: Chain, price: Decimal, pay_to: &str) -> PaymentOption {
        let asset = self.assets.for_chain(chain);
        let atomic = asset
            .to_atomic(price)
            .map(|units| units.to_string())
            .unwrap_or_else(|| price.to_string());

        let (network, extra) = match chain {
            Chain::Solana => (
                chain.as_str().to_string(),
                json!({
                    "tokenProgram": "spl-token",
                    "commitment": "confirmed",
                    "reference": "transaction signature (base58)"
                }),
            ),
            Chain::Base => (
                if self.assets.base_chain_id == crate::models::BASE_SEPOLIA_CHAIN_ID {
                    "base-sepolia".to_string()
                } else {
                    "base".to_string()
                },
                json!({
                    "chainId": self.assets.base_chain_id,
                    "tokenStandard": "erc20",
                    "reference": "transaction hash (0x-prefixed)"
                }),
            ),
        };

        PaymentOption {
            scheme: "exact".to_string(),
            network,
            chain,
            pay_to: pay_to.to_string(),
            asset: asset.address.clone(),
            decimals: asset.decimals,
            max_amount_required: atomic,
            max_timeout_seconds: MAX_TIMEOUT_SECONDS,
            extra,
        }
    }
}
