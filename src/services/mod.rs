pub mod analytics;
pub mod challenge;
pub mod evm;
pub mod replay;
pub mod solana;
pub mod verifier;

pub use analytics::Analytics;
pub use challenge::ChallengeBuilder;
pub use evm::EvmVerifier;
pub use replay::ReplayGuard;
pub use solana::SolanaVerifier;
pub use verifier::{ChainVerifier, PaymentVerifier, DEFAULT_TOLERANCE_PERCENT};
