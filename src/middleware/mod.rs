pub mod extract;
pub mod x402;

pub use extract::extract_payment;
pub use x402::{x402_middleware_layer, PaymentGate};
