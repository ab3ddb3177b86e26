pub mod health;
pub mod paid;
pub mod stats;

pub use health::*;
pub use paid::*;
pub use stats::*;
