pub mod challenge;
pub mod payment;
pub mod response;

pub use challenge::*;
pub use payment::*;
pub use response::*;
