pub mod payment;
pub mod payment_allocation;

pub use payment::*;
pub use payment_allocation::*;
