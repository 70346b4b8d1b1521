pub mod egress;
pub mod egress_allocation;
pub mod payable;

pub use egress::*;
pub use egress_allocation::*;
pub use payable::*;
