pub mod reconciliation;
pub mod reconciliation_item;

pub use reconciliation::*;
pub use reconciliation_item::*;
