pub mod billing_rules;
pub mod credit;
pub mod distribution;
pub mod document;
pub mod money;
pub mod reconciliation;
pub mod settlement;

pub use billing_rules::*;
pub use credit::*;
pub use distribution::*;
pub use document::*;
pub use money::*;
pub use reconciliation::*;
pub use settlement::*;
