pub mod account;
pub mod audit;
pub mod auditable;
pub mod billing;
pub mod credit;
pub mod egress;
pub mod identifiable;
pub mod payment;
pub mod reconciliation;

// Re-exports
pub use account::*;
pub use audit::*;
pub use auditable::*;
pub use billing::*;
pub use credit::*;
pub use egress::*;
pub use identifiable::*;
pub use payment::*;
pub use reconciliation::*;
