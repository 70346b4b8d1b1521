pub mod account;
pub mod audit;
pub mod billing;
pub mod credit;
pub mod egress;
pub mod payment;
pub mod reconciliation;
