pub mod reconciliation_item_repository;
pub mod reconciliation_repository;

pub use reconciliation_item_repository::ReconciliationItemRepositoryImpl;
pub use reconciliation_repository::ReconciliationRepositoryImpl;
