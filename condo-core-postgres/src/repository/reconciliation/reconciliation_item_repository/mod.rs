pub mod create_batch;
pub mod find_locked;
pub mod repo_impl;

pub use repo_impl::ReconciliationItemRepositoryImpl;
