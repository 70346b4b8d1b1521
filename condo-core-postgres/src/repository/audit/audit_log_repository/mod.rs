pub mod create;
pub mod load_batch;
pub mod repo_impl;

pub use repo_impl::AuditLogRepositoryImpl;
