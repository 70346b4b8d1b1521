pub mod audit_link_repository;
pub mod audit_log_repository;

pub use audit_link_repository::{insert_audit_link, AuditLinkRepositoryImpl};
pub use audit_log_repository::AuditLogRepositoryImpl;
