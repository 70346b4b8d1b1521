pub mod charge_repository;

pub use charge_repository::ChargeRepositoryImpl;
