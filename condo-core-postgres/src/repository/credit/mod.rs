pub mod unit_credit_repository;

pub use unit_credit_repository::UnitCreditRepositoryImpl;
