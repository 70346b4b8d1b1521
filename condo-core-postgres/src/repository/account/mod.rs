pub mod financial_account_repository;
pub mod folio_counter_repository;

pub use financial_account_repository::FinancialAccountRepositoryImpl;
pub use folio_counter_repository::FolioCounterRepositoryImpl;
