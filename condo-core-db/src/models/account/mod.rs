pub mod financial_account;
pub mod folio_counter;

pub use financial_account::*;
pub use folio_counter::*;
