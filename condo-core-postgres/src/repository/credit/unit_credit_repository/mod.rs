pub mod create_batch;
pub mod ledger;
pub mod load_for_update;
pub mod repo_impl;
pub mod update_batch;

#[cfg(test)]
pub mod test_utils;

pub use ledger::LedgerTotals;
pub use repo_impl::UnitCreditRepositoryImpl;
