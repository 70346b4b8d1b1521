use condo_core_db::models::account::FinancialAccountModel;
use sqlx::{postgres::PgRow, Row};
use std::error::Error;

use crate::unit_of_work::Executor;
use crate::utils::{get_heapless_string, TryFromRow};

pub struct FinancialAccountRepositoryImpl {
    pub executor: Executor,
}

impl FinancialAccountRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for FinancialAccountModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(FinancialAccountModel {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            name: get_heapless_string(row, "name")?,
            opening_balance: row.try_get("opening_balance")?,
            current_balance: row.try_get("current_balance")?,
            audit_log_id: row.try_get("audit_log_id")?,
        })
    }
}
