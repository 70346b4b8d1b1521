use condo_core_db::models::credit::UnitCreditModel;
use sqlx::{postgres::PgRow, Row};
use std::error::Error;

use crate::unit_of_work::Executor;
use crate::utils::{get_heapless_string, TryFromRow};

pub struct UnitCreditRepositoryImpl {
    pub executor: Executor,
}

impl UnitCreditRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for UnitCreditModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(UnitCreditModel {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            unit_id: row.try_get("unit_id")?,
            movement_type: row.try_get("movement_type")?,
            origin: row.try_get("origin")?,
            amount: row.try_get("amount")?,
            remaining_amount: row.try_get("remaining_amount")?,
            running_balance: row.try_get("running_balance")?,
            status: row.try_get("status")?,
            source_credit_id: row.try_get("source_credit_id")?,
            charge_id: row.try_get("charge_id")?,
            payment_id: row.try_get("payment_id")?,
            reason: get_heapless_string(row, "reason")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            audit_log_id: row.try_get("audit_log_id")?,
        })
    }
}
