use condo_core_db::models::billing::ChargeModel;
use sqlx::{postgres::PgRow, Row};
use std::error::Error;

use crate::unit_of_work::Executor;
use crate::utils::{get_heapless_string, get_optional_heapless_string, TryFromRow};

pub struct ChargeRepositoryImpl {
    pub executor: Executor,
}

impl ChargeRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for ChargeModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(ChargeModel {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            unit_id: row.try_get("unit_id")?,
            charge_type: row.try_get("charge_type")?,
            concept: get_heapless_string(row, "concept")?,
            period: get_heapless_string(row, "period")?,
            due_date: row.try_get("due_date")?,
            total_amount: row.try_get("total_amount")?,
            paid_amount: row.try_get("paid_amount")?,
            balance: row.try_get("balance")?,
            status: row.try_get("status")?,
            cancellation_reason: get_optional_heapless_string(row, "cancellation_reason")?,
            created_at: row.try_get("created_at")?,
            audit_log_id: row.try_get("audit_log_id")?,
        })
    }
}
