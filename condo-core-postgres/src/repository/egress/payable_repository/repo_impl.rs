use condo_core_db::models::egress::PayableModel;
use sqlx::{postgres::PgRow, Row};
use std::error::Error;

use crate::unit_of_work::Executor;
use crate::utils::{get_heapless_string, TryFromRow};

pub struct PayableRepositoryImpl {
    pub executor: Executor,
}

impl PayableRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for PayableModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(PayableModel {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            supplier: get_heapless_string(row, "supplier")?,
            concept: get_heapless_string(row, "concept")?,
            due_date: row.try_get("due_date")?,
            total_amount: row.try_get("total_amount")?,
            paid_amount: row.try_get("paid_amount")?,
            balance: row.try_get("balance")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            audit_log_id: row.try_get("audit_log_id")?,
        })
    }
}
