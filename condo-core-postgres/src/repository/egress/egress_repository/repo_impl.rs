use condo_core_db::models::egress::EgressModel;
use sqlx::{postgres::PgRow, Row};
use std::error::Error;

use crate::unit_of_work::Executor;
use crate::utils::{get_optional_heapless_string, TryFromRow};

pub struct EgressRepositoryImpl {
    pub executor: Executor,
}

impl EgressRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for EgressModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(EgressModel {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            financial_account_id: row.try_get("financial_account_id")?,
            folio_eg: row.try_get("folio_eg")?,
            egress_date: row.try_get("egress_date")?,
            total_amount: row.try_get("total_amount")?,
            allocated_amount: row.try_get("allocated_amount")?,
            check_number: get_optional_heapless_string(row, "check_number")?,
            reference: get_optional_heapless_string(row, "reference")?,
            status: row.try_get("status")?,
            cancellation_reason: get_optional_heapless_string(row, "cancellation_reason")?,
            cancelled_by: row.try_get("cancelled_by")?,
            cancelled_at: row.try_get("cancelled_at")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            audit_log_id: row.try_get("audit_log_id")?,
        })
    }
}
