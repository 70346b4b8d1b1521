use chrono::{DateTime, NaiveDate, Utc};
use condo_core_api::domain::settlement::{Settleable, SettlementStatus};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit::EntityType;
use crate::models::auditable::Auditable;
use crate::models::identifiable::Identifiable;

/// An amount the condominium owes a supplier; egress allocations settle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayableModel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub supplier: HeaplessString<100>,
    pub concept: HeaplessString<100>,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub audit_log_id: Option<Uuid>,
}

impl PayableModel {
    pub fn pending(
        tenant_id: Uuid,
        supplier: HeaplessString<100>,
        concept: HeaplessString<100>,
        due_date: NaiveDate,
        total_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            supplier,
            concept,
            due_date,
            total_amount,
            paid_amount: Decimal::ZERO,
            balance: total_amount,
            status: SettlementStatus::Pending,
            created_at: Utc::now(),
            audit_log_id: None,
        }
    }
}

impl Identifiable for PayableModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Auditable for PayableModel {
    const ENTITY_TYPE: EntityType = EntityType::Payable;

    fn get_audit_log_id(&self) -> Option<Uuid> {
        self.audit_log_id
    }

    fn set_audit_log_id(&mut self, audit_log_id: Uuid) {
        self.audit_log_id = Some(audit_log_id);
    }
}

impl Settleable for PayableModel {
    fn settlement_id(&self) -> Uuid {
        self.id
    }

    fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    fn paid_amount(&self) -> Decimal {
        self.paid_amount
    }

    fn balance(&self) -> Decimal {
        self.balance
    }

    fn settlement_status(&self) -> SettlementStatus {
        self.status
    }

    fn set_settlement(&mut self, paid_amount: Decimal, balance: Decimal, status: SettlementStatus) {
        self.paid_amount = paid_amount;
        self.balance = balance;
        self.status = status;
    }
}
