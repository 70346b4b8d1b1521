use chrono::{DateTime, NaiveDate, Utc};
use condo_core_api::domain::document::{DocumentStatus, DocumentType};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit::EntityType;
use crate::models::auditable::Auditable;
use crate::models::identifiable::Identifiable;

/// An incoming payment (ingreso), numbered with a `REC` folio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentModel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub financial_account_id: Uuid,
    pub unit_id: Option<Uuid>,
    pub folio_rec: i64,
    pub payment_date: NaiveDate,
    pub total_amount: Decimal,
    /// Always equals the sum of this payment's allocation rows.
    pub allocated_amount: Decimal,
    pub reference: Option<HeaplessString<255>>,
    pub status: DocumentStatus,
    pub cancellation_reason: Option<HeaplessString<500>>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub audit_log_id: Option<Uuid>,
}

impl PaymentModel {
    pub fn folio_display(&self) -> String {
        DocumentType::Rec.format_folio(self.folio_rec)
    }

    pub fn unallocated_amount(&self) -> Decimal {
        self.total_amount - self.allocated_amount
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == DocumentStatus::Cancelled
    }
}

impl Identifiable for PaymentModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Auditable for PaymentModel {
    const ENTITY_TYPE: EntityType = EntityType::Payment;

    fn get_audit_log_id(&self) -> Option<Uuid> {
        self.audit_log_id
    }

    fn set_audit_log_id(&mut self, audit_log_id: Uuid) {
        self.audit_log_id = Some(audit_log_id);
    }
}
