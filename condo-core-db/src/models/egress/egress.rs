use chrono::{DateTime, NaiveDate, Utc};
use condo_core_api::domain::document::{DocumentStatus, DocumentType};
use condo_core_api::domain::reconciliation::EgressLine;
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit::EntityType;
use crate::models::auditable::Auditable;
use crate::models::identifiable::Identifiable;

/// An outgoing payment to suppliers, numbered with an `EG` folio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgressModel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub financial_account_id: Uuid,
    pub folio_eg: i64,
    pub egress_date: NaiveDate,
    pub total_amount: Decimal,
    pub allocated_amount: Decimal,
    /// Present when the egress was paid by check; such egresses can be in transit.
    pub check_number: Option<HeaplessString<32>>,
    pub reference: Option<HeaplessString<255>>,
    pub status: DocumentStatus,
    pub cancellation_reason: Option<HeaplessString<500>>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub audit_log_id: Option<Uuid>,
}

impl EgressModel {
    pub fn folio_display(&self) -> String {
        DocumentType::Eg.format_folio(self.folio_eg)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == DocumentStatus::Cancelled
    }

    pub fn to_reconciliation_line(&self, is_check_cashed: bool) -> EgressLine {
        EgressLine {
            amount: self.total_amount,
            has_check: self.check_number.is_some(),
            is_check_cashed,
        }
    }
}

impl Identifiable for EgressModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Auditable for EgressModel {
    const ENTITY_TYPE: EntityType = EntityType::Egress;

    fn get_audit_log_id(&self) -> Option<Uuid> {
        self.audit_log_id
    }

    fn set_audit_log_id(&mut self, audit_log_id: Uuid) {
        self.audit_log_id = Some(audit_log_id);
    }
}
