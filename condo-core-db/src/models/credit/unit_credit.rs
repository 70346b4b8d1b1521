use chrono::{DateTime, Utc};
use condo_core_api::domain::credit::{CreditOrigin, CreditSource, CreditStatus, MovementType};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit::EntityType;
use crate::models::auditable::Auditable;
use crate::models::identifiable::Identifiable;

/// One signed entry of a unit's credit ledger.
///
/// Entries are append-only. The only fields that change after insert are `remaining_amount` and
/// `status` of positive source entries, as debits draw them down or a cancellation voids them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCreditModel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub unit_id: Uuid,
    pub movement_type: MovementType,
    pub origin: CreditOrigin,
    /// Positive for credit_in, negative for credit_out.
    pub amount: Decimal,
    /// Unconsumed part of a positive entry; zero on debits.
    pub remaining_amount: Decimal,
    /// Unit balance right after this entry, computed at insert time.
    pub running_balance: Decimal,
    pub status: CreditStatus,
    /// The source a debit drew from.
    pub source_credit_id: Option<Uuid>,
    pub charge_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
    pub reason: HeaplessString<255>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub audit_log_id: Option<Uuid>,
}

impl UnitCreditModel {
    /// A new positive source entry.
    pub fn credit_in(
        tenant_id: Uuid,
        unit_id: Uuid,
        origin: CreditOrigin,
        amount: Decimal,
        reason: HeaplessString<255>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            unit_id,
            movement_type: MovementType::CreditIn,
            origin,
            amount,
            remaining_amount: amount,
            running_balance: Decimal::ZERO,
            status: CreditStatus::Active,
            source_credit_id: None,
            charge_id: None,
            payment_id: None,
            reason,
            created_by,
            created_at: Utc::now(),
            audit_log_id: None,
        }
    }

    /// A debit of `amount` (given as a positive figure) drawn from `source`.
    pub fn debit_from(
        source: &UnitCreditModel,
        movement_type: MovementType,
        origin: CreditOrigin,
        amount: Decimal,
        reason: HeaplessString<255>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: source.tenant_id,
            unit_id: source.unit_id,
            movement_type,
            origin,
            amount: -amount,
            remaining_amount: Decimal::ZERO,
            running_balance: Decimal::ZERO,
            status: CreditStatus::Consumed,
            source_credit_id: Some(source.id),
            charge_id: None,
            payment_id: None,
            reason,
            created_by,
            created_at: Utc::now(),
            audit_log_id: None,
        }
    }

    pub fn is_source(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl Identifiable for UnitCreditModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Auditable for UnitCreditModel {
    const ENTITY_TYPE: EntityType = EntityType::UnitCredit;

    fn get_audit_log_id(&self) -> Option<Uuid> {
        self.audit_log_id
    }

    fn set_audit_log_id(&mut self, audit_log_id: Uuid) {
        self.audit_log_id = Some(audit_log_id);
    }
}

impl CreditSource for UnitCreditModel {
    fn credit_id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn remaining_amount(&self) -> Decimal {
        self.remaining_amount
    }

    fn credit_status(&self) -> CreditStatus {
        self.status
    }
}
