use chrono::{DateTime, NaiveDate, Utc};
use condo_core_api::domain::billing_rules::Billable;
use condo_core_api::domain::settlement::{ChargeType, Settleable, SettlementStatus};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit::EntityType;
use crate::models::auditable::Auditable;
use crate::models::identifiable::Identifiable;

/// An amount a unit owes for one billing period.
///
/// Charges are never deleted. A charge nobody paid can be cancelled; everything else goes through
/// allocations and their reversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeModel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub unit_id: Uuid,
    pub charge_type: ChargeType,
    pub concept: HeaplessString<100>,
    /// Billing period as `YYYY-MM`
    pub period: HeaplessString<7>,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub status: SettlementStatus,
    pub cancellation_reason: Option<HeaplessString<500>>,
    pub created_at: DateTime<Utc>,
    pub audit_log_id: Option<Uuid>,
}

impl ChargeModel {
    /// A fresh, unpaid charge.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        tenant_id: Uuid,
        unit_id: Uuid,
        charge_type: ChargeType,
        concept: HeaplessString<100>,
        period: HeaplessString<7>,
        due_date: NaiveDate,
        total_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            unit_id,
            charge_type,
            concept,
            period,
            due_date,
            total_amount,
            paid_amount: Decimal::ZERO,
            balance: total_amount,
            status: SettlementStatus::Pending,
            cancellation_reason: None,
            created_at: Utc::now(),
            audit_log_id: None,
        }
    }
}

impl Identifiable for ChargeModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Auditable for ChargeModel {
    const ENTITY_TYPE: EntityType = EntityType::Charge;

    fn get_audit_log_id(&self) -> Option<Uuid> {
        self.audit_log_id
    }

    fn set_audit_log_id(&mut self, audit_log_id: Uuid) {
        self.audit_log_id = Some(audit_log_id);
    }
}

impl Settleable for ChargeModel {
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

impl Billable for ChargeModel {
    fn due_date(&self) -> NaiveDate {
        self.due_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condo_core_api::domain::settlement::{apply_settlement, assert_settlement_conserved};
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn charge_settles_through_the_shared_rules() {
        let mut charge = ChargeModel::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ChargeType::Maintenance,
            HeaplessString::from_str("Cuota de mantenimiento").unwrap(),
            HeaplessString::from_str("2024-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            dec!(1500.00),
        );
        apply_settlement(&mut charge, dec!(1500.00)).unwrap();
        assert_eq!(charge.status, SettlementStatus::Paid);
        assert_eq!(charge.balance, Decimal::ZERO);
        assert_settlement_conserved(&charge).unwrap();
    }
}
