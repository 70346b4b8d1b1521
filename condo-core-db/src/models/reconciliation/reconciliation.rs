use chrono::{DateTime, NaiveDate, Utc};
use condo_core_api::domain::reconciliation::{ReconciliationStatus, ReconciliationSummary};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::audit::EntityType;
use crate::models::auditable::Auditable;
use crate::models::identifiable::Identifiable;
use crate::models::reconciliation::ReconciliationItemModel;
use crate::utils::hash_as_i64;

/// Persisted result of matching an account's books against a bank statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReconciliationModel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub financial_account_id: Uuid,
    pub cutoff_date: NaiveDate,
    pub opening_balance: Decimal,
    pub closing_balance_bank: Decimal,
    /// Books balance: opening plus ingresos minus settled egresos.
    pub closing_balance_calculated: Decimal,
    pub in_transit_total: Decimal,
    pub difference: Decimal,
    pub status: ReconciliationStatus,
    /// Hash of the snapshot figures and the referenced documents, with this field set to 0
    pub hash: i64,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub closed_by: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    pub audit_log_id: Option<Uuid>,
}

/// Hashed view of a snapshot; timestamps and actors are left out.
#[derive(Serialize)]
struct SnapshotHashInput<'a> {
    financial_account_id: Uuid,
    cutoff_date: NaiveDate,
    opening_balance: Decimal,
    closing_balance_bank: Decimal,
    closing_balance_calculated: Decimal,
    in_transit_total: Decimal,
    difference: Decimal,
    items: Vec<(Option<Uuid>, Option<Uuid>, &'a Decimal, bool)>,
}

impl ReconciliationModel {
    pub fn from_summary(
        tenant_id: Uuid,
        financial_account_id: Uuid,
        cutoff_date: NaiveDate,
        opening_balance: Decimal,
        bank_closing_balance: Decimal,
        summary: &ReconciliationSummary,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            financial_account_id,
            cutoff_date,
            opening_balance,
            closing_balance_bank: bank_closing_balance,
            closing_balance_calculated: summary.books_balance,
            in_transit_total: summary.in_transit,
            difference: summary.difference,
            status: summary.status,
            hash: 0,
            created_by,
            created_at: Utc::now(),
            closed_by: None,
            closed_at: None,
            audit_log_id: None,
        }
    }

    /// Hash over the figures and items; items are sorted so selection order does not matter.
    pub fn compute_hash(&self, items: &[ReconciliationItemModel]) -> Result<i64, String> {
        let mut hashed_items: Vec<_> = items
            .iter()
            .map(|item| (item.payment_id, item.egress_id, &item.amount, item.is_check_cashed))
            .collect();
        hashed_items.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        hash_as_i64(&SnapshotHashInput {
            financial_account_id: self.financial_account_id,
            cutoff_date: self.cutoff_date,
            opening_balance: self.opening_balance,
            closing_balance_bank: self.closing_balance_bank,
            closing_balance_calculated: self.closing_balance_calculated,
            in_transit_total: self.in_transit_total,
            difference: self.difference,
            items: hashed_items,
        })
    }

    pub fn locks_documents(&self) -> bool {
        self.status.locks_documents()
    }
}

impl Identifiable for ReconciliationModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Auditable for ReconciliationModel {
    const ENTITY_TYPE: EntityType = EntityType::Reconciliation;

    fn get_audit_log_id(&self) -> Option<Uuid> {
        self.audit_log_id
    }

    fn set_audit_log_id(&mut self, audit_log_id: Uuid) {
        self.audit_log_id = Some(audit_log_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condo_core_api::domain::reconciliation::{
        compute_reconciliation_summary, EgressLine, ReconciliationInput,
    };
    use rust_decimal_macros::dec;

    fn snapshot() -> ReconciliationModel {
        let summary = compute_reconciliation_summary(&ReconciliationInput {
            opening_balance: dec!(1000),
            ingresos: vec![dec!(500)],
            egresos: vec![EgressLine { amount: dec!(300), has_check: false, is_check_cashed: false }],
            bank_closing_balance: dec!(1200),
        });
        ReconciliationModel::from_summary(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            dec!(1000),
            dec!(1200),
            &summary,
            Uuid::new_v4(),
        )
    }

    #[test]
    fn hash_ignores_item_order_but_not_content() {
        let model = snapshot();
        let a = ReconciliationItemModel::for_payment(model.id, Uuid::new_v4(), dec!(500));
        let b = ReconciliationItemModel::for_egress(model.id, Uuid::new_v4(), dec!(300), false);

        let forward = model.compute_hash(&[a.clone(), b.clone()]).unwrap();
        let backward = model.compute_hash(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(forward, backward);

        let mut cashed = b;
        cashed.is_check_cashed = true;
        assert_ne!(forward, model.compute_hash(&[a, cashed]).unwrap());
        assert_eq!(model.status, ReconciliationStatus::Conciliada);
    }
}
