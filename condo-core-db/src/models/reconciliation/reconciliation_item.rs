use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// A document included in a reconciliation. Exactly one of `payment_id` and `egress_id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReconciliationItemModel {
    pub id: Uuid,
    pub reconciliation_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub egress_id: Option<Uuid>,
    pub amount: Decimal,
    pub is_check_cashed: bool,
}

impl ReconciliationItemModel {
    pub fn for_payment(reconciliation_id: Uuid, payment_id: Uuid, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            reconciliation_id,
            payment_id: Some(payment_id),
            egress_id: None,
            amount,
            is_check_cashed: false,
        }
    }

    pub fn for_egress(
        reconciliation_id: Uuid,
        egress_id: Uuid,
        amount: Decimal,
        is_check_cashed: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reconciliation_id,
            payment_id: None,
            egress_id: Some(egress_id),
            amount,
            is_check_cashed,
        }
    }
}

impl Identifiable for ReconciliationItemModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
