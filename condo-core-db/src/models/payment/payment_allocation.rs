use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Part of a payment applied to one charge. `amount_allocated` is always positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PaymentAllocationModel {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub charge_id: Uuid,
    pub amount_allocated: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PaymentAllocationModel {
    pub fn new(payment_id: Uuid, charge_id: Uuid, amount_allocated: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_id,
            charge_id,
            amount_allocated,
            created_at: Utc::now(),
        }
    }
}

impl Identifiable for PaymentAllocationModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
