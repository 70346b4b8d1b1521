use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EgressAllocationModel {
    pub id: Uuid,
    pub egress_id: Uuid,
    pub payable_id: Uuid,
    pub amount_allocated: Decimal,
    pub created_at: DateTime<Utc>,
}

impl EgressAllocationModel {
    pub fn new(egress_id: Uuid, payable_id: Uuid, amount_allocated: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            egress_id,
            payable_id,
            amount_allocated,
            created_at: Utc::now(),
        }
    }
}

impl Identifiable for EgressAllocationModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
