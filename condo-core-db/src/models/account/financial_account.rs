use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::audit::EntityType;
use crate::models::auditable::Auditable;
use crate::models::identifiable::Identifiable;

/// A bank or cash account that payments land in and egresses leave from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAccountModel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: HeaplessString<100>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    pub audit_log_id: Option<Uuid>,
}

impl FinancialAccountModel {
    pub fn new(tenant_id: Uuid, name: HeaplessString<100>, opening_balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            opening_balance,
            current_balance: opening_balance,
            audit_log_id: None,
        }
    }

    pub fn record_inflow(&mut self, amount: Decimal) {
        self.current_balance += amount;
    }

    pub fn record_outflow(&mut self, amount: Decimal) {
        self.current_balance -= amount;
    }
}

impl Identifiable for FinancialAccountModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Auditable for FinancialAccountModel {
    const ENTITY_TYPE: EntityType = EntityType::FinancialAccount;

    fn get_audit_log_id(&self) -> Option<Uuid> {
        self.audit_log_id
    }

    fn set_audit_log_id(&mut self, audit_log_id: Uuid) {
        self.audit_log_id = Some(audit_log_id);
    }
}
