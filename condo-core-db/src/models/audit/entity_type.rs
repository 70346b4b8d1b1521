use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "entity_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Charge,
    Payment,
    Egress,
    Payable,
    UnitCredit,
    FinancialAccount,
    Reconciliation,
}

impl From<EntityType> for &str {
    fn from(val: EntityType) -> Self {
        match val {
            EntityType::Charge => "CHARGE",
            EntityType::Payment => "PAYMENT",
            EntityType::Egress => "EGRESS",
            EntityType::Payable => "PAYABLE",
            EntityType::UnitCredit => "UNIT_CREDIT",
            EntityType::FinancialAccount => "FINANCIAL_ACCOUNT",
            EntityType::Reconciliation => "RECONCILIATION",
        }
    }
}
