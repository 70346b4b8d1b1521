#[cfg(test)]
pub mod test_utils {
    use condo_core_api::domain::credit::CreditOrigin;
    use condo_core_db::models::credit::UnitCreditModel;
    use heapless::String as HeaplessString;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    pub fn create_test_credit(
        tenant_id: Uuid,
        unit_id: Uuid,
        amount: Decimal,
        running_balance: Decimal,
    ) -> UnitCreditModel {
        let mut credit = UnitCreditModel::credit_in(
            tenant_id,
            unit_id,
            CreditOrigin::Manual,
            amount,
            HeaplessString::from_str("Saldo a favor").unwrap(),
            Uuid::new_v4(),
        );
        credit.running_balance = running_balance;
        credit
    }
}
