#[cfg(test)]
pub mod test_utils {
    use chrono::NaiveDate;
    use condo_core_api::domain::settlement::ChargeType;
    use condo_core_db::models::billing::ChargeModel;
    use heapless::String as HeaplessString;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    pub fn create_test_charge(tenant_id: Uuid, unit_id: Uuid, total: Decimal) -> ChargeModel {
        ChargeModel::pending(
            tenant_id,
            unit_id,
            ChargeType::Maintenance,
            HeaplessString::from_str("Cuota de mantenimiento").unwrap(),
            HeaplessString::from_str("2024-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            total,
        )
    }
}
