#[cfg(test)]
pub mod test_utils {
    use chrono::NaiveDate;
    use condo_core_db::models::egress::PayableModel;
    use heapless::String as HeaplessString;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uuid::Uuid;

    pub fn create_test_payable(tenant_id: Uuid, total: Decimal) -> PayableModel {
        PayableModel::pending(
            tenant_id,
            HeaplessString::from_str("Jardinería del Valle").unwrap(),
            HeaplessString::from_str("Mantenimiento de áreas verdes").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            total,
        )
    }
}
