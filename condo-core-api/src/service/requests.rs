//! Inputs accepted by the engine's operations.
//!
//! Every request is validated before the first lock is taken; a failing request never touches
//! the database.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::distribution::ChargePreview;
use crate::domain::document::DocumentType;
use crate::domain::settlement::ChargeType;

pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    if amount.scale() > 2 && amount.round_dp(2) != *amount {
        return Err(ValidationError::new("amount_has_sub_cent_precision"));
    }
    Ok(())
}

pub fn validate_required_id(id: &Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::new("id_is_required"));
    }
    Ok(())
}

/// `YYYY-MM`
pub fn validate_period(period: &str) -> Result<(), ValidationError> {
    let bytes = period.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return Err(ValidationError::new("period_must_be_yyyy_mm"));
    }
    match period[5..].parse::<u32>() {
        Ok(1..=12) => Ok(()),
        _ => Err(ValidationError::new("period_month_out_of_range")),
    }
}

/// One requested allocation against a charge (payments) or a payable (egresses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AllocationRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub target_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
}

/// Folds repeated targets into one request each, ordered by id so rows are always locked in the
/// same order.
pub fn merge_allocations(allocations: &[AllocationRequest]) -> Vec<AllocationRequest> {
    let mut merged: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for allocation in allocations {
        *merged.entry(allocation.target_id).or_insert(Decimal::ZERO) += allocation.amount;
    }
    merged
        .into_iter()
        .map(|(target_id, amount)| AllocationRequest { target_id, amount })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NextFolioRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub tenant_id: Uuid,
    pub document_type: DocumentType,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyPaymentRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub financial_account_id: Uuid,
    /// Unit that paid; required when the unallocated remainder is kept as credit.
    pub unit_id: Option<Uuid>,
    pub payment_date: NaiveDate,
    #[validate(custom(function = "validate_positive_amount"))]
    pub total_amount: Decimal,
    #[validate(nested)]
    pub allocations: Vec<AllocationRequest>,
    #[serde(default)]
    pub credit_overpayment: bool,
    #[validate(length(max = 255))]
    pub reference: Option<String>,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyEgressRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub financial_account_id: Uuid,
    pub egress_date: NaiveDate,
    #[validate(custom(function = "validate_positive_amount"))]
    pub total_amount: Decimal,
    #[validate(nested)]
    pub allocations: Vec<AllocationRequest>,
    #[validate(length(min = 1, max = 32))]
    pub check_number: Option<String>,
    #[validate(length(max = 255))]
    pub reference: Option<String>,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CancelDocumentRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub document_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommitChargesRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub tenant_id: Uuid,
    pub charge_type: ChargeType,
    #[validate(length(min = 1, max = 100))]
    pub concept: String,
    #[validate(custom(function = "validate_period"))]
    pub period: String,
    pub due_date: NaiveDate,
    #[validate(length(min = 1))]
    pub previews: Vec<ChargePreview>,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ManualCreditRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub tenant_id: Uuid,
    #[validate(custom(function = "validate_required_id"))]
    pub unit_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyCreditRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub credit_id: Uuid,
    #[validate(custom(function = "validate_required_id"))]
    pub charge_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AutoApplyCreditRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub unit_id: Uuid,
    #[validate(custom(function = "validate_required_id"))]
    pub charge_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub max_amount: Option<Decimal>,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_distinct_units"))]
pub struct TransferCreditRequest {
    /// Both units must belong to this tenant.
    #[validate(custom(function = "validate_required_id"))]
    pub tenant_id: Uuid,
    #[validate(custom(function = "validate_required_id"))]
    pub from_unit_id: Uuid,
    #[validate(custom(function = "validate_required_id"))]
    pub to_unit_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

fn validate_distinct_units(request: &TransferCreditRequest) -> Result<(), ValidationError> {
    if request.from_unit_id == request.to_unit_id {
        return Err(ValidationError::new("transfer_to_same_unit"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefundCreditRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub unit_id: Uuid,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CancelCreditRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub credit_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CloseReconciliationRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub reconciliation_id: Uuid,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressSelection {
    pub egress_id: Uuid,
    pub is_check_cashed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_unique_selection"))]
pub struct ReconciliationRequest {
    #[validate(custom(function = "validate_required_id"))]
    pub financial_account_id: Uuid,
    pub cutoff_date: NaiveDate,
    pub bank_closing_balance: Decimal,
    pub selected_payments: Vec<Uuid>,
    pub selected_egresses: Vec<EgressSelection>,
    #[validate(custom(function = "validate_required_id"))]
    pub actor_id: Uuid,
}

fn validate_unique_selection(request: &ReconciliationRequest) -> Result<(), ValidationError> {
    let mut payments = request.selected_payments.clone();
    payments.sort();
    payments.dedup();
    let mut egresses: Vec<Uuid> = request.selected_egresses.iter().map(|e| e.egress_id).collect();
    egresses.sort();
    egresses.dedup();
    if payments.len() != request.selected_payments.len()
        || egresses.len() != request.selected_egresses.len()
    {
        return Err(ValidationError::new("document_selected_twice"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment_request(total: Decimal, allocations: Vec<AllocationRequest>) -> ApplyPaymentRequest {
        ApplyPaymentRequest {
            financial_account_id: Uuid::new_v4(),
            unit_id: None,
            payment_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            total_amount: total,
            allocations,
            credit_overpayment: false,
            reference: None,
            actor_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn rejects_non_positive_totals_and_allocations() {
        assert!(payment_request(dec!(0), vec![]).validate().is_err());
        let bad_allocation = AllocationRequest {
            target_id: Uuid::new_v4(),
            amount: dec!(-1),
        };
        assert!(payment_request(dec!(10), vec![bad_allocation]).validate().is_err());
        assert!(payment_request(dec!(10), vec![]).validate().is_ok());
    }

    #[test]
    fn rejects_sub_cent_amounts_and_nil_ids() {
        assert!(payment_request(dec!(10.005), vec![]).validate().is_err());
        assert!(payment_request(dec!(10.500), vec![]).validate().is_ok());
        let mut request = payment_request(dec!(10), vec![]);
        request.financial_account_id = Uuid::nil();
        assert!(request.validate().is_err());
    }

    #[test]
    fn merges_repeated_targets_in_lock_order() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let merged = merge_allocations(&[
            AllocationRequest { target_id: a, amount: dec!(10) },
            AllocationRequest { target_id: b, amount: dec!(5) },
            AllocationRequest { target_id: a, amount: dec!(2.5) },
        ]);
        assert_eq!(
            merged,
            vec![
                AllocationRequest { target_id: b, amount: dec!(5) },
                AllocationRequest { target_id: a, amount: dec!(12.5) },
            ]
        );
    }

    #[test]
    fn period_format() {
        assert!(validate_period("2024-05").is_ok());
        assert!(validate_period("2024-13").is_err());
        assert!(validate_period("2024-5").is_err());
        assert!(validate_period("202405").is_err());
    }

    #[test]
    fn transfer_needs_two_units() {
        let unit = Uuid::new_v4();
        let request = TransferCreditRequest {
            tenant_id: Uuid::new_v4(),
            from_unit_id: unit,
            to_unit_id: unit,
            amount: dec!(10),
            reason: "move".to_string(),
            actor_id: Uuid::new_v4(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn reconciliation_rejects_duplicate_selection() {
        let payment = Uuid::new_v4();
        let request = ReconciliationRequest {
            financial_account_id: Uuid::new_v4(),
            cutoff_date: NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            bank_closing_balance: dec!(100),
            selected_payments: vec![payment, payment],
            selected_egresses: vec![],
            actor_id: Uuid::new_v4(),
        };
        assert!(request.validate().is_err());
    }
}
