//! Paid/balance bookkeeping shared by charges (receivables) and payables.
//!
//! Every mutation keeps `paid_amount + balance == total_amount` and derives the status from the
//! balance, so callers never set a status by hand.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::{round_money, MONEY_EPSILON};
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "settlement_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Paid,
    Cancelled,
}

/// Billing concept of a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "charge_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    Maintenance,
    Extraordinary,
    Water,
    LateFee,
    Other,
}

/// An owed amount that allocations reduce: a charge a unit owes, or a payable owed to a supplier.
pub trait Settleable {
    fn settlement_id(&self) -> Uuid;
    fn total_amount(&self) -> Decimal;
    fn paid_amount(&self) -> Decimal;
    fn balance(&self) -> Decimal;
    fn settlement_status(&self) -> SettlementStatus;
    fn set_settlement(&mut self, paid_amount: Decimal, balance: Decimal, status: SettlementStatus);
}

pub fn status_for_balance(balance: Decimal) -> SettlementStatus {
    if balance < MONEY_EPSILON {
        SettlementStatus::Paid
    } else {
        SettlementStatus::Pending
    }
}

/// Applies up to `requested` against the document and returns the amount actually applied.
///
/// The request is clamped to the outstanding balance. A clamp that leaves nothing to apply is an
/// error, not a silent skip.
pub fn apply_settlement<S: Settleable>(doc: &mut S, requested: Decimal) -> BillingResult<Decimal> {
    if requested <= Decimal::ZERO {
        return Err(BillingError::validation(format!(
            "amount to apply on {} must be positive, got {requested}",
            doc.settlement_id()
        )));
    }
    match doc.settlement_status() {
        SettlementStatus::Cancelled => {
            return Err(BillingError::rule(format!(
                "{} is cancelled and cannot receive allocations",
                doc.settlement_id()
            )))
        }
        SettlementStatus::Paid => {
            return Err(BillingError::rule(format!(
                "{} is already settled",
                doc.settlement_id()
            )))
        }
        SettlementStatus::Pending => {}
    }

    let applied = round_money(requested.min(doc.balance()));
    if applied <= Decimal::ZERO {
        return Err(BillingError::rule(format!(
            "{} has no outstanding balance",
            doc.settlement_id()
        )));
    }

    let paid = doc.paid_amount() + applied;
    let balance = doc.total_amount() - paid;
    doc.set_settlement(paid, balance, status_for_balance(balance));
    Ok(applied)
}

/// Undoes a previous application of `amount`, reopening the balance.
pub fn reverse_settlement<S: Settleable>(doc: &mut S, amount: Decimal) -> BillingResult<()> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::validation(format!(
            "amount to reverse on {} must be positive, got {amount}",
            doc.settlement_id()
        )));
    }
    if amount > doc.paid_amount() + MONEY_EPSILON {
        return Err(BillingError::InvariantViolation(format!(
            "reversing {amount} on {} exceeds its paid amount {}",
            doc.settlement_id(),
            doc.paid_amount()
        )));
    }

    let paid = (doc.paid_amount() - amount).max(Decimal::ZERO);
    let balance = doc.total_amount() - paid;
    doc.set_settlement(paid, balance, status_for_balance(balance));
    Ok(())
}

/// Voids an untouched document. Returns `false` when it was already cancelled.
pub fn cancel_settlement<S: Settleable>(doc: &mut S) -> BillingResult<bool> {
    if doc.settlement_status() == SettlementStatus::Cancelled {
        return Ok(false);
    }
    if doc.paid_amount() >= MONEY_EPSILON {
        return Err(BillingError::rule(format!(
            "{} has {} applied; cancel the allocations first",
            doc.settlement_id(),
            doc.paid_amount()
        )));
    }
    let total = doc.total_amount();
    doc.set_settlement(Decimal::ZERO, total, SettlementStatus::Cancelled);
    Ok(true)
}

/// Checked before every commit that touches the document.
pub fn assert_settlement_conserved<S: Settleable>(doc: &S) -> BillingResult<()> {
    let id = doc.settlement_id();
    if doc.paid_amount() + doc.balance() != doc.total_amount() {
        return Err(BillingError::InvariantViolation(format!(
            "{id}: paid {} + balance {} != total {}",
            doc.paid_amount(),
            doc.balance(),
            doc.total_amount()
        )));
    }
    if doc.balance() < Decimal::ZERO || doc.paid_amount() < Decimal::ZERO {
        return Err(BillingError::InvariantViolation(format!(
            "{id}: negative paid {} or balance {}",
            doc.paid_amount(),
            doc.balance()
        )));
    }
    let status = doc.settlement_status();
    if status != SettlementStatus::Cancelled && status != status_for_balance(doc.balance()) {
        return Err(BillingError::InvariantViolation(format!(
            "{id}: status {status:?} does not match balance {}",
            doc.balance()
        )));
    }
    Ok(())
}

/// `Σ allocations` may never exceed what the document brought in.
pub fn assert_allocation_within_total(
    document_id: Uuid,
    total_amount: Decimal,
    allocated_amount: Decimal,
) -> BillingResult<()> {
    if allocated_amount > total_amount {
        return Err(BillingError::InsufficientBalance(format!(
            "allocations of {allocated_amount} exceed document {document_id} total {total_amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Clone)]
    struct Owed {
        id: Uuid,
        total: Decimal,
        paid: Decimal,
        balance: Decimal,
        status: SettlementStatus,
    }

    impl Owed {
        fn new(total: Decimal) -> Self {
            Self {
                id: Uuid::new_v4(),
                total,
                paid: Decimal::ZERO,
                balance: total,
                status: SettlementStatus::Pending,
            }
        }
    }

    impl Settleable for Owed {
        fn settlement_id(&self) -> Uuid {
            self.id
        }
        fn total_amount(&self) -> Decimal {
            self.total
        }
        fn paid_amount(&self) -> Decimal {
            self.paid
        }
        fn balance(&self) -> Decimal {
            self.balance
        }
        fn settlement_status(&self) -> SettlementStatus {
            self.status
        }
        fn set_settlement(&mut self, paid: Decimal, balance: Decimal, status: SettlementStatus) {
            self.paid = paid;
            self.balance = balance;
            self.status = status;
        }
    }

    #[test]
    fn partial_application_keeps_charge_pending() {
        let mut owed = Owed::new(dec!(100.00));
        let applied = apply_settlement(&mut owed, dec!(40.00)).unwrap();
        assert_eq!(applied, dec!(40.00));
        assert_eq!(owed.paid, dec!(40.00));
        assert_eq!(owed.balance, dec!(60.00));
        assert_eq!(owed.status, SettlementStatus::Pending);
        assert_settlement_conserved(&owed).unwrap();
    }

    #[test]
    fn over_request_is_clamped_to_balance() {
        let mut owed = Owed::new(dec!(100.00));
        apply_settlement(&mut owed, dec!(70.00)).unwrap();
        let applied = apply_settlement(&mut owed, dec!(50.00)).unwrap();
        assert_eq!(applied, dec!(30.00));
        assert_eq!(owed.balance, Decimal::ZERO);
        assert_eq!(owed.status, SettlementStatus::Paid);
        assert_settlement_conserved(&owed).unwrap();
    }

    #[test]
    fn settled_charge_rejects_further_allocations() {
        let mut owed = Owed::new(dec!(25.00));
        apply_settlement(&mut owed, dec!(25.00)).unwrap();
        let err = apply_settlement(&mut owed, dec!(1.00)).unwrap_err();
        assert!(matches!(err, BillingError::BusinessRuleViolation(_)));
        assert_eq!(owed.paid, dec!(25.00));
    }

    #[test]
    fn non_positive_request_is_a_validation_error() {
        let mut owed = Owed::new(dec!(25.00));
        assert!(matches!(
            apply_settlement(&mut owed, Decimal::ZERO),
            Err(BillingError::Validation(_))
        ));
        assert!(matches!(
            apply_settlement(&mut owed, dec!(-3)),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn reversal_reopens_a_paid_charge() {
        let mut owed = Owed::new(dec!(80.00));
        apply_settlement(&mut owed, dec!(80.00)).unwrap();
        reverse_settlement(&mut owed, dec!(30.00)).unwrap();
        assert_eq!(owed.paid, dec!(50.00));
        assert_eq!(owed.balance, dec!(30.00));
        assert_eq!(owed.status, SettlementStatus::Pending);
        assert_settlement_conserved(&owed).unwrap();
    }

    #[test]
    fn reversal_beyond_paid_amount_is_rejected() {
        let mut owed = Owed::new(dec!(80.00));
        apply_settlement(&mut owed, dec!(10.00)).unwrap();
        let err = reverse_settlement(&mut owed, dec!(10.50)).unwrap_err();
        assert!(matches!(err, BillingError::InvariantViolation(_)));
    }

    #[test]
    fn cancel_requires_no_applied_amount() {
        let mut untouched = Owed::new(dec!(10.00));
        assert!(cancel_settlement(&mut untouched).unwrap());
        assert_eq!(untouched.status, SettlementStatus::Cancelled);
        assert!(!cancel_settlement(&mut untouched).unwrap());
        assert!(apply_settlement(&mut untouched, dec!(1)).is_err());

        let mut touched = Owed::new(dec!(10.00));
        apply_settlement(&mut touched, dec!(1.00)).unwrap();
        assert!(matches!(
            cancel_settlement(&mut touched),
            Err(BillingError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn detects_broken_conservation() {
        let mut owed = Owed::new(dec!(10.00));
        owed.paid = dec!(3.00);
        assert!(assert_settlement_conserved(&owed).is_err());
    }

    #[test]
    fn allocation_total_guard() {
        let id = Uuid::new_v4();
        assert!(assert_allocation_within_total(id, dec!(100), dec!(100)).is_ok());
        assert!(matches!(
            assert_allocation_within_total(id, dec!(100), dec!(100.01)),
            Err(BillingError::InsufficientBalance(_))
        ));
    }
}
