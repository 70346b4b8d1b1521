//! Unit credit ledger rules.
//!
//! A unit's credit is an append-only list of signed entries. Positive entries are *sources*: they
//! carry a `remaining_amount` that debits draw down. Negative entries record which source they
//! drew from, so the unit balance always equals both the sum of entry amounts and the sum of what
//! active sources still hold.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::round_money;
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "credit_movement_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    CreditIn,
    CreditOut,
    Adjustment,
    Reversal,
}

impl MovementType {
    pub fn validate_amount(self, amount: Decimal) -> BillingResult<()> {
        let ok = match self {
            MovementType::CreditIn => amount > Decimal::ZERO,
            MovementType::CreditOut => amount < Decimal::ZERO,
            MovementType::Adjustment | MovementType::Reversal => !amount.is_zero(),
        };
        if ok {
            Ok(())
        } else {
            Err(BillingError::validation(format!(
                "amount {amount} has the wrong sign for a {self:?} movement"
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "credit_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    /// Source with an unconsumed remainder.
    Active,
    /// Fully drawn source, or any debit entry.
    Consumed,
    Cancelled,
}

/// Why an entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "credit_origin", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CreditOrigin {
    Overpayment,
    Manual,
    ChargeApplication,
    TransferIn,
    TransferOut,
    Refund,
    Cancellation,
    PaymentCancellation,
}

/// A positive ledger entry that debits can draw from.
pub trait CreditSource {
    fn credit_id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn remaining_amount(&self) -> Decimal;
    fn credit_status(&self) -> CreditStatus;
}

/// One slice of a debit, taken from a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditDraw {
    pub source_id: Uuid,
    pub amount: Decimal,
}

pub fn available_credit<S: CreditSource>(sources: &[S]) -> Decimal {
    sources
        .iter()
        .filter(|s| s.credit_status() == CreditStatus::Active)
        .map(|s| s.remaining_amount())
        .sum()
}

/// Draws up to `target` from the oldest active sources first.
///
/// Sources are ordered by `created_at`, then id, regardless of input order. Oldest-first is part of
/// the contract with residents: credit is always consumed in the order it was granted.
pub fn plan_fifo<S: CreditSource>(sources: &[S], target: Decimal) -> Vec<CreditDraw> {
    let mut ordered: Vec<&S> = sources
        .iter()
        .filter(|s| s.credit_status() == CreditStatus::Active && s.remaining_amount() > Decimal::ZERO)
        .collect();
    ordered.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.credit_id().cmp(&b.credit_id()))
    });

    let mut outstanding = round_money(target);
    let mut draws = Vec::new();
    for source in ordered {
        if outstanding <= Decimal::ZERO {
            break;
        }
        let amount = source.remaining_amount().min(outstanding);
        outstanding -= amount;
        draws.push(CreditDraw {
            source_id: source.credit_id(),
            amount,
        });
    }
    draws
}

/// Like [`plan_fifo`], but the whole `amount` must be covered.
pub fn plan_debit<S: CreditSource>(
    unit_id: Uuid,
    sources: &[S],
    amount: Decimal,
) -> BillingResult<Vec<CreditDraw>> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::validation(format!(
            "credit amount must be positive, got {amount}"
        )));
    }
    let available = available_credit(sources);
    if available < amount {
        return Err(BillingError::InsufficientCredit(format!(
            "unit {unit_id} has {available} available, {amount} requested"
        )));
    }
    Ok(plan_fifo(sources, amount))
}

/// Remaining amount and status of a source after a draw.
pub fn drawn_source_state(remaining: Decimal, drawn: Decimal) -> BillingResult<(Decimal, CreditStatus)> {
    if drawn > remaining {
        return Err(BillingError::InvariantViolation(format!(
            "draw of {drawn} exceeds source remainder {remaining}"
        )));
    }
    let left = remaining - drawn;
    let status = if left.is_zero() {
        CreditStatus::Consumed
    } else {
        CreditStatus::Active
    };
    Ok((left, status))
}
