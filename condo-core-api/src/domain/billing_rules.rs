//! Early-payment discounts and late-payment fees.
//!
//! Pure functions: the caller decides whether and when to post the result as a charge
//! adjustment. Policy values come from the tenant configuration store.

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::domain::money::round_money;
use crate::domain::settlement::{Settleable, SettlementStatus};
use crate::error::{BillingError, BillingResult};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    Percentage,
    FixedAmount,
}

/// Which figure a percentage is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOn {
    Balance,
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyPaymentPolicy {
    pub rate_type: RateType,
    pub value: Decimal,
    /// Last day of the due month on which the discount still applies.
    pub cutoff_day: u32,
    pub apply_on: ApplyOn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateFeePolicy {
    pub rate_type: RateType,
    pub value: Decimal,
    pub grace_days: u32,
    pub apply_on: ApplyOn,
    /// Cap on the cumulative fee, as a percentage of the charge total.
    #[serde(default)]
    pub max_rate: Option<Decimal>,
    #[serde(default)]
    pub compound: bool,
}

/// Per-tenant billing rules as stored by the tenant configuration store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingPolicies {
    #[serde(default)]
    pub early_payment: Option<EarlyPaymentPolicy>,
    #[serde(default)]
    pub late_fee: Option<LateFeePolicy>,
}

impl BillingPolicies {
    pub fn from_json(raw: &str) -> BillingResult<Self> {
        let policies: BillingPolicies = serde_json::from_str(raw)
            .map_err(|e| BillingError::validation(format!("invalid billing policy document: {e}")))?;
        if let Some(policy) = &policies.early_payment {
            policy.validate()?;
        }
        if let Some(policy) = &policies.late_fee {
            policy.validate()?;
        }
        Ok(policies)
    }
}

/// A charge the rule engine can price.
pub trait Billable: Settleable {
    fn due_date(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateFeeAssessment {
    /// Billing periods elapsed since the grace period ended.
    pub periods: u32,
    pub fee: Decimal,
    /// True when `max_rate` reduced the fee.
    pub capped: bool,
}

impl LateFeeAssessment {
    fn none() -> Self {
        Self {
            periods: 0,
            fee: Decimal::ZERO,
            capped: false,
        }
    }
}

impl EarlyPaymentPolicy {
    pub fn validate(&self) -> BillingResult<()> {
        validate_rate(self.rate_type, self.value)?;
        if !(1..=31).contains(&self.cutoff_day) {
            return Err(BillingError::validation(format!(
                "cutoff day must be between 1 and 31, got {}",
                self.cutoff_day
            )));
        }
        Ok(())
    }
}

impl LateFeePolicy {
    pub fn validate(&self) -> BillingResult<()> {
        validate_rate(self.rate_type, self.value)?;
        if let Some(max_rate) = self.max_rate {
            if max_rate < Decimal::ZERO {
                return Err(BillingError::validation("max rate cannot be negative"));
            }
        }
        Ok(())
    }
}

pub fn compute_early_discount<C: Billable>(
    charge: &C,
    as_of: NaiveDate,
    policy: &EarlyPaymentPolicy,
) -> BillingResult<Decimal> {
    policy.validate()?;
    if charge.settlement_status() != SettlementStatus::Pending || charge.balance() <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let due = charge.due_date();
    let cutoff_day = policy.cutoff_day.min(last_day_of_month(due.year(), due.month()));
    let cutoff = NaiveDate::from_ymd_opt(due.year(), due.month(), cutoff_day)
        .ok_or_else(|| BillingError::validation(format!("invalid cutoff day {cutoff_day}")))?;
    if as_of > cutoff {
        return Ok(Decimal::ZERO);
    }

    let discount = match policy.rate_type {
        RateType::Percentage => basis(charge, policy.apply_on) * policy.value / HUNDRED,
        RateType::FixedAmount => policy.value,
    };
    Ok(round_money(discount.min(charge.balance())))
}

pub fn compute_late_fee<C: Billable>(
    charge: &C,
    as_of: NaiveDate,
    policy: &LateFeePolicy,
) -> BillingResult<LateFeeAssessment> {
    policy.validate()?;
    if charge.settlement_status() != SettlementStatus::Pending || charge.balance() <= Decimal::ZERO {
        return Ok(LateFeeAssessment::none());
    }

    let late_from = charge
        .due_date()
        .checked_add_days(Days::new(u64::from(policy.grace_days)))
        .ok_or_else(|| BillingError::validation("grace period overflows the calendar"))?;
    if as_of <= late_from {
        return Ok(LateFeeAssessment::none());
    }

    let periods = 1 + whole_months_between(late_from, as_of);
    let base = basis(charge, policy.apply_on);
    let cap = policy
        .max_rate
        .map(|max_rate| round_money(charge.total_amount() * max_rate / HUNDRED));
    let fee = match policy.rate_type {
        RateType::FixedAmount => Some(policy.value * Decimal::from(periods)),
        RateType::Percentage => {
            let rate = policy.value / HUNDRED;
            if policy.compound {
                (Decimal::ONE + rate)
                    .checked_powu(u64::from(periods))
                    .and_then(|growth| base.checked_mul(growth - Decimal::ONE))
            } else {
                Some(base * rate * Decimal::from(periods))
            }
        }
    };

    // An overflowing compound fee is past any cap.
    let (fee, capped) = match (fee.map(round_money), cap) {
        (Some(fee), Some(cap)) if fee > cap => (cap, true),
        (Some(fee), _) => (fee, false),
        (None, Some(cap)) => (cap, true),
        (None, None) => return Err(BillingError::validation("compounded late fee overflows")),
    };
    Ok(LateFeeAssessment { periods, fee, capped })
}

fn basis<C: Billable>(charge: &C, apply_on: ApplyOn) -> Decimal {
    match apply_on {
        ApplyOn::Balance => charge.balance(),
        ApplyOn::Total => charge.total_amount(),
    }
}

fn validate_rate(rate_type: RateType, value: Decimal) -> BillingResult<()> {
    if value < Decimal::ZERO {
        return Err(BillingError::validation("policy value cannot be negative"));
    }
    if rate_type == RateType::Percentage && value > HUNDRED {
        return Err(BillingError::validation(format!(
            "percentage policy value must not exceed 100, got {value}"
        )));
    }
    Ok(())
}

fn whole_months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
