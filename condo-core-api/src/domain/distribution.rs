//! Splits a billing total across units.
//!
//! Each unit's share is rounded to cents on its own and the leftover cents are not pushed onto
//! any unit: the sum of a distribution can drift from the requested total by up to half a cent
//! per unit. Historical charges were posted this way, so the drift is kept.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::round_money;
use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DistributionMethod {
    /// Proportional to each unit's ownership share.
    ByAliquot,
    /// Same amount for every unit.
    Equal,
    /// Metered: `consumption * unit_rate`; the requested total is informational.
    ByConsumption { unit_rate: Decimal },
}

/// A unit as seen by the distribution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitShare {
    pub unit_id: Uuid,
    pub aliquot: Decimal,
    #[serde(default)]
    pub consumption: Option<Decimal>,
}

impl UnitShare {
    pub fn with_aliquot(unit_id: Uuid, aliquot: Decimal) -> Self {
        Self {
            unit_id,
            aliquot,
            consumption: None,
        }
    }

    pub fn with_consumption(unit_id: Uuid, consumption: Decimal) -> Self {
        Self {
            unit_id,
            aliquot: Decimal::ZERO,
            consumption: Some(consumption),
        }
    }
}

/// Editable per-unit result; nothing is persisted until the previews are committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargePreview {
    pub unit_id: Uuid,
    pub computed_amount: Decimal,
    pub final_amount: Decimal,
    pub include: bool,
}

impl ChargePreview {
    fn new(unit_id: Uuid, amount: Decimal) -> Self {
        Self {
            unit_id,
            computed_amount: amount,
            final_amount: amount,
            include: true,
        }
    }

    pub fn override_amount(&mut self, amount: Decimal) -> BillingResult<()> {
        if amount < Decimal::ZERO {
            return Err(BillingError::validation(format!(
                "final amount for unit {} cannot be negative",
                self.unit_id
            )));
        }
        self.final_amount = round_money(amount);
        Ok(())
    }

    pub fn exclude(&mut self) {
        self.include = false;
    }

    /// Amount a committed charge would carry, if any.
    pub fn billable_amount(&self) -> Option<Decimal> {
        if self.include && self.final_amount > Decimal::ZERO {
            Some(self.final_amount)
        } else {
            None
        }
    }
}

pub fn distribute(
    units: &[UnitShare],
    total: Decimal,
    method: &DistributionMethod,
) -> BillingResult<Vec<ChargePreview>> {
    if units.is_empty() {
        return Err(BillingError::validation("no units to distribute across"));
    }

    match method {
        DistributionMethod::ByAliquot => {
            require_positive_total(total)?;
            if let Some(unit) = units.iter().find(|u| u.aliquot < Decimal::ZERO) {
                return Err(BillingError::validation(format!(
                    "unit {} has a negative aliquot",
                    unit.unit_id
                )));
            }
            let aliquot_sum: Decimal = units.iter().map(|u| u.aliquot).sum();
            if aliquot_sum.is_zero() {
                return Err(BillingError::validation("aliquots sum to zero"));
            }
            Ok(units
                .iter()
                .map(|u| ChargePreview::new(u.unit_id, round_money(total * u.aliquot / aliquot_sum)))
                .collect())
        }
        DistributionMethod::Equal => {
            require_positive_total(total)?;
            let share = round_money(total / Decimal::from(units.len()));
            Ok(units
                .iter()
                .map(|u| ChargePreview::new(u.unit_id, share))
                .collect())
        }
        DistributionMethod::ByConsumption { unit_rate } => {
            if *unit_rate <= Decimal::ZERO {
                return Err(BillingError::validation("unit rate must be positive"));
            }
            units
                .iter()
                .map(|u| {
                    let consumption = u.consumption.ok_or_else(|| {
                        BillingError::validation(format!(
                            "unit {} has no metered consumption",
                            u.unit_id
                        ))
                    })?;
                    if consumption < Decimal::ZERO {
                        return Err(BillingError::validation(format!(
                            "unit {} has negative consumption",
                            u.unit_id
                        )));
                    }
                    Ok(ChargePreview::new(u.unit_id, round_money(consumption * unit_rate)))
                })
                .collect()
        }
    }
}

/// Difference between the distributed amounts and the requested total.
pub fn rounding_drift(previews: &[ChargePreview], total: Decimal) -> Decimal {
    previews.iter().map(|p| p.computed_amount).sum::<Decimal>() - total
}

fn require_positive_total(total: Decimal) -> BillingResult<()> {
    if total <= Decimal::ZERO {
        return Err(BillingError::validation(format!(
            "total to distribute must be positive, got {total}"
        )));
    }
    Ok(())
}
