use chrono::NaiveDate;
use condo_core_api::domain::billing_rules::{compute_early_discount, compute_late_fee, LateFeeAssessment};
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::policy_provider::BillingPolicyProvider;
use condo_core_db::repository::load_batch::LoadBatch;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::postgres_repositories::BillingRepositories;

/// What the tenant's policies say about a charge on a given day. Nothing is posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeAssessment {
    pub charge_id: Uuid,
    pub as_of: NaiveDate,
    pub early_discount: Decimal,
    pub late_fee: LateFeeAssessment,
}

#[instrument(skip(repos, policies))]
pub async fn assess_charge(
    repos: &BillingRepositories,
    policies: &dyn BillingPolicyProvider,
    charge_id: Uuid,
    as_of: NaiveDate,
) -> BillingResult<ChargeAssessment> {
    let charge = repos
        .charge_repository
        .load_batch(&[charge_id])
        .await?
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| BillingError::not_found("charge", charge_id))?;
    let policies = policies.policies_for(charge.tenant_id).await?;

    let early_discount = match &policies.early_payment {
        Some(policy) => compute_early_discount(&charge, as_of, policy)?,
        None => Decimal::ZERO,
    };
    let late_fee = match &policies.late_fee {
        Some(policy) => compute_late_fee(&charge, as_of, policy)?,
        None => LateFeeAssessment {
            periods: 0,
            fee: Decimal::ZERO,
            capped: false,
        },
    };

    debug!(%early_discount, late_fee = %late_fee.fee, periods = late_fee.periods, "charge assessed");
    Ok(ChargeAssessment {
        charge_id,
        as_of,
        early_discount,
        late_fee,
    })
}
