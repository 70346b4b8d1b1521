use condo_core_api::domain::distribution::{distribute, rounding_drift, ChargePreview, DistributionMethod, UnitShare};
use condo_core_api::domain::settlement::{assert_settlement_conserved, cancel_settlement};
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::requests::{CancelDocumentRequest, CommitChargesRequest};
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::repository::create_batch::CreateBatch;
use condo_core_db::repository::update_batch::UpdateBatch;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use validator::Validate;

use super::{bounded, lock_one, open_audit_log};
use crate::postgres_repositories::BillingRepositories;

/// Previews how `total` would be split. Nothing is written.
pub fn distribute_charges(
    units: &[UnitShare],
    total: Decimal,
    method: &DistributionMethod,
) -> BillingResult<Vec<ChargePreview>> {
    let previews = distribute(units, total, method)?;
    if !matches!(method, DistributionMethod::ByConsumption { .. }) {
        debug!(
            %total,
            drift = %rounding_drift(&previews, total),
            units = previews.len(),
            "distribution computed"
        );
    }
    Ok(previews)
}

/// Posts one pending charge per included preview with a positive final amount.
#[instrument(skip(repos, request), fields(tenant_id = %request.tenant_id, period = %request.period))]
pub async fn commit_charges(
    repos: &BillingRepositories,
    request: CommitChargesRequest,
) -> BillingResult<Vec<ChargeModel>> {
    request.validate()?;
    let concept = bounded::<100>("concept", &request.concept)?;
    let period = bounded::<7>("period", &request.period)?;

    let charges = build_charges(&request, &concept, &period)?;
    if charges.is_empty() {
        return Err(BillingError::validation("no preview is billable"));
    }
    for charge in &charges {
        assert_settlement_conserved(charge)?;
    }

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    let saved = repos.charge_repository.create_batch(charges, audit_log_id).await?;

    let posted: Decimal = saved.iter().map(|c| c.total_amount).sum();
    info!(charges = saved.len(), %posted, "charges committed");
    Ok(saved)
}

fn build_charges(
    request: &CommitChargesRequest,
    concept: &heapless::String<100>,
    period: &heapless::String<7>,
) -> BillingResult<Vec<ChargeModel>> {
    let mut charges = Vec::with_capacity(request.previews.len());
    for preview in &request.previews {
        if preview.final_amount < Decimal::ZERO {
            return Err(BillingError::validation(format!(
                "final amount for unit {} cannot be negative",
                preview.unit_id
            )));
        }
        if preview.final_amount.round_dp(2) != preview.final_amount {
            return Err(BillingError::validation(format!(
                "final amount for unit {} has sub-cent precision",
                preview.unit_id
            )));
        }
        if let Some(amount) = preview.billable_amount() {
            charges.push(ChargeModel::pending(
                request.tenant_id,
                preview.unit_id,
                request.charge_type,
                concept.clone(),
                period.clone(),
                request.due_date,
                amount,
            ));
        }
    }
    Ok(charges)
}

/// Voids a charge nothing has been applied to. Cancelling twice is a no-op.
#[instrument(skip(repos, request), fields(charge_id = %request.document_id))]
pub async fn cancel_charge(
    repos: &BillingRepositories,
    request: CancelDocumentRequest,
) -> BillingResult<ChargeModel> {
    request.validate()?;
    let reason = bounded::<500>("reason", &request.reason)?;

    let mut charge: ChargeModel = lock_one(&*repos.charge_repository, "charge", request.document_id).await?;
    if !cancel_settlement(&mut charge)? {
        info!("charge already cancelled");
        return Ok(charge);
    }
    charge.cancellation_reason = Some(reason);
    assert_settlement_conserved(&charge)?;

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    let mut updated = repos.charge_repository.update_batch(vec![charge], audit_log_id).await?;
    info!("charge cancelled");
    updated
        .pop()
        .ok_or_else(|| BillingError::InvariantViolation("cancelled charge was not written".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::setup_test_context;
    use chrono::NaiveDate;
    use condo_core_api::domain::settlement::{ChargeType, SettlementStatus};
    use condo_core_db::repository::load_batch::LoadBatch;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn commit_request(tenant_id: Uuid, previews: Vec<ChargePreview>) -> CommitChargesRequest {
        CommitChargesRequest {
            tenant_id,
            charge_type: ChargeType::Maintenance,
            concept: "Cuota de mantenimiento".to_string(),
            period: "2024-05".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            previews,
            actor_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_distribution_preview_keeps_rounding_drift() {
        let units: Vec<UnitShare> = (0..3)
            .map(|_| UnitShare::with_aliquot(Uuid::new_v4(), dec!(1)))
            .collect();
        let previews = distribute_charges(&units, dec!(100), &DistributionMethod::ByAliquot).unwrap();
        assert!(previews.iter().all(|p| p.computed_amount == dec!(33.33)));
        assert_eq!(rounding_drift(&previews, dec!(100)), dec!(-0.01));
    }

    #[tokio::test]
    async fn test_commit_posts_only_billable_previews() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let units: Vec<UnitShare> = [dec!(50), dec!(30), dec!(20)]
            .iter()
            .map(|a| UnitShare::with_aliquot(Uuid::new_v4(), *a))
            .collect();
        let mut previews = distribute_charges(&units, dec!(1000), &DistributionMethod::ByAliquot)?;
        previews[1].override_amount(dec!(250.00))?;
        previews[2].exclude();

        let charges = commit_charges(repos, commit_request(Uuid::new_v4(), previews)).await?;

        assert_eq!(charges.len(), 2);
        assert_eq!(charges[0].total_amount, dec!(500.00));
        assert_eq!(charges[1].total_amount, dec!(250.00));
        assert!(charges.iter().all(|c| c.balance == c.total_amount && c.status == SettlementStatus::Pending));

        Ok(())
    }

    #[tokio::test]
    async fn test_commit_rejects_invalid_period() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let units = vec![UnitShare::with_aliquot(Uuid::new_v4(), dec!(1))];
        let previews = distribute_charges(&units, dec!(10), &DistributionMethod::Equal)?;
        let mut request = commit_request(Uuid::new_v4(), previews);
        request.period = "2024-13".to_string();

        let result = commit_charges(ctx.repos(), request).await;
        assert!(matches!(result, Err(BillingError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_charge_is_idempotent() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let units = vec![UnitShare::with_aliquot(Uuid::new_v4(), dec!(1))];
        let previews = distribute_charges(&units, dec!(80), &DistributionMethod::Equal)?;
        let charge = commit_charges(repos, commit_request(Uuid::new_v4(), previews)).await?.remove(0);

        let request = CancelDocumentRequest {
            document_id: charge.id,
            reason: "Cargo duplicado".to_string(),
            actor_id: Uuid::new_v4(),
        };
        let cancelled = cancel_charge(repos, request.clone()).await?;
        assert_eq!(cancelled.status, SettlementStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Cargo duplicado"));

        let again = cancel_charge(repos, request).await?;
        assert_eq!(again.status, SettlementStatus::Cancelled);

        let stored = repos.charge_repository.load_batch(&[charge.id]).await?.remove(0).ok_or("charge missing")?;
        assert_eq!(stored.status, SettlementStatus::Cancelled);
        Ok(())
    }
}
