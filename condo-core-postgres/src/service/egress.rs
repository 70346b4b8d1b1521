//! Outgoing payments (`EG` vouchers) and their allocation to payables.

use chrono::Utc;
use condo_core_api::domain::document::{DocumentStatus, DocumentType};
use condo_core_api::domain::settlement::{apply_settlement, assert_allocation_within_total, assert_settlement_conserved};
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::requests::{merge_allocations, ApplyEgressRequest};
use condo_core_db::models::egress::{EgressAllocationModel, EgressModel, PayableModel};
use condo_core_db::repository::create_batch::CreateBatch;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use condo_core_db::repository::update_batch::UpdateBatch;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::credit::single;
use super::folio::next_folio;
use super::{bounded_opt, lock_one, open_audit_log};
use crate::postgres_repositories::BillingRepositories;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgressVoucher {
    pub egress: EgressModel,
    pub allocations: Vec<EgressAllocationModel>,
}

#[instrument(skip(repos, request), fields(account_id = %request.financial_account_id, total = %request.total_amount))]
pub async fn apply_egress(repos: &BillingRepositories, request: ApplyEgressRequest) -> BillingResult<EgressVoucher> {
    request.validate()?;
    let check_number = bounded_opt::<32>("check_number", request.check_number.as_deref())?;
    let reference = bounded_opt::<255>("reference", request.reference.as_deref())?;

    let account = repos
        .financial_account_repository
        .find_by_id(request.financial_account_id)
        .await?
        .ok_or_else(|| BillingError::not_found("financial account", request.financial_account_id))?;
    let tenant_id = account.tenant_id;

    let folio = next_folio(repos, tenant_id, DocumentType::Eg).await?;
    let egress_id = Uuid::new_v4();

    let requested = merge_allocations(&request.allocations);
    let target_ids: Vec<Uuid> = requested.iter().map(|a| a.target_id).collect();
    let loaded = repos.payable_repository.load_for_update(&target_ids).await?;

    let mut payables: Vec<PayableModel> = Vec::with_capacity(requested.len());
    let mut allocations = Vec::with_capacity(requested.len());
    let mut allocated = Decimal::ZERO;
    for (allocation, payable) in requested.iter().zip(loaded) {
        let mut payable = payable.ok_or_else(|| BillingError::not_found("payable", allocation.target_id))?;
        if payable.tenant_id != tenant_id {
            return Err(BillingError::rule(format!(
                "payable {} belongs to another tenant",
                payable.id
            )));
        }
        let applied = apply_settlement(&mut payable, allocation.amount)?;
        if applied < allocation.amount {
            debug!(payable_id = %payable.id, requested = %allocation.amount, %applied, "allocation clamped to payable balance");
        }
        assert_settlement_conserved(&payable)?;
        allocated += applied;
        allocations.push(EgressAllocationModel::new(egress_id, payable.id, applied));
        payables.push(payable);
    }
    assert_allocation_within_total(egress_id, request.total_amount, allocated)?;

    let mut account = lock_one(&*repos.financial_account_repository, "financial account", account.id).await?;
    account.record_outflow(request.total_amount);

    let egress = EgressModel {
        id: egress_id,
        tenant_id,
        financial_account_id: account.id,
        folio_eg: folio,
        egress_date: request.egress_date,
        total_amount: request.total_amount,
        allocated_amount: allocated,
        check_number,
        reference,
        status: DocumentStatus::Available,
        cancellation_reason: None,
        cancelled_by: None,
        cancelled_at: None,
        created_by: request.actor_id,
        created_at: Utc::now(),
        audit_log_id: None,
    };

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    let egress = single(repos.egress_repository.create_batch(vec![egress], audit_log_id).await?)?;
    let allocations = repos
        .egress_allocation_repository
        .create_batch(allocations, audit_log_id)
        .await?;
    repos.payable_repository.update_batch(payables, audit_log_id).await?;
    repos
        .financial_account_repository
        .update_batch(vec![account], audit_log_id)
        .await?;

    info!(folio = %egress.folio_display(), %allocated, "egress applied");
    Ok(EgressVoucher { egress, allocations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::egress::payable_repository::test_utils::test_utils::create_test_payable;
    use crate::service::folio::provision_folio_counter;
    use crate::test_helper::{create_test_account, create_test_audit_log, setup_test_context};
    use chrono::NaiveDate;
    use condo_core_api::domain::settlement::SettlementStatus;
    use condo_core_api::service::requests::AllocationRequest;
    use rust_decimal_macros::dec;
    use std::error::Error;

    #[tokio::test]
    async fn test_egress_pays_payables_with_check() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let tenant_id = Uuid::new_v4();
        provision_folio_counter(repos, tenant_id).await?;
        let account = create_test_account(repos, tenant_id, dec!(1000)).await?;
        let audit_log = create_test_audit_log(repos).await?;
        let payable = single(
            repos
                .payable_repository
                .create_batch(vec![create_test_payable(tenant_id, dec!(300))], audit_log.id)
                .await?,
        )?;

        let request = ApplyEgressRequest {
            financial_account_id: account.id,
            egress_date: NaiveDate::from_ymd_opt(2024, 5, 21).unwrap(),
            total_amount: dec!(300),
            allocations: vec![
                AllocationRequest { target_id: payable.id, amount: dec!(200) },
                AllocationRequest { target_id: payable.id, amount: dec!(100) },
            ],
            check_number: Some("000123".to_string()),
            reference: None,
            actor_id: Uuid::new_v4(),
        };
        let voucher = apply_egress(repos, request.clone()).await?;

        assert_eq!(voucher.egress.folio_display(), "EG-000001");
        assert_eq!(voucher.allocations.len(), 1);
        assert_eq!(voucher.allocations[0].amount_allocated, dec!(300));
        assert!(voucher.egress.to_reconciliation_line(false).is_in_transit());

        let stored = repos.egress_allocation_repository.find_by_egress(voucher.egress.id).await?;
        assert_eq!(stored.len(), 1);
        let payable = lock_one(&*repos.payable_repository, "payable", payable.id).await?;
        assert_eq!(payable.status, SettlementStatus::Paid);
        let account = repos
            .financial_account_repository
            .find_by_id(account.id)
            .await?
            .ok_or("account missing")?;
        assert_eq!(account.current_balance, dec!(700));

        let again = apply_egress(repos, request).await;
        assert!(matches!(again, Err(BillingError::BusinessRuleViolation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_egress_without_folio_counter_is_fatal() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let account = create_test_account(repos, Uuid::new_v4(), dec!(0)).await?;

        let result = apply_egress(
            repos,
            ApplyEgressRequest {
                financial_account_id: account.id,
                egress_date: NaiveDate::from_ymd_opt(2024, 5, 21).unwrap(),
                total_amount: dec!(50),
                allocations: Vec::new(),
                check_number: None,
                reference: Some("Comisión bancaria".to_string()),
                actor_id: Uuid::new_v4(),
            },
        )
        .await;
        assert!(matches!(result, Err(BillingError::FatalConfiguration(_))));
        Ok(())
    }
}
