//! Incoming payments (`REC` receipts) and their allocation to charges.

use chrono::Utc;
use condo_core_api::domain::credit::CreditOrigin;
use condo_core_api::domain::document::{DocumentStatus, DocumentType};
use condo_core_api::domain::settlement::{apply_settlement, assert_allocation_within_total, assert_settlement_conserved};
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::requests::{merge_allocations, ApplyPaymentRequest};
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::models::payment::{PaymentAllocationModel, PaymentModel};
use condo_core_db::repository::create_batch::CreateBatch;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use condo_core_db::repository::update_batch::UpdateBatch;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::credit::{append_entries, single, verify_ledger};
use super::folio::next_folio;
use super::{bounded, bounded_opt, lock_one, open_audit_log};
use crate::postgres_repositories::BillingRepositories;

/// What a payment produced: the receipt, one allocation per charge, and the credit kept from any
/// remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: PaymentModel,
    pub allocations: Vec<PaymentAllocationModel>,
    pub overpayment_credit: Option<UnitCreditModel>,
}

impl PaymentReceipt {
    pub fn folio(&self) -> String {
        self.payment.folio_display()
    }
}

#[instrument(skip(repos, request), fields(account_id = %request.financial_account_id, total = %request.total_amount))]
pub async fn apply_payment(repos: &BillingRepositories, request: ApplyPaymentRequest) -> BillingResult<PaymentReceipt> {
    request.validate()?;
    if request.credit_overpayment && request.unit_id.is_none() {
        return Err(BillingError::validation("crediting an overpayment requires a unit"));
    }
    let reference = bounded_opt::<255>("reference", request.reference.as_deref())?;

    let account = repos
        .financial_account_repository
        .find_by_id(request.financial_account_id)
        .await?
        .ok_or_else(|| BillingError::not_found("financial account", request.financial_account_id))?;
    let tenant_id = account.tenant_id;

    let folio = next_folio(repos, tenant_id, DocumentType::Rec).await?;
    let payment_id = Uuid::new_v4();

    let requested = merge_allocations(&request.allocations);
    let target_ids: Vec<Uuid> = requested.iter().map(|a| a.target_id).collect();
    let loaded = repos.charge_repository.load_for_update(&target_ids).await?;

    let mut charges: Vec<ChargeModel> = Vec::with_capacity(requested.len());
    let mut allocations = Vec::with_capacity(requested.len());
    let mut allocated = Decimal::ZERO;
    for (allocation, charge) in requested.iter().zip(loaded) {
        let mut charge = charge.ok_or_else(|| BillingError::not_found("charge", allocation.target_id))?;
        if charge.tenant_id != tenant_id {
            return Err(BillingError::rule(format!(
                "charge {} belongs to another tenant",
                charge.id
            )));
        }
        if let Some(unit_id) = request.unit_id {
            if charge.unit_id != unit_id {
                return Err(BillingError::rule(format!(
                    "charge {} does not belong to unit {unit_id}",
                    charge.id
                )));
            }
        }

        let applied = apply_settlement(&mut charge, allocation.amount)?;
        if applied < allocation.amount {
            debug!(charge_id = %charge.id, requested = %allocation.amount, %applied, "allocation clamped to charge balance");
        }
        assert_settlement_conserved(&charge)?;
        allocated += applied;
        allocations.push(PaymentAllocationModel::new(payment_id, charge.id, applied));
        charges.push(charge);
    }
    assert_allocation_within_total(payment_id, request.total_amount, allocated)?;

    let mut account = lock_one(&*repos.financial_account_repository, "financial account", account.id).await?;
    account.record_inflow(request.total_amount);

    let remainder = request.total_amount - allocated;
    let overpayment = match request.unit_id {
        Some(unit_id) if request.credit_overpayment && remainder > Decimal::ZERO => {
            repos.unit_credit_repository.lock_unit(unit_id).await?;
            let reason = bounded::<255>("reason", &format!("overpayment on {}", DocumentType::Rec.format_folio(folio)))?;
            let mut credit = UnitCreditModel::credit_in(
                tenant_id,
                unit_id,
                CreditOrigin::Overpayment,
                remainder,
                reason,
                request.actor_id,
            );
            credit.payment_id = Some(payment_id);
            Some(credit)
        }
        _ => None,
    };

    let payment = PaymentModel {
        id: payment_id,
        tenant_id,
        financial_account_id: account.id,
        unit_id: request.unit_id,
        folio_rec: folio,
        payment_date: request.payment_date,
        total_amount: request.total_amount,
        allocated_amount: allocated,
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
    let payment = single(repos.payment_repository.create_batch(vec![payment], audit_log_id).await?)?;
    let allocations = repos
        .payment_allocation_repository
        .create_batch(allocations, audit_log_id)
        .await?;
    repos.charge_repository.update_batch(charges, audit_log_id).await?;
    repos
        .financial_account_repository
        .update_batch(vec![account], audit_log_id)
        .await?;

    let overpayment_credit = match overpayment {
        Some(credit) => {
            let unit_id = credit.unit_id;
            let saved = single(append_entries(repos, unit_id, vec![credit], audit_log_id).await?)?;
            verify_ledger(repos, unit_id).await?;
            Some(saved)
        }
        None => None,
    };

    info!(
        folio = %payment.folio_display(),
        %allocated,
        credited = overpayment_credit.is_some(),
        "payment applied"
    );
    Ok(PaymentReceipt {
        payment,
        allocations,
        overpayment_credit,
    })
}
