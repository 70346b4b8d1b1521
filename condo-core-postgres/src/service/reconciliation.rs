//! Bank reconciliation snapshots.
//!
//! A snapshot matches the selected payments and egresses of one account against the bank's
//! closing balance. Once a snapshot is `conciliada` its documents are frozen: they cannot be
//! cancelled nor selected again. A check left in transit is the exception to re-selection; a later
//! period picks it up again until it is reported cashed.

use chrono::Utc;
use condo_core_api::domain::reconciliation::{
    compute_reconciliation_summary, ReconciliationInput, ReconciliationStatus,
};
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::requests::{CloseReconciliationRequest, ReconciliationRequest};
use condo_core_db::models::reconciliation::{ReconciliationItemModel, ReconciliationModel};
use condo_core_db::repository::create_batch::CreateBatch;
use condo_core_db::repository::update_batch::UpdateBatch;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::credit::single;
use super::{lock_one, open_audit_log};
use crate::postgres_repositories::BillingRepositories;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSnapshot {
    pub reconciliation: ReconciliationModel,
    pub items: Vec<ReconciliationItemModel>,
}

#[instrument(skip(repos, request), fields(account_id = %request.financial_account_id, cutoff = %request.cutoff_date))]
pub async fn compute_reconciliation(
    repos: &BillingRepositories,
    request: ReconciliationRequest,
) -> BillingResult<ReconciliationSnapshot> {
    request.validate()?;
    let account_id = request.financial_account_id;
    let reconciliation_id = Uuid::new_v4();

    let mut items = Vec::new();
    let mut ingresos = Vec::new();
    let mut egresos = Vec::new();

    let payments = repos.payment_repository.load_for_share(&request.selected_payments).await?;
    for (payment_id, payment) in request.selected_payments.iter().zip(payments) {
        let payment = payment.ok_or_else(|| BillingError::not_found("payment", payment_id))?;
        let folio = payment.folio_display();
        if payment.financial_account_id != account_id {
            return Err(BillingError::rule(format!("{folio} was received on another account")));
        }
        if payment.is_cancelled() {
            return Err(BillingError::rule(format!("{folio} is cancelled")));
        }
        if payment.payment_date > request.cutoff_date {
            return Err(BillingError::rule(format!("{folio} is dated after the cutoff")));
        }
        ingresos.push(payment.total_amount);
        items.push(ReconciliationItemModel::for_payment(
            reconciliation_id,
            payment.id,
            payment.total_amount,
        ));
    }

    let egress_ids: Vec<Uuid> = request.selected_egresses.iter().map(|s| s.egress_id).collect();
    let egresses = repos.egress_repository.load_for_share(&egress_ids).await?;
    for (selection, egress) in request.selected_egresses.iter().zip(egresses) {
        let egress = egress.ok_or_else(|| BillingError::not_found("egress", selection.egress_id))?;
        let folio = egress.folio_display();
        if egress.financial_account_id != account_id {
            return Err(BillingError::rule(format!("{folio} was paid from another account")));
        }
        if egress.is_cancelled() {
            return Err(BillingError::rule(format!("{folio} is cancelled")));
        }
        if egress.egress_date > request.cutoff_date {
            return Err(BillingError::rule(format!("{folio} is dated after the cutoff")));
        }
        egresos.push(egress.to_reconciliation_line(selection.is_check_cashed));
        items.push(ReconciliationItemModel::for_egress(
            reconciliation_id,
            egress.id,
            egress.total_amount,
            selection.is_check_cashed,
        ));
    }

    let locked = repos
        .reconciliation_item_repository
        .settled_document_ids(&request.selected_payments, &egress_ids)
        .await?;
    if !locked.is_empty() {
        warn!(count = locked.len(), "selection includes reconciled documents");
        return Err(BillingError::rule(format!(
            "{} selected documents already belong to a reconciled period",
            locked.len()
        )));
    }

    let account = lock_one(&*repos.financial_account_repository, "financial account", account_id).await?;
    let opening_balance = match repos.reconciliation_repository.find_last_locked(account_id).await? {
        Some(previous) if previous.cutoff_date >= request.cutoff_date => {
            return Err(BillingError::rule(format!(
                "account is already reconciled up to {}",
                previous.cutoff_date
            )));
        }
        Some(previous) => previous.closing_balance_bank,
        None => account.opening_balance,
    };

    let summary = compute_reconciliation_summary(&ReconciliationInput {
        opening_balance,
        ingresos,
        egresos,
        bank_closing_balance: request.bank_closing_balance,
    });
    let mut reconciliation = ReconciliationModel::from_summary(
        account.tenant_id,
        account_id,
        request.cutoff_date,
        opening_balance,
        request.bank_closing_balance,
        &summary,
        request.actor_id,
    );
    reconciliation.id = reconciliation_id;
    reconciliation.hash = reconciliation
        .compute_hash(&items)
        .map_err(BillingError::InvariantViolation)?;

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    let reconciliation = single(
        repos
            .reconciliation_repository
            .create_batch(vec![reconciliation], audit_log_id)
            .await?,
    )?;
    let items = repos
        .reconciliation_item_repository
        .create_batch(items, audit_log_id)
        .await?;

    info!(
        status = ?reconciliation.status,
        difference = %reconciliation.difference,
        in_transit = %reconciliation.in_transit_total,
        "reconciliation computed"
    );
    Ok(ReconciliationSnapshot { reconciliation, items })
}

/// `conciliada -> cerrada`. Closing an already closed snapshot changes nothing.
#[instrument(skip(repos, request), fields(reconciliation_id = %request.reconciliation_id))]
pub async fn close_reconciliation(
    repos: &BillingRepositories,
    request: CloseReconciliationRequest,
) -> BillingResult<ReconciliationSnapshot> {
    request.validate()?;

    let mut reconciliation: ReconciliationModel =
        lock_one(&*repos.reconciliation_repository, "reconciliation", request.reconciliation_id).await?;
    match reconciliation.status {
        ReconciliationStatus::Cerrada => {
            info!("reconciliation already closed");
        }
        ReconciliationStatus::Borrador => {
            return Err(BillingError::rule(format!(
                "reconciliation {} still has a difference of {}",
                reconciliation.id, reconciliation.difference
            )));
        }
        ReconciliationStatus::Conciliada => {
            reconciliation.status = ReconciliationStatus::Cerrada;
            reconciliation.closed_by = Some(request.actor_id);
            reconciliation.closed_at = Some(Utc::now());

            let audit_log_id = open_audit_log(repos, request.actor_id).await?;
            reconciliation = single(
                repos
                    .reconciliation_repository
                    .update_batch(vec![reconciliation], audit_log_id)
                    .await?,
            )?;
            info!("reconciliation closed");
        }
    }

    let items = repos
        .reconciliation_item_repository
        .find_by_reconciliation(reconciliation.id)
        .await?;
    Ok(ReconciliationSnapshot { reconciliation, items })
}

/// Whether a payment or egress is frozen by a reconciled period.
pub async fn is_document_reconciled(repos: &BillingRepositories, document_id: Uuid) -> BillingResult<bool> {
    Ok(repos.reconciliation_item_repository.is_locked(document_id).await?)
}
