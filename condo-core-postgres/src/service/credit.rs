//! Unit credit ledger operations.
//!
//! Every operation that writes a unit's ledger first takes the unit's advisory lock, then locks
//! the source rows it draws from. Running balances are computed under that lock, and the two
//! ledger totals are compared before the caller commits.

use chrono::Duration;
use condo_core_api::domain::credit::{
    available_credit, drawn_source_state, plan_debit, plan_fifo, CreditDraw, CreditOrigin, CreditStatus,
    MovementType,
};
use condo_core_api::domain::settlement::{apply_settlement, assert_settlement_conserved, SettlementStatus};
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::requests::{
    ApplyCreditRequest, AutoApplyCreditRequest, CancelCreditRequest, ManualCreditRequest, RefundCreditRequest,
    TransferCreditRequest,
};
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::repository::create_batch::CreateBatch;
use condo_core_db::repository::pagination::{Page, PageRequest};
use condo_core_db::repository::update_batch::UpdateBatch;
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{bounded, lock_one, open_audit_log};
use crate::postgres_repositories::BillingRepositories;

/// Result of drawing credit against a charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditApplication {
    pub charge: ChargeModel,
    /// One `credit_out` entry per source drawn from, oldest source first.
    pub entries: Vec<UnitCreditModel>,
    pub total_applied: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTransfer {
    pub debits: Vec<UnitCreditModel>,
    pub credit: UnitCreditModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCancellation {
    pub credit: UnitCreditModel,
    pub reversal: Option<UnitCreditModel>,
    pub already_cancelled: bool,
}

/// Appends entries for one unit, stamping each with the balance right after it.
///
/// The unit lock must already be held.
pub(crate) async fn append_entries(
    repos: &BillingRepositories,
    unit_id: Uuid,
    mut entries: Vec<UnitCreditModel>,
    audit_log_id: Uuid,
) -> BillingResult<Vec<UnitCreditModel>> {
    let mut running = repos.unit_credit_repository.ledger_balance(unit_id).await?;
    let mut previous_at = None;
    for entry in entries.iter_mut() {
        entry.movement_type.validate_amount(entry.amount)?;
        running += entry.amount;
        if running < Decimal::ZERO {
            return Err(BillingError::InsufficientCredit(format!(
                "unit {unit_id} would end at {running}"
            )));
        }
        entry.running_balance = running;
        // statement order follows created_at, which Postgres keeps to the microsecond
        if let Some(previous_at) = previous_at {
            if entry.created_at <= previous_at {
                entry.created_at = previous_at + Duration::microseconds(1);
            }
        }
        previous_at = Some(entry.created_at);
    }
    Ok(repos.unit_credit_repository.create_batch(entries, audit_log_id).await?)
}

/// Σ of all entries must equal what active sources still hold, and never go negative.
pub(crate) async fn verify_ledger(repos: &BillingRepositories, unit_id: Uuid) -> BillingResult<Decimal> {
    let totals = repos.unit_credit_repository.ledger_totals(unit_id).await?;
    if totals.balance != totals.active_remaining || totals.balance < Decimal::ZERO {
        return Err(BillingError::InvariantViolation(format!(
            "unit {unit_id} ledger sums to {} but active sources hold {}",
            totals.balance, totals.active_remaining
        )));
    }
    Ok(totals.balance)
}

/// Debit entries for `draws`, plus the drawn sources with their new remainder.
fn draw_sources(
    sources: &[UnitCreditModel],
    draws: &[CreditDraw],
    origin: CreditOrigin,
    reason: &HeaplessString<255>,
    actor_id: Uuid,
) -> BillingResult<(Vec<UnitCreditModel>, Vec<UnitCreditModel>)> {
    let mut drawn = Vec::with_capacity(draws.len());
    let mut debits = Vec::with_capacity(draws.len());
    for draw in draws {
        let source = sources
            .iter()
            .find(|s| s.id == draw.source_id)
            .ok_or_else(|| BillingError::InvariantViolation(format!("source {} is not locked", draw.source_id)))?;
        let (remaining, status) = drawn_source_state(source.remaining_amount, draw.amount)?;
        debits.push(UnitCreditModel::debit_from(
            source,
            MovementType::CreditOut,
            origin,
            draw.amount,
            reason.clone(),
            actor_id,
        ));
        let mut updated = source.clone();
        updated.remaining_amount = remaining;
        updated.status = status;
        drawn.push(updated);
    }
    Ok((drawn, debits))
}

async fn lock_units(repos: &BillingRepositories, unit_ids: &[Uuid]) -> BillingResult<()> {
    for unit_id in crate::utils::lock_order(unit_ids) {
        repos.unit_credit_repository.lock_unit(unit_id).await?;
    }
    Ok(())
}

#[instrument(skip(repos, request), fields(unit_id = %request.unit_id, amount = %request.amount))]
pub async fn create_manual_credit(
    repos: &BillingRepositories,
    request: ManualCreditRequest,
) -> BillingResult<UnitCreditModel> {
    request.validate()?;
    let reason = bounded::<255>("reason", &request.reason)?;

    repos.unit_credit_repository.lock_unit(request.unit_id).await?;
    let entry = UnitCreditModel::credit_in(
        request.tenant_id,
        request.unit_id,
        CreditOrigin::Manual,
        request.amount,
        reason,
        request.actor_id,
    );

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    let mut saved = append_entries(repos, request.unit_id, vec![entry], audit_log_id).await?;
    let balance = verify_ledger(repos, request.unit_id).await?;
    info!(%balance, "manual credit recorded");
    saved
        .pop()
        .ok_or_else(|| BillingError::InvariantViolation("credit entry was not written".into()))
}

/// Applies part of one specific credit entry to a charge of the same unit.
#[instrument(skip(repos, request), fields(credit_id = %request.credit_id, charge_id = %request.charge_id))]
pub async fn apply_credit_to_charge(
    repos: &BillingRepositories,
    request: ApplyCreditRequest,
) -> BillingResult<CreditApplication> {
    request.validate()?;

    let mut charge: ChargeModel = lock_one(&*repos.charge_repository, "charge", request.charge_id).await?;
    let credit = repos
        .unit_credit_repository
        .find_by_id(request.credit_id)
        .await?
        .ok_or_else(|| BillingError::not_found("credit", request.credit_id))?;
    if credit.unit_id != charge.unit_id || credit.tenant_id != charge.tenant_id {
        return Err(BillingError::rule(format!(
            "credit {} belongs to unit {}, charge {} to unit {}",
            credit.id, credit.unit_id, charge.id, charge.unit_id
        )));
    }

    repos.unit_credit_repository.lock_unit(credit.unit_id).await?;
    let source: UnitCreditModel = lock_one(&*repos.unit_credit_repository, "credit", credit.id).await?;
    if !source.is_source() {
        return Err(BillingError::rule(format!("entry {} is a debit, not a credit", source.id)));
    }
    if source.status != CreditStatus::Active {
        return Err(BillingError::rule(format!("credit {} is {:?}", source.id, source.status)));
    }

    let applied = apply_settlement(&mut charge, request.amount)?;
    if applied < request.amount {
        debug!(requested = %request.amount, %applied, "application clamped to charge balance");
    }
    if source.remaining_amount < applied {
        return Err(BillingError::InsufficientCredit(format!(
            "credit {} holds {}, {applied} requested",
            source.id, source.remaining_amount
        )));
    }
    assert_settlement_conserved(&charge)?;

    let reason = bounded::<255>("reason", &format!("applied to charge {}", charge.id))?;
    let draws = [CreditDraw {
        source_id: source.id,
        amount: applied,
    }];
    let (drawn, mut debits) = draw_sources(
        std::slice::from_ref(&source),
        &draws,
        CreditOrigin::ChargeApplication,
        &reason,
        request.actor_id,
    )?;
    for debit in debits.iter_mut() {
        debit.charge_id = Some(charge.id);
    }

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    repos.unit_credit_repository.update_batch(drawn, audit_log_id).await?;
    let entries = append_entries(repos, source.unit_id, debits, audit_log_id).await?;
    let charge = single(repos.charge_repository.update_batch(vec![charge], audit_log_id).await?)?;
    verify_ledger(repos, source.unit_id).await?;

    info!(%applied, "credit applied to charge");
    Ok(CreditApplication {
        charge,
        entries,
        total_applied: applied,
    })
}

/// Pays a charge from the unit's oldest credit first, up to the charge balance and `max_amount`.
///
/// Applies whatever is available when credit does not cover the whole target.
#[instrument(skip(repos, request), fields(unit_id = %request.unit_id, charge_id = %request.charge_id))]
pub async fn auto_apply_fifo(
    repos: &BillingRepositories,
    request: AutoApplyCreditRequest,
) -> BillingResult<CreditApplication> {
    request.validate()?;

    let mut charge: ChargeModel = lock_one(&*repos.charge_repository, "charge", request.charge_id).await?;
    if charge.unit_id != request.unit_id {
        return Err(BillingError::rule(format!(
            "charge {} does not belong to unit {}",
            charge.id, request.unit_id
        )));
    }
    if charge.status != SettlementStatus::Pending {
        return Err(BillingError::rule(format!("charge {} is {:?}", charge.id, charge.status)));
    }

    repos.unit_credit_repository.lock_unit(request.unit_id).await?;
    let sources = repos.unit_credit_repository.lock_active_sources(request.unit_id).await?;
    let available = available_credit(&sources);
    if available <= Decimal::ZERO {
        return Err(BillingError::InsufficientCredit(format!(
            "unit {} has no credit available",
            request.unit_id
        )));
    }

    let mut target = charge.balance.min(available);
    if let Some(max_amount) = request.max_amount {
        target = target.min(max_amount);
    }
    let draws = plan_fifo(&sources, target);
    let total: Decimal = draws.iter().map(|d| d.amount).sum();
    let applied = apply_settlement(&mut charge, total)?;
    if applied != total {
        return Err(BillingError::InvariantViolation(format!(
            "planned {total} but charge accepted {applied}"
        )));
    }
    assert_settlement_conserved(&charge)?;

    let reason = bounded::<255>("reason", &format!("applied to charge {}", charge.id))?;
    let (drawn, mut debits) = draw_sources(
        &sources,
        &draws,
        CreditOrigin::ChargeApplication,
        &reason,
        request.actor_id,
    )?;
    for debit in debits.iter_mut() {
        debit.charge_id = Some(charge.id);
    }

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    repos.unit_credit_repository.update_batch(drawn, audit_log_id).await?;
    let entries = append_entries(repos, request.unit_id, debits, audit_log_id).await?;
    let charge = single(repos.charge_repository.update_batch(vec![charge], audit_log_id).await?)?;
    verify_ledger(repos, request.unit_id).await?;

    info!(%applied, sources = entries.len(), "credit auto-applied");
    Ok(CreditApplication {
        charge,
        entries,
        total_applied: applied,
    })
}

/// Moves credit between two units in one transaction.
#[instrument(skip(repos, request), fields(from = %request.from_unit_id, to = %request.to_unit_id, amount = %request.amount))]
pub async fn transfer_credit(
    repos: &BillingRepositories,
    request: TransferCreditRequest,
) -> BillingResult<CreditTransfer> {
    request.validate()?;
    let reason = bounded::<255>("reason", &request.reason)?;

    lock_units(repos, &[request.from_unit_id, request.to_unit_id]).await?;
    for unit_id in [request.from_unit_id, request.to_unit_id] {
        let tenants = repos.unit_credit_repository.ledger_tenants(unit_id).await?;
        if tenants.iter().any(|tenant_id| *tenant_id != request.tenant_id) {
            return Err(BillingError::rule(format!("unit {unit_id} holds credit of another tenant")));
        }
    }
    let sources = repos.unit_credit_repository.lock_active_sources(request.from_unit_id).await?;
    let draws = plan_debit(request.from_unit_id, &sources, request.amount)?;

    let (drawn, debits) = draw_sources(&sources, &draws, CreditOrigin::TransferOut, &reason, request.actor_id)?;
    let credit = UnitCreditModel::credit_in(
        request.tenant_id,
        request.to_unit_id,
        CreditOrigin::TransferIn,
        request.amount,
        reason,
        request.actor_id,
    );

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    repos.unit_credit_repository.update_batch(drawn, audit_log_id).await?;
    let debits = append_entries(repos, request.from_unit_id, debits, audit_log_id).await?;
    let credit = single(append_entries(repos, request.to_unit_id, vec![credit], audit_log_id).await?)?;
    verify_ledger(repos, request.from_unit_id).await?;
    verify_ledger(repos, request.to_unit_id).await?;

    info!("credit transferred");
    Ok(CreditTransfer { debits, credit })
}

/// Pays credit back to the resident, oldest credit first.
#[instrument(skip(repos, request), fields(unit_id = %request.unit_id, amount = %request.amount))]
pub async fn refund_credit(
    repos: &BillingRepositories,
    request: RefundCreditRequest,
) -> BillingResult<Vec<UnitCreditModel>> {
    request.validate()?;
    let reason = bounded::<255>("reason", &request.reason)?;

    repos.unit_credit_repository.lock_unit(request.unit_id).await?;
    let sources = repos.unit_credit_repository.lock_active_sources(request.unit_id).await?;
    let draws = plan_debit(request.unit_id, &sources, request.amount)?;
    let (drawn, debits) = draw_sources(&sources, &draws, CreditOrigin::Refund, &reason, request.actor_id)?;

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    repos.unit_credit_repository.update_batch(drawn, audit_log_id).await?;
    let entries = append_entries(repos, request.unit_id, debits, audit_log_id).await?;
    let balance = verify_ledger(repos, request.unit_id).await?;

    info!(%balance, "credit refunded");
    Ok(entries)
}

/// Voids what is left of a credit entry with a reversal. Cancelling twice is a no-op.
#[instrument(skip(repos, request), fields(credit_id = %request.credit_id))]
pub async fn cancel_credit(
    repos: &BillingRepositories,
    request: CancelCreditRequest,
) -> BillingResult<CreditCancellation> {
    request.validate()?;
    let reason = bounded::<255>("reason", &request.reason)?;

    let peek = repos
        .unit_credit_repository
        .find_by_id(request.credit_id)
        .await?
        .ok_or_else(|| BillingError::not_found("credit", request.credit_id))?;
    repos.unit_credit_repository.lock_unit(peek.unit_id).await?;
    let mut credit: UnitCreditModel = lock_one(&*repos.unit_credit_repository, "credit", peek.id).await?;

    if !credit.is_source() {
        return Err(BillingError::rule(format!("entry {} is a debit and cannot be cancelled", credit.id)));
    }
    match credit.status {
        CreditStatus::Cancelled => {
            info!("credit already cancelled");
            return Ok(CreditCancellation {
                credit,
                reversal: None,
                already_cancelled: true,
            });
        }
        CreditStatus::Consumed => {
            return Err(BillingError::rule(format!("credit {} is fully consumed", credit.id)));
        }
        CreditStatus::Active => {}
    }

    let reversal = UnitCreditModel::debit_from(
        &credit,
        MovementType::Reversal,
        CreditOrigin::Cancellation,
        credit.remaining_amount,
        reason,
        request.actor_id,
    );
    credit.remaining_amount = Decimal::ZERO;
    credit.status = CreditStatus::Cancelled;

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    let credit = single(repos.unit_credit_repository.update_batch(vec![credit], audit_log_id).await?)?;
    let reversal = single(append_entries(repos, credit.unit_id, vec![reversal], audit_log_id).await?)?;
    verify_ledger(repos, credit.unit_id).await?;

    let reversed = -reversal.amount;
    info!(%reversed, "credit cancelled");
    Ok(CreditCancellation {
        credit,
        reversal: Some(reversal),
        already_cancelled: false,
    })
}

pub async fn credit_statement(
    repos: &BillingRepositories,
    unit_id: Uuid,
    page: PageRequest,
) -> BillingResult<Page<UnitCreditModel>> {
    Ok(repos.unit_credit_repository.statement(unit_id, page).await?)
}

pub async fn credit_balance(repos: &BillingRepositories, unit_id: Uuid) -> BillingResult<Decimal> {
    Ok(repos.unit_credit_repository.ledger_balance(unit_id).await?)
}

pub(crate) fn single<T>(mut items: Vec<T>) -> BillingResult<T> {
    match (items.pop(), items.is_empty()) {
        (Some(item), true) => Ok(item),
        _ => Err(BillingError::InvariantViolation("expected exactly one written row".into())),
    }
}
