//! Cancellation of payments and egresses.
//!
//! A cancelled document keeps its folio and its allocation rows; only the amounts they moved are
//! reversed. Documents inside a reconciled or closed reconciliation cannot be cancelled.

use chrono::Utc;
use condo_core_api::domain::credit::{CreditOrigin, CreditStatus, MovementType};
use condo_core_api::domain::document::DocumentStatus;
use condo_core_api::domain::settlement::{assert_settlement_conserved, reverse_settlement, Settleable};
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::requests::CancelDocumentRequest;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::models::egress::PayableModel;
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use condo_core_db::repository::update_batch::UpdateBatch;
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::credit::{append_entries, verify_ledger};
use super::{bounded, lock_one, open_audit_log};
use crate::postgres_repositories::BillingRepositories;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationOutcome {
    pub document_id: Uuid,
    pub folio: String,
    /// The document was cancelled before this call; nothing was changed.
    pub already_cancelled: bool,
    pub reversed_allocations: usize,
    pub reversed_amount: Decimal,
}

/// Reopens every allocated document by the amount it received.
fn reverse_allocations<S: Settleable>(
    targets: Vec<Option<S>>,
    allocations: &[(Uuid, Decimal)],
) -> BillingResult<(Vec<S>, Decimal)> {
    let mut reopened = Vec::with_capacity(allocations.len());
    let mut reversed = Decimal::ZERO;
    for ((target_id, amount), target) in allocations.iter().zip(targets) {
        let mut target = target.ok_or_else(|| BillingError::not_found("allocated document", target_id))?;
        reverse_settlement(&mut target, *amount)?;
        assert_settlement_conserved(&target)?;
        reversed += *amount;
        reopened.push(target);
    }
    Ok((reopened, reversed))
}

async fn ensure_not_reconciled(
    repos: &BillingRepositories,
    payment_ids: &[Uuid],
    egress_ids: &[Uuid],
    folio: &str,
) -> BillingResult<()> {
    let locked = repos
        .reconciliation_item_repository
        .locked_document_ids(payment_ids, egress_ids)
        .await?;
    if !locked.is_empty() {
        warn!(folio, "cancellation refused for reconciled document");
        return Err(BillingError::rule(format!(
            "{folio} belongs to a reconciled period and cannot be cancelled"
        )));
    }
    Ok(())
}

/// Withdraws what is left of each overpayment credit the payment created.
fn reverse_overpayment_credits(
    credits: Vec<UnitCreditModel>,
    reason: &HeaplessString<255>,
    actor_id: Uuid,
) -> BillingResult<(Vec<UnitCreditModel>, Vec<UnitCreditModel>)> {
    let mut voided = Vec::new();
    let mut reversals = Vec::new();
    for mut credit in credits {
        if credit.status == CreditStatus::Cancelled {
            continue;
        }
        if credit.remaining_amount != credit.amount {
            return Err(BillingError::rule(format!(
                "overpayment credit {} has already been used ({} of {} left)",
                credit.id, credit.remaining_amount, credit.amount
            )));
        }
        let mut reversal = UnitCreditModel::debit_from(
            &credit,
            MovementType::Reversal,
            CreditOrigin::PaymentCancellation,
            credit.remaining_amount,
            reason.clone(),
            actor_id,
        );
        reversal.payment_id = credit.payment_id;
        credit.remaining_amount = Decimal::ZERO;
        credit.status = CreditStatus::Cancelled;
        reversals.push(reversal);
        voided.push(credit);
    }
    Ok((voided, reversals))
}

#[instrument(skip(repos, request), fields(payment_id = %request.document_id))]
pub async fn cancel_payment(
    repos: &BillingRepositories,
    request: CancelDocumentRequest,
) -> BillingResult<CancellationOutcome> {
    request.validate()?;
    let reason = bounded::<500>("reason", &request.reason)?;

    let mut payment = lock_one(&*repos.payment_repository, "payment", request.document_id).await?;
    let folio = payment.folio_display();
    if payment.is_cancelled() {
        info!(%folio, "payment already cancelled");
        return Ok(CancellationOutcome {
            document_id: payment.id,
            folio,
            already_cancelled: true,
            reversed_allocations: 0,
            reversed_amount: Decimal::ZERO,
        });
    }
    if !payment.status.can_transition_to(DocumentStatus::Cancelled) {
        return Err(BillingError::rule(format!("{folio} cannot be cancelled from {:?}", payment.status)));
    }
    ensure_not_reconciled(repos, &[payment.id], &[], &folio).await?;

    let allocations: Vec<(Uuid, Decimal)> = repos
        .payment_allocation_repository
        .find_by_payment(payment.id)
        .await?
        .into_iter()
        .map(|a| (a.charge_id, a.amount_allocated))
        .collect();
    let charge_ids: Vec<Uuid> = allocations.iter().map(|(id, _)| *id).collect();
    let charges: Vec<Option<ChargeModel>> = repos.charge_repository.load_for_update(&charge_ids).await?;
    let (charges, reversed_amount) = reverse_allocations(charges, &allocations)?;

    let mut account = lock_one(
        &*repos.financial_account_repository,
        "financial account",
        payment.financial_account_id,
    )
    .await?;
    account.record_outflow(payment.total_amount);

    let credit_reversal = match payment.unit_id {
        Some(unit_id) => {
            repos.unit_credit_repository.lock_unit(unit_id).await?;
            let credits = repos.unit_credit_repository.find_by_payment(payment.id).await?;
            let credit_reason = bounded::<255>("reason", &format!("{folio} cancelled"))?;
            let (voided, reversals) = reverse_overpayment_credits(credits, &credit_reason, request.actor_id)?;
            Some((unit_id, voided, reversals))
        }
        None => None,
    };

    payment.status = DocumentStatus::Cancelled;
    payment.cancellation_reason = Some(reason);
    payment.cancelled_by = Some(request.actor_id);
    payment.cancelled_at = Some(Utc::now());

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    repos.payment_repository.update_batch(vec![payment], audit_log_id).await?;
    let reversed_allocations = charges.len();
    repos.charge_repository.update_batch(charges, audit_log_id).await?;
    repos
        .financial_account_repository
        .update_batch(vec![account], audit_log_id)
        .await?;
    if let Some((unit_id, voided, reversals)) = credit_reversal {
        if !reversals.is_empty() {
            repos.unit_credit_repository.update_batch(voided, audit_log_id).await?;
            append_entries(repos, unit_id, reversals, audit_log_id).await?;
            verify_ledger(repos, unit_id).await?;
        }
    }

    info!(%folio, %reversed_amount, reversed_allocations, "payment cancelled");
    Ok(CancellationOutcome {
        document_id: request.document_id,
        folio,
        already_cancelled: false,
        reversed_allocations,
        reversed_amount,
    })
}

#[instrument(skip(repos, request), fields(egress_id = %request.document_id))]
pub async fn cancel_egress(
    repos: &BillingRepositories,
    request: CancelDocumentRequest,
) -> BillingResult<CancellationOutcome> {
    request.validate()?;
    let reason = bounded::<500>("reason", &request.reason)?;

    let mut egress = lock_one(&*repos.egress_repository, "egress", request.document_id).await?;
    let folio = egress.folio_display();
    if egress.is_cancelled() {
        info!(%folio, "egress already cancelled");
        return Ok(CancellationOutcome {
            document_id: egress.id,
            folio,
            already_cancelled: true,
            reversed_allocations: 0,
            reversed_amount: Decimal::ZERO,
        });
    }
    if !egress.status.can_transition_to(DocumentStatus::Cancelled) {
        return Err(BillingError::rule(format!("{folio} cannot be cancelled from {:?}", egress.status)));
    }
    ensure_not_reconciled(repos, &[], &[egress.id], &folio).await?;

    let allocations: Vec<(Uuid, Decimal)> = repos
        .egress_allocation_repository
        .find_by_egress(egress.id)
        .await?
        .into_iter()
        .map(|a| (a.payable_id, a.amount_allocated))
        .collect();
    let payable_ids: Vec<Uuid> = allocations.iter().map(|(id, _)| *id).collect();
    let payables: Vec<Option<PayableModel>> = repos.payable_repository.load_for_update(&payable_ids).await?;
    let (payables, reversed_amount) = reverse_allocations(payables, &allocations)?;

    let mut account = lock_one(
        &*repos.financial_account_repository,
        "financial account",
        egress.financial_account_id,
    )
    .await?;
    account.record_inflow(egress.total_amount);

    egress.status = DocumentStatus::Cancelled;
    egress.cancellation_reason = Some(reason);
    egress.cancelled_by = Some(request.actor_id);
    egress.cancelled_at = Some(Utc::now());

    let audit_log_id = open_audit_log(repos, request.actor_id).await?;
    repos.egress_repository.update_batch(vec![egress], audit_log_id).await?;
    let reversed_allocations = payables.len();
    repos.payable_repository.update_batch(payables, audit_log_id).await?;
    repos
        .financial_account_repository
        .update_batch(vec![account], audit_log_id)
        .await?;

    info!(%folio, %reversed_amount, reversed_allocations, "egress cancelled");
    Ok(CancellationOutcome {
        document_id: request.document_id,
        folio,
        already_cancelled: false,
        reversed_allocations,
        reversed_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::billing::charge_repository::test_utils::test_utils::create_test_charge;
    use crate::repository::egress::payable_repository::test_utils::test_utils::create_test_payable;
    use crate::service::credit::{credit_balance, refund_credit, single};
    use crate::service::egress::apply_egress;
    use crate::service::folio::provision_folio_counter;
    use crate::service::payment::apply_payment;
    use crate::service::reconciliation::compute_reconciliation;
    use crate::test_helper::{create_test_account, create_test_audit_log, setup_test_context};
    use chrono::NaiveDate;
    use condo_core_api::domain::settlement::SettlementStatus;
    use condo_core_api::service::requests::{
        AllocationRequest, ApplyEgressRequest, ApplyPaymentRequest, RefundCreditRequest, ReconciliationRequest,
    };
    use condo_core_db::models::account::FinancialAccountModel;
    use condo_core_db::repository::create_batch::CreateBatch;
    use condo_core_db::repository::load_batch::LoadBatch;
    use rust_decimal_macros::dec;
    use std::error::Error;

    struct Books {
        tenant_id: Uuid,
        unit_id: Uuid,
        account: FinancialAccountModel,
        charge: ChargeModel,
    }

    async fn books(repos: &BillingRepositories) -> Result<Books, Box<dyn Error + Send + Sync>> {
        let tenant_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        provision_folio_counter(repos, tenant_id).await?;
        let account = create_test_account(repos, tenant_id, dec!(1000)).await?;
        let audit_log = create_test_audit_log(repos).await?;
        let charge = single(
            repos
                .charge_repository
                .create_batch(vec![create_test_charge(tenant_id, unit_id, dec!(100))], audit_log.id)
                .await?,
        )?;
        Ok(Books {
            tenant_id,
            unit_id,
            account,
            charge,
        })
    }

    fn pay(books: &Books, total: Decimal, credit_overpayment: bool) -> ApplyPaymentRequest {
        ApplyPaymentRequest {
            financial_account_id: books.account.id,
            unit_id: Some(books.unit_id),
            payment_date: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            total_amount: total,
            allocations: vec![AllocationRequest {
                target_id: books.charge.id,
                amount: dec!(100),
            }],
            credit_overpayment,
            reference: None,
            actor_id: Uuid::new_v4(),
        }
    }

    fn cancel(document_id: Uuid) -> CancelDocumentRequest {
        CancelDocumentRequest {
            document_id,
            reason: "Cheque devuelto".to_string(),
            actor_id: Uuid::new_v4(),
        }
    }

    async fn account_balance(repos: &BillingRepositories, id: Uuid) -> Result<Decimal, Box<dyn Error + Send + Sync>> {
        let account = repos.financial_account_repository.find_by_id(id).await?.ok_or("account missing")?;
        Ok(account.current_balance)
    }

    #[tokio::test]
    async fn test_cancel_payment_reopens_charges_once() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let books = books(repos).await?;
        let receipt = apply_payment(repos, pay(&books, dec!(100), false)).await?;
        assert_eq!(account_balance(repos, books.account.id).await?, dec!(1100));

        let outcome = cancel_payment(repos, cancel(receipt.payment.id)).await?;
        assert!(!outcome.already_cancelled);
        assert_eq!(outcome.folio, "REC-000001");
        assert_eq!(outcome.reversed_allocations, 1);
        assert_eq!(outcome.reversed_amount, dec!(100));

        let charge = lock_one(&*repos.charge_repository, "charge", books.charge.id).await?;
        assert_eq!(charge.status, SettlementStatus::Pending);
        assert_eq!(charge.balance, dec!(100));
        assert_eq!(account_balance(repos, books.account.id).await?, dec!(1000));
        let payment = repos
            .payment_repository
            .load_batch(&[receipt.payment.id])
            .await?
            .pop()
            .flatten()
            .ok_or("payment missing")?;
        assert_eq!(payment.status, DocumentStatus::Cancelled);
        assert_eq!(payment.folio_rec, 1);
        let history = repos.payment_allocation_repository.find_by_payment(payment.id).await?;
        assert_eq!(history.len(), 1);

        let again = cancel_payment(repos, cancel(receipt.payment.id)).await?;
        assert!(again.already_cancelled);
        assert_eq!(account_balance(repos, books.account.id).await?, dec!(1000));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_payment_withdraws_unused_overpayment_credit() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let books = books(repos).await?;
        let receipt = apply_payment(repos, pay(&books, dec!(130), true)).await?;
        assert_eq!(credit_balance(repos, books.unit_id).await?, dec!(30));

        cancel_payment(repos, cancel(receipt.payment.id)).await?;
        assert_eq!(credit_balance(repos, books.unit_id).await?, dec!(0));
        let credits = repos.unit_credit_repository.find_by_payment(receipt.payment.id).await?;
        assert_eq!(credits[0].status, CreditStatus::Cancelled);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_payment_blocked_by_spent_credit() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let books = books(repos).await?;
        let receipt = apply_payment(repos, pay(&books, dec!(130), true)).await?;
        refund_credit(
            repos,
            RefundCreditRequest {
                unit_id: books.unit_id,
                amount: dec!(10),
                reason: "Devolución".to_string(),
                actor_id: Uuid::new_v4(),
            },
        )
        .await?;

        let result = cancel_payment(repos, cancel(receipt.payment.id)).await;
        assert!(matches!(result, Err(BillingError::BusinessRuleViolation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_reconciled_documents_cannot_be_cancelled() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let books = books(repos).await?;
        let receipt = apply_payment(repos, pay(&books, dec!(100), false)).await?;

        compute_reconciliation(
            repos,
            ReconciliationRequest {
                financial_account_id: books.account.id,
                cutoff_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
                bank_closing_balance: dec!(1100),
                selected_payments: vec![receipt.payment.id],
                selected_egresses: Vec::new(),
                actor_id: Uuid::new_v4(),
            },
        )
        .await?;

        let result = cancel_payment(repos, cancel(receipt.payment.id)).await;
        assert!(matches!(result, Err(BillingError::BusinessRuleViolation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_egress_restores_account_and_payables() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let books = books(repos).await?;
        let audit_log = create_test_audit_log(repos).await?;
        let payable = single(
            repos
                .payable_repository
                .create_batch(vec![create_test_payable(books.tenant_id, dec!(250))], audit_log.id)
                .await?,
        )?;
        let voucher = apply_egress(
            repos,
            ApplyEgressRequest {
                financial_account_id: books.account.id,
                egress_date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
                total_amount: dec!(250),
                allocations: vec![AllocationRequest {
                    target_id: payable.id,
                    amount: dec!(250),
                }],
                check_number: None,
                reference: None,
                actor_id: Uuid::new_v4(),
            },
        )
        .await?;
        assert_eq!(account_balance(repos, books.account.id).await?, dec!(750));

        let outcome = cancel_egress(repos, cancel(voucher.egress.id)).await?;
        assert_eq!(outcome.folio, "EG-000001");
        assert_eq!(outcome.reversed_amount, dec!(250));
        assert_eq!(account_balance(repos, books.account.id).await?, dec!(1000));
        let payable = lock_one(&*repos.payable_repository, "payable", payable.id).await?;
        assert_eq!(payable.status, SettlementStatus::Pending);

        assert!(cancel_egress(repos, cancel(voucher.egress.id)).await?.already_cancelled);
        Ok(())
    }
}
