//! Entry point for callers: one method per operation, each run in its own transaction.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::NaiveDate;
use condo_core_api::domain::distribution::{ChargePreview, DistributionMethod, UnitShare};
use condo_core_api::error::BillingResult;
use condo_core_api::service::policy_provider::BillingPolicyProvider;
use condo_core_api::service::requests::{
    ApplyCreditRequest, ApplyEgressRequest, ApplyPaymentRequest, AutoApplyCreditRequest, CancelCreditRequest,
    CancelDocumentRequest, CloseReconciliationRequest, CommitChargesRequest, ManualCreditRequest, NextFolioRequest,
    ReconciliationRequest, RefundCreditRequest, TransferCreditRequest,
};
use condo_core_api::service::retry::{with_retry, RetryPolicy};
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::repository::pagination::{Page, PageRequest};
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use super::billing_rules::{self, ChargeAssessment};
use super::cancellation::{self, CancellationOutcome};
use super::credit::{self, CreditApplication, CreditCancellation, CreditTransfer};
use super::egress::{self, EgressVoucher};
use super::payment::{self, PaymentReceipt};
use super::reconciliation::{self, ReconciliationSnapshot};
use super::{charge, folio};
use crate::config::CoreConfig;
use crate::policy_store::PgPolicyProvider;
use crate::postgres_repositories::{BillingRepositories, PostgresRepositories};

type TxFuture<'a, T> = Pin<Box<dyn Future<Output = BillingResult<T>> + Send + 'a>>;

pub struct BillingEngine {
    repositories: Arc<PostgresRepositories>,
    policies: Arc<dyn BillingPolicyProvider>,
    retry: RetryPolicy,
}

impl BillingEngine {
    pub fn new(
        repositories: Arc<PostgresRepositories>,
        policies: Arc<dyn BillingPolicyProvider>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repositories,
            policies,
            retry,
        }
    }

    /// Connects the pool and reads tenant policies from the same database.
    pub async fn connect(config: &CoreConfig) -> BillingResult<Self> {
        let repositories = PostgresRepositories::connect(config).await?;
        let policies = PgPolicyProvider::new(Arc::new(repositories.pool().clone()));
        Ok(Self::new(Arc::new(repositories), Arc::new(policies), config.retry_policy()))
    }

    /// Runs `operation` in a fresh transaction and commits it; lock conflicts start over.
    async fn in_transaction<T, F>(&self, operation: F) -> BillingResult<T>
    where
        T: Send,
        F: for<'a> Fn(&'a BillingRepositories) -> TxFuture<'a, T> + Send + Sync,
    {
        with_retry(self.retry, || self.run_once(&operation)).await
    }

    async fn run_once<T, F>(&self, operation: &F) -> BillingResult<T>
    where
        T: Send,
        F: for<'a> Fn(&'a BillingRepositories) -> TxFuture<'a, T> + Send + Sync,
    {
        let repos = self.repositories.begin().await?;
        match operation(&repos).await {
            Ok(value) => {
                repos.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = repos.rollback().await {
                    warn!(%rollback_error, "rollback failed");
                }
                Err(error)
            }
        }
    }

    pub async fn provision_tenant(&self, tenant_id: Uuid) -> BillingResult<bool> {
        self.in_transaction(|repos| Box::pin(folio::provision_folio_counter(repos, tenant_id)))
            .await
    }

    pub async fn next_folio(&self, request: NextFolioRequest) -> BillingResult<i64> {
        request.validate()?;
        self.in_transaction(|repos| {
            Box::pin(folio::next_folio(repos, request.tenant_id, request.document_type))
        })
        .await
    }

    pub fn distribute_charges(
        &self,
        units: &[UnitShare],
        total: Decimal,
        method: &DistributionMethod,
    ) -> BillingResult<Vec<ChargePreview>> {
        charge::distribute_charges(units, total, method)
    }

    pub async fn commit_charges(&self, request: CommitChargesRequest) -> BillingResult<Vec<ChargeModel>> {
        self.in_transaction(|repos| Box::pin(charge::commit_charges(repos, request.clone())))
            .await
    }

    pub async fn cancel_charge(&self, request: CancelDocumentRequest) -> BillingResult<ChargeModel> {
        self.in_transaction(|repos| Box::pin(charge::cancel_charge(repos, request.clone())))
            .await
    }

    /// Early-payment discount and late fee of a charge under its tenant's policies.
    pub async fn assess_charge(&self, charge_id: Uuid, as_of: NaiveDate) -> BillingResult<ChargeAssessment> {
        self.in_transaction(|repos| {
            let policies = Arc::clone(&self.policies);
            Box::pin(async move { billing_rules::assess_charge(repos, policies.as_ref(), charge_id, as_of).await })
        })
        .await
    }

    pub async fn apply_payment(&self, request: ApplyPaymentRequest) -> BillingResult<PaymentReceipt> {
        self.in_transaction(|repos| Box::pin(payment::apply_payment(repos, request.clone())))
            .await
    }

    pub async fn apply_egress(&self, request: ApplyEgressRequest) -> BillingResult<EgressVoucher> {
        self.in_transaction(|repos| Box::pin(egress::apply_egress(repos, request.clone())))
            .await
    }

    pub async fn create_manual_credit(&self, request: ManualCreditRequest) -> BillingResult<UnitCreditModel> {
        self.in_transaction(|repos| Box::pin(credit::create_manual_credit(repos, request.clone())))
            .await
    }

    pub async fn apply_credit_to_charge(&self, request: ApplyCreditRequest) -> BillingResult<CreditApplication> {
        self.in_transaction(|repos| Box::pin(credit::apply_credit_to_charge(repos, request.clone())))
            .await
    }

    pub async fn auto_apply_fifo(&self, request: AutoApplyCreditRequest) -> BillingResult<CreditApplication> {
        self.in_transaction(|repos| Box::pin(credit::auto_apply_fifo(repos, request.clone())))
            .await
    }

    pub async fn transfer_credit(&self, request: TransferCreditRequest) -> BillingResult<CreditTransfer> {
        self.in_transaction(|repos| Box::pin(credit::transfer_credit(repos, request.clone())))
            .await
    }

    pub async fn refund_credit(&self, request: RefundCreditRequest) -> BillingResult<Vec<UnitCreditModel>> {
        self.in_transaction(|repos| Box::pin(credit::refund_credit(repos, request.clone())))
            .await
    }

    pub async fn cancel_credit(&self, request: CancelCreditRequest) -> BillingResult<CreditCancellation> {
        self.in_transaction(|repos| Box::pin(credit::cancel_credit(repos, request.clone())))
            .await
    }

    pub async fn credit_statement(&self, unit_id: Uuid, page: PageRequest) -> BillingResult<Page<UnitCreditModel>> {
        self.in_transaction(|repos| Box::pin(credit::credit_statement(repos, unit_id, page)))
            .await
    }

    pub async fn credit_balance(&self, unit_id: Uuid) -> BillingResult<Decimal> {
        self.in_transaction(|repos| Box::pin(credit::credit_balance(repos, unit_id)))
            .await
    }

    pub async fn cancel_payment(&self, request: CancelDocumentRequest) -> BillingResult<CancellationOutcome> {
        self.in_transaction(|repos| Box::pin(cancellation::cancel_payment(repos, request.clone())))
            .await
    }

    pub async fn cancel_egress(&self, request: CancelDocumentRequest) -> BillingResult<CancellationOutcome> {
        self.in_transaction(|repos| Box::pin(cancellation::cancel_egress(repos, request.clone())))
            .await
    }

    pub async fn compute_reconciliation(
        &self,
        request: ReconciliationRequest,
    ) -> BillingResult<ReconciliationSnapshot> {
        self.in_transaction(|repos| Box::pin(reconciliation::compute_reconciliation(repos, request.clone())))
            .await
    }

    pub async fn close_reconciliation(
        &self,
        request: CloseReconciliationRequest,
    ) -> BillingResult<ReconciliationSnapshot> {
        self.in_transaction(|repos| Box::pin(reconciliation::close_reconciliation(repos, request.clone())))
            .await
    }

    pub async fn is_document_reconciled(&self, document_id: Uuid) -> BillingResult<bool> {
        self.in_transaction(|repos| Box::pin(reconciliation::is_document_reconciled(repos, document_id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::setup_shared_repos;
    use condo_core_api::domain::billing_rules::{ApplyOn, BillingPolicies, LateFeePolicy, RateType};
    use condo_core_api::domain::document::DocumentType;
    use condo_core_api::domain::settlement::ChargeType;
    use condo_core_api::error::BillingError;
    use condo_core_api::service::policy_provider::StaticPolicyProvider;
    use condo_core_api::service::requests::AllocationRequest;
    use condo_core_db::models::account::FinancialAccountModel;
    use condo_core_db::repository::create_batch::CreateBatch;
    use heapless::String as HeaplessString;
    use rust_decimal_macros::dec;
    use serial_test::serial;
    use std::error::Error;
    use std::str::FromStr;
    use std::time::Duration;

    async fn engine(policies: StaticPolicyProvider) -> Result<BillingEngine, Box<dyn Error + Send + Sync>> {
        let repositories = setup_shared_repos().await?;
        Ok(BillingEngine::new(
            Arc::new(repositories),
            Arc::new(policies),
            RetryPolicy::new(3, Duration::from_millis(5)),
        ))
    }

    async fn open_account(engine: &BillingEngine, tenant_id: Uuid) -> Result<FinancialAccountModel, Box<dyn Error + Send + Sync>> {
        let repos = engine.repositories.begin().await?;
        let audit_log = super::super::open_audit_log(&repos, Uuid::new_v4()).await?;
        let name = HeaplessString::from_str("Cuenta de cobranza").map_err(|_| "name too long")?;
        let account = FinancialAccountModel::new(tenant_id, name, dec!(0));
        let mut saved = repos
            .financial_account_repository
            .create_batch(vec![account], audit_log)
            .await?;
        repos.commit().await?;
        saved.pop().ok_or_else(|| "account was not saved".into())
    }

    #[tokio::test]
    #[serial]
    async fn test_month_end_flow_commits_each_operation() -> Result<(), Box<dyn Error + Send + Sync>> {
        let tenant_id = Uuid::new_v4();
        let late_fees = BillingPolicies {
            early_payment: None,
            late_fee: Some(LateFeePolicy {
                rate_type: RateType::Percentage,
                value: dec!(2),
                grace_days: 5,
                apply_on: ApplyOn::Balance,
                max_rate: None,
                compound: false,
            }),
        };
        let engine = engine(StaticPolicyProvider::default().with_tenant(tenant_id, late_fees)).await?;

        assert!(engine.provision_tenant(tenant_id).await?);
        assert!(!engine.provision_tenant(tenant_id).await?);
        let account = open_account(&engine, tenant_id).await?;

        let units = [
            UnitShare::with_aliquot(Uuid::new_v4(), dec!(50)),
            UnitShare::with_aliquot(Uuid::new_v4(), dec!(50)),
        ];
        let previews = engine.distribute_charges(&units, dec!(2000), &DistributionMethod::ByAliquot)?;
        let charges = engine
            .commit_charges(CommitChargesRequest {
                tenant_id,
                charge_type: ChargeType::Maintenance,
                concept: "Cuota de mantenimiento".to_string(),
                period: "2024-05".to_string(),
                due_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
                previews,
                actor_id: Uuid::new_v4(),
            })
            .await?;
        assert_eq!(charges.len(), 2);

        let assessment = engine
            .assess_charge(charges[0].id, NaiveDate::from_ymd_opt(2024, 6, 20).unwrap())
            .await?;
        assert_eq!(assessment.late_fee.periods, 2);
        assert_eq!(assessment.late_fee.fee, dec!(40.00));

        let receipt = engine
            .apply_payment(ApplyPaymentRequest {
                financial_account_id: account.id,
                unit_id: Some(charges[0].unit_id),
                payment_date: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
                total_amount: dec!(1100),
                allocations: vec![AllocationRequest {
                    target_id: charges[0].id,
                    amount: dec!(1000),
                }],
                credit_overpayment: true,
                reference: None,
                actor_id: Uuid::new_v4(),
            })
            .await?;
        assert_eq!(receipt.folio(), DocumentType::Rec.format_folio(1));
        assert_eq!(engine.credit_balance(charges[0].unit_id).await?, dec!(100));

        let folio = engine
            .next_folio(NextFolioRequest {
                tenant_id,
                document_type: DocumentType::Rec,
            })
            .await?;
        assert_eq!(folio, 2);

        let outcome = engine
            .cancel_payment(CancelDocumentRequest {
                document_id: receipt.payment.id,
                reason: "Depósito no identificado".to_string(),
                actor_id: Uuid::new_v4(),
            })
            .await?;
        assert_eq!(outcome.reversed_amount, dec!(1000));
        assert_eq!(engine.credit_balance(charges[0].unit_id).await?, dec!(0));
        assert!(!engine.is_document_reconciled(receipt.payment.id).await?);
        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_failed_operation_rolls_back() -> Result<(), Box<dyn Error + Send + Sync>> {
        let engine = engine(StaticPolicyProvider::default()).await?;
        let tenant_id = Uuid::new_v4();
        engine.provision_tenant(tenant_id).await?;
        let account = open_account(&engine, tenant_id).await?;

        let result = engine
            .apply_payment(ApplyPaymentRequest {
                financial_account_id: account.id,
                unit_id: None,
                payment_date: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
                total_amount: dec!(50),
                allocations: vec![AllocationRequest {
                    target_id: Uuid::new_v4(),
                    amount: dec!(50),
                }],
                credit_overpayment: false,
                reference: None,
                actor_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(BillingError::NotFound(_))));

        let folio = engine
            .next_folio(NextFolioRequest {
                tenant_id,
                document_type: DocumentType::Rec,
            })
            .await?;
        assert_eq!(folio, 1);
        Ok(())
    }
}
