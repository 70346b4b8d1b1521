use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CoreConfig;
use crate::repository::account::{FinancialAccountRepositoryImpl, FolioCounterRepositoryImpl};
use crate::repository::audit::{AuditLinkRepositoryImpl, AuditLogRepositoryImpl};
use crate::repository::billing::ChargeRepositoryImpl;
use crate::repository::credit::UnitCreditRepositoryImpl;
use crate::repository::egress::{
    EgressAllocationRepositoryImpl, EgressRepositoryImpl, PayableRepositoryImpl,
};
use crate::repository::payment::{PaymentAllocationRepositoryImpl, PaymentRepositoryImpl};
use crate::repository::reconciliation::{
    ReconciliationItemRepositoryImpl, ReconciliationRepositoryImpl,
};
use crate::unit_of_work::Executor;

pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    lock_timeout_ms: u64,
}

impl PostgresRepositories {
    pub fn new(pool: Arc<PgPool>, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }

    pub async fn connect(config: &CoreConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(Arc::new(pool), config.lock_timeout_ms))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create all repositories sharing a single transaction
    pub async fn begin(&self) -> Result<BillingRepositories, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::raw_sql(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;
        Ok(BillingRepositories::new(Executor::new(tx)))
    }
}

/// Every repository of one unit of work. Dropping it without [`BillingRepositories::commit`]
/// rolls the whole transaction back.
pub struct BillingRepositories {
    pub executor: Executor,
    pub audit_log_repository: Arc<AuditLogRepositoryImpl>,
    pub audit_link_repository: Arc<AuditLinkRepositoryImpl>,
    pub charge_repository: Arc<ChargeRepositoryImpl>,
    pub payment_repository: Arc<PaymentRepositoryImpl>,
    pub payment_allocation_repository: Arc<PaymentAllocationRepositoryImpl>,
    pub egress_repository: Arc<EgressRepositoryImpl>,
    pub egress_allocation_repository: Arc<EgressAllocationRepositoryImpl>,
    pub payable_repository: Arc<PayableRepositoryImpl>,
    pub unit_credit_repository: Arc<UnitCreditRepositoryImpl>,
    pub financial_account_repository: Arc<FinancialAccountRepositoryImpl>,
    pub folio_counter_repository: Arc<FolioCounterRepositoryImpl>,
    pub reconciliation_repository: Arc<ReconciliationRepositoryImpl>,
    pub reconciliation_item_repository: Arc<ReconciliationItemRepositoryImpl>,
}

impl BillingRepositories {
    pub fn new(executor: Executor) -> Self {
        Self {
            audit_log_repository: Arc::new(AuditLogRepositoryImpl::new(executor.clone())),
            audit_link_repository: Arc::new(AuditLinkRepositoryImpl::new(executor.clone())),
            charge_repository: Arc::new(ChargeRepositoryImpl::new(executor.clone())),
            payment_repository: Arc::new(PaymentRepositoryImpl::new(executor.clone())),
            payment_allocation_repository: Arc::new(PaymentAllocationRepositoryImpl::new(
                executor.clone(),
            )),
            egress_repository: Arc::new(EgressRepositoryImpl::new(executor.clone())),
            egress_allocation_repository: Arc::new(EgressAllocationRepositoryImpl::new(
                executor.clone(),
            )),
            payable_repository: Arc::new(PayableRepositoryImpl::new(executor.clone())),
            unit_credit_repository: Arc::new(UnitCreditRepositoryImpl::new(executor.clone())),
            financial_account_repository: Arc::new(FinancialAccountRepositoryImpl::new(
                executor.clone(),
            )),
            folio_counter_repository: Arc::new(FolioCounterRepositoryImpl::new(executor.clone())),
            reconciliation_repository: Arc::new(ReconciliationRepositoryImpl::new(
                executor.clone(),
            )),
            reconciliation_item_repository: Arc::new(ReconciliationItemRepositoryImpl::new(
                executor.clone(),
            )),
            executor,
        }
    }

    pub async fn commit(&self) -> Result<(), sqlx::Error> {
        self.executor.commit().await
    }

    pub async fn rollback(&self) -> Result<(), sqlx::Error> {
        self.executor.rollback().await
    }
}
