//! Transaction-scoped test isolation.
//!
//! Each test runs inside one transaction that is rolled back when the context is dropped, so tests
//! never see each other's rows. Tests that need committed data across transactions (concurrency)
//! use [`setup_shared_repos`] and fresh tenant ids instead.
//!
//! The database comes from `DATABASE_URL`, falling back to the local default of [`CoreConfig`].

use crate::config::CoreConfig;
use crate::postgres_repositories::{BillingRepositories, PostgresRepositories};
use condo_core_db::models::account::FinancialAccountModel;
use condo_core_db::models::audit::AuditLogModel;
use condo_core_db::repository::create_batch::CreateBatch;
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const TEST_LOCK_TIMEOUT_MS: u64 = 5_000;

pub struct TestContext {
    pub repos: BillingRepositories,
}

impl TestContext {
    pub fn repos(&self) -> &BillingRepositories {
        &self.repos
    }
}

async fn connect(max_connections: u32) -> Result<PostgresRepositories, Box<dyn Error + Send + Sync>> {
    let config = CoreConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(PostgresRepositories::new(Arc::new(pool), TEST_LOCK_TIMEOUT_MS))
}

/// Opens a transaction that is rolled back when the returned context is dropped.
pub async fn setup_test_context() -> Result<TestContext, Box<dyn Error + Send + Sync>> {
    let postgres = connect(1).await?;
    let repos = postgres.begin().await?;
    Ok(TestContext { repos })
}

/// A pool for tests that commit, typically to exercise row locks between transactions.
pub async fn setup_shared_repos() -> Result<PostgresRepositories, Box<dyn Error + Send + Sync>> {
    connect(10).await
}

pub async fn create_test_audit_log(
    repos: &BillingRepositories,
) -> Result<AuditLogModel, Box<dyn Error + Send + Sync>> {
    repos
        .audit_log_repository
        .create(&AuditLogModel::new(Uuid::new_v4()))
        .await
}

pub async fn create_test_account(
    repos: &BillingRepositories,
    tenant_id: Uuid,
    opening_balance: Decimal,
) -> Result<FinancialAccountModel, Box<dyn Error + Send + Sync>> {
    let audit_log = create_test_audit_log(repos).await?;
    let name = HeaplessString::from_str("Cuenta operativa").map_err(|_| "account name too long")?;
    let account = FinancialAccountModel::new(tenant_id, name, opening_balance);
    let mut saved = repos
        .financial_account_repository
        .create_batch(vec![account], audit_log.id)
        .await?;
    saved.pop().ok_or_else(|| "account was not saved".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use condo_core_db::repository::load::Load;

    #[tokio::test]
    async fn test_transaction_rollback() -> Result<(), Box<dyn Error + Send + Sync>> {
        let test_id;
        {
            let ctx = setup_test_context().await?;
            let audit_log = create_test_audit_log(ctx.repos()).await?;
            test_id = audit_log.id;
            assert!(ctx.repos().audit_log_repository.load(test_id).await.is_ok());
        }

        let ctx = setup_test_context().await?;
        assert!(ctx.repos().audit_log_repository.load(test_id).await.is_err());

        Ok(())
    }
}
