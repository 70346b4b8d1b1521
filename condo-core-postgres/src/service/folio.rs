use condo_core_api::domain::document::DocumentType;
use condo_core_api::error::{BillingError, BillingResult};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::postgres_repositories::BillingRepositories;

/// Reserves the next folio of `document_type` for the tenant.
///
/// The counter row stays locked until the surrounding transaction ends, and the increment is
/// undone if it rolls back, so folios are gapless as long as the document insert shares the
/// transaction.
#[instrument(skip(repos), fields(%tenant_id, %document_type))]
pub async fn next_folio(
    repos: &BillingRepositories,
    tenant_id: Uuid,
    document_type: DocumentType,
) -> BillingResult<i64> {
    let Some(mut counter) = repos.folio_counter_repository.load_for_update(tenant_id).await? else {
        error!("folio counter is not provisioned");
        return Err(BillingError::FatalConfiguration(format!(
            "no folio counter provisioned for tenant {tenant_id}"
        )));
    };

    let folio = counter.advance(document_type);
    repos.folio_counter_repository.save(&counter).await?;
    debug!(folio, "folio reserved");
    Ok(folio)
}

/// Creates the tenant's counters at zero. Safe to call again for an existing tenant.
#[instrument(skip(repos))]
pub async fn provision_folio_counter(repos: &BillingRepositories, tenant_id: Uuid) -> BillingResult<bool> {
    if tenant_id.is_nil() {
        return Err(BillingError::validation("tenant id is required"));
    }
    let created = repos.folio_counter_repository.provision(tenant_id).await?;
    if created {
        info!(%tenant_id, "folio counter provisioned");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres_repositories::PostgresRepositories;
    use crate::test_helper::{setup_shared_repos, setup_test_context};
    use serial_test::serial;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_folios_increase_per_document_type() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let tenant_id = Uuid::new_v4();
        provision_folio_counter(repos, tenant_id).await?;

        assert_eq!(next_folio(repos, tenant_id, DocumentType::Rec).await?, 1);
        assert_eq!(next_folio(repos, tenant_id, DocumentType::Rec).await?, 2);
        assert_eq!(next_folio(repos, tenant_id, DocumentType::Eg).await?, 1);
        assert_eq!(next_folio(repos, tenant_id, DocumentType::Rec).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_unprovisioned_tenant_is_fatal() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let result = next_folio(ctx.repos(), Uuid::new_v4(), DocumentType::Rec).await;
        assert!(matches!(result, Err(BillingError::FatalConfiguration(_))));
        Ok(())
    }

    async fn reserve(
        postgres: Arc<PostgresRepositories>,
        tenant_id: Uuid,
        roll_back: bool,
    ) -> BillingResult<Option<i64>> {
        let repos = postgres.begin().await?;
        let folio = next_folio(&repos, tenant_id, DocumentType::Rec).await?;
        if roll_back {
            repos.rollback().await?;
            return Ok(None);
        }
        repos.commit().await?;
        Ok(Some(folio))
    }

    #[tokio::test]
    #[serial]
    async fn test_concurrent_reservations_are_unique_and_gapless() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let postgres = setup_shared_repos().await?;
        let postgres = Arc::new(postgres);
        let tenant_id = Uuid::new_v4();
        {
            let repos = postgres.begin().await?;
            provision_folio_counter(&repos, tenant_id).await?;
            repos.commit().await?;
        }

        // Polled together on this task; each reservation holds its own pooled connection.
        let reservations = (0..8).map(|i| reserve(postgres.clone(), tenant_id, i % 4 == 3));

        let mut committed = Vec::new();
        for result in futures::future::join_all(reservations).await {
            if let Some(folio) = result? {
                committed.push(folio);
            }
        }
        committed.sort();

        assert_eq!(committed.len(), 6);
        assert_eq!(committed, (1..=6).collect::<Vec<i64>>());

        Ok(())
    }
}
