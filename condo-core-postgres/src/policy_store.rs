use async_trait::async_trait;
use condo_core_api::domain::billing_rules::BillingPolicies;
use condo_core_api::error::{BillingError, BillingResult};
use condo_core_api::service::policy_provider::BillingPolicyProvider;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Billing policies kept as one JSON document per tenant in `tenant_billing_policy`.
///
/// Tenants without a row get the default (no discount, no late fee).
pub struct PgPolicyProvider {
    pool: Arc<PgPool>,
}

impl PgPolicyProvider {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn store(&self, tenant_id: Uuid, policies: &BillingPolicies) -> BillingResult<()> {
        let document = serde_json::to_value(policies)
            .map_err(|e| BillingError::validation(format!("billing policies cannot be stored: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO tenant_billing_policy (tenant_id, policies, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (tenant_id) DO UPDATE SET policies = EXCLUDED.policies, updated_at = NOW()
            "#,
        )
        .bind(tenant_id)
        .bind(document)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BillingPolicyProvider for PgPolicyProvider {
    async fn policies_for(&self, tenant_id: Uuid) -> BillingResult<BillingPolicies> {
        let document: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT policies FROM tenant_billing_policy WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_optional(&*self.pool)
                .await?;

        match document {
            Some(document) => BillingPolicies::from_json(&document.to_string()),
            None => {
                debug!(%tenant_id, "no billing policies stored, using defaults");
                Ok(BillingPolicies::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::setup_shared_repos;
    use condo_core_api::domain::billing_rules::{ApplyOn, LateFeePolicy, RateType};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_stored_policies_round_trip() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let postgres = setup_shared_repos().await?;
        let provider = PgPolicyProvider::new(Arc::new(postgres.pool().clone()));
        let tenant_id = Uuid::new_v4();

        assert_eq!(provider.policies_for(tenant_id).await?, BillingPolicies::default());

        let policies = BillingPolicies {
            early_payment: None,
            late_fee: Some(LateFeePolicy {
                rate_type: RateType::Percentage,
                value: dec!(3),
                grace_days: 5,
                apply_on: ApplyOn::Balance,
                max_rate: Some(dec!(10)),
                compound: false,
            }),
        };
        provider.store(tenant_id, &policies).await?;
        assert_eq!(provider.policies_for(tenant_id).await?, policies);

        Ok(())
    }
}
