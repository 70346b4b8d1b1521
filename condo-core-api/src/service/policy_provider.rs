use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::billing_rules::BillingPolicies;
use crate::error::BillingResult;

/// Read access to the tenant configuration store.
#[async_trait]
pub trait BillingPolicyProvider: Send + Sync {
    async fn policies_for(&self, tenant_id: Uuid) -> BillingResult<BillingPolicies>;
}

/// In-memory provider: a default policy set plus per-tenant overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyProvider {
    default_policies: BillingPolicies,
    tenant_policies: HashMap<Uuid, BillingPolicies>,
}

impl StaticPolicyProvider {
    pub fn new(default_policies: BillingPolicies) -> Self {
        Self {
            default_policies,
            tenant_policies: HashMap::new(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: Uuid, policies: BillingPolicies) -> Self {
        self.tenant_policies.insert(tenant_id, policies);
        self
    }

    /// Loads the override for `tenant_id` from its stored JSON document.
    pub fn with_tenant_json(self, tenant_id: Uuid, raw: &str) -> BillingResult<Self> {
        let policies = BillingPolicies::from_json(raw)?;
        Ok(self.with_tenant(tenant_id, policies))
    }
}

#[async_trait]
impl BillingPolicyProvider for StaticPolicyProvider {
    async fn policies_for(&self, tenant_id: Uuid) -> BillingResult<BillingPolicies> {
        Ok(self
            .tenant_policies
            .get(&tenant_id)
            .cloned()
            .unwrap_or_else(|| self.default_policies.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tenant_override_wins_over_default() {
        let tenant = Uuid::new_v4();
        let provider = StaticPolicyProvider::default()
            .with_tenant_json(
                tenant,
                r#"{"late_fee": {"rate_type": "percentage", "value": "5", "grace_days": 10, "apply_on": "balance"}}"#,
            )
            .unwrap();

        let configured = provider.policies_for(tenant).await.unwrap();
        assert!(configured.late_fee.is_some());
        assert!(configured.early_payment.is_none());

        let other = provider.policies_for(Uuid::new_v4()).await.unwrap();
        assert_eq!(other, BillingPolicies::default());
    }

    #[test]
    fn default_policies_apply_without_overrides() {
        let provider = StaticPolicyProvider::new(BillingPolicies::default());
        let policies = tokio_test::block_on(provider.policies_for(Uuid::new_v4())).unwrap();
        assert!(policies.late_fee.is_none());
    }

    #[test]
    fn rejects_malformed_policy_documents() {
        let provider = StaticPolicyProvider::default();
        assert!(provider.with_tenant_json(Uuid::new_v4(), "{not json").is_err());
    }
}
