use condo_core_db::models::audit::{AuditLinkModel, EntityType};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::unit_of_work::Executor;

pub struct AuditLinkRepositoryImpl {
    pub(crate) executor: Executor,
}

impl AuditLinkRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn find_by_audit_log_id(
        &self,
        audit_log_id: Uuid,
    ) -> Result<Vec<AuditLinkModel>, Box<dyn std::error::Error + Send + Sync>> {
        Self::find_by_audit_log_id_impl(self, audit_log_id).await
    }
}

/// Records that `entity_id` was written under `audit_log_id`.
///
/// Runs on a transaction the caller already holds, so entity writes and their links share one lock
/// acquisition. Writing the same entity twice under one audit log keeps a single link.
pub async fn insert_audit_link(
    transaction: &mut Transaction<'static, Postgres>,
    audit_log_id: Uuid,
    entity_id: Uuid,
    entity_type: EntityType,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_link (audit_log_id, entity_id, entity_type)
        VALUES ($1, $2, $3)
        ON CONFLICT (audit_log_id, entity_id) DO NOTHING
        "#,
    )
    .bind(audit_log_id)
    .bind(entity_id)
    .bind(entity_type)
    .execute(&mut **transaction)
    .await?;
    Ok(())
}
