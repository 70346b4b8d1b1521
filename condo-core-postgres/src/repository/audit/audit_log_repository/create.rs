use condo_core_db::models::audit::AuditLogModel;

use super::repo_impl::AuditLogRepositoryImpl;

impl AuditLogRepositoryImpl {
    pub(super) async fn create_impl(
        repo: &AuditLogRepositoryImpl,
        audit_log: &AuditLogModel,
    ) -> Result<AuditLogModel, Box<dyn std::error::Error + Send + Sync>> {
        let query = sqlx::query(
            r#"
            INSERT INTO audit_log (id, updated_at, updated_by_person_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(audit_log.id)
        .bind(audit_log.updated_at)
        .bind(audit_log.updated_by_person_id);

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        query.execute(&mut **transaction).await?;

        Ok(audit_log.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::setup_test_context;
    use condo_core_db::models::audit::AuditLogModel;
    use condo_core_db::repository::load::Load;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_create_audit_log() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let audit_log_repo = &ctx.repos().audit_log_repository;

        let actor = Uuid::new_v4();
        let audit_log = AuditLogModel::new(actor);
        audit_log_repo.create(&audit_log).await?;

        let loaded = audit_log_repo.load(audit_log.id).await?;
        assert_eq!(loaded.updated_by_person_id, actor);

        Ok(())
    }
}
