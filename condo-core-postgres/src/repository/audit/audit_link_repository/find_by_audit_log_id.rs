use condo_core_db::models::audit::AuditLinkModel;
use uuid::Uuid;

use super::repo_impl::AuditLinkRepositoryImpl;

impl AuditLinkRepositoryImpl {
    pub(super) async fn find_by_audit_log_id_impl(
        repo: &AuditLinkRepositoryImpl,
        audit_log_id: Uuid,
    ) -> Result<Vec<AuditLinkModel>, Box<dyn std::error::Error + Send + Sync>> {
        let query = sqlx::query_as::<_, AuditLinkModel>(
            r#"
            SELECT audit_log_id, entity_id, entity_type
            FROM audit_link
            WHERE audit_log_id = $1
            ORDER BY entity_type, entity_id
            "#,
        )
        .bind(audit_log_id);

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        Ok(query.fetch_all(&mut **transaction).await?)
    }
}
