use condo_core_db::models::audit::AuditLogModel;
use uuid::Uuid;

use crate::unit_of_work::Executor;

pub async fn load_batch_impl(
    executor: &Executor,
    ids: &[Uuid],
) -> Result<Vec<Option<AuditLogModel>>, Box<dyn std::error::Error + Send + Sync>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let query = sqlx::query_as::<_, AuditLogModel>(
        r#"
        SELECT id, updated_at, updated_by_person_id
        FROM audit_log
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids);

    let rows = {
        let mut tx = executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        query.fetch_all(&mut **transaction).await?
    };

    let mut map: std::collections::HashMap<Uuid, AuditLogModel> =
        rows.into_iter().map(|model| (model.id, model)).collect();

    Ok(ids.iter().map(|id| map.remove(id)).collect())
}
