use condo_core_db::models::egress::EgressAllocationModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::EgressAllocationRepositoryImpl;

impl EgressAllocationRepositoryImpl {
    pub async fn find_by_egress(
        &self,
        egress_id: Uuid,
    ) -> Result<Vec<EgressAllocationModel>, Box<dyn Error + Send + Sync>> {
        let query = sqlx::query_as::<_, EgressAllocationModel>(
            r#"
            SELECT id, egress_id, payable_id, amount_allocated, created_at
            FROM egress_allocation
            WHERE egress_id = $1
            ORDER BY payable_id
            "#,
        )
        .bind(egress_id);

        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        Ok(query.fetch_all(&mut **transaction).await?)
    }
}
