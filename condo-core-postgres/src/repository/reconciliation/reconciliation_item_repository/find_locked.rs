use condo_core_api::domain::reconciliation::ReconciliationStatus;
use std::collections::HashSet;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ReconciliationItemRepositoryImpl;

impl ReconciliationItemRepositoryImpl {
    /// Which of the given documents already belong to a reconciled or closed snapshot.
    pub async fn locked_document_ids(
        &self,
        payment_ids: &[Uuid],
        egress_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, Box<dyn Error + Send + Sync>> {
        self.find_locked(payment_ids, egress_ids, true).await
    }

    /// Like [`Self::locked_document_ids`], but an egress whose check was still in transit in
    /// every locked snapshot stays selectable, so a later period can report it cashed.
    pub async fn settled_document_ids(
        &self,
        payment_ids: &[Uuid],
        egress_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, Box<dyn Error + Send + Sync>> {
        self.find_locked(payment_ids, egress_ids, false).await
    }

    async fn find_locked(
        &self,
        payment_ids: &[Uuid],
        egress_ids: &[Uuid],
        include_in_transit: bool,
    ) -> Result<HashSet<Uuid>, Box<dyn Error + Send + Sync>> {
        if payment_ids.is_empty() && egress_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let rows: Vec<(Option<Uuid>, Option<Uuid>)> = sqlx::query_as(
            r#"
            SELECT ri.payment_id, ri.egress_id
            FROM reconciliation_item ri
            JOIN reconciliation r ON r.id = ri.reconciliation_id
            WHERE r.status IN ($3, $4)
              AND (
                ri.payment_id = ANY($1)
                OR (ri.egress_id = ANY($2) AND (ri.is_check_cashed OR $5))
              )
            "#,
        )
        .bind(payment_ids)
        .bind(egress_ids)
        .bind(ReconciliationStatus::Conciliada)
        .bind(ReconciliationStatus::Cerrada)
        .bind(include_in_transit)
        .fetch_all(&mut **transaction)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(payment_id, egress_id)| payment_id.or(egress_id))
            .collect())
    }

    pub async fn is_locked(&self, document_id: Uuid) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let ids = [document_id];
        Ok(!self.locked_document_ids(&ids, &ids).await?.is_empty())
    }
}
