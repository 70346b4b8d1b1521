use async_trait::async_trait;
use condo_core_db::models::account::FinancialAccountModel;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::FinancialAccountRepositoryImpl;
use crate::repository::audit::insert_audit_link;

#[async_trait]
impl CreateBatch<Postgres, FinancialAccountModel> for FinancialAccountRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<FinancialAccountModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<FinancialAccountModel>, Box<dyn Error + Send + Sync>> {
        let mut saved_items = Vec::with_capacity(items.len());
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            sqlx::query(
                r#"
                INSERT INTO financial_account (id, tenant_id, name, opening_balance, current_balance, audit_log_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id)
            .bind(item.tenant_id)
            .bind(item.name.as_str())
            .bind(item.opening_balance)
            .bind(item.current_balance)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            insert_audit_link(transaction, audit_log_id, item.id, FinancialAccountModel::ENTITY_TYPE).await?;
            saved_items.push(item);
        }

        Ok(saved_items)
    }
}
