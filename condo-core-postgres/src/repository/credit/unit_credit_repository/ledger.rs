use condo_core_api::domain::credit::CreditStatus;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::repository::pagination::{Page, PageRequest};
use condo_core_db::utils::hash_as_i64;
use rust_decimal::Decimal;
use sqlx::Row;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::UnitCreditRepositoryImpl;
use crate::utils::TryFromRow;

/// Both views of a unit's credit, which must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTotals {
    /// Σ amount over every entry.
    pub balance: Decimal,
    /// Σ remaining_amount over active sources.
    pub active_remaining: Decimal,
}

impl UnitCreditRepositoryImpl {
    /// Serializes every ledger write for one unit until the transaction ends.
    pub async fn lock_unit(&self, unit_id: Uuid) -> Result<(), Box<dyn Error + Send + Sync>> {
        let key = hash_as_i64(&unit_id)?;
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key)
            .execute(&mut **transaction)
            .await?;
        Ok(())
    }

    pub async fn ledger_balance(&self, unit_id: Uuid) -> Result<Decimal, Box<dyn Error + Send + Sync>> {
        Ok(self.ledger_totals(unit_id).await?.balance)
    }

    pub async fn ledger_totals(&self, unit_id: Uuid) -> Result<LedgerTotals, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(amount), 0) AS balance,
                COALESCE(SUM(remaining_amount) FILTER (WHERE status = $2 AND amount > 0), 0) AS active_remaining
            FROM unit_credit
            WHERE unit_id = $1
            "#,
        )
        .bind(unit_id)
        .bind(CreditStatus::Active)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(LedgerTotals {
            balance: row.try_get("balance")?,
            active_remaining: row.try_get("active_remaining")?,
        })
    }

    /// Tenants that own entries in the unit's ledger; empty for a unit that never held credit.
    pub async fn ledger_tenants(&self, unit_id: Uuid) -> Result<Vec<Uuid>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let tenants: Vec<Uuid> = sqlx::query_scalar("SELECT DISTINCT tenant_id FROM unit_credit WHERE unit_id = $1")
            .bind(unit_id)
            .fetch_all(&mut **transaction)
            .await?;
        Ok(tenants)
    }

    /// Reads one entry without locking it, to learn which unit to lock first.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UnitCreditModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let row = sqlx::query("SELECT * FROM unit_credit WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await?;
        row.as_ref().map(UnitCreditModel::try_from_row).transpose()
    }

    /// Overpayment sources created by a payment.
    pub async fn find_by_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Vec<UnitCreditModel>, Box<dyn Error + Send + Sync>> {
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(
                r#"
                SELECT * FROM unit_credit
                WHERE payment_id = $1 AND amount > 0
                ORDER BY created_at, id
                FOR UPDATE
                "#,
            )
            .bind(payment_id)
            .fetch_all(&mut **transaction)
            .await?
        };

        rows.iter().map(UnitCreditModel::try_from_row).collect()
    }

    /// Chronological ledger of a unit.
    pub async fn statement(
        &self,
        unit_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<UnitCreditModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM unit_credit WHERE unit_id = $1")
            .bind(unit_id)
            .fetch_one(&mut **transaction)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM unit_credit
            WHERE unit_id = $1
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(unit_id)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&mut **transaction)
        .await?;

        let items = rows
            .iter()
            .map(UnitCreditModel::try_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total as usize, page.limit, page.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_utils::create_test_credit;
    use crate::test_helper::{create_test_audit_log, setup_test_context};
    use condo_core_db::repository::create_batch::CreateBatch;
    use condo_core_db::repository::pagination::PageRequest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_totals_of_an_empty_ledger_are_zero() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let totals = ctx.repos().unit_credit_repository.ledger_totals(Uuid::new_v4()).await?;
        assert_eq!(totals.balance, dec!(0));
        assert_eq!(totals.active_remaining, dec!(0));
        Ok(())
    }

    #[tokio::test]
    async fn test_statement_pages_in_entry_order() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let audit_log = create_test_audit_log(repos).await?;

        let tenant_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        let mut entries = Vec::new();
        let mut running = dec!(0);
        for i in 1..=5 {
            running += dec!(10.00);
            let mut entry = create_test_credit(tenant_id, unit_id, dec!(10.00), running);
            entry.created_at += chrono::Duration::seconds(i);
            entries.push(entry);
        }
        repos.unit_credit_repository.lock_unit(unit_id).await?;
        repos.unit_credit_repository.create_batch(entries.clone(), audit_log.id).await?;

        let page = repos
            .unit_credit_repository
            .statement(unit_id, PageRequest::for_page(2, 2))
            .await?;
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, entries[2].id);
        assert!(page.has_more());

        let totals = repos.unit_credit_repository.ledger_totals(unit_id).await?;
        assert_eq!(totals.balance, dec!(50.00));
        assert_eq!(totals.active_remaining, dec!(50.00));

        Ok(())
    }
}
