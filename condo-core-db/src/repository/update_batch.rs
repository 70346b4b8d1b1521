use async_trait::async_trait;
use sqlx::Database;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Generic repository trait for updating multiple entities in a batch
///
/// Callers load the rows with [`crate::repository::LoadForUpdate`] first, so the update never
/// races another writer.
///
/// # Type Parameters
/// * `DB` - The database type (must implement sqlx::Database)
/// * `T` - The entity type that must implement Identifiable trait
#[async_trait]
pub trait UpdateBatch<DB: Database, T: Identifiable>: Send + Sync {
    /// Update multiple items in the current transaction
    ///
    /// # Arguments
    /// * `items` - A vector of entities to update
    /// * `audit_log_id` - The audit log of the current transaction
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - A vector of updated entities
    /// * `Err` - An error if an item does not exist or the statements could not be executed
    async fn update_batch(
        &self,
        items: Vec<T>,
        audit_log_id: Uuid,
    ) -> Result<Vec<T>, Box<dyn std::error::Error + Send + Sync>>;
}
