use async_trait::async_trait;
use sqlx::Database;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Generic repository trait for creating multiple entities in a batch
///
/// All inserts run on the repository's executor, so they commit or roll back together with the
/// rest of the unit of work. Auditable entities are stamped with `audit_log_id` and linked to it.
///
/// # Type Parameters
/// * `DB` - The database type (must implement sqlx::Database)
/// * `T` - The entity type that must implement Identifiable trait
///
/// # Example
/// ```ignore
/// impl CreateBatch<Postgres, ChargeModel> for ChargeRepositoryImpl {
///     async fn create_batch(&self, items: Vec<ChargeModel>, audit_log_id: Uuid) -> Result<Vec<ChargeModel>, Box<dyn Error + Send + Sync>> {
///         // Implementation
///     }
/// }
/// ```
#[async_trait]
pub trait CreateBatch<DB: Database, T: Identifiable>: Send + Sync {
    /// Save multiple items in the current transaction
    ///
    /// # Arguments
    /// * `items` - A vector of entities to create
    /// * `audit_log_id` - The audit log of the current transaction
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - The created entities, as stored
    /// * `Err` - An error if the statements could not be executed
    async fn create_batch(
        &self,
        items: Vec<T>,
        audit_log_id: Uuid,
    ) -> Result<Vec<T>, Box<dyn std::error::Error + Send + Sync>>;
}
