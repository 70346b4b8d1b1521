use async_trait::async_trait;
use sqlx::Database;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Loads entities and takes an exclusive row lock on each of them
///
/// Rows are locked in ascending id order whatever the order of `ids`, so two transactions that
/// lock overlapping sets never deadlock on each other. The locks are held until the executor's
/// transaction commits or rolls back.
///
/// # Type Parameters
/// * `DB` - The database type (must implement sqlx::Database)
/// * `T` - The entity type that must implement Identifiable trait
#[async_trait]
pub trait LoadForUpdate<DB: Database, T: Identifiable>: Send + Sync {
    /// # Returns
    /// * `Ok(Vec<Option<T>>)` - Locked entities in the same order as the provided IDs, `None` for
    ///   missing ones
    /// * `Err` - An error if the query failed, including lock timeouts
    async fn load_for_update(&self, ids: &[Uuid]) -> Result<Vec<Option<T>>, Box<dyn std::error::Error + Send + Sync>>;
}
