use async_trait::async_trait;
use sqlx::Database;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Loads a single entity that must exist
#[async_trait]
pub trait Load<DB: Database, T: Identifiable>: Send + Sync {
    /// # Returns
    /// * `Ok(T)` - The entity
    /// * `Err` - If the entity does not exist or the query failed
    async fn load(&self, id: Uuid) -> Result<T, Box<dyn std::error::Error + Send + Sync>>;
}
