use async_trait::async_trait;
use sqlx::Database;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Plain reads by id, without row locks.
///
/// Used where a value is only reported (assessments, tests); anything that is about to be
/// written goes through [`crate::repository::LoadForUpdate`] instead.
///
/// The result lines up with `ids`: position `i` is `None` when `ids[i]` does not exist.
#[async_trait]
pub trait LoadBatch<DB: Database, T: Identifiable>: Send + Sync {
    async fn load_batch(&self, ids: &[Uuid]) -> Result<Vec<Option<T>>, Box<dyn std::error::Error + Send + Sync>>;
}
