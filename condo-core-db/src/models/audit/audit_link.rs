use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::EntityType;

/// Tracks every entity modified under one audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuditLinkModel {
    pub audit_log_id: Uuid,
    pub entity_id: Uuid,
    pub entity_type: EntityType,
}
