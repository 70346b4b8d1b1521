use uuid::Uuid;

use super::audit::EntityType;
use super::identifiable::Identifiable;

/// Trait for entities whose every change is attributed to an audit log entry
pub trait Auditable: Identifiable {
    /// Entity type recorded in the audit link table
    const ENTITY_TYPE: EntityType;

    /// Returns the ID of the last audit log entry that touched this entity, if any
    fn get_audit_log_id(&self) -> Option<Uuid>;

    /// Stamps the entity with the audit log of the current transaction
    fn set_audit_log_id(&mut self, audit_log_id: Uuid);
}
