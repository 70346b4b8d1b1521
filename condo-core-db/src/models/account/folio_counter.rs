use chrono::{DateTime, Utc};
use condo_core_api::domain::document::DocumentType;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Per-tenant folio counters, one column per document type.
///
/// The stored value is the last folio issued; `0` means none yet. Counter changes are attributed
/// through the audit log of the document they number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FolioCounterModel {
    pub tenant_id: Uuid,
    pub current_folio_rec: i64,
    pub current_folio_eg: i64,
    pub updated_at: DateTime<Utc>,
}

impl FolioCounterModel {
    pub fn new(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            current_folio_rec: 0,
            current_folio_eg: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn current(&self, document_type: DocumentType) -> i64 {
        match document_type {
            DocumentType::Rec => self.current_folio_rec,
            DocumentType::Eg => self.current_folio_eg,
        }
    }

    /// Moves the counter for `document_type` forward by one and returns the new folio.
    pub fn advance(&mut self, document_type: DocumentType) -> i64 {
        let slot = match document_type {
            DocumentType::Rec => &mut self.current_folio_rec,
            DocumentType::Eg => &mut self.current_folio_eg,
        };
        *slot += 1;
        self.updated_at = Utc::now();
        *slot
    }
}

impl Identifiable for FolioCounterModel {
    fn get_id(&self) -> Uuid {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_advance_independently() {
        let mut counter = FolioCounterModel::new(Uuid::new_v4());
        assert_eq!(counter.advance(DocumentType::Rec), 1);
        assert_eq!(counter.advance(DocumentType::Rec), 2);
        assert_eq!(counter.advance(DocumentType::Eg), 1);
        assert_eq!(counter.current(DocumentType::Rec), 2);
        assert_eq!(counter.current(DocumentType::Eg), 1);
    }
}
