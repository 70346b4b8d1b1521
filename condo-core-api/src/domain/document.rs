use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of financial documents that carry a sequential folio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "document_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Receipt issued for an incoming payment.
    Rec,
    /// Voucher issued for an outgoing egress.
    Eg,
}

impl DocumentType {
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentType::Rec => "REC",
            DocumentType::Eg => "EG",
        }
    }

    /// Human-facing document number, e.g. `REC-000042`.
    pub fn format_folio(self, folio: i64) -> String {
        format!("{}-{:06}", self.prefix(), folio)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "REC" => Ok(DocumentType::Rec),
            "EG" => Ok(DocumentType::Eg),
            other => Err(format!("unknown document type: {other}")),
        }
    }
}

/// Lifecycle of a payment or egress. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "document_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Available,
    Cancelled,
}

impl DocumentStatus {
    /// `available -> cancelled` is the only transition; there is no way back.
    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        matches!((self, next), (DocumentStatus::Available, DocumentStatus::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_folios_with_prefix() {
        assert_eq!(DocumentType::Rec.format_folio(42), "REC-000042");
        assert_eq!(DocumentType::Eg.format_folio(1_234_567), "EG-1234567");
    }

    #[test]
    fn parses_prefixes_case_insensitively() {
        assert_eq!("rec".parse::<DocumentType>(), Ok(DocumentType::Rec));
        assert_eq!("EG".parse::<DocumentType>(), Ok(DocumentType::Eg));
        assert!("INV".parse::<DocumentType>().is_err());
    }

    #[test]
    fn cancelled_documents_cannot_be_reactivated() {
        assert!(DocumentStatus::Available.can_transition_to(DocumentStatus::Cancelled));
        assert!(!DocumentStatus::Cancelled.can_transition_to(DocumentStatus::Available));
        assert!(!DocumentStatus::Cancelled.can_transition_to(DocumentStatus::Cancelled));
    }
}
