use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::MONEY_EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "reconciliation_status", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Difference still open; nothing is locked yet.
    Borrador,
    /// Books match the bank within one cent.
    Conciliada,
    /// Period closed by the administrator.
    Cerrada,
}

impl ReconciliationStatus {
    /// Documents referenced by a reconciliation in this status can no longer be cancelled.
    pub fn locks_documents(self) -> bool {
        match self {
            ReconciliationStatus::Borrador => false,
            ReconciliationStatus::Conciliada | ReconciliationStatus::Cerrada => true,
        }
    }
}

/// An egress as the matcher sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressLine {
    pub amount: Decimal,
    pub has_check: bool,
    pub is_check_cashed: bool,
}

impl EgressLine {
    /// Issued checks the bank has not paid yet.
    pub fn is_in_transit(&self) -> bool {
        self.has_check && !self.is_check_cashed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationInput {
    pub opening_balance: Decimal,
    pub ingresos: Vec<Decimal>,
    pub egresos: Vec<EgressLine>,
    pub bank_closing_balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_ingresos: Decimal,
    pub settled_egresos: Decimal,
    pub in_transit: Decimal,
    pub books_balance: Decimal,
    pub difference: Decimal,
    pub status: ReconciliationStatus,
}

/// `books = opening + Σingresos − Σsettled`, `difference = bank − (books + Σin_transit)`.
pub fn compute_reconciliation_summary(input: &ReconciliationInput) -> ReconciliationSummary {
    let total_ingresos: Decimal = input.ingresos.iter().copied().sum();
    let (in_transit, settled_egresos) = input.egresos.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(in_transit, settled), line| {
            if line.is_in_transit() {
                (in_transit + line.amount, settled)
            } else {
                (in_transit, settled + line.amount)
            }
        },
    );

    let books_balance = input.opening_balance + total_ingresos - settled_egresos;
    let difference = input.bank_closing_balance - (books_balance + in_transit);
    let status = if difference.abs() <= MONEY_EPSILON {
        ReconciliationStatus::Conciliada
    } else {
        ReconciliationStatus::Borrador
    };

    ReconciliationSummary {
        total_ingresos,
        settled_egresos,
        in_transit,
        books_balance,
        difference,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settled(amount: Decimal) -> EgressLine {
        EgressLine {
            amount,
            has_check: false,
            is_check_cashed: false,
        }
    }

    fn uncashed_check(amount: Decimal) -> EgressLine {
        EgressLine {
            amount,
            has_check: true,
            is_check_cashed: false,
        }
    }

    fn input(bank: Decimal) -> ReconciliationInput {
        ReconciliationInput {
            opening_balance: dec!(1000),
            ingresos: vec![dec!(500), dec!(200)],
            egresos: vec![settled(dec!(300)), uncashed_check(dec!(150))],
            bank_closing_balance: bank,
        }
    }

    #[test]
    fn open_difference_stays_in_draft() {
        let summary = compute_reconciliation_summary(&input(dec!(1400)));
        assert_eq!(summary.books_balance, dec!(1400));
        assert_eq!(summary.in_transit, dec!(150));
        assert_eq!(summary.difference, dec!(-150));
        assert_eq!(summary.status, ReconciliationStatus::Borrador);
    }

    #[test]
    fn matching_bank_balance_reconciles() {
        let summary = compute_reconciliation_summary(&input(dec!(1550)));
        assert_eq!(summary.difference, Decimal::ZERO);
        assert_eq!(summary.status, ReconciliationStatus::Conciliada);
    }

    #[test]
    fn one_cent_tolerance() {
        let summary = compute_reconciliation_summary(&input(dec!(1550.01)));
        assert_eq!(summary.status, ReconciliationStatus::Conciliada);
        let summary = compute_reconciliation_summary(&input(dec!(1550.02)));
        assert_eq!(summary.status, ReconciliationStatus::Borrador);
    }

    #[test]
    fn cashed_checks_are_settled() {
        let mut data = input(dec!(1400));
        data.egresos[1].is_check_cashed = true;
        let summary = compute_reconciliation_summary(&data);
        assert_eq!(summary.in_transit, Decimal::ZERO);
        assert_eq!(summary.settled_egresos, dec!(450));
        assert_eq!(summary.books_balance, dec!(1250));
        assert_eq!(summary.difference, dec!(150));
    }

    #[test]
    fn only_closed_statuses_lock() {
        assert!(!ReconciliationStatus::Borrador.locks_documents());
        assert!(ReconciliationStatus::Conciliada.locks_documents());
        assert!(ReconciliationStatus::Cerrada.locks_documents());
    }
}
