use rust_decimal::{Decimal, RoundingStrategy};

/// Amounts closer than one cent are considered equal.
pub const MONEY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn is_zero_money(amount: Decimal) -> bool {
    amount.abs() < MONEY_EPSILON
}

pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn epsilon_is_one_cent() {
        assert_eq!(MONEY_EPSILON, dec!(0.01));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(33.335)), dec!(33.34));
        assert_eq!(round_money(dec!(-33.335)), dec!(-33.34));
        assert_eq!(round_money(dec!(33.3349)), dec!(33.33));
    }

    #[test]
    fn sub_cent_differences_compare_equal() {
        assert!(money_eq(dec!(10.004), dec!(10.00)));
        assert!(!money_eq(dec!(10.01), dec!(10.00)));
        assert!(is_zero_money(dec!(0.009)));
        assert!(!is_zero_money(dec!(-0.01)));
    }
}
