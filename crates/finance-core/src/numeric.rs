/// Decimal helpers shared by every analyzer.
/// Rounding happens only when report values are built; intermediate sums stay exact.
use rust_decimal::prelude::*;
use rust_decimal::{MathematicalOps, RoundingStrategy};

/// Round a currency amount to cents.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a percentage to one decimal place.
pub fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Divide, returning `None` when the denominator is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    safe_div(part, whole)
        .map(|ratio| ratio * Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let total: Decimal = values.iter().copied().sum();
    safe_div(total, Decimal::from(values.len()))
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(values: &[Decimal]) -> Option<Decimal> {
    let avg = mean(values)?;
    let sum_sq: Decimal = values
        .iter()
        .map(|v| {
            let diff = *v - avg;
            diff * diff
        })
        .sum();
    let variance = safe_div(sum_sq, Decimal::from(values.len()))?;
    variance.sqrt()
}

/// Standard deviation divided by mean; `None` for empty input or a zero mean.
pub fn coefficient_of_variation(values: &[Decimal]) -> Option<Decimal> {
    let avg = mean(values)?;
    let std_dev = population_std_dev(values)?;
    safe_div(std_dev, avg)
}

/// Convert a float coming from a loosely typed source into a decimal.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(round_currency(dec!(1.005)), dec!(1.01));
        assert_eq!(round_currency(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_currency(dec!(2.344)), dec!(2.34));
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(dec!(83.35)), dec!(83.4));
        assert_eq!(round_percent(dec!(99.94)), dec!(99.9));
    }

    #[test]
    fn test_division_guard() {
        assert_eq!(safe_div(dec!(10), Decimal::ZERO), None);
        assert_eq!(safe_div(dec!(10), dec!(4)), Some(dec!(2.5)));
        assert_eq!(percent_of(dec!(50), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percent_of(dec!(50), dec!(200)), dec!(25));
    }

    #[test]
    fn test_mean_and_dispersion() {
        let values = [dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        assert_eq!(mean(&values), Some(dec!(5)));
        assert_eq!(population_std_dev(&values), Some(dec!(2)));
        assert_eq!(coefficient_of_variation(&values), Some(dec!(0.4)));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_constant_series_has_zero_variation() {
        let values = [dec!(15.49); 4];
        assert_eq!(coefficient_of_variation(&values), Some(Decimal::ZERO));
    }
}
