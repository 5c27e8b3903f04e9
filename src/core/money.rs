use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to 2 decimal places, half away from zero.
///
/// Every amount entering or leaving the engines passes through this helper so
/// floating drift cannot accumulate across repeated additions/subtractions.
/// Idempotent: `round2(round2(x)) == round2(x)`.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors a converted amount to whole yen.
///
/// Yen has no subunit, and the allocation engine floors (not rounds) each
/// per-line conversion; the lost fraction is restored by the rounding
/// reconciliation step.
pub fn jpy_floor(value: Decimal) -> Decimal {
    value.floor()
}

/// Converts an amount in payment currency to whole yen at the given rate.
pub fn to_jpy(amount: Decimal, exchange_rate: Decimal) -> Decimal {
    jpy_floor(amount * exchange_rate)
}
