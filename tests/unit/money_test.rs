// Property-based tests for the fixed-point money helpers.
//
// Every monetary quantity in the engines passes through round2/jpy_floor, so
// these two small functions carry the whole rounding policy.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use yenledger::core::money::{jpy_floor, round2, to_jpy};

proptest! {
    #[test]
    fn round2_is_idempotent(cents in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..10) {
        let value = Decimal::new(cents, scale);
        let once = round2(value);
        prop_assert_eq!(round2(once), once);
    }

    #[test]
    fn round2_never_increases_scale_beyond_two(cents in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..10) {
        let rounded = round2(Decimal::new(cents, scale));
        prop_assert!(rounded.scale() <= 2, "scale {} too large for {}", rounded.scale(), rounded);
    }

    #[test]
    fn round2_stays_within_half_a_cent(cents in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..10) {
        let value = Decimal::new(cents, scale);
        let diff = (round2(value) - value).abs();
        prop_assert!(diff <= dec!(0.005), "rounding moved {} by {}", value, diff);
    }

    #[test]
    fn jpy_floor_is_whole_and_never_rounds_up(cents in 0i64..1_000_000_000i64, scale in 0u32..6) {
        let value = Decimal::new(cents, scale);
        let floored = jpy_floor(value);
        prop_assert_eq!(floored, floored.trunc());
        prop_assert!(floored <= value);
        prop_assert!(value - floored < Decimal::ONE);
    }

    #[test]
    fn to_jpy_matches_floor_of_product(
        amount_cents in 0i64..100_000_000i64,
        rate_hundredths in 1i64..100_000i64,
    ) {
        let amount = Decimal::new(amount_cents, 2);
        let rate = Decimal::new(rate_hundredths, 2);
        prop_assert_eq!(to_jpy(amount, rate), (amount * rate).floor());
    }
}

#[test]
fn round2_half_away_from_zero_at_boundary() {
    assert_eq!(round2(dec!(0.125)), dec!(0.13));
    assert_eq!(round2(dec!(-0.125)), dec!(-0.13));
}
