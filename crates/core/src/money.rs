//! Currency conversions between decimal amounts and integer minor units.
//!
//! Amounts are persisted as integer cents. Conversions from floating point
//! first snap the scaled value to six decimal places so representation error
//! (e.g. `10.005 * 100 == 1000.4999999999999`) does not flip the rounding.

const SNAP: f64 = 1e6;

/// Convert a decimal dollar amount to integer cents, rounding half away from zero.
pub fn dollars_to_cents(dollars: f64) -> i64 {
    let scaled = dollars * 100.0;
    let snapped = (scaled * SNAP).round() / SNAP;
    snapped.round() as i64
}

/// Convert integer cents back to a decimal dollar amount.
pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_half_cent_up() {
        assert_eq!(dollars_to_cents(10.005), 1001);
        assert_eq!(dollars_to_cents(0.0), 0);
        assert_eq!(dollars_to_cents(1.1), 110);
        assert_eq!(dollars_to_cents(19.99), 1999);
        assert_eq!(dollars_to_cents(0.004), 0);
    }

    #[test]
    fn cents_to_dollars_is_exact_for_whole_cents() {
        assert_eq!(cents_to_dollars(1001), 10.01);
        assert_eq!(cents_to_dollars(0), 0.0);
        assert_eq!(cents_to_dollars(-250), -2.5);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: a round trip through cents never drifts by more than one minor unit.
        #[test]
        fn round_trip_within_one_cent(x in 0.0f64..1_000_000_000.0f64) {
            let back = cents_to_dollars(dollars_to_cents(x));
            prop_assert!((back - x).abs() <= 0.01, "x={x} back={back}");
        }
    }
}
