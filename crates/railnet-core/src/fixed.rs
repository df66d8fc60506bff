use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for probabilities and elapsed animation time so that runs are
/// reproducible across platforms.
pub type Fixed64 = I32F32;

/// Turn counter type.
pub type Turn = u32;

/// Convert an f64 to Fixed64. Use only at the host boundary.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Whether `v` lies in the closed unit interval.
#[inline]
pub fn is_probability(v: Fixed64) -> bool {
    v >= Fixed64::ZERO && v <= Fixed64::ONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_values() {
        assert_eq!(fixed64_to_f64(f64_to_fixed64(0.5)), 0.5);
        assert_eq!(fixed64_to_f64(f64_to_fixed64(2.0)), 2.0);
    }

    #[test]
    fn accumulation_is_exact_for_binary_fractions() {
        let quarter = f64_to_fixed64(0.25);
        let mut acc = Fixed64::ZERO;
        for _ in 0..8 {
            acc += quarter;
        }
        assert_eq!(acc, f64_to_fixed64(2.0));
    }

    #[test]
    fn probability_bounds() {
        assert!(is_probability(Fixed64::ZERO));
        assert!(is_probability(Fixed64::ONE));
        assert!(is_probability(f64_to_fixed64(0.4)));
        assert!(!is_probability(f64_to_fixed64(-0.1)));
        assert!(!is_probability(f64_to_fixed64(1.5)));
    }
}
