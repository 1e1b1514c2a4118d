use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a number-field snaps its value to `precision` decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    Up,
    Down,
    Nearest,
}

/// Number of decimal digits in `value`, ignoring sign and decimal point.
pub fn count_digits(value: f64) -> usize {
    value
        .abs()
        .to_string()
        .chars()
        .filter(|ch| ch.is_ascii_digit())
        .count()
}

/// Snap `value` to `precision` decimal places.
///
/// `Nearest` inspects the fractional remainder after scaling: below `0.1`
/// floors, at or above `0.59` ceils, anything between lands on `.5`.
pub fn round(value: f64, precision: u32, mode: Rounding) -> f64 {
    let scale = 10f64.powi(precision.min(15) as i32);
    let scaled = value * scale;
    let snapped = match mode {
        Rounding::Up => scaled.ceil(),
        Rounding::Down => scaled.floor(),
        Rounding::Nearest => {
            let base = scaled.floor();
            let remainder = scaled - base;
            if remainder < 0.1 {
                base
            } else if remainder >= 0.59 {
                base + 1.0
            } else {
                base + 0.5
            }
        }
    };
    snapped / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_ignore_sign_and_point() {
        assert_eq!(count_digits(-12.5), 3);
        assert_eq!(count_digits(1000.0), 4);
        assert_eq!(count_digits(0.25), 3);
    }

    #[test]
    fn nearest_uses_asymmetric_cutoffs() {
        assert_eq!(round(2.05, 0, Rounding::Nearest), 2.0);
        assert_eq!(round(2.3, 0, Rounding::Nearest), 2.5);
        assert_eq!(round(2.58, 0, Rounding::Nearest), 2.5);
        assert_eq!(round(2.6, 0, Rounding::Nearest), 3.0);
    }

    #[test]
    fn up_and_down_respect_precision() {
        assert_eq!(round(1.234, 2, Rounding::Up), 1.24);
        assert_eq!(round(1.239, 2, Rounding::Down), 1.23);
    }
}
