//! # Land Areas
//!
//! A farm declares three areas in hectares. The arable and vegetation
//! areas must sum to the total, compared as decimal text fixed to four
//! places. Fixing rounds the exact binary value half away from zero, so an
//! exact tie such as 0.28125 becomes "0.2813". Negative values are not
//! rejected on their own; they only fail when they break the sum.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Decimal places used when comparing areas.
pub const AREA_PRECISION: usize = 4;

/// Validated total/arable/vegetation triple, in hectares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HectaresArea {
    total: f64,
    arable: f64,
    vegetation: f64,
}

impl HectaresArea {
    /// Build an area triple.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidArea`] when `total` is zero or NaN,
    /// or when `arable + vegetation` and `total` differ once fixed to
    /// [`AREA_PRECISION`] decimal places.
    pub fn new(total: f64, arable: f64, vegetation: f64) -> Result<Self, ValidationError> {
        let falsy_total = total == 0.0 || total.is_nan();
        if falsy_total || fixed(arable + vegetation) != fixed(total) {
            return Err(ValidationError::InvalidArea {
                total,
                arable,
                vegetation,
            });
        }
        Ok(Self {
            total,
            arable,
            vegetation,
        })
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn arable(&self) -> f64 {
        self.arable
    }

    pub fn vegetation(&self) -> f64 {
        self.vegetation
    }
}

/// `value` as decimal text with [`AREA_PRECISION`] places.
///
/// The exact binary value is scaled by 10^4 in integer arithmetic and
/// rounded half away from zero. Non-finite values and magnitudes of 1e21
/// or more are printed as-is.
fn fixed(value: f64) -> String {
    if !value.is_finite() || value.abs() >= 1e21 {
        return value.to_string();
    }
    let scale = 10u128.pow(AREA_PRECISION as u32);
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = u128::from(bits & ((1u64 << 52) - 1));
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u128 << 52), biased - 1075)
    };

    let scaled = if exponent >= 0 {
        (mantissa << exponent) * scale
    } else {
        let shift = exponent.unsigned_abs();
        let numerator = mantissa * scale;
        if shift >= 128 {
            // Below 2^-75 after scaling: rounds to zero.
            0
        } else {
            let quotient = numerator >> shift;
            let remainder = numerator - (quotient << shift);
            if remainder >= 1u128 << (shift - 1) {
                quotient + 1
            } else {
                quotient
            }
        }
    };

    let sign = if value < 0.0 { "-" } else { "" };
    format!(
        "{sign}{}.{:0width$}",
        scaled / scale,
        scaled % scale,
        width = AREA_PRECISION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_sum() {
        let area = HectaresArea::new(100.0, 50.0, 50.0).unwrap();
        assert_eq!(area.total(), 100.0);
        assert_eq!(area.arable(), 50.0);
        assert_eq!(area.vegetation(), 50.0);
    }

    #[test]
    fn accepts_float_noise_below_precision() {
        // 0.1 + 0.2 is 0.30000000000000004 in binary floating point.
        assert!(HectaresArea::new(0.3, 0.1, 0.2).is_ok());
    }

    #[test]
    fn rejects_mismatched_sum() {
        assert!(matches!(
            HectaresArea::new(100.0, 50.0, 30.0),
            Err(ValidationError::InvalidArea { .. })
        ));
        assert!(HectaresArea::new(100.0, 50.0, 50.001).is_err());
    }

    #[test]
    fn rejects_zero_total() {
        assert!(HectaresArea::new(0.0, 0.0, 0.0).is_err());
        assert!(HectaresArea::new(-0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn rejects_nan_total() {
        assert!(HectaresArea::new(f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn fixing_rounds_exact_ties_away_from_zero() {
        assert_eq!(fixed(0.28125), "0.2813");
        assert_eq!(fixed(-0.28125), "-0.2813");
        assert_eq!(fixed(123456.78125), "123456.7813");
        assert_eq!(fixed(0.1 + 0.2), "0.3000");
        assert_eq!(fixed(1.5), "1.5000");
        assert_eq!(fixed(100.0), "100.0000");
    }

    #[test]
    fn fixing_tiny_and_signed_zero_values() {
        assert_eq!(fixed(0.0), "0.0000");
        assert_eq!(fixed(-0.0), "0.0000");
        assert_eq!(fixed(1e-10), "0.0000");
        assert_eq!(fixed(-1e-10), "-0.0000");
        assert_eq!(fixed(f64::MIN_POSITIVE), "0.0000");
    }

    #[test]
    fn tie_sum_matches_the_rounded_up_total() {
        assert!(HectaresArea::new(0.2813, 0.28125, 0.0).is_ok());
        assert!(HectaresArea::new(0.2812, 0.28125, 0.0).is_err());
        assert!(HectaresArea::new(10.2813, 10.0, 0.28125).is_ok());
    }

    #[test]
    fn negative_parts_only_matter_through_the_sum() {
        assert!(HectaresArea::new(10.0, 15.0, -5.0).is_ok());
        assert!(HectaresArea::new(-10.0, -4.0, -6.0).is_ok());
        assert!(HectaresArea::new(10.0, 15.0, -4.0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any non-degenerate pair builds an area whose total is its sum.
        #[test]
        fn sum_of_parts_is_always_accepted(
            arable in 0.0f64..1_000_000.0,
            vegetation in 0.0f64..1_000_000.0,
        ) {
            prop_assume!(arable + vegetation > 0.0);
            prop_assert!(HectaresArea::new(arable + vegetation, arable, vegetation).is_ok());
        }

        /// A total off by at least a thousandth never matches.
        #[test]
        fn shifted_total_is_always_rejected(
            arable in 0.0f64..1_000_000.0,
            vegetation in 0.0f64..1_000_000.0,
            delta in 0.001f64..1_000.0,
        ) {
            let total = arable + vegetation + delta;
            prop_assert!(HectaresArea::new(total, arable, vegetation).is_err());
        }
    }
}
