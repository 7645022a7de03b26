//! Growth percentiles from reference curves.
//!
//! A measurement is converted to a z-score against the reference mean and
//! standard deviation for the subject's age, then mapped through the
//! standard normal CDF. Results are clamped to \[3, 97\] because the
//! reference curves are not considered reliable in the tails.

use serde::{Deserialize, Serialize};

use crate::growth::GrowthEntry;
use crate::profile::Sex;
use crate::reference::{Metric, ReferenceTable};

/// Lowest percentile ever reported.
pub const MIN_PERCENTILE: u8 = 3;
/// Highest percentile ever reported.
pub const MAX_PERCENTILE: u8 = 97;

/// Error function, Abramowitz & Stegun formula 7.1.26.
///
/// Maximum absolute error is about 1.5e-7.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / P.mul_add(x, 1.0);
    let poly = t * A5.mul_add(t, A4).mul_add(t, A3).mul_add(t, A2).mul_add(t, A1);
    sign * poly.mul_add(-(-x * x).exp(), 1.0)
}

/// Cumulative distribution function of the standard normal distribution.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Percentile of `value` for `metric` at `age_months`.
///
/// Ages past the end of the reference table are extrapolated, so this never
/// fails. Non-finite inputs land on the nearest clamp bound.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentile(value: f64, metric: Metric, age_months: u32, sex: Option<Sex>) -> u8 {
    let reference = ReferenceTable::for_metric(metric, sex).at(age_months);
    let z = (value - reference.mean) / reference.sd;
    let raw = if z.is_nan() {
        50.0
    } else {
        (normal_cdf(z) * 100.0).round()
    };
    raw.clamp(f64::from(MIN_PERCENTILE), f64::from(MAX_PERCENTILE)) as u8
}

/// Body mass index from kilograms and centimetres.
///
/// Returns `None` unless both inputs are strictly positive.
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let metres = height_cm / 100.0;
    Some(weight_kg / (metres * metres))
}

/// Percentiles for every usable field of a growth entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPercentiles {
    pub age_months: u32,
    pub weight: Option<u8>,
    pub height: Option<u8>,
    pub head_circumference: Option<u8>,
    pub bmi: Option<u8>,
}

impl GrowthPercentiles {
    /// Computes percentiles for `entry` at the given age.
    ///
    /// Fields that are zero (unresolved during backfill) are skipped.
    pub fn for_entry(entry: &GrowthEntry, age_months: u32, sex: Option<Sex>) -> Self {
        let of = |value: f64, metric: Metric| {
            (value > 0.0).then(|| percentile(value, metric, age_months, sex))
        };
        Self {
            age_months,
            weight: of(entry.weight, Metric::Weight),
            height: of(entry.height, Metric::Height),
            head_circumference: of(entry.head_circumference, Metric::HeadCircumference),
            bmi: bmi(entry.weight, entry.height).map(|v| percentile(v, Metric::Bmi, age_months, sex)),
        }
    }
}
