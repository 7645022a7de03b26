//! Population reference curves.
//!
//! Each table maps age in whole months (index 0 = birth) to the expected
//! value and standard deviation of a measurement. Values follow the WHO
//! child growth standards (medians, with a symmetric SD approximation).
//!
//! Weight, height and head circumference have sex-specific tables plus a
//! neutral table used when no sex is recorded. Neutral height and head
//! circumference average the two sexes; neutral weight is the general
//! infant weight curve (5.6 kg at two months). BMI only has the neutral
//! table.

use serde::{Deserialize, Serialize};

use crate::profile::Sex;

/// Expected value and spread at one age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefPoint {
    pub mean: f64,
    pub sd: f64,
}

const fn p(mean: f64, sd: f64) -> RefPoint {
    RefPoint { mean, sd }
}

/// A measurement with reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Kilograms.
    Weight,
    /// Centimetres.
    Height,
    /// Centimetres.
    HeadCircumference,
    /// kg/m².
    Bmi,
}

impl Metric {
    pub const ALL: [Self; 4] = [
        Self::Weight,
        Self::Height,
        Self::HeadCircumference,
        Self::Bmi,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Height => "height",
            Self::HeadCircumference => "head",
            Self::Bmi => "bmi",
        }
    }
}

/// An age-indexed reference curve.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTable {
    points: &'static [RefPoint],
}

impl ReferenceTable {
    /// Returns the table for a metric, picking the sex-specific curve when
    /// one exists.
    ///
    /// BMI ignores `sex` and always uses the neutral curve.
    pub fn for_metric(metric: Metric, sex: Option<Sex>) -> Self {
        let points: &'static [RefPoint] = match (metric, sex) {
            (Metric::Weight, Some(Sex::Male)) => &WEIGHT_MALE,
            (Metric::Weight, Some(Sex::Female)) => &WEIGHT_FEMALE,
            (Metric::Weight, None) => &WEIGHT_NEUTRAL,
            (Metric::Height, Some(Sex::Male)) => &HEIGHT_MALE,
            (Metric::Height, Some(Sex::Female)) => &HEIGHT_FEMALE,
            (Metric::Height, None) => &HEIGHT_NEUTRAL,
            (Metric::HeadCircumference, Some(Sex::Male)) => &HEAD_MALE,
            (Metric::HeadCircumference, Some(Sex::Female)) => &HEAD_FEMALE,
            (Metric::HeadCircumference, None) => &HEAD_NEUTRAL,
            (Metric::Bmi, _) => &BMI_NEUTRAL,
        };
        Self { points }
    }

    /// Number of tabulated months.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reference point at `age_months`, extrapolating past the last entry.
    pub fn at(&self, age_months: u32) -> RefPoint {
        let index = age_months as usize;
        self.points
            .get(index)
            .copied()
            .unwrap_or_else(|| extrapolate(self.points, age_months))
    }
}

/// Extends a table linearly beyond its last month using the last observed
/// monthly delta.
///
/// The standard deviation is extended the same way but never drops below
/// the last tabulated value, so it stays strictly positive.
pub fn extrapolate(points: &[RefPoint], age_months: u32) -> RefPoint {
    let (Some(last), Some(prev)) = (points.last(), points.len().checked_sub(2).map(|i| points[i]))
    else {
        return points.last().copied().unwrap_or(p(0.0, 1.0));
    };
    let last_age = (points.len() - 1) as f64;
    let months_past = f64::from(age_months) - last_age;
    if months_past <= 0.0 {
        return points[age_months as usize];
    }
    let mean = months_past.mul_add(last.mean - prev.mean, last.mean);
    let sd = months_past.mul_add(last.sd - prev.sd, last.sd).max(last.sd);
    p(mean, sd)
}

// Months 0..=24.

#[rustfmt::skip]
static WEIGHT_MALE: [RefPoint; 25] = [
    p(3.3, 0.45), p(4.5, 0.57), p(5.6, 0.65), p(6.4, 0.70), p(7.0, 0.75),
    p(7.5, 0.78), p(7.9, 0.80), p(8.3, 0.83), p(8.6, 0.86), p(8.9, 0.89),
    p(9.2, 0.92), p(9.4, 0.95), p(9.6, 0.98), p(9.9, 1.01), p(10.1, 1.04),
    p(10.3, 1.07), p(10.5, 1.10), p(10.7, 1.13), p(10.9, 1.16), p(11.1, 1.19),
    p(11.3, 1.22), p(11.5, 1.25), p(11.8, 1.28), p(12.0, 1.31), p(12.2, 1.34),
];

#[rustfmt::skip]
static WEIGHT_FEMALE: [RefPoint; 25] = [
    p(3.2, 0.44), p(4.2, 0.55), p(5.1, 0.63), p(5.8, 0.68), p(6.4, 0.72),
    p(6.9, 0.76), p(7.3, 0.79), p(7.6, 0.82), p(7.9, 0.85), p(8.2, 0.88),
    p(8.5, 0.91), p(8.7, 0.94), p(8.9, 0.97), p(9.2, 1.00), p(9.4, 1.03),
    p(9.6, 1.06), p(9.8, 1.09), p(10.0, 1.12), p(10.2, 1.15), p(10.4, 1.18),
    p(10.6, 1.21), p(10.9, 1.24), p(11.1, 1.27), p(11.3, 1.30), p(11.5, 1.33),
];

#[rustfmt::skip]
static WEIGHT_NEUTRAL: [RefPoint; 25] = [
    p(3.3, 0.45), p(4.5, 0.56), p(5.6, 0.64), p(6.3, 0.69), p(6.9, 0.74),
    p(7.4, 0.77), p(7.8, 0.80), p(8.1, 0.83), p(8.4, 0.86), p(8.7, 0.89),
    p(9.0, 0.92), p(9.2, 0.95), p(9.4, 0.98), p(9.7, 1.01), p(9.9, 1.04),
    p(10.1, 1.07), p(10.3, 1.10), p(10.5, 1.13), p(10.7, 1.16), p(10.9, 1.19),
    p(11.1, 1.22), p(11.3, 1.25), p(11.5, 1.28), p(11.8, 1.31), p(12.0, 1.34),
];

#[rustfmt::skip]
static HEIGHT_MALE: [RefPoint; 25] = [
    p(49.9, 1.9), p(54.7, 1.9), p(58.4, 2.0), p(61.4, 2.1), p(63.9, 2.1),
    p(65.9, 2.2), p(67.6, 2.2), p(69.2, 2.3), p(70.6, 2.3), p(72.0, 2.4),
    p(73.3, 2.4), p(74.5, 2.5), p(75.7, 2.5), p(76.9, 2.6), p(78.0, 2.6),
    p(79.1, 2.7), p(80.2, 2.8), p(81.2, 2.8), p(82.3, 2.9), p(83.2, 2.9),
    p(84.2, 3.0), p(85.1, 3.0), p(86.0, 3.1), p(86.9, 3.1), p(87.8, 3.2),
];

#[rustfmt::skip]
static HEIGHT_FEMALE: [RefPoint; 25] = [
    p(49.1, 1.9), p(53.7, 2.0), p(57.1, 2.0), p(59.8, 2.1), p(62.1, 2.2),
    p(64.0, 2.2), p(65.7, 2.3), p(67.3, 2.3), p(68.7, 2.4), p(70.1, 2.4),
    p(71.5, 2.5), p(72.8, 2.5), p(74.0, 2.6), p(75.2, 2.6), p(76.4, 2.7),
    p(77.5, 2.8), p(78.6, 2.8), p(79.7, 2.9), p(80.7, 2.9), p(81.7, 3.0),
    p(82.7, 3.0), p(83.7, 3.1), p(84.6, 3.1), p(85.5, 3.2), p(86.4, 3.2),
];

#[rustfmt::skip]
static HEIGHT_NEUTRAL: [RefPoint; 25] = [
    p(49.5, 1.9), p(54.2, 2.0), p(57.75, 2.0), p(60.6, 2.1), p(63.0, 2.2),
    p(64.95, 2.2), p(66.65, 2.3), p(68.25, 2.3), p(69.65, 2.4), p(71.05, 2.4),
    p(72.4, 2.5), p(73.65, 2.5), p(74.85, 2.6), p(76.05, 2.6), p(77.2, 2.7),
    p(78.3, 2.8), p(79.4, 2.8), p(80.45, 2.9), p(81.5, 2.9), p(82.45, 3.0),
    p(83.45, 3.0), p(84.4, 3.1), p(85.3, 3.1), p(86.2, 3.2), p(87.1, 3.2),
];

#[rustfmt::skip]
static HEAD_MALE: [RefPoint; 25] = [
    p(34.5, 1.2), p(37.3, 1.2), p(39.1, 1.2), p(40.5, 1.2), p(41.6, 1.2),
    p(42.6, 1.2), p(43.3, 1.2), p(44.0, 1.2), p(44.5, 1.2), p(45.0, 1.2),
    p(45.4, 1.2), p(45.8, 1.2), p(46.1, 1.2), p(46.3, 1.2), p(46.6, 1.2),
    p(46.8, 1.2), p(47.0, 1.2), p(47.2, 1.3), p(47.4, 1.3), p(47.5, 1.3),
    p(47.7, 1.3), p(47.8, 1.3), p(48.0, 1.3), p(48.1, 1.3), p(48.3, 1.3),
];

#[rustfmt::skip]
static HEAD_FEMALE: [RefPoint; 25] = [
    p(33.9, 1.2), p(36.5, 1.2), p(38.3, 1.2), p(39.5, 1.2), p(40.6, 1.2),
    p(41.5, 1.2), p(42.2, 1.2), p(42.8, 1.2), p(43.4, 1.2), p(43.8, 1.2),
    p(44.2, 1.2), p(44.6, 1.2), p(44.9, 1.2), p(45.2, 1.2), p(45.4, 1.2),
    p(45.7, 1.2), p(45.9, 1.2), p(46.1, 1.3), p(46.2, 1.3), p(46.4, 1.3),
    p(46.6, 1.3), p(46.7, 1.3), p(46.9, 1.3), p(47.0, 1.3), p(47.2, 1.3),
];

#[rustfmt::skip]
static HEAD_NEUTRAL: [RefPoint; 25] = [
    p(34.2, 1.2), p(36.9, 1.2), p(38.7, 1.2), p(40.0, 1.2), p(41.1, 1.2),
    p(42.05, 1.2), p(42.75, 1.2), p(43.4, 1.2), p(43.95, 1.2), p(44.4, 1.2),
    p(44.8, 1.2), p(45.2, 1.2), p(45.5, 1.2), p(45.75, 1.2), p(46.0, 1.2),
    p(46.25, 1.2), p(46.45, 1.2), p(46.65, 1.3), p(46.8, 1.3), p(46.95, 1.3),
    p(47.15, 1.3), p(47.25, 1.3), p(47.45, 1.3), p(47.55, 1.3), p(47.75, 1.3),
];

#[rustfmt::skip]
static BMI_NEUTRAL: [RefPoint; 25] = [
    p(13.3, 1.1), p(14.8, 1.2), p(16.1, 1.3), p(16.7, 1.3), p(16.9, 1.3),
    p(17.1, 1.3), p(17.2, 1.3), p(17.2, 1.3), p(17.1, 1.3), p(17.0, 1.3),
    p(16.9, 1.3), p(16.8, 1.3), p(16.7, 1.3), p(16.6, 1.3), p(16.5, 1.3),
    p(16.4, 1.3), p(16.3, 1.3), p(16.2, 1.3), p(16.1, 1.3), p(16.1, 1.3),
    p(16.0, 1.3), p(16.0, 1.3), p(15.9, 1.3), p(15.9, 1.3), p(15.8, 1.3),
];
