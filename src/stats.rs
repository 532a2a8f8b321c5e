//! Summary statistics for signal profiles.
//!
//! Variance and covariance are population statistics (divide by `n`);
//! [`ustd`] is the unbiased standard deviation (divide by `n - 1`).

use crate::error::{GaError, Result};

/// 97.5 % points of Student's t distribution by degrees of freedom.
/// Lookup is a step function: the entry with the largest dof not above the
/// requested one.
const T_TABLE: &[(u64, f64)] = &[
    (1, 12.70620),
    (2, 4.302653),
    (3, 3.182446),
    (4, 2.776445),
    (5, 2.570582),
    (6, 2.446912),
    (7, 2.364624),
    (8, 2.306004),
    (9, 2.262157),
    (10, 2.228139),
    (11, 2.200985),
    (12, 2.178813),
    (13, 2.160369),
    (14, 2.144787),
    (15, 2.131450),
    (16, 2.119905),
    (17, 2.109816),
    (18, 2.100922),
    (19, 2.093024),
    (20, 2.085963),
    (21, 2.079614),
    (22, 2.073873),
    (23, 2.068658),
    (24, 2.063899),
    (25, 2.059539),
    (26, 2.055529),
    (27, 2.051831),
    (28, 2.048407),
    (29, 2.045230),
    (30, 2.042272),
    (31, 2.039513),
    (32, 2.036933),
    (33, 2.034515),
    (34, 2.032245),
    (35, 2.030108),
    (36, 2.028094),
    (37, 2.026192),
    (38, 2.024394),
    (39, 2.022691),
    (40, 2.021075),
    (41, 2.019541),
    (42, 2.018082),
    (43, 2.016692),
    (44, 2.015368),
    (45, 2.014103),
    (46, 2.012896),
    (47, 2.011741),
    (48, 2.010635),
    (49, 2.009575),
    (50, 2.008559),
    (51, 2.007584),
    (52, 2.006647),
    (53, 2.005746),
    (54, 2.004879),
    (55, 2.004045),
    (56, 2.003241),
    (57, 2.002465),
    (58, 2.001717),
    (59, 2.000995),
    (60, 2.000298),
    (61, 1.999624),
    (62, 1.998972),
    (63, 1.998341),
    (64, 1.997730),
    (65, 1.997138),
    (66, 1.996564),
    (67, 1.996008),
    (68, 1.995469),
    (69, 1.994945),
    (70, 1.994437),
    (72, 1.993464),
    (74, 1.992543),
    (76, 1.991673),
    (78, 1.990847),
    (80, 1.990063),
    (85, 1.988268),
    (90, 1.986675),
    (95, 1.985251),
    (100, 1.983972),
    (110, 1.981765),
    (120, 1.979930),
    (130, 1.978380),
    (140, 1.977054),
    (150, 1.975905),
    (160, 1.974902),
    (170, 1.974017),
    (180, 1.973231),
    (200, 1.971896),
    (250, 1.969498),
    (300, 1.967903),
    (400, 1.965912),
    (500, 1.964720),
    (1000, 1.962339),
    (5000, 1.960439),
    (10000, 1.960201),
    (50000, 1.960011),
    (100000, 1.959988),
    (500000, 1.959969),
    (1000000, 1.959966),
];

/// Limit of the 97.5 % point for very large samples.
const T_INFINITY: f64 = 1.959964;

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
pub fn var(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (m - v) * (m - v)).sum::<f64>() / values.len() as f64
}

/// Population covariance of two equally long slices.
pub fn covar(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let (mx, my) = (mean(&x[..n]), mean(&y[..n]));
    x.iter()
        .zip(y)
        .map(|(a, b)| (mx - a) * (my - b))
        .sum::<f64>()
        / n as f64
}

/// Unbiased standard deviation; 0 when fewer than two values.
pub fn ustd(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let dev: f64 = values.iter().map(|v| (m - v) * (m - v)).sum();
    (dev / (values.len() - 1) as f64).sqrt()
}

/// 97.5 % point of the t distribution for `dof` degrees of freedom.
///
/// Returns 0 for `dof == 0`, where no interval exists.
pub fn t_value(dof: u64) -> f64 {
    if dof == 0 {
        return 0.0;
    }
    if dof > 1_000_000 {
        return T_INFINITY;
    }
    let idx = T_TABLE.partition_point(|&(d, _)| d <= dof);
    T_TABLE[idx - 1].1
}

/// Mean with its 95 % confidence bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub mean: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Interval {
    /// A degenerate interval, as reported for background simulations.
    pub fn point(value: f64) -> Self {
        Self {
            mean: value,
            upper: value,
            lower: value,
        }
    }
}

/// Two-sided 95 % t interval for the mean of `values`.
pub fn t_interval(values: &[f64]) -> Interval {
    let n = values.len();
    let m = mean(values);
    if n == 0 {
        return Interval::point(m);
    }
    let t = t_value(n as u64 - 1);
    let half = t * ustd(values) / (n as f64).sqrt();
    Interval {
        mean: m,
        upper: m + half,
        lower: m - half,
    }
}

/// Fieller 95 % interval for the ratio of means `mean(num) / mean(den)`.
///
/// Fails when the denominator mean is not significantly different from
/// zero (`t² >= mean(den)² / var(den)`), where the interval is unbounded.
pub fn fieller_interval(num: &[f64], den: &[f64]) -> Result<Interval> {
    let n = num.len().min(den.len());
    if n < 2 {
        return Err(GaError::InvalidArgument(
            "ratio confidence interval needs at least two summits".to_string(),
        ));
    }
    let (num, den) = (&num[..n], &den[..n]);
    let t = t_value(n as u64 - 1);
    let t2 = t * t;
    let my = mean(num);
    let mx = mean(den);
    let scale = (n - 1) as f64;
    let vy = var(num) / scale;
    let vx = var(den) / scale;
    let vxy = covar(num, den) / scale;

    let significant = if vx == 0.0 {
        mx != 0.0
    } else {
        t2 < mx * mx / vx
    };
    if !significant {
        return Err(GaError::InvalidArgument(
            "confidence interval cannot be calculated: denominator is not significantly different from zero"
                .to_string(),
        ));
    }

    let a = mx * my - t2 * vxy;
    let b = mx * mx - t2 * vx;
    let c = my * my - t2 * vy;
    let root = (a * a - b * c).max(0.0).sqrt();
    Ok(Interval {
        mean: my / mx,
        upper: (a + root) / b,
        lower: (a - root) / b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_moments() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v), 5.0);
        assert_relative_eq!(var(&v), 4.0);
        assert_relative_eq!(ustd(&v), (32.0f64 / 7.0).sqrt());
        assert_relative_eq!(covar(&v, &v), var(&v));
        assert_eq!(ustd(&[3.0]), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_covar_sign() {
        let x = [1.0, 2.0, 3.0];
        let y = [3.0, 2.0, 1.0];
        assert_relative_eq!(covar(&x, &y), -2.0 / 3.0);
    }

    #[test]
    fn test_t_table_lookup() {
        assert_eq!(t_value(0), 0.0);
        assert_relative_eq!(t_value(1), 12.70620);
        assert_relative_eq!(t_value(70), 1.994437);
        // between table entries the lower entry applies
        assert_relative_eq!(t_value(71), 1.994437);
        assert_relative_eq!(t_value(999), 1.964720);
        assert_relative_eq!(t_value(1_000_000), 1.959966);
        assert_relative_eq!(t_value(5_000_000), 1.959964);
    }

    #[test]
    fn test_t_interval() {
        let v = [1.0, 2.0, 3.0];
        let ci = t_interval(&v);
        let half = 4.302653 * 1.0 / 3.0f64.sqrt();
        assert_relative_eq!(ci.mean, 2.0);
        assert_relative_eq!(ci.upper, 2.0 + half, epsilon = 1e-9);
        assert_relative_eq!(ci.lower, 2.0 - half, epsilon = 1e-9);

        let single = t_interval(&[5.0]);
        assert_eq!(single, Interval::point(5.0));
    }

    #[test]
    fn test_fieller_brackets_ratio() {
        let num = [10.0, 12.0, 11.0, 9.0, 10.5, 11.5];
        let den = [5.0, 6.0, 5.5, 4.5, 5.2, 5.8];
        let ci = fieller_interval(&num, &den).unwrap();
        assert_relative_eq!(ci.mean, mean(&num) / mean(&den));
        assert!(ci.lower <= ci.mean && ci.mean <= ci.upper);
    }

    #[test]
    fn test_fieller_constant_tracks() {
        // No spread at all: the interval collapses onto the ratio
        let ci = fieller_interval(&[4.0, 4.0, 4.0], &[2.0, 2.0, 2.0]).unwrap();
        assert_relative_eq!(ci.mean, 2.0);
        assert_relative_eq!(ci.upper, 2.0);
        assert_relative_eq!(ci.lower, 2.0);
    }

    #[test]
    fn test_fieller_rejects_noisy_denominator() {
        let num = [1.0, 2.0, 3.0];
        let den = [-1.0, 0.5, 1.0];
        assert!(fieller_interval(&num, &den).is_err());
        assert!(fieller_interval(&[1.0], &[1.0]).is_err());
    }
}
