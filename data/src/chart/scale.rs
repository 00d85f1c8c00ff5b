use serde::{Deserialize, Serialize};

/// Minimum visible range as a fraction of the largest value
pub const ANTI_FLAT_FRACTION: f64 = 0.06;
/// Minimum visible range in the values' own unit
pub const ABS_FLOOR: f64 = 1.0;
/// Added on both ends, as a fraction of the effective range
pub const PADDING_FRACTION: f64 = 0.10;

const TRIM_LOW_PERCENTILE: f64 = 0.05;
const TRIM_HIGH_PERCENTILE: f64 = 0.95;

/// Which values decide the visible window
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ScaleMode {
    /// Every value is in view
    #[default]
    Full,
    /// Values outside the 5th..95th percentile band may fall out of view
    Trimmed,
}

impl std::fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleMode::Full => write!(f, "Full range"),
            ScaleMode::Trimmed => write!(f, "Trim outliers"),
        }
    }
}

/// Value window mapped onto the vertical axis, `max > min` always holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub min: f64,
    pub max: f64,
}

impl Scale {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// 0.0 at `max`, 1.0 at `min`; values outside the window go beyond that
    pub fn inverted_ratio(&self, value: f64) -> f64 {
        (self.max - value) / self.range()
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub fn compute_scale(values: &[f64]) -> Scale {
    compute_scale_with(values, ScaleMode::Full)
}

pub fn compute_scale_with(values: &[f64], mode: ScaleMode) -> Scale {
    let (low, high) = match mode {
        ScaleMode::Full => min_max(values.iter().copied()),
        ScaleMode::Trimmed => percentile_band(values),
    }
    .unwrap_or((0.0, 0.0));

    // halves first so sums and differences of finite extremes stay finite
    let (half_low, half_high) = (low / 2.0, high / 2.0);
    let mid = half_low + half_high;

    let half_range = (half_high - half_low)
        .max(half_high * ANTI_FLAT_FRACTION)
        .max(ABS_FLOOR / 2.0);
    let half_span = (half_range * (1.0 + 2.0 * PADDING_FRACTION)).min(f64::MAX / 2.0);

    let (min, max) = clamp_finite(mid - half_span, mid + half_span);
    if max > min {
        return Scale { min, max };
    }

    // magnitudes where the floor is lost to f64 precision
    let step = mid.abs().max(ABS_FLOOR) * f64::EPSILON * 4.0;
    let (min, max) = clamp_finite(mid - step, mid + step);
    Scale { min, max }
}

fn clamp_finite(min: f64, max: f64) -> (f64, f64) {
    (min.max(f64::MIN), max.min(f64::MAX))
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn percentile_band(values: &[f64]) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let last = (sorted.len() - 1) as f64;
    let low_idx = (last * TRIM_LOW_PERCENTILE).floor() as usize;
    let high_idx = (last * TRIM_HIGH_PERCENTILE).ceil() as usize;

    Some((sorted[low_idx], sorted[high_idx.min(sorted.len() - 1)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_degenerate() {
        let inputs: [&[f64]; 11] = [
            &[0.0],
            &[f64::MAX, f64::MAX],
            &[1e308, 1.5e308],
            &[f64::MIN, f64::MIN],
            &[f64::MIN, f64::MAX],
            &[100.0, 100.0, 100.0],
            &[-5.0, -5.0],
            &[1e-9, 2e-9],
            &[3.0, 1.0, 2.0],
            &[1e15, 1e15 + 1.0],
            &[],
        ];

        for values in inputs {
            let scale = compute_scale(values);
            assert!(scale.max > scale.min, "{values:?} -> {scale:?}");
            assert!(scale.range().is_finite(), "{values:?} -> {scale:?}");
        }
    }

    #[test]
    fn constant_series_honors_anti_flat_floor() {
        let scale = compute_scale(&[100.0, 100.0, 100.0]);

        assert!(scale.range() >= 100.0 * ANTI_FLAT_FRACTION);
        assert!(((scale.min + scale.max) / 2.0 - 100.0).abs() < 1e-9);
        // 6.0 effective range plus 10% padding on each side
        assert!((scale.range() - 7.2).abs() < 1e-9);
    }

    #[test]
    fn small_values_use_absolute_floor() {
        let scale = compute_scale(&[2.0, 2.1]);

        assert!((scale.range() - ABS_FLOOR * (1.0 + 2.0 * PADDING_FRACTION)).abs() < 1e-9);
        assert!(((scale.min + scale.max) / 2.0 - 2.05).abs() < 1e-9);
    }

    #[test]
    fn wide_series_keeps_raw_range_plus_padding() {
        let scale = compute_scale(&[50.0, 150.0, 100.0]);

        assert!((scale.min - 40.0).abs() < 1e-9);
        assert!((scale.max - 160.0).abs() < 1e-9);
        assert!(scale.contains(50.0) && scale.contains(150.0));
    }

    #[test]
    fn trimmed_mode_ignores_a_single_spike() {
        let mut values = vec![100.0; 40];
        values.push(1000.0);

        let full = compute_scale_with(&values, ScaleMode::Full);
        let trimmed = compute_scale_with(&values, ScaleMode::Trimmed);

        assert!(full.contains(1000.0));
        assert!(!trimmed.contains(1000.0));
        assert!(trimmed.contains(100.0));
        assert!(trimmed.max > trimmed.min);
    }

    #[test]
    fn trimmed_mode_on_short_series_matches_full() {
        let values = [10.0, 12.0, 30.0];

        assert_eq!(
            compute_scale_with(&values, ScaleMode::Trimmed),
            compute_scale_with(&values, ScaleMode::Full)
        );
    }
}
