//! 1-D column statistic helpers
//!
//! Pure functions over per-column series: centered moving average, clipped
//! window mean and variance, and bounded peak search.

/// Centered moving average.
///
/// The window is clipped to the series bounds, so it shrinks near both ends
/// instead of wrapping or padding. The output has the same length as the input.
pub fn smooth(series: &[f64], window_size: usize) -> Vec<f64> {
    let len = series.len();
    if len == 0 {
        return Vec::new();
    }
    let half = window_size / 2;

    (0..len)
        .map(|i| {
            let from = i.saturating_sub(half);
            let to = (i + half).min(len - 1);
            series[from..=to].iter().sum::<f64>() / (to - from + 1) as f64
        })
        .collect()
}

/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of `series[from..to]`, with both bounds clipped to the series
pub fn window_mean(series: &[f64], from: usize, to: usize) -> f64 {
    let to = to.min(series.len());
    if from >= to {
        return 0.0;
    }
    mean(&series[from..to])
}

/// Population variance of the inclusive window `series[from..=to]`.
///
/// A window with fewer than two samples (`from >= to`) has variance `0.0`.
pub fn variance_inclusive(series: &[f64], from: usize, to: usize) -> f64 {
    if series.is_empty() || from >= to {
        return 0.0;
    }
    let to = to.min(series.len() - 1);
    if from >= to {
        return 0.0;
    }
    let window = &series[from..=to];
    let m = mean(window);
    window.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / window.len() as f64
}

/// Index and value of the first maximum in `series[start..=end]`.
///
/// Only values strictly above `floor` count. When none does, the midpoint of
/// the requested range is returned together with `floor`.
pub fn find_peak(series: &[f64], start: usize, end: usize, floor: f64) -> (usize, f64) {
    let mut best_idx = (start + end) / 2;
    let mut best_val = floor;
    if series.is_empty() {
        return (best_idx, best_val);
    }
    let last = end.min(series.len() - 1);
    if start > last {
        return (best_idx, best_val);
    }
    for (offset, &value) in series[start..=last].iter().enumerate() {
        if value > best_val {
            best_val = value;
            best_idx = start + offset;
        }
    }
    (best_idx, best_val)
}
