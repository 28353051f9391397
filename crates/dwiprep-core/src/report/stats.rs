//! Summary statistics and axis ticks shared by the figure bands.

use serde::Serialize;

/// Max / mean / standard deviation / 95th percentile over the finite values of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub p95: f64,
    /// Number of finite samples the stats were computed from.
    pub count: usize,
}

impl SeriesStats {
    /// NaN and infinite samples are skipped; an all-NaN series yields zeros.
    pub fn from_series(values: &[f64]) -> Self {
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                std: 0.0,
                p95: 0.0,
                count: 0,
            };
        }
        finite.sort_by(f64::total_cmp);

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            min: finite[0],
            max: finite[finite.len() - 1],
            mean,
            std: variance.sqrt(),
            p95: percentile_sorted(&finite, 95.0),
            count: finite.len(),
        }
    }
}

/// Linearly interpolated percentile of an ascending, non-empty slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = (q / 100.0).clamp(0.0, 1.0) * (len - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

/// Median of the finite values, 0 when there are none.
pub fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_by(f64::total_cmp);
    percentile_sorted(&finite, 50.0)
}

/// Tick positions for `n` frames: roughly five to ten markers, never fewer than one step.
pub fn frame_ticks(n: usize) -> Vec<usize> {
    let interval = ((n + 1) / 10).max((n + 1) / 5).max(1);
    (0..n).step_by(interval).collect()
}

/// `%.2f` labels in seconds when a sampling interval is known, in frames otherwise.
pub fn tick_labels(ticks: &[usize], repetition_time: Option<f64>) -> Vec<String> {
    let tr = repetition_time.unwrap_or(1.0);
    ticks
        .iter()
        .map(|&t| format!("{:.2}", tr * t as f64))
        .collect()
}

/// Horizontal axis caption matching [`tick_labels`].
pub fn time_axis_label(repetition_time: Option<f64>) -> &'static str {
    if repetition_time.is_some() {
        "time (s)"
    } else {
        "time (frame #)"
    }
}
