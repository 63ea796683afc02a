/// Reviews further than this many standard deviations from the mean are outliers.
pub const OUTLIER_SIGMA: f64 = 2.0;

/// Applications whose scores spread less than this are never scanned for outliers.
pub const MIN_OUTLIER_SPREAD: f64 = 2.0;

pub fn mean(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|value| f64::from(*value)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N).
pub fn population_std_dev(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| (f64::from(*value) - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

pub fn is_outlier(score: i32, mean: f64, std_dev: f64) -> bool {
    (f64::from(score) - mean).abs() > OUTLIER_SIGMA * std_dev
}

/// `max(0, 100 - 10σ)` over the reviewer's own totals, rounded.
pub fn consistency_score(scores: &[i32]) -> u8 {
    let raw = (100.0 - population_std_dev(scores) * 10.0).max(0.0);
    raw.round().clamp(0.0, 100.0) as u8
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Share of `all_scores` strictly below `score`, as a rounded percentage.
pub fn percentile(score: f64, all_scores: &[f64]) -> u8 {
    if all_scores.is_empty() {
        return 0;
    }
    let below = all_scores.iter().filter(|other| **other < score).count();
    ((below as f64 / all_scores.len() as f64) * 100.0).round() as u8
}
