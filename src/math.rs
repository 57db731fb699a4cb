//! Aggregates over numeric slices. Empty input yields `0.0` (or `None` for
//! `max`/`min`) instead of NaN.

pub fn sum(data: &[f64]) -> f64 {
    data.iter().sum()
}

pub fn average(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    sum(data) / data.len() as f64
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mean = average(data);
    let variance = data
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;
    variance.sqrt()
}

/// Largest value; incomparable values (NaN) are skipped.
pub fn max<T: PartialOrd + Copy>(values: &[T]) -> Option<T> {
    pick(values, |candidate, best| candidate > best)
}

/// Smallest value; incomparable values (NaN) are skipped.
pub fn min<T: PartialOrd + Copy>(values: &[T]) -> Option<T> {
    pick(values, |candidate, best| candidate < best)
}

fn pick<T, F>(values: &[T], better: F) -> Option<T>
where
    T: PartialOrd + Copy,
    F: Fn(&T, &T) -> bool,
{
    values
        .iter()
        .copied()
        .filter(|v| v.partial_cmp(v).is_some())
        .fold(None, |best, v| match best {
            Some(b) if !better(&v, &b) => Some(b),
            _ => Some(v),
        })
}
