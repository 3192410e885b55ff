use crate::domain::DVError;

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub label: String,
    pub count: usize,
}

/// Splits `values` into `bin_count` equal-width bins over `[min, max]`.
///
/// Bins are half-open except the last, which also holds `max`. When every value is equal
/// the width is zero, all values land in bin 0 and every label reads `min - min`.
pub fn bin(values: &[f64], bin_count: usize) -> Result<Vec<HistogramBin>, DVError> {
    if values.is_empty() || bin_count == 0 {
        return Err(DVError::EmptySample);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Divided before subtracting so `max - min` cannot overflow.
    let width = max / bin_count as f64 - min / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for &v in values {
        let idx = if width > 0.0 && width.is_finite() {
            ((v / width - min / width).floor() as usize).min(bin_count - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    let edge = |i: usize| {
        let t = i as f64 / bin_count as f64;
        min - min * t + max * t
    };

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            label: format!("{:.2} - {:.2}", edge(i), edge(i + 1)),
            count,
        })
        .collect())
}
