use std::collections::HashSet;

use tracing::trace;

use crate::table::{Cell, Table};

pub type Insight = String;

pub const MISSING_RATIO_THRESHOLD: f64 = 0.1;
pub const SKEW_FACTOR: f64 = 1.2;
pub const CATEGORICAL_RATIO: f64 = 0.5;

/// Runs the fixed battery of checks. The output order is the check order.
pub fn generate(table: &Table, _x: &str, y: Option<&str>) -> Vec<Insight> {
    let mut insights = Vec::new();
    if table.is_empty() {
        return insights;
    }

    insights.push(format!(
        "📊 Dataset contains {} records with {} features",
        table.nrows(),
        table.ncolumns()
    ));
    insights.extend(missing_data(table));
    if let Some(idx) = y.and_then(|y| table.column_index(y).ok()) {
        insights.extend(distribution(table, &table.header()[idx], idx));
    }
    insights.extend(categorical(table));

    trace!("Generated {} insights", insights.len());
    insights
}

fn missing_data(table: &Table) -> Option<Insight> {
    let nrows = table.nrows() as f64;
    let columns: Vec<String> = table
        .header()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let ratio = table.column(idx).filter(|c| c.is_missing()).count() as f64 / nrows;
            (ratio > MISSING_RATIO_THRESHOLD)
                .then(|| format!("{name} ({:.1}% missing)", ratio * 100.0))
        })
        .collect();
    (!columns.is_empty()).then(|| format!("⚠️ High missing data in: {}", columns.join(", ")))
}

/// Value at index `n / 2` of an ascending sample. Even sizes do not average the two middles.
pub fn median(sorted: &[f64]) -> Option<f64> {
    sorted.get(sorted.len() / 2).copied()
}

fn distribution(table: &Table, name: &str, idx: usize) -> Vec<Insight> {
    let mut values = table.numeric_values(idx);
    values.sort_by(f64::total_cmp);
    let Some(mid) = median(&values) else {
        return Vec::new();
    };
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let mut insights = vec![format!("📈 {name}: Mean = {mean:.2}, Median = {mid:.2}")];
    if mean > mid * SKEW_FACTOR {
        insights.push(format!(
            "🔍 {name} shows positive skewness (right-tailed distribution)"
        ));
    } else if mid > mean * SKEW_FACTOR {
        insights.push(format!(
            "🔍 {name} shows negative skewness (left-tailed distribution)"
        ));
    }
    insights
}

#[derive(Hash, PartialEq, Eq)]
enum CellKey<'a> {
    Number(u64),
    Text(&'a str),
}

fn cell_key(cell: &Cell) -> Option<CellKey<'_>> {
    match cell {
        // -0.0 and 0.0 are the same category
        Cell::Number(v) => Some(CellKey::Number((v + 0.0).to_bits())),
        Cell::Text(s) if !s.is_empty() => Some(CellKey::Text(s)),
        _ => None,
    }
}

fn categorical(table: &Table) -> Option<Insight> {
    let limit = table.nrows() as f64 * CATEGORICAL_RATIO;
    let columns: Vec<String> = table
        .header()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let distinct = table
                .column(idx)
                .filter_map(cell_key)
                .collect::<HashSet<_>>()
                .len();
            (distinct > 1 && (distinct as f64) < limit)
                .then(|| format!("{name} ({distinct} categories)"))
        })
        .collect();
    (!columns.is_empty())
        .then(|| format!("🏷️ Categorical features detected: {}", columns.join(", ")))
}
