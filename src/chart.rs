use tracing::{debug, warn};

use crate::domain::{ChartKind, DVError};
use crate::histogram;
use crate::table::{Cell, Table};

/// Index-aligned labels and values ready for plotting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    fn new(name: &str) -> Self {
        ChartSeries {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn push(&mut self, label: String, value: f64) {
        self.labels.push(label);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn build_series(
    table: &Table,
    kind: ChartKind,
    x: &str,
    y: Option<&str>,
    bin_count: usize,
    max_points: usize,
) -> Result<ChartSeries, DVError> {
    let xidx = table.column_index(x)?;
    let yidx = y.map(|y| table.column_index(y)).transpose()?;
    let mut series = ChartSeries::new(y.unwrap_or(x));

    match kind {
        ChartKind::Pie => group_series(table, xidx, yidx, &mut series),
        ChartKind::Histogram => histogram_series(table, xidx, bin_count, &mut series),
        ChartKind::Line | ChartKind::Bar | ChartKind::Scatter => {
            sampled_series(table, xidx, yidx, max_points, &mut series)
        }
    }
    debug!(
        "Built {} series \"{}\" with {} points",
        kind.name(),
        series.name,
        series.len()
    );
    Ok(series)
}

// Sums y per distinct x in first-seen order; without y every row counts 1.
fn group_series(table: &Table, xidx: usize, yidx: Option<usize>, series: &mut ChartSeries) {
    for row in table.rows() {
        let key = &row.cells()[xidx];
        if key.is_falsy() {
            continue;
        }
        let value = yidx.map_or(1.0, |y| row.cells()[y].as_number().unwrap_or(1.0));
        let label = key.to_string();
        match series.labels.iter().position(|l| *l == label) {
            Some(pos) => series.values[pos] += value,
            None => series.push(label, value),
        }
    }
}

fn histogram_series(table: &Table, xidx: usize, bin_count: usize, series: &mut ChartSeries) {
    match histogram::bin(&table.numeric_values(xidx), bin_count) {
        Ok(bins) => {
            for b in bins {
                series.push(b.label, b.count as f64);
            }
        }
        Err(e) => warn!("No histogram for column {xidx}: {e}"),
    }
}

fn sampled_series(
    table: &Table,
    xidx: usize,
    yidx: Option<usize>,
    max_points: usize,
    series: &mut ChartSeries,
) {
    let step = table.nrows().div_ceil(max_points.max(1)).max(1);
    for (idx, row) in table.rows().iter().enumerate().step_by(step) {
        let value = match yidx {
            Some(y) => row.cells()[y].as_number().unwrap_or(0.0),
            None => idx as f64,
        };
        let label = match &row.cells()[xidx] {
            Cell::Missing => String::new(),
            cell => cell.to_string(),
        };
        series.push(label, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Table {
        Table::from_rows(
            "t",
            &["idx", "half", "tag"],
            (0..n)
                .map(|i| {
                    vec![
                        Cell::Number(i as f64),
                        Cell::Text(format!("{}", i as f64 / 2.0)),
                        Cell::Text(if i % 3 == 0 { "a".into() } else { "b".into() }),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn line_without_y_plots_row_indices() {
        let table = numbered(120);
        let series = build_series(&table, ChartKind::Line, "tag", None, 20, 50).unwrap();
        assert_eq!(series.name, "tag");
        // ceil(120 / 50) = 3
        assert_eq!(series.len(), 40);
        assert!(series.values.iter().enumerate().all(|(i, v)| *v == (i * 3) as f64));
        assert!(series.values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(series.labels.len(), series.values.len());
    }

    #[test]
    fn scatter_with_y_coerces_values() {
        let mut table = numbered(4);
        table.push_row(vec![Cell::Number(4.0), Cell::Text("oops".into()), Cell::Missing]);
        let series = build_series(&table, ChartKind::Scatter, "idx", Some("half"), 20, 50).unwrap();
        assert_eq!(series.name, "half");
        assert_eq!(series.labels, vec!["0", "1", "2", "3", "4"]);
        assert_eq!(series.values, vec![0.0, 0.5, 1.0, 1.5, 0.0]);
    }

    #[test]
    fn small_tables_are_not_downsampled() {
        let series = build_series(&numbered(50), ChartKind::Bar, "idx", None, 20, 50).unwrap();
        assert_eq!(series.len(), 50);
        let series = build_series(&numbered(51), ChartKind::Bar, "idx", None, 20, 50).unwrap();
        assert_eq!(series.len(), 26);
    }

    #[test]
    fn pie_counts_rows_in_first_seen_order() {
        let table = Table::from_rows(
            "t",
            &["fruit"],
            vec![
                vec![Cell::Text("pear".into())],
                vec![Cell::Text("apple".into())],
                vec![Cell::Missing],
                vec![Cell::Text("pear".into())],
                vec![Cell::Text("fig".into())],
            ],
        );
        let series = build_series(&table, ChartKind::Pie, "fruit", None, 20, 50).unwrap();
        assert_eq!(series.labels, vec!["pear", "apple", "fig"]);
        assert_eq!(series.values, vec![2.0, 1.0, 1.0]);

        let full = numbered(30);
        let series = build_series(&full, ChartKind::Pie, "tag", None, 20, 50).unwrap();
        assert_eq!(series.values.iter().sum::<f64>(), 30.0);
    }

    #[test]
    fn pie_sums_y_with_fallback_of_one() {
        let table = Table::from_rows(
            "t",
            &["k", "v"],
            vec![
                vec![Cell::Text("a".into()), Cell::Number(2.5)],
                vec![Cell::Text("b".into()), Cell::Text("x".into())],
                vec![Cell::Text("a".into()), Cell::Text("4".into())],
                vec![Cell::Number(0.0), Cell::Number(100.0)],
                vec![Cell::Number(7.0), Cell::Missing],
            ],
        );
        let series = build_series(&table, ChartKind::Pie, "k", Some("v"), 20, 50).unwrap();
        assert_eq!(series.name, "v");
        assert_eq!(series.labels, vec!["a", "b", "7"]);
        assert_eq!(series.values, vec![6.5, 1.0, 1.0]);
    }

    #[test]
    fn histogram_bins_numeric_x() {
        let table = numbered(10);
        let series = build_series(&table, ChartKind::Histogram, "half", None, 3, 50).unwrap();
        assert_eq!(series.labels, vec!["0.00 - 1.50", "1.50 - 3.00", "3.00 - 4.50"]);
        assert_eq!(series.values, vec![3.0, 3.0, 4.0]);

        let series = build_series(&table, ChartKind::Histogram, "tag", None, 3, 50).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let table = numbered(3);
        assert!(matches!(
            build_series(&table, ChartKind::Line, "nope", None, 20, 50),
            Err(DVError::UnknownColumn(c)) if c == "nope"
        ));
        assert!(build_series(&table, ChartKind::Line, "idx", Some("nope"), 20, 50).is_err());
    }

    #[test]
    fn empty_table_builds_empty_series() {
        let table = Table::new("t", vec!["a".into()]);
        for kind in ChartKind::ALL {
            assert!(build_series(&table, kind, "a", None, 20, 50).unwrap().is_empty());
        }
    }
}
