use rayon::prelude::*;
use tracing::trace;

use crate::table::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnSummary {
    /// Summary of a numeric sample, `None` when it is empty.
    pub fn from_values(name: &str, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(ColumnSummary {
            name: name.to_string(),
            count: values.len(),
            mean: sum / values.len() as f64,
            min,
            max,
        })
    }

    pub fn display_mean(&self) -> String {
        format!("{:.2}", self.mean)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSummary {
    pub nrows: usize,
    pub ncolumns: usize,
    pub columns: Vec<ColumnSummary>,
}

/// Row/column counts plus a summary for every column holding at least one number.
pub fn summarize(table: &Table) -> TableSummary {
    if table.is_empty() {
        return TableSummary::default();
    }

    let columns: Vec<ColumnSummary> = table
        .header()
        .par_iter()
        .enumerate()
        .filter_map(|(idx, name)| ColumnSummary::from_values(name, &table.numeric_values(idx)))
        .collect();
    trace!(
        "Summarized {} of {} columns as numeric",
        columns.len(),
        table.ncolumns()
    );

    TableSummary {
        nrows: table.nrows(),
        ncolumns: table.ncolumns(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn table() -> Table {
        Table::from_rows(
            "t",
            &["a", "b", "c"],
            vec![
                vec![Cell::Number(1.0), Cell::Text("x".into()), Cell::Text(" 10 ".into())],
                vec![Cell::Number(2.0), Cell::Text("y".into()), Cell::Missing],
                vec![Cell::Missing, Cell::Text("x".into()), Cell::Text("-4".into())],
                vec![Cell::Number(6.0), Cell::Missing, Cell::Text("n/a".into())],
            ],
        )
    }

    #[test]
    fn summarize_numeric_columns_only() {
        let summary = summarize(&table());
        assert_eq!(summary.nrows, 4);
        assert_eq!(summary.ncolumns, 3);
        let names: Vec<&str> = summary.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);

        let a = &summary.columns[0];
        assert_eq!((a.count, a.min, a.max), (3, 1.0, 6.0));
        assert_eq!(a.display_mean(), "3.00");

        let c = &summary.columns[1];
        assert_eq!((c.count, c.min, c.max, c.mean), (2, -4.0, 10.0, 3.0));
    }

    #[test]
    fn summarize_empty_table() {
        let table = Table::new("t", vec!["a".into()]);
        assert_eq!(summarize(&table), TableSummary::default());
    }

    #[test]
    fn mean_lies_between_min_and_max() {
        let samples: [&[f64]; 4] = [
            &[5.0],
            &[-1.0, 1.0],
            &[0.1, 0.2, 0.3, 1e9],
            &[2.5, 2.5, 2.5],
        ];
        for values in samples {
            let s = ColumnSummary::from_values("v", values).unwrap();
            assert!(s.min <= s.mean && s.mean <= s.max, "{s:?}");
        }
        assert!(ColumnSummary::from_values("v", &[]).is_none());
    }
}
