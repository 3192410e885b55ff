use tracing::{info, trace};

use crate::chart::{self, ChartSeries};
use crate::domain::{ChartKind, DVConfig, DVError};
use crate::insights::{self, Insight};
use crate::stats::{self, TableSummary};
use crate::table::Table;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Everything one analysis pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub summary: TableSummary,
    pub series: ChartSeries,
    pub insights: Vec<Insight>,
}

/// Owns the current table and the series last produced from it.
#[derive(Debug)]
pub struct Session {
    table: Table,
    pub selection: Selection,
    series: Option<ChartSeries>,
    bin_count: usize,
    max_points: usize,
}

impl Session {
    pub fn new(config: &DVConfig) -> Self {
        Session {
            table: Table::default(),
            selection: Selection {
                kind: config.chart,
                x: config.x.clone(),
                y: config.y.clone(),
            },
            series: None,
            bin_count: config.bin_count,
            max_points: config.max_points,
        }
    }

    /// Replaces the current table. The previous chart and any selection
    /// that no longer names a column are dropped.
    pub fn load(&mut self, table: Table) {
        info!(
            "Session now holds {} ({} rows, {} columns)",
            table.name(),
            table.nrows(),
            table.ncolumns()
        );
        let keep = |c: &Option<String>| c.clone().filter(|c| table.header().contains(c));
        self.selection.x = keep(&self.selection.x).or_else(|| table.header().first().cloned());
        self.selection.y = keep(&self.selection.y);
        self.table = table;
        self.series = None;
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn series(&self) -> Option<&ChartSeries> {
        self.series.as_ref()
    }

    pub fn summary(&self) -> TableSummary {
        stats::summarize(&self.table)
    }

    /// Runs statistics, chart series and insights for the current selection.
    pub fn analyze(&mut self) -> Result<Analysis, DVError> {
        if self.table.is_empty() {
            return Err(DVError::NoData);
        }
        let x = self.selection.x.as_deref().ok_or(DVError::NoXAxis)?;
        let y = self.selection.y.as_deref();

        let series = chart::build_series(
            &self.table,
            self.selection.kind,
            x,
            y,
            self.bin_count,
            self.max_points,
        )?;
        let analysis = Analysis {
            summary: stats::summarize(&self.table),
            series: series.clone(),
            insights: insights::generate(&self.table, x, y),
        };
        self.series = Some(series);
        Ok(analysis)
    }

    pub fn chart_title(&self) -> String {
        let kind = self.selection.kind.name();
        let mut title = kind[..1].to_uppercase() + &kind[1..];
        title.push_str(" Chart:");
        if let Some(x) = &self.selection.x {
            title.push_str(&format!(" {x}"));
        }
        if let Some(y) = &self.selection.y {
            title.push_str(&format!(" vs {y}"));
        }
        title
    }

    /// Axis titles: the X column and either the Y column or "Count".
    pub fn axis_titles(&self) -> (String, String) {
        (
            self.selection.x.clone().unwrap_or_default(),
            self.selection.y.clone().unwrap_or_else(|| "Count".to_string()),
        )
    }

    pub fn next_x(&mut self, forward: bool) {
        let header = self.table.header();
        if header.is_empty() {
            return;
        }
        let current = self
            .selection
            .x
            .as_ref()
            .and_then(|x| header.iter().position(|h| h == x));
        let idx = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % header.len(),
            (Some(i), false) => (i + header.len() - 1) % header.len(),
        };
        self.selection.x = Some(header[idx].clone());
        trace!("Selected x: {:?}", self.selection.x);
    }

    /// Cycles y through every column plus "no column".
    pub fn next_y(&mut self, forward: bool) {
        let header = self.table.header();
        let slots = header.len() + 1;
        let current = self
            .selection
            .y
            .as_ref()
            .and_then(|y| header.iter().position(|h| h == y))
            .map_or(0, |i| i + 1);
        let slot = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        self.selection.y = slot.checked_sub(1).map(|i| header[i].clone());
        trace!("Selected y: {:?}", self.selection.y);
    }

    pub fn next_kind(&mut self) {
        self.selection.kind = self.selection.kind.next();
        trace!("Selected chart kind: {:?}", self.selection.kind);
    }
}
