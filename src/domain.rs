use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const DEFAULT_BIN_COUNT: usize = 20;
pub const DEFAULT_MAX_POINTS: usize = 50;
pub const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Error)]
pub enum DVError {
    #[error("I/O error: {0}")]
    IoError(#[from] Error),
    #[error("Error parsing CSV: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Error reading file: {0}")]
    LoadingFailed(String),
    #[error("File not found")]
    FileNotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Please select a CSV file.")]
    UnknownFileType,
    #[error("Unknown column \"{0}\"")]
    UnknownColumn(String),
    #[error("Please upload data first.")]
    NoData,
    #[error("Please select X-axis column.")]
    NoXAxis,
    #[error("Cannot bin an empty sample")]
    EmptySample,
    #[error("Failed to set up logging: {0}")]
    LoggingFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Scatter,
    Pie,
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Scatter,
        ChartKind::Pie,
        ChartKind::Histogram,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "histogram",
        }
    }

    pub fn next(&self) -> ChartKind {
        let idx = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Setters)]
pub struct DVConfig {
    pub event_poll_time: u64,
    pub bin_count: usize,
    pub max_points: usize,
    pub chart: ChartKind,
    #[setters(strip_option)]
    pub x: Option<String>,
    #[setters(strip_option)]
    pub y: Option<String>,
    #[setters(strip_option)]
    pub path: Option<PathBuf>,
}

impl Default for DVConfig {
    fn default() -> Self {
        DVConfig {
            event_poll_time: 100,
            bin_count: DEFAULT_BIN_COUNT,
            max_points: DEFAULT_MAX_POINTS,
            chart: ChartKind::default(),
            x: None,
            y: None,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    OpenFile,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Exit,
    Help,
    Resize,
    MoveUp,
    MoveDown,
    NextX,
    PrevX,
    NextY,
    PrevY,
    NextChartKind,
    Analyze,
    Open,
    CopyInsights,
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
dv - CSV statistics, charts and insights

  o          Open a CSV file
  x / X      Next / previous X-axis column
  y / Y      Next / previous Y-axis column (or none)
  c          Cycle chart type
  a / Enter  Analyze current selection
  Up / Down  Scroll data preview
  i          Copy insights to clipboard
  ?          Show this help
  Esc        Close popup
  q          Quit
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_kind_cycles_through_all_kinds() {
        let mut kind = ChartKind::Line;
        let mut seen = vec![kind];
        for _ in 0..4 {
            kind = kind.next();
            seen.push(kind);
        }
        assert_eq!(seen, ChartKind::ALL.to_vec());
        assert_eq!(kind.next(), ChartKind::Line);
    }

    #[test]
    fn config_setters_override_defaults() {
        let cfg = DVConfig::default().bin_count(5).y("price".to_string());
        assert_eq!(cfg.bin_count, 5);
        assert_eq!(cfg.max_points, DEFAULT_MAX_POINTS);
        assert_eq!(cfg.y.as_deref(), Some("price"));
        assert_eq!(cfg.x, None);
    }

    #[test]
    fn errors_render_user_messages() {
        assert_eq!(DVError::UnknownFileType.to_string(), "Please select a CSV file.");
        assert_eq!(DVError::NoXAxis.to_string(), "Please select X-axis column.");
    }
}
