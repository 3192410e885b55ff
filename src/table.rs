use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::domain::DVError;

/// A single field of a parsed CSV row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Builds a cell from raw CSV text: empty becomes `Missing`, numeric text becomes `Number`.
    pub fn parse(raw: &str) -> Cell {
        if raw.is_empty() {
            Cell::Missing
        } else if let Some(v) = coerce(raw) {
            Cell::Number(v)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    /// Numeric value of the cell, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => coerce(s),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Missing, empty text, zero and NaN do not form a group key.
    pub fn is_falsy(&self) -> bool {
        match self {
            Cell::Number(v) => *v == 0.0 || v.is_nan(),
            _ => self.is_missing(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => Ok(()),
        }
    }
}

/// Parses text that looks like a decimal number, ignoring surrounding whitespace.
pub fn coerce(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty()
        || !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'))
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// Parsed CSV content. Every row holds exactly one cell per header column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    name: String,
    header: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding with `Missing` or truncating it to the header width.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.header.len(), Cell::Missing);
        self.rows.push(Row { cells });
    }

    #[cfg(test)]
    pub fn from_rows(name: &str, header: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Table::new(name, header.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncolumns(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, DVError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DVError::UnknownColumn(name.to_string()))
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| &r.cells[idx])
    }

    /// Coerced numeric values of a column, non-numeric cells dropped.
    pub fn numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column(idx).filter_map(Cell::as_number).collect()
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        &self.rows[row].cells[column]
    }
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
}

pub fn get_file_info(path: PathBuf) -> Result<FileInfo, DVError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DVError::FileNotFound,
        ErrorKind::PermissionDenied => DVError::PermissionDenied,
        _ => DVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DVError::LoadingFailed("Not a file!".into()));
    }
    if !is_csv(&path) {
        return Err(DVError::UnknownFileType);
    }

    Ok(FileInfo {
        path,
        file_size: metadata.len(),
    })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("csv"))
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Cell>, PolarsError> {
    let column = df.column(col_name)?;
    let cells = column
        .str()?
        .into_iter()
        .map(|v| v.map_or(Cell::Missing, Cell::parse))
        .collect::<Vec<_>>();
    debug!("Column \"{col_name}\": {} rows", df.height());
    Ok(cells)
}

// Every column is read as text, cells are typed one by one with `Cell::parse`.
fn load_csv(path: &Path) -> Result<DataFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()
}

/// Loads a CSV file into a `Table`. Columns are converted in parallel.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: PathBuf) -> Result<Table, DVError> {
    let file_info = get_file_info(path)?;
    let start_time = Instant::now();

    let df = load_csv(&file_info.path)?;
    let header: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let columns = header
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<Vec<Vec<Cell>>, _>>()?;

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    let mut table = Table::new(name, header);
    for ridx in 0..df.height() {
        table.push_row(columns.iter().map(|c| c[ridx].clone()).collect());
    }

    info!(
        "Loading {} ({} bytes, {} rows) took {}ms ...",
        table.name(),
        file_info.file_size,
        table.nrows(),
        start_time.elapsed().as_millis()
    );
    Ok(table)
}
