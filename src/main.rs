use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod chart;
mod controller;
mod domain;
mod histogram;
mod inputter;
mod insights;
mod model;
mod session;
mod stats;
mod table;
mod ui;

use controller::Controller;
use domain::{ChartKind, DEFAULT_BIN_COUNT, DEFAULT_MAX_POINTS, DVConfig, DVError};
use model::{Model, StatCard, Status};
use session::Session;
use ui::DashboardUI;

/// Statistics, charts and insights for CSV files in the terminal.
#[derive(Parser, Debug)]
#[command(name = "dv", version, about)]
struct Cli {
    /// CSV file to open
    path: Option<PathBuf>,

    /// Chart type
    #[arg(short, long, value_enum, default_value_t = ChartKind::Line)]
    chart: ChartKind,

    /// X-axis column (defaults to the first column)
    #[arg(short, long)]
    x: Option<String>,

    /// Y-axis column
    #[arg(short, long)]
    y: Option<String>,

    /// Number of histogram bins
    #[arg(long, default_value_t = DEFAULT_BIN_COUNT)]
    bins: usize,

    /// Maximum number of points for line, bar and scatter charts
    #[arg(long, default_value_t = DEFAULT_MAX_POINTS)]
    max_points: usize,

    /// Print statistics and insights to stdout instead of starting the ui
    #[arg(long, requires = "path")]
    report: bool,

    /// Log file [default: <tmp>/dv.log]
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

impl Cli {
    fn config(&self) -> DVConfig {
        let mut cfg = DVConfig::default()
            .event_poll_time(self.poll_ms)
            .bin_count(self.bins.max(1))
            .max_points(self.max_points.max(1))
            .chart(self.chart);
        cfg.x = self.x.clone();
        cfg.y = self.y.clone();
        cfg.path = self.path.clone();
        cfg
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(cli: &Cli) -> Result<(), DVError> {
    let path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("dv.log"));
    let file = File::create(&path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| DVError::LoggingFailed(e.to_string()))
}

fn run(cli: Cli) -> Result<(), DVError> {
    init_logging(&cli)?;
    let cfg = cli.config();
    info!("Starting dv with {cfg:?}");

    if cli.report {
        return report(&cfg, &mut io::stdout().lock());
    }

    let mut model = Model::init(&cfg);
    if let Some(path) = cfg.path.clone() {
        // Load errors end up on the status line, the ui still starts.
        if let Err(e) = model.load_data_file(path) {
            info!("Starting without data: {e}");
        }
    }
    let ui = DashboardUI::new();
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = (|| -> Result<(), DVError> {
        while model.status != Status::QUITTING {
            terminal.draw(|f| ui.draw(&model, f))?;
            if let Some(message) = controller.handle_event(&model)? {
                model.update(Some(message))?;
            }
        }
        Ok(())
    })();
    ratatui::restore();
    result
}

const NO_INSIGHTS: &str = "No specific insights generated for current analysis.";

fn report(cfg: &DVConfig, out: &mut impl Write) -> Result<(), DVError> {
    let path = cfg.path.clone().ok_or(DVError::NoData)?;
    let mut session = Session::new(cfg);
    session.load(table::load(path)?);

    writeln!(out, "{}", session.table().name())?;
    for card in StatCard::from_summary(&session.summary()) {
        writeln!(out, "{:>12}  {}", card.value, card.label)?;
    }
    if session.table().is_empty() {
        writeln!(out)?;
        writeln!(out, "{NO_INSIGHTS}")?;
        return Ok(());
    }

    let analysis = session.analyze()?;
    writeln!(out)?;
    writeln!(out, "{}", session.chart_title())?;
    for (label, value) in analysis.series.labels.iter().zip(analysis.series.values.iter()) {
        writeln!(out, "{label:>16}  {value}")?;
    }
    writeln!(out)?;
    if analysis.insights.is_empty() {
        writeln!(out, "{NO_INSIGHTS}")?;
    }
    for insight in analysis.insights {
        writeln!(out, "{insight}")?;
    }
    Ok(())
}
