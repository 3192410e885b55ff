use std::path::PathBuf;
use std::time::Instant;

use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{error, info, instrument, trace};
use tracing_error::SpanTrace;

use crate::chart::ChartSeries;
use crate::domain::{CMDMode, ChartKind, DVConfig, DVError, HELP_TEXT, Message, PREVIEW_ROWS};
use crate::inputter::{InputResult, Inputter};
use crate::insights::Insight;
use crate::session::Session;
use crate::stats::TableSummary;
use crate::table::{self, Cell};

#[derive(Debug, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    DASHBOARD,
    POPUP,
    CMDINPUT,
}

/// A labelled value shown in the statistics pane.
#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub value: String,
    pub label: String,
}

impl StatCard {
    fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        StatCard {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn from_summary(summary: &TableSummary) -> Vec<StatCard> {
        if summary.nrows == 0 {
            return Vec::new();
        }
        let mut cards = vec![
            StatCard::new(summary.nrows.to_string(), "Total Rows"),
            StatCard::new(summary.ncolumns.to_string(), "Columns"),
        ];
        for c in summary.columns.iter() {
            cards.push(StatCard::new(c.display_mean(), format!("{} (Avg)", c.name)));
            cards.push(StatCard::new(c.max.to_string(), format!("{} (Max)", c.name)));
            cards.push(StatCard::new(c.min.to_string(), format!("{} (Min)", c.name)));
        }
        cards
    }
}

/// Snapshot of everything the UI renders.
#[derive(Debug, Clone)]
pub struct UIData {
    pub name: String,
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
    pub header: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub preview_offset: usize,
    pub nrows: usize,
    pub stats: Vec<StatCard>,
    pub series: Option<ChartSeries>,
    pub chart_title: String,
    pub axis_titles: (String, String),
    pub insights: Option<Vec<Insight>>,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub status_since: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            kind: ChartKind::default(),
            x: None,
            y: None,
            header: Vec::new(),
            preview: Vec::new(),
            preview_offset: 0,
            nrows: 0,
            stats: Vec::new(),
            series: None,
            chart_title: String::new(),
            axis_titles: (String::new(), String::new()),
            insights: None,
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            status_since: Instant::now(),
        }
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    session: Session,
    stats: Vec<StatCard>,
    insights: Option<Vec<Insight>>,
    preview_offset: usize,
    uidata: UIData,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &DVConfig) -> Self {
        let mut model = Self {
            status: Status::EMPTY,
            modus: Modus::DASHBOARD,
            previous_modus: Modus::DASHBOARD,
            session: Session::new(config),
            stats: Vec::new(),
            insights: None,
            preview_offset: 0,
            uidata: UIData::empty(),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.set_status_message("Welcome to dv! Press 'o' to open a CSV file.");
        model.update_uidata();
        model
    }

    /// Loads a CSV file, replacing the current table in full.
    #[instrument(skip(self))]
    pub fn load_data_file(&mut self, path: PathBuf) -> Result<(), DVError> {
        self.set_status_message("Processing file...");
        let table = match table::load(path) {
            Ok(table) => table,
            Err(e) => {
                error!(span_trace = %SpanTrace::capture(), "Loading failed: {e}");
                self.set_status_message(e.to_string());
                self.update_uidata();
                return Err(e);
            }
        };
        let nrows = table.nrows();

        self.session.load(table);
        self.stats = StatCard::from_summary(&self.session.summary());
        self.insights = None;
        self.preview_offset = 0;
        self.status = Status::READY;
        self.set_status_message(format!("Successfully loaded {nrows} rows of data!"));
        self.update_uidata();
        Ok(())
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DVError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::DASHBOARD => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_help(),
                    Message::MoveUp => self.scroll_preview(false),
                    Message::MoveDown => self.scroll_preview(true),
                    Message::NextX => self.change_selection(|s| s.next_x(true)),
                    Message::PrevX => self.change_selection(|s| s.next_x(false)),
                    Message::NextY => self.change_selection(|s| s.next_y(true)),
                    Message::PrevY => self.change_selection(|s| s.next_y(false)),
                    Message::NextChartKind => self.change_selection(Session::next_kind),
                    Message::Analyze => self.analyze(),
                    Message::Open => self.enter_cmd_mode(CMDMode::OpenFile),
                    Message::CopyInsights => self.copy_insights(),
                    Message::Resize => trace!("Dashboard redraw after resize"),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit => self.exit_popup(),
                    _ => (),
                },
                Modus::CMDINPUT => {
                    if let Message::RawKey(key) = msg {
                        self.raw_input(key)
                    }
                }
            }
        }
        self.update_uidata();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn analyze(&mut self) {
        match self.session.analyze() {
            Ok(analysis) => {
                info!(
                    "Analyzed {}: {} points, {} insights",
                    self.session.chart_title(),
                    analysis.series.len(),
                    analysis.insights.len()
                );
                self.stats = StatCard::from_summary(&analysis.summary);
                self.insights = Some(analysis.insights);
                self.set_status_message("Analysis completed successfully!");
            }
            Err(e) => {
                error!("Analysis failed: {e}");
                self.set_status_message(e.to_string());
            }
        }
    }

    // Selection changes refresh an analysis that is already on screen.
    fn change_selection(&mut self, f: impl FnOnce(&mut Session)) {
        f(&mut self.session);
        if self.insights.is_some() {
            self.analyze();
        }
    }

    fn scroll_preview(&mut self, down: bool) {
        let nrows = self.session.table().nrows();
        self.preview_offset = if down {
            (self.preview_offset + 1).min(nrows.saturating_sub(PREVIEW_ROWS))
        } else {
            self.preview_offset.saturating_sub(1)
        };
    }

    fn copy_insights(&mut self) {
        let Some(insights) = &self.insights else {
            self.set_status_message("Nothing to copy, run an analysis first.");
            return;
        };
        let text = insights.join("\n");
        match Clipboard::new().and_then(|mut c| c.set_text(text)) {
            Ok(_) => self.set_status_message("Copied insights to clipboard."),
            Err(e) => {
                trace!("Error copying to clipboard: {:?}", e);
                self.set_status_message(format!("Clipboard unavailable: {e}"));
            }
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn exit_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
        }
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {mode:?} ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.clear();
        self.last_input = self.input.get();
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        if self.last_input.canceled {
            return;
        }
        match self.cmd_mode.take() {
            Some(CMDMode::OpenFile) => {
                let path = self.last_input.expanded_path();
                // failures are shown on the status line
                let _ = self.load_data_file(path);
            }
            None => info!("Cmd mode is none!"),
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn update_uidata(&mut self) {
        let table = self.session.table();
        let end = (self.preview_offset + PREVIEW_ROWS).min(table.nrows());
        let preview = (self.preview_offset..end)
            .map(|r| {
                (0..table.ncolumns())
                    .map(|c| match table.cell(r, c) {
                        Cell::Missing => String::new(),
                        cell => cell.to_string(),
                    })
                    .collect()
            })
            .collect();

        let selection = &self.session.selection;
        self.uidata = UIData {
            name: table.name().to_string(),
            kind: selection.kind,
            x: selection.x.clone(),
            y: selection.y.clone(),
            header: table.header().to_vec(),
            preview,
            preview_offset: self.preview_offset,
            nrows: table.nrows(),
            stats: self.stats.clone(),
            series: self.session.series().cloned(),
            chart_title: self.session.chart_title(),
            axis_titles: self.session.axis_titles(),
            insights: self.insights.clone(),
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            status_since: self.last_status_message_update,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn loaded() -> Model {
        let mut model = Model::init(&DVConfig::default());
        model.load_data_file(fixture("sales.csv")).unwrap();
        model
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    #[test]
    fn load_shows_statistics_and_preview() {
        let model = loaded();
        let ui = model.get_uidata();
        assert_eq!(model.status, Status::READY);
        assert_eq!(ui.status_message, "Successfully loaded 10 rows of data!");
        assert_eq!(ui.preview.len(), PREVIEW_ROWS);
        assert_eq!(ui.preview[2], vec!["north", "3", "", "late"]);
        assert_eq!(ui.stats[0], StatCard::new("10", "Total Rows"));
        assert_eq!(ui.stats[2], StatCard::new("9.10", "units (Avg)"));
        assert_eq!(ui.stats[3], StatCard::new("15", "units (Max)"));
        assert_eq!(ui.stats.len(), 2 + 3 * 2);
        assert!(ui.insights.is_none());
    }

    #[test]
    fn analyze_without_data_reports_error() {
        let mut model = Model::init(&DVConfig::default());
        send(&mut model, Message::Analyze);
        assert_eq!(model.get_uidata().status_message, "Please upload data first.");
    }

    #[test]
    fn failed_load_keeps_previous_table() {
        let mut model = loaded();
        assert!(matches!(
            model.load_data_file(fixture("notes.txt")),
            Err(DVError::UnknownFileType)
        ));
        let ui = model.get_uidata();
        assert_eq!(ui.status_message, "Please select a CSV file.");
        assert_eq!(ui.nrows, 10);
    }

    #[test]
    fn analyze_then_change_selection_refreshes() {
        let mut model = loaded();
        send(&mut model, Message::Analyze);
        let ui = model.get_uidata();
        assert_eq!(ui.status_message, "Analysis completed successfully!");
        assert_eq!(ui.chart_title, "Line Chart: region");
        assert_eq!(ui.series.as_ref().unwrap().len(), 10);

        send(&mut model, Message::NextChartKind);
        send(&mut model, Message::NextChartKind);
        send(&mut model, Message::NextChartKind);
        let ui = model.get_uidata();
        assert_eq!(ui.kind, ChartKind::Pie);
        let series = ui.series.as_ref().unwrap();
        assert_eq!(series.labels, vec!["north", "south", "east", "west"]);
        assert_eq!(series.values, vec![4.0, 3.0, 2.0, 1.0]);
        let insights = ui.insights.as_ref().unwrap();
        assert_eq!(insights[0], "📊 Dataset contains 10 records with 4 features");
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = loaded();
        send(&mut model, Message::Help);
        assert!(model.get_uidata().show_popup);
        send(&mut model, Message::NextX);
        assert_eq!(model.get_uidata().x.as_deref(), Some("region"));
        send(&mut model, Message::Exit);
        assert!(!model.get_uidata().show_popup);
    }

    #[test]
    fn open_file_through_command_input() {
        let mut model = Model::init(&DVConfig::default());
        send(&mut model, Message::Open);
        assert!(model.raw_keyevents());
        for c in fixture("sales.csv").to_string_lossy().chars() {
            send(
                &mut model,
                Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)),
            );
        }
        send(
            &mut model,
            Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
        );
        assert!(!model.raw_keyevents());
        assert_eq!(model.get_uidata().nrows, 10);
        assert_eq!(model.get_uidata().name, "sales.csv");
    }

    #[test]
    fn preview_scroll_is_bounded() {
        let mut model = loaded();
        send(&mut model, Message::MoveUp);
        assert_eq!(model.get_uidata().preview_offset, 0);
        // 10 rows fit the preview exactly
        send(&mut model, Message::MoveDown);
        assert_eq!(model.get_uidata().preview_offset, 0);
    }

    #[test]
    fn quit_sets_status() {
        let mut model = loaded();
        send(&mut model, Message::Quit);
        assert_eq!(model.status, Status::QUITTING);
    }
}
