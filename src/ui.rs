use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span, Text},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Chart, Clear, Dataset, GraphType, List, ListItem,
        Paragraph, Row, Table, Wrap,
    },
};

use crate::chart::ChartSeries;
use crate::domain::{CMDMode, ChartKind, PREVIEW_ROWS};
use crate::model::{Model, UIData};

pub const STATS_WIDTH: u16 = 32;
pub const INSIGHTS_HEIGHT: u16 = 8;
pub const CMDLINE_HEIGHT: u16 = 1;
pub const BAR_SCALE: f64 = 1000.0;
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

const PALETTE: [(u8, u8, u8); 12] = [
    (0x66, 0x7e, 0xea),
    (0x76, 0x4b, 0xa2),
    (0xf0, 0x93, 0xfb),
    (0xf5, 0x57, 0x6c),
    (0x4f, 0xac, 0xfe),
    (0x00, 0xf2, 0xfe),
    (0x43, 0xe9, 0x7b),
    (0x38, 0xf9, 0xd7),
    (0xff, 0xec, 0xd2),
    (0xfc, 0xb6, 0x9f),
    (0xa8, 0xed, 0xea),
    (0xfe, 0xd6, 0xe3),
];

fn palette_color(idx: usize) -> Color {
    let (r, g, b) = PALETTE[idx % PALETTE.len()];
    Color::Rgb(r, g, b)
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[derive(Debug, Default)]
pub struct DashboardUI {}

impl DashboardUI {
    pub fn new() -> Self {
        Self {}
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let ui = model.get_uidata();
        let [title, body, insights, cmdline] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(INSIGHTS_HEIGHT),
            Constraint::Length(CMDLINE_HEIGHT),
        ])
        .areas(frame.area());
        let [stats, main] =
            Layout::horizontal([Constraint::Length(STATS_WIDTH), Constraint::Min(20)]).areas(body);
        let [preview, chart] = Layout::vertical([
            Constraint::Length(PREVIEW_ROWS as u16 + 3),
            Constraint::Min(6),
        ])
        .areas(main);

        self.render_title(ui, frame, title);
        self.render_stats(ui, frame, stats);
        self.render_preview(ui, frame, preview);
        self.render_chart(ui, frame, chart);
        self.render_insights(ui, frame, insights);
        self.render_cmdline(ui, frame, cmdline);
        if ui.show_popup {
            self.render_popup(ui, frame);
        }
    }

    fn render_title(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        let name = if ui.name.is_empty() { "no file" } else { &ui.name };
        let line = Line::from(vec![
            " dv ".bold().reversed(),
            Span::raw(format!(" {name} ")).yellow(),
            " chart: ".into(),
            ui.kind.name().blue().bold(),
            " x: ".into(),
            Span::raw(ui.x.clone().unwrap_or_else(|| "-".into())).blue().bold(),
            " y: ".into(),
            Span::raw(ui.y.clone().unwrap_or_else(|| "-".into())).blue().bold(),
            "  <?> help".dark_gray(),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_stats(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = ui
            .stats
            .iter()
            .map(|card| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:>10} ", card.value),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(card.label.clone()),
                ]))
            })
            .collect();
        frame.render_widget(
            List::new(items).block(Block::bordered().title(" Statistics ")),
            area,
        );
    }

    fn render_preview(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        let widths = vec![Constraint::Fill(1); ui.header.len().max(1)];
        let header = Row::new(ui.header.clone()).style(Style::default().bold().underlined());
        let rows: Vec<Row> = ui.preview.iter().map(|r| Row::new(r.clone())).collect();
        let title = format!(
            " Preview {}-{} of {} ",
            (ui.preview_offset + 1).min(ui.nrows),
            ui.preview_offset + ui.preview.len(),
            ui.nrows
        );
        frame.render_widget(
            Table::new(rows, widths)
                .header(header)
                .block(Block::bordered().title(title)),
            area,
        );
    }

    fn render_chart(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(format!(" {} ", ui.chart_title));
        let Some(series) = ui.series.as_ref().filter(|s| !s.is_empty()) else {
            let hint = if ui.series.is_some() {
                "No numeric data to plot for this selection."
            } else {
                "Select columns and press <a> to analyze."
            };
            frame.render_widget(Paragraph::new(hint).dark_gray().block(block), area);
            return;
        };

        match ui.kind {
            ChartKind::Line | ChartKind::Scatter => {
                Self::render_xy_chart(ui, series, block, frame, area)
            }
            ChartKind::Bar => Self::render_bars(series, false, Direction::Vertical, block, frame, area),
            ChartKind::Histogram => {
                Self::render_bars(series, false, Direction::Horizontal, block, frame, area)
            }
            ChartKind::Pie => {
                Self::render_bars(series, true, Direction::Horizontal, block, frame, area)
            }
        }
    }

    fn render_xy_chart(
        ui: &UIData,
        series: &ChartSeries,
        block: Block,
        frame: &mut Frame,
        area: Rect,
    ) {
        let points: Vec<(f64, f64)> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();
        let ymin = series.values.iter().copied().fold(f64::INFINITY, f64::min);
        let ymax = series.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (ymin, ymax) = if ymax > ymin { (ymin, ymax) } else { (ymin - 1.0, ymax + 1.0) };
        let xmax = (series.len().max(2) - 1) as f64;

        let graph_type = if ui.kind == ChartKind::Scatter {
            GraphType::Scatter
        } else {
            GraphType::Line
        };
        let dataset = Dataset::default()
            .name(series.name.clone())
            .marker(symbols::Marker::Braille)
            .graph_type(graph_type)
            .style(Style::default().fg(palette_color(0)))
            .data(&points);

        let mid = series.len() / 2;
        let x_labels = vec![
            series.labels[0].clone(),
            series.labels[mid].clone(),
            series.labels[series.len() - 1].clone(),
        ];
        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .title(ui.axis_titles.0.clone())
                    .style(Style::default().fg(Color::Gray))
                    .labels(x_labels)
                    .bounds([0.0, xmax]),
            )
            .y_axis(
                Axis::default()
                    .title(ui.axis_titles.1.clone())
                    .style(Style::default().fg(Color::Gray))
                    .labels(vec![format_value(ymin), format_value(ymax)])
                    .bounds([ymin, ymax]),
            );
        frame.render_widget(chart, area);
    }

    fn render_bars(
        series: &ChartSeries,
        show_share: bool,
        direction: Direction,
        block: Block,
        frame: &mut Frame,
        area: Rect,
    ) {
        let max = series.values.iter().copied().fold(0.0, f64::max);
        let total: f64 = series.values.iter().filter(|v| **v > 0.0).sum();
        let bars: Vec<Bar> = series
            .values
            .iter()
            .zip(series.labels.iter())
            .enumerate()
            .map(|(i, (v, label))| {
                let height = if max > 0.0 { (v.max(0.0) / max * BAR_SCALE).round() } else { 0.0 };
                let label = if show_share && total > 0.0 {
                    format!("{label} {:.0}%", v.max(0.0) * 100.0 / total)
                } else {
                    label.clone()
                };
                Bar::default()
                    .value(height as u64)
                    .label(Line::from(label))
                    .text_value(format_value(*v))
                    .style(Style::default().fg(palette_color(i)))
            })
            .collect();

        let bar_width = match direction {
            Direction::Horizontal => 1,
            Direction::Vertical => {
                let inner = area.width.saturating_sub(2) as usize;
                ((inner / series.len().max(1)).saturating_sub(1)).clamp(1, 9) as u16
            }
        };
        let chart = BarChart::default()
            .block(block)
            .direction(direction)
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(if direction == Direction::Horizontal { 0 } else { 1 })
            .max(BAR_SCALE as u64);
        frame.render_widget(chart, area);
    }

    fn render_insights(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        let text = match &ui.insights {
            None => Text::from("Press <a> to generate insights.".dark_gray()),
            Some(insights) if insights.is_empty() => {
                Text::from("No specific insights generated for current analysis.")
            }
            Some(insights) => Text::from(
                insights
                    .iter()
                    .map(|i| Line::from(i.clone()))
                    .collect::<Vec<Line>>(),
            ),
        };
        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: true })
                .block(Block::bordered().title(" Insights ")),
            area,
        );
    }

    fn render_cmdline(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        if ui.active_cmdinput {
            let prompt = match ui.cmd_mode {
                Some(CMDMode::OpenFile) | None => "Open: ",
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    prompt.bold(),
                    Span::raw(ui.cmdinput.input.clone()),
                ])),
                area,
            );
            let chars_before = ui.cmdinput.curser_pos as u16;
            frame.set_cursor_position((area.x + prompt.len() as u16 + chars_before, area.y));
        } else if ui.status_since.elapsed() < STATUS_TIMEOUT {
            frame.render_widget(Paragraph::new(Span::raw(ui.status_message.clone()).italic()), area);
        } else {
            frame.render_widget(
                Paragraph::new("<o> open  <x>/<y> columns  <c> chart  <a> analyze  <q> quit".dark_gray()),
                area,
            );
        }
    }

    fn render_popup(&self, ui: &UIData, frame: &mut Frame) {
        let area = frame.area();
        let width = 56.min(area.width);
        let height = (ui.popup_message.lines().count() as u16 + 2).min(area.height);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(ui.popup_message.clone())
                .block(Block::bordered().title(" Help ").title_bottom(" <Esc> close ")),
            popup,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DVConfig, Message};
    use ratatui::{Terminal, backend::TestBackend};
    use std::path::PathBuf;

    fn render(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let ui = DashboardUI::new();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn loaded() -> Model {
        let mut model = Model::init(&DVConfig::default());
        model
            .load_data_file(
                PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sales.csv"),
            )
            .unwrap();
        model
    }

    #[test]
    fn renders_empty_dashboard() {
        let screen = render(&Model::init(&DVConfig::default()));
        assert!(screen.contains("no file"));
        assert!(screen.contains("Welcome to dv!"));
        assert!(screen.contains("Press <a> to generate insights."));
    }

    #[test]
    fn renders_statistics_and_preview() {
        let screen = render(&loaded());
        assert!(screen.contains("Total Rows"));
        assert!(screen.contains("units (Avg)"));
        assert!(screen.contains("region"));
        assert!(screen.contains("Preview 1-10 of 10"));
    }

    #[test]
    fn renders_every_chart_kind() {
        let mut model = loaded();
        model.update(Some(Message::Analyze)).unwrap();
        for _ in ChartKind::ALL {
            let screen = render(&model);
            assert!(screen.contains("Chart: region"), "{screen}");
            assert!(screen.contains("Dataset contains 10 records"));
            model.update(Some(Message::NextChartKind)).unwrap();
        }
    }

    #[test]
    fn renders_help_popup() {
        let mut model = loaded();
        model.update(Some(Message::Help)).unwrap();
        assert!(render(&model).contains("Cycle chart type"));
    }

    #[test]
    fn formats_values() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(2.5), "2.50");
        assert_eq!(palette_color(12), palette_color(0));
    }
}
