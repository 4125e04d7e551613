//! Ratatui-based terminal UI.
//!
//! Two pages:
//! - Forecast: store/product/date selection, interval and series toggles, the
//!   forecast chart and the "Forecast Summary" panel.
//! - Clusters: the store/category scatter with per-cluster sales bands.
//!
//! Fetches run on background threads and report back over a channel. Every
//! request is tagged by a [`RequestGate`]; responses for superseded requests
//! are dropped so a slow, stale response never overwrites newer state.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::cluster::{ClusterBounds, StoreGroup, cluster_bounds, group_by_store};
use crate::data::{BackendClient, ClusterFetch, ForecastFetch, RequestGate, RequestTicket, summarize_issues};
use crate::domain::{DisplayConfig, Product};
use crate::error::AppError;
use crate::forecast::{ChartSeries, ForecastView, SeriesKind};
use crate::nav::Selection;
use crate::report::{fmt_units, fmt_value};

mod plotters_chart;

use plotters_chart::{ClusterPlottersChart, ForecastPlottersChart};

/// Start the TUI.
pub fn run(
    client: BackendClient,
    selection: Selection,
    display: DisplayConfig,
    today: NaiveDate,
) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::backend(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(client, selection, display, today);
    app.request_forecast();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::backend(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::backend(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Where a fetch stands. The backend reports "no data for this selection" as a
/// 404, which lands in `Failed`; `Ready` with an empty payload only covers an
/// empty success body or one whose records were all dropped by validation.
#[derive(Debug, Clone)]
enum LoadState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(v) => Some(v),
            _ => None,
        }
    }
}

enum FetchMessage {
    Forecast {
        ticket: RequestTicket,
        result: Result<ForecastFetch, AppError>,
    },
    Clusters {
        ticket: RequestTicket,
        result: Result<ClusterFetch, AppError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Forecast,
    Clusters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Store,
    Product,
    Start,
    End,
    Interval,
    Predicted,
    Min,
    Max,
}

const FIELDS: [Field; 8] = [
    Field::Store,
    Field::Product,
    Field::Start,
    Field::End,
    Field::Interval,
    Field::Predicted,
    Field::Min,
    Field::Max,
];

struct ClusterLayout {
    groups: Vec<StoreGroup>,
    bounds: Vec<ClusterBounds>,
}

struct App {
    client: BackendClient,
    selection: Selection,
    display: DisplayConfig,
    today: NaiveDate,
    page: Page,
    selected_field: usize,
    editing: Option<Field>,
    date_input: String,
    status: String,
    forecast_gate: RequestGate,
    cluster_gate: RequestGate,
    tx: Sender<FetchMessage>,
    rx: Receiver<FetchMessage>,
    forecast: LoadState<ForecastFetch>,
    view: Option<ForecastView>,
    clusters: LoadState<ClusterLayout>,
}

impl App {
    fn new(client: BackendClient, selection: Selection, display: DisplayConfig, today: NaiveDate) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            selection,
            display,
            today,
            page: Page::Forecast,
            selected_field: 0,
            editing: None,
            date_input: String::new(),
            status: String::new(),
            forecast_gate: RequestGate::new(),
            cluster_gate: RequestGate::new(),
            tx,
            rx,
            forecast: LoadState::Idle,
            view: None,
            clusters: LoadState::Idle,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.drain_messages() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::backend(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::backend(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::backend(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ---- fetching -------------------------------------------------------

    fn request_forecast(&mut self) {
        let Some(request) = crate::app::pipeline::request_for(&self.selection) else {
            self.forecast_gate.invalidate();
            self.forecast = LoadState::Idle;
            self.view = None;
            self.status = "Select a spare part to load a forecast.".to_string();
            return;
        };

        let ticket = self.forecast_gate.issue();
        self.forecast = LoadState::Loading;
        self.status = format!("Fetching forecast for {} in {}...", request.product_name, request.store_id);

        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client.fetch_forecast(&request);
            let _ = tx.send(FetchMessage::Forecast { ticket, result });
        });
    }

    fn request_clusters(&mut self) {
        let ticket = self.cluster_gate.issue();
        self.clusters = LoadState::Loading;
        self.status = "Fetching clusters...".to_string();

        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = client.fetch_clusters();
            let _ = tx.send(FetchMessage::Clusters { ticket, result });
        });
    }

    /// Apply finished fetches. Returns whether anything changed.
    fn drain_messages(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(msg) => changed |= self.apply_message(msg),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    fn apply_message(&mut self, msg: FetchMessage) -> bool {
        match msg {
            FetchMessage::Forecast { ticket, result } => {
                if !self.forecast_gate.is_current(ticket) {
                    tracing::debug!(generation = ticket.generation(), "discarding stale forecast response");
                    return false;
                }
                match result {
                    Ok(fetch) => {
                        self.status = match summarize_issues(&fetch.issues) {
                            Some(summary) => format!("Loaded with warnings: {summary}"),
                            None if fetch.data.is_empty() => "No forecast data for this selection.".to_string(),
                            None => format!("Loaded {} forecast days.", fetch.data.predicted.len()),
                        };
                        self.forecast = LoadState::Ready(fetch);
                        self.rebuild_view();
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "forecast fetch failed");
                        self.status = format!("Forecast fetch failed: {err}");
                        self.forecast = LoadState::Failed(err.message().to_string());
                        self.view = None;
                    }
                }
            }
            FetchMessage::Clusters { ticket, result } => {
                if !self.cluster_gate.is_current(ticket) {
                    tracing::debug!(generation = ticket.generation(), "discarding stale cluster response");
                    return false;
                }
                match result {
                    Ok(fetch) => {
                        self.status = match summarize_issues(&fetch.issues) {
                            Some(summary) => format!("Clusters loaded with warnings: {summary}"),
                            None => format!("Loaded {} cluster points.", fetch.points.len()),
                        };
                        self.clusters = LoadState::Ready(ClusterLayout {
                            groups: group_by_store(&fetch.points),
                            bounds: cluster_bounds(&fetch.points),
                        });
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "cluster fetch failed");
                        self.status = format!("Cluster fetch failed: {err}");
                        self.clusters = LoadState::Failed(err.message().to_string());
                    }
                }
            }
        }
        true
    }

    fn rebuild_view(&mut self) {
        self.view = self.forecast.ready().map(|fetch| {
            crate::app::pipeline::build_view(&fetch.data, &self.selection, &self.display, self.today)
        });
    }

    // ---- input ----------------------------------------------------------

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.switch_page(),
            KeyCode::Char('r') => match self.page {
                Page::Forecast => self.request_forecast(),
                Page::Clusters => self.request_clusters(),
            },
            _ if self.page == Page::Clusters => {}
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELDS.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right | KeyCode::Char(' ') => self.adjust_field(1),
            KeyCode::Enter => {
                let field = FIELDS[self.selected_field];
                if matches!(field, Field::Start | Field::End) {
                    self.editing = Some(field);
                    self.date_input.clear();
                    self.status = "Editing date (YYYY-MM-DD). Enter to apply, Esc to cancel.".to_string();
                }
            }
            KeyCode::Char('e') => self.export_csv(),
            _ => {}
        }

        false
    }

    fn switch_page(&mut self) {
        self.page = match self.page {
            Page::Forecast => Page::Clusters,
            Page::Clusters => Page::Forecast,
        };
        if self.page == Page::Clusters && matches!(self.clusters, LoadState::Idle) {
            self.request_clusters();
        }
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                if let Some(field) = self.editing.take() {
                    self.apply_date_input(field);
                }
            }
            KeyCode::Backspace => {
                self.date_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' {
                    self.date_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn apply_date_input(&mut self, field: Field) {
        let trimmed = self.date_input.trim();
        let date = match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                self.status = format!("Invalid date '{trimmed}': {e}");
                return;
            }
        };

        let mut range = self.selection.range;
        match field {
            Field::Start => range.start = date,
            Field::End => range.end = date,
            _ => return,
        }
        if range.end < range.start {
            self.status = format!("End date {} is before start date {}.", range.end, range.start);
            return;
        }
        self.selection.range = range;
        self.request_forecast();
    }

    fn adjust_field(&mut self, delta: i32) {
        let forward = delta >= 0;
        match FIELDS[self.selected_field] {
            Field::Store => {
                self.selection.store = if forward {
                    self.selection.store.next()
                } else {
                    self.selection.store.prev()
                };
                self.request_forecast();
            }
            Field::Product => {
                self.selection.product = Some(match (self.selection.product, forward) {
                    (Some(p), true) => p.next(),
                    (Some(p), false) => p.prev(),
                    (None, true) => Product::ALL[0],
                    (None, false) => Product::ALL[Product::ALL.len() - 1],
                });
                self.request_forecast();
            }
            Field::Start | Field::End => {}
            Field::Interval => {
                let interval = if forward {
                    self.display.interval.next()
                } else {
                    self.display.interval.prev()
                };
                self.display = self.display.with_interval(interval);
                self.rebuild_view();
                self.status = format!("interval: {}", interval.as_str());
            }
            Field::Predicted => {
                self.display = self.display.toggle_predicted();
                self.rebuild_view();
            }
            Field::Min => {
                self.display = self.display.toggle_min();
                self.rebuild_view();
            }
            Field::Max => {
                self.display = self.display.toggle_max();
                self.rebuild_view();
            }
        }
    }

    fn export_csv(&mut self) {
        let Some(chart) = self.view.as_ref().and_then(|v| v.chart.as_ref()) else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let product = self
            .selection
            .product
            .map(|p| p.name().replace(' ', "_").to_lowercase())
            .unwrap_or_default();
        let path = std::path::PathBuf::from(format!(
            "forecast_{}_{product}_{}.csv",
            self.selection.store,
            self.display.interval.as_str()
        ));
        self.status = match crate::io::write_series_csv(&path, chart) {
            Ok(()) => format!("Wrote {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    // ---- drawing --------------------------------------------------------

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        match self.page {
            Page::Forecast => self.draw_forecast_page(frame, chunks[1]),
            Page::Clusters => self.draw_cluster_page(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let page = match self.page {
            Page::Forecast => "Forecast",
            Page::Clusters => "Cluster Analysis",
        };
        let lines = vec![
            Line::from(vec![
                Span::styled("mecha", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" - spare-part demand | {page}")),
            ]),
            Line::from(Span::styled(
                format!("{} | today: {}", self.selection.to_location(), self.today),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_forecast_page(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(10)])
            .split(area);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        self.draw_forecast_chart(frame, rows[0]);
        self.draw_settings(frame, bottom[0]);
        self.draw_summary(frame, bottom[1]);
    }

    fn draw_forecast_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match self.selection.product {
            Some(p) => format!("Sales Forecast for {p} in {}", self.selection.store),
            None => "Sales Forecast".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let chart = self.view.as_ref().and_then(|v| v.chart.as_ref());
        let Some(chart) = chart.filter(|c| !c.is_empty()) else {
            let msg = match (&self.forecast, chart) {
                (LoadState::Idle, _) => "Select a spare part.".to_string(),
                (LoadState::Loading, _) => "Loading forecast...".to_string(),
                (LoadState::Failed(msg), _) => format!("No data ({msg})"),
                (LoadState::Ready(_), Some(_)) => "No dates match this interval.".to_string(),
                (LoadState::Ready(_), None) => "No forecast data for this selection.".to_string(),
            };
            let p = Paragraph::new(msg).style(Style::default().fg(Color::Yellow));
            frame.render_widget(p, inner);
            return;
        };

        let (x_bounds, y_bounds) = forecast_bounds(chart);
        let legend_rect = Rect { height: 1, ..inner };
        frame.render_widget(Paragraph::new(legend_line(chart)), legend_rect);

        let plot_area = Rect {
            y: inner.y + 1,
            height: inner.height.saturating_sub(1),
            ..inner
        };
        let (chart_rect, insets) = chart_layout(plot_area);
        frame.render_widget(
            ForecastPlottersChart {
                chart,
                x_bounds,
                y_bounds,
            },
            chart_rect,
        );
        if let Some(insets) = insets {
            draw_axis_ticks(frame, plot_area, chart_rect, insets, y_bounds, |u| {
                let i = (u * (chart.len().saturating_sub(1)) as f64).round() as usize;
                chart
                    .labels
                    .get(i)
                    .map(|d| d.format("%m-%d").to_string())
                    .unwrap_or_default()
            });
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let on_off = |b: bool| if b { "[x]" } else { "[ ]" };
        let items: Vec<ListItem> = FIELDS
            .iter()
            .map(|field| {
                let text = match field {
                    Field::Store => format!("Store: {}", self.selection.store),
                    Field::Product => format!(
                        "Product: {}",
                        self.selection.product.map(|p| p.name()).unwrap_or("Select Spare Part")
                    ),
                    Field::Start => format!("Start Date: {}", self.date_label(Field::Start)),
                    Field::End => format!("End Date: {}", self.date_label(Field::End)),
                    Field::Interval => format!("Interval: {}", self.display.interval.as_str()),
                    Field::Predicted => format!("{} {}", on_off(self.display.show_predicted), SeriesKind::Predicted.label()),
                    Field::Min => format!("{} {}", on_off(self.display.show_min), SeriesKind::Lower.label()),
                    Field::Max => format!("{} {}", on_off(self.display.show_max), SeriesKind::Upper.label()),
                };
                ListItem::new(text)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn date_label(&self, field: Field) -> String {
        if self.editing == Some(field) {
            return format!("{}_", self.date_input);
        }
        match field {
            Field::Start => self.selection.range.start.to_string(),
            _ => self.selection.range.end.to_string(),
        }
    }

    fn draw_summary(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let units = self.view.as_ref().and_then(|v| v.future_units.as_ref());
        let (min, max) = fmt_units(units);
        let latest = self
            .view
            .as_ref()
            .and_then(|v| v.chart.as_ref())
            .and_then(|c| latest_values(c));

        let mut lines = vec![
            Line::from(format!("Forecast Interval: {}", self.display.interval.as_str())),
            Line::from(format!("Min Required Units: {min} units")),
            Line::from(format!("Max Required Units: {max} units")),
        ];
        if let Some((date, values)) = latest {
            lines.push(Line::from(Span::styled(
                format!("Last label {date}:"),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for (kind, v) in values {
                lines.push(Line::from(format!("  {}: {}", kind.label(), fmt_value(v))));
            }
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Forecast Summary").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_cluster_page(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Cluster Analysis").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let layout = match &self.clusters {
            LoadState::Ready(layout) if !layout.groups.is_empty() => layout,
            state => {
                let msg = match state {
                    LoadState::Idle | LoadState::Loading => "Loading clusters...".to_string(),
                    LoadState::Failed(msg) => format!("No data ({msg})"),
                    LoadState::Ready(_) => "No cluster data.".to_string(),
                };
                let p = Paragraph::new(msg).style(Style::default().fg(Color::Yellow));
                frame.render_widget(p, inner);
                return;
            }
        };

        let legend: Vec<Span> = layout
            .groups
            .iter()
            .flat_map(|g| {
                let c = plotters_chart::store_color(g.store.store());
                [
                    Span::styled("■ ", Style::default().fg(Color::Rgb(c.0, c.1, c.2))),
                    Span::raw(format!("Store {}  ", g.store)),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(legend)), Rect { height: 1, ..inner });

        let plot_area = Rect {
            y: inner.y + 1,
            height: inner.height.saturating_sub(1),
            ..inner
        };
        let (x_bounds, y_bounds) = cluster_plot_bounds(&layout.groups);
        frame.render_widget(
            ClusterPlottersChart {
                groups: &layout.groups,
                bounds: &layout.bounds,
                x_bounds,
                y_bounds,
            },
            plot_area,
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.page {
            Page::Forecast => "↑/↓ select  ←/→/space adjust  Enter edit date  r reload  e export  Tab clusters  q quit",
            Page::Clusters => "r reload  Tab forecast  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn legend_line(chart: &ChartSeries) -> Line<'static> {
    let spans: Vec<Span<'static>> = chart
        .datasets
        .iter()
        .flat_map(|ds| {
            let c = plotters_chart::series_color(ds.kind);
            [
                Span::styled("━ ", Style::default().fg(Color::Rgb(c.0, c.1, c.2))),
                Span::raw(format!("{}  ", ds.kind.label())),
            ]
        })
        .collect();
    Line::from(spans)
}

/// Values of every dataset at the last label.
fn latest_values(chart: &ChartSeries) -> Option<(NaiveDate, Vec<(SeriesKind, Option<f64>)>)> {
    let last = chart.labels.len().checked_sub(1)?;
    let values = chart
        .datasets
        .iter()
        .map(|ds| (ds.kind, ds.values[last]))
        .collect();
    Some((chart.labels[last], values))
}

/// X spans label positions; Y covers every present value with 5% padding.
fn forecast_bounds(chart: &ChartSeries) -> ([f64; 2], [f64; 2]) {
    let n = chart.len();
    let x_bounds = if n > 1 {
        [0.0, (n - 1) as f64]
    } else {
        [-0.5, 0.5]
    };

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for ds in &chart.datasets {
        for v in ds.values.iter().flatten() {
            y_min = y_min.min(*v);
            y_max = y_max.max(*v);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    } else if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    (x_bounds, [y_min - pad, y_max + pad])
}

/// X covers all sales with padding; Y covers category codes 0..=4 plus any unknown ones.
fn cluster_plot_bounds(groups: &[StoreGroup]) -> ([f64; 2], [f64; 2]) {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut c_min, mut c_max) = (0_i64, 4_i64);
    for p in groups.iter().flat_map(|g| g.points.iter()) {
        x_min = x_min.min(p.sales);
        x_max = x_max.max(p.sales);
        c_min = c_min.min(p.category.0);
        c_max = c_max.max(p.category.0);
    }
    if !x_min.is_finite() || !x_max.is_finite() {
        x_min = 0.0;
        x_max = 1.0;
    }
    let pad = ((x_max - x_min).abs() * 0.05).max(1.0);
    (
        [x_min - pad, x_max + pad],
        [c_min as f64 - 0.5, c_max as f64 + 0.5],
    )
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    y_bounds: [f64; 2],
    x_label: impl Fn(f64) -> String,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = x_label(u);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{:.0}", y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("sales")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ForecastFetch;
    use crate::domain::{ForecastData, ForecastPoint, Interval, Store};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> App {
        let today = ymd(2024, 1, 1);
        let mut selection = Selection::new(today);
        selection.product = Some(Product::Battery);
        selection.range.end = ymd(2024, 1, 31);
        App::new(BackendClient::new("http://127.0.0.1:9"), selection, DisplayConfig::default(), today)
    }

    fn fetch(n: usize) -> ForecastFetch {
        let predicted = ymd(2024, 1, 1)
            .iter_days()
            .take(n)
            .map(|date| ForecastPoint { date, predicted: 2.0, lower_bound: 1.0, upper_bound: 3.0 })
            .collect();
        ForecastFetch {
            data: ForecastData { predicted, actual: vec![] },
            issues: vec![],
        }
    }

    #[test]
    fn stale_forecast_response_is_ignored() {
        let mut app = app();
        let stale = app.forecast_gate.issue();
        let current = app.forecast_gate.issue();

        assert!(app.apply_message(FetchMessage::Forecast { ticket: current, result: Ok(fetch(14)) }));
        assert!(!app.apply_message(FetchMessage::Forecast { ticket: stale, result: Ok(fetch(3)) }));

        let chart = app.view.as_ref().and_then(|v| v.chart.as_ref()).unwrap();
        // 14 days, weekly -> positions 0 and 7.
        assert_eq!(chart.len(), 2);
    }

    #[test]
    fn failed_fetch_leaves_no_data() {
        let mut app = app();
        let ticket = app.forecast_gate.issue();
        app.apply_message(FetchMessage::Forecast { ticket, result: Ok(fetch(5)) });
        assert!(app.view.is_some());

        let ticket = app.forecast_gate.issue();
        app.apply_message(FetchMessage::Forecast {
            ticket,
            result: Err(AppError::backend("forecast request failed with status 404 Not Found: No data available for given store and product")),
        });
        assert!(app.view.is_none());
        assert!(matches!(app.forecast, LoadState::Failed(_)));
    }

    #[test]
    fn display_changes_rebuild_without_refetch() {
        let mut app = app();
        let ticket = app.forecast_gate.issue();
        app.apply_message(FetchMessage::Forecast { ticket, result: Ok(fetch(31)) });

        app.selected_field = FIELDS.iter().position(|f| *f == Field::Interval).unwrap();
        app.adjust_field(1);
        assert_eq!(app.display.interval, Interval::Monthly);
        assert_eq!(app.view.as_ref().unwrap().chart.as_ref().unwrap().len(), 1);

        app.selected_field = FIELDS.iter().position(|f| *f == Field::Max).unwrap();
        app.adjust_field(1);
        let chart = app.view.as_ref().unwrap().chart.as_ref().unwrap();
        assert!(chart.dataset(SeriesKind::Upper).is_none());
        // Same ticket still current: no new request was issued.
        assert!(app.forecast_gate.is_current(ticket));
    }

    #[test]
    fn bounds_handle_single_point_and_flat_series() {
        let chart = ChartSeries {
            labels: vec![ymd(2024, 1, 1)],
            datasets: vec![crate::forecast::Dataset { kind: SeriesKind::Predicted, values: vec![Some(5.0)] }],
        };
        let (x, y) = forecast_bounds(&chart);
        assert_eq!(x, [-0.5, 0.5]);
        assert!(y[0] < 5.0 && y[1] > 5.0);
    }

    #[test]
    fn cluster_bounds_include_unknown_categories() {
        let groups = vec![StoreGroup {
            store: crate::domain::StoreCode(Store::S001.code()),
            points: vec![crate::cluster::ScatterPoint { sales: 10.0, category: crate::domain::CategoryCode(7) }],
        }];
        let (_, y) = cluster_plot_bounds(&groups);
        assert_eq!(y, [-0.5, 7.5]);
    }
}
