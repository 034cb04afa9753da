use chrono::{DateTime, Local};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::format;
use crate::models::{EconomicIndicators, SectorPerformance, StockQuote, Symbol};
use crate::row_fetcher::RowId;
use crate::ui::{components, View};

pub const PREVIEW_LIMIT: usize = 5;

/// Load state of one dashboard region; regions fail independently
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Loading,
    Ready(T),
    Failed,
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        PanelState::Loading
    }
}

/// Readable label for an indicator code
pub fn indicator_label(code: &str) -> &str {
    match code {
        "GDP" => "GDP",
        "UNEMPLOYMENT" => "Unemployment Rate",
        "INFLATION" => "Inflation Rate",
        "INTEREST_RATE" => "Interest Rate",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorRow {
    pub sector: String,
    pub change: Option<f64>,
}

impl SectorRow {
    pub fn change_text(&self) -> String {
        self.change
            .map(format::format_signed_percent)
            .unwrap_or_else(|| format::NOT_AVAILABLE.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub row: RowId,
    pub symbol: Symbol,
    /// `None` until the price lookup returns
    pub price: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchlistPreview {
    pub rows: Vec<PreviewRow>,
    pub hidden: usize,
}

impl WatchlistPreview {
    pub fn more_label(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("+{} more", self.hidden))
    }
}

/// Dashboard tab: market summary plus a short watchlist preview
#[derive(Debug, Default)]
pub struct DashboardPanel {
    pub indicators: PanelState<Vec<IndicatorRow>>,
    pub sectors: PanelState<Vec<SectorRow>>,
    pub preview: WatchlistPreview,
    pub last_update: Option<DateTime<Local>>,
}

impl DashboardPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_indicators(&mut self, indicators: &EconomicIndicators) {
        let rows = indicators
            .0
            .iter()
            .map(|indicator| IndicatorRow {
                label: indicator_label(&indicator.code).to_string(),
                value: format::first_present([indicator.value.clone()])
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| format::NOT_AVAILABLE.to_string()),
            })
            .collect();
        self.indicators = PanelState::Ready(rows);
    }

    pub fn set_sectors(&mut self, sectors: &SectorPerformance) {
        let rows = sectors
            .0
            .iter()
            .map(|s| SectorRow {
                sector: s.sector.clone(),
                change: s.change_percent,
            })
            .collect();
        self.sectors = PanelState::Ready(rows);
    }

    /// Fill a preview price if the row is still shown
    pub fn fill_preview(&mut self, row: RowId, quote: &StockQuote) -> bool {
        match self.preview.rows.iter_mut().find(|r| r.row == row) {
            Some(preview) => {
                preview.price = Some(format::price_or(quote.current_price, format::NOT_AVAILABLE));
                true
            }
            None => false,
        }
    }

    pub fn touch(&mut self) {
        self.last_update = Some(Local::now());
    }

    pub fn indicator_lines(&self) -> Vec<Line<'static>> {
        match &self.indicators {
            PanelState::Loading => vec![components::dimmed(format::LOADING)],
            PanelState::Failed => vec![failed_line()],
            PanelState::Ready(rows) if rows.is_empty() => vec![components::dimmed(format::NOT_AVAILABLE)],
            PanelState::Ready(rows) => rows
                .iter()
                .map(|r| components::metric_line(&r.label, r.value.clone()))
                .collect(),
        }
    }

    pub fn sector_lines(&self) -> Vec<Line<'static>> {
        match &self.sectors {
            PanelState::Loading => vec![components::dimmed(format::LOADING)],
            PanelState::Failed => vec![failed_line()],
            PanelState::Ready(rows) if rows.is_empty() => vec![components::dimmed(format::NOT_AVAILABLE)],
            PanelState::Ready(rows) => rows
                .iter()
                .map(|r| {
                    let change = match r.change {
                        Some(value) => components::styled_percentage_change(value),
                        None => Span::styled(r.change_text(), Style::default().fg(Color::DarkGray)),
                    };
                    Line::from(vec![Span::raw(format!("{:<24}", r.sector)), change])
                })
                .collect(),
        }
    }

    pub fn preview_lines(&self) -> Vec<Line<'static>> {
        if self.preview.rows.is_empty() {
            return vec![components::dimmed("Watchlist is empty")];
        }

        let mut lines: Vec<Line<'static>> = self
            .preview
            .rows
            .iter()
            .map(|r| match &r.price {
                Some(price) => Line::from(vec![
                    Span::styled(format!("{:<10}", r.symbol), Style::default().fg(Color::Cyan)),
                    Span::raw(price.clone()),
                ]),
                None => Line::from(vec![
                    Span::styled(format!("{:<10}", r.symbol), Style::default().fg(Color::Cyan)),
                    Span::styled(format::LOADING, Style::default().fg(Color::DarkGray)),
                ]),
            })
            .collect();

        if let Some(more) = self.preview.more_label() {
            lines.push(components::dimmed(&more));
        }
        lines
    }
}

fn failed_line() -> Line<'static> {
    Line::from(Span::styled(format::LOAD_FAILED, Style::default().fg(Color::Red)))
}

impl View for DashboardPanel {
    fn render(&self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(33),
                Constraint::Percentage(34),
                Constraint::Percentage(33),
            ])
            .split(rows[0]);

        f.render_widget(
            Paragraph::new(self.indicator_lines())
                .block(Block::default().borders(Borders::ALL).title("Economic Indicators")),
            columns[0],
        );
        f.render_widget(
            Paragraph::new(self.sector_lines())
                .block(Block::default().borders(Borders::ALL).title("Sector Performance")),
            columns[1],
        );
        f.render_widget(
            Paragraph::new(self.preview_lines())
                .block(Block::default().borders(Borders::ALL).title("Watchlist")),
            columns[2],
        );

        let stamp = self
            .last_update
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        f.render_widget(
            Paragraph::new(format!("Last update: {}", stamp)).style(Style::default().fg(Color::Gray)),
            rows[1],
        );
    }

    fn get_title(&self) -> String {
        "Dashboard".to_string()
    }

    fn get_status(&self) -> String {
        "r refresh".to_string()
    }
}
