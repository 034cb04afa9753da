use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::format::{self, FormatKind};
use crate::models::AnalysisResult;
use crate::ui::{components, View};

const FUNDAMENTAL_PENDING: &str = "Fundamental data pending...";
const TECHNICAL_PENDING: &str = "Technical data pending...";

/// Colour class of the recommendation badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationClass {
    Buy,
    Sell,
    Hold,
}

impl RecommendationClass {
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("buy") || lower.contains("買入") {
            RecommendationClass::Buy
        } else if lower.contains("sell") || lower.contains("賣出") {
            RecommendationClass::Sell
        } else {
            RecommendationClass::Hold
        }
    }

    fn color(self) -> Color {
        match self {
            RecommendationClass::Buy => Color::Green,
            RecommendationClass::Sell => Color::Red,
            RecommendationClass::Hold => Color::Yellow,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreView {
    pub label: &'static str,
    pub score: f64,
}

/// Metric rows of one detail section; zero or absent metrics are left out
#[derive(Debug, Clone, PartialEq)]
pub struct MetricList {
    pub rows: Vec<(&'static str, String)>,
    pub placeholder: &'static str,
}

impl MetricList {
    fn collect(
        candidates: Vec<(&'static str, Option<f64>, FormatKind)>,
        placeholder: &'static str,
    ) -> Self {
        let rows = candidates
            .into_iter()
            .filter_map(|(label, value, kind)| {
                value.map(|v| (label, format::format_value(Some(v), kind)))
            })
            .collect();
        Self { rows, placeholder }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        if self.rows.is_empty() {
            return vec![components::dimmed(self.placeholder)];
        }
        self.rows
            .iter()
            .map(|(label, value)| components::metric_line(label, value.clone()))
            .collect()
    }
}

/// Everything the analysis tab shows, with fallbacks already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub title: String,
    pub current_price: String,
    pub sector: String,
    pub market_cap: String,
    pub scores: [ScoreView; 3],
    pub recommendation: String,
    pub recommendation_class: RecommendationClass,
    pub target_price: String,
    pub upside: String,
    pub risk_level: String,
    pub confidence: String,
    pub fundamentals: MetricList,
    pub technicals: MetricList,
}

impl AnalysisView {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let info = &result.stock_info;
        let rec = &result.recommendation;
        let fundamental = &rec.details.fundamental_analysis;
        let technical = &rec.details.technical_analysis;
        let legacy = &result.technical_indicators;

        let name = format::first_present([info.name.as_deref()]).unwrap_or(result.symbol.as_str());
        let recommendation = format::text_or(rec.recommendation.as_deref(), format::ANALYZING);

        let upside = format::first_present([rec.upside_potential])
            .map(|u| format!("{:.1}%", u))
            .unwrap_or_else(|| format::PENDING.to_string());

        let fundamentals = MetricList::collect(
            vec![
                (
                    "P/E Ratio",
                    format::first_present([fundamental.number("pe_analysis", "ratio"), info.pe_ratio]),
                    FormatKind::Ratio,
                ),
                (
                    "ROE",
                    format::first_present([fundamental.number("roe_analysis", "ratio"), info.roe]),
                    FormatKind::Percentage,
                ),
                (
                    "Debt/Equity",
                    format::first_present([
                        fundamental.number("debt_analysis", "ratio"),
                        info.debt_to_equity,
                    ]),
                    FormatKind::Ratio,
                ),
                (
                    "Profit Margin",
                    format::first_present([
                        fundamental.number("margin_analysis", "ratio"),
                        info.profit_margin,
                    ]),
                    FormatKind::Percentage,
                ),
                (
                    "P/B Ratio",
                    format::first_present([fundamental.number("pb_analysis", "ratio"), info.price_to_book]),
                    FormatKind::Ratio,
                ),
            ],
            FUNDAMENTAL_PENDING,
        );

        let technicals = MetricList::collect(
            vec![
                (
                    "RSI",
                    format::first_present([technical.number("rsi_analysis", "value"), legacy.rsi]),
                    FormatKind::Decimal,
                ),
                (
                    "MACD",
                    format::first_present([technical.number("macd_analysis", "macd"), legacy.macd]),
                    FormatKind::Decimal,
                ),
                (
                    "SMA 20",
                    format::first_present([technical.number("ma_analysis", "sma_20"), legacy.sma_20]),
                    FormatKind::Price,
                ),
                (
                    "SMA 50",
                    format::first_present([technical.number("ma_analysis", "sma_50"), legacy.sma_50]),
                    FormatKind::Price,
                ),
                (
                    "SMA 200",
                    format::first_present([technical.number("ma_analysis", "sma_200"), legacy.sma_200]),
                    FormatKind::Price,
                ),
                (
                    "Volume Ratio",
                    format::first_present([technical.number("volume_analysis", "ratio"), Some(1.0)]),
                    FormatKind::Ratio,
                ),
            ],
            TECHNICAL_PENDING,
        );

        Self {
            title: format!("{} - {}", result.symbol, name),
            current_price: format::price_or(
                format::first_positive([info.current_price, rec.current_price]),
                format::PRICE_PENDING,
            ),
            sector: format::text_or(info.sector.as_deref(), format::UNCLASSIFIED),
            market_cap: format::format_market_cap(info.market_cap),
            scores: [
                ScoreView { label: "Overall", score: score_or_zero(rec.overall_score) },
                ScoreView { label: "Fundamental", score: score_or_zero(rec.fundamental_score) },
                ScoreView { label: "Technical", score: score_or_zero(rec.technical_score) },
            ],
            recommendation_class: RecommendationClass::from_label(&recommendation),
            recommendation,
            target_price: format::price_or(
                format::first_present([info.target_price, rec.target_price]),
                format::PENDING,
            ),
            upside,
            risk_level: format::text_or(rec.risk_level.as_deref(), format::ASSESSING),
            confidence: format::text_or(rec.confidence.as_deref(), format::ASSESSING),
            fundamentals,
            technicals,
        }
    }

    /// Plain-text rendering, used by the headless `analyze` command
    pub fn summary_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            components::heading(&self.title),
            components::metric_line("Price", self.current_price.clone()),
            components::metric_line("Sector", self.sector.clone()),
            components::metric_line("Market Cap", self.market_cap.clone()),
        ];
        for score in &self.scores {
            lines.push(components::metric_line(
                &format!("{} Score", score.label),
                format::format_score(score.score),
            ));
        }
        lines.extend(self.recommendation_lines());
        lines.push(components::heading("Fundamentals"));
        lines.extend(self.fundamentals.lines());
        lines.push(components::heading("Technicals"));
        lines.extend(self.technicals.lines());
        lines
    }

    fn recommendation_lines(&self) -> Vec<Line<'static>> {
        vec![
            Line::from(vec![
                Span::styled("Recommendation: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    self.recommendation.clone(),
                    Style::default()
                        .fg(self.recommendation_class.color())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            components::metric_line("Target Price", self.target_price.clone()),
            components::metric_line("Upside", self.upside.clone()),
            components::metric_line("Risk", self.risk_level.clone()),
            components::metric_line("Confidence", self.confidence.clone()),
        ]
    }
}

fn score_or_zero(score: Option<f64>) -> f64 {
    format::first_present([score]).unwrap_or(0.0)
}

/// Analysis tab: symbol input plus the last analysis
#[derive(Debug, Default)]
pub struct AnalysisPanel {
    pub search_input: String,
    pub editing: bool,
    pub loading: bool,
    pub view: Option<AnalysisView>,
}

impl AnalysisPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn render_input(&self, f: &mut Frame, area: Rect) {
        let (text, style) = if self.editing {
            (format!("{}_", self.search_input), Style::default().fg(Color::Yellow))
        } else if self.search_input.is_empty() {
            ("Press / to enter a symbol".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (self.search_input.clone(), Style::default().fg(Color::White))
        };
        let input = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title("Symbol"));
        f.render_widget(input, area);
    }

    fn render_view(&self, f: &mut Frame, area: Rect, view: &AnalysisView) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6), // Header
                Constraint::Length(3), // Scores
                Constraint::Min(0),    // Details
            ])
            .split(area);

        let header = Paragraph::new(vec![
            components::heading(&view.title),
            components::metric_line("Price", view.current_price.clone()),
            components::metric_line("Sector", view.sector.clone()),
            components::metric_line("Market Cap", view.market_cap.clone()),
        ])
        .block(Block::default().borders(Borders::ALL).title("Stock"));
        f.render_widget(header, rows[0]);

        let score_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(rows[1]);
        for (score, slot) in view.scores.iter().zip(score_areas.iter()) {
            components::render_score_gauge(f, *slot, score.label, score.score);
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(34),
                Constraint::Percentage(33),
                Constraint::Percentage(33),
            ])
            .split(rows[2]);

        f.render_widget(
            Paragraph::new(view.recommendation_lines())
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Recommendation")),
            columns[0],
        );
        f.render_widget(
            Paragraph::new(view.fundamentals.lines())
                .block(Block::default().borders(Borders::ALL).title("Fundamentals")),
            columns[1],
        );
        f.render_widget(
            Paragraph::new(view.technicals.lines())
                .block(Block::default().borders(Borders::ALL).title("Technicals")),
            columns[2],
        );
    }
}

impl View for AnalysisPanel {
    fn render(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        self.render_input(f, chunks[0]);

        if self.loading {
            components::render_loading_indicator(f, chunks[1], "Analysis", "Analyzing...");
        } else if let Some(view) = &self.view {
            self.render_view(f, chunks[1], view);
        } else {
            let empty = Paragraph::new("Enter a symbol to run an analysis")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Analysis"));
            f.render_widget(empty, chunks[1]);
        }
    }

    fn get_title(&self) -> String {
        "Analysis".to_string()
    }

    fn get_status(&self) -> String {
        if self.editing {
            "Enter analyze • Esc cancel".to_string()
        } else {
            "/ symbol • a add to watchlist • o open report • p download report".to_string()
        }
    }

    fn is_editing(&self) -> bool {
        self.editing
    }
}
