use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::format;
use crate::models::{CacheStats, DataSource, DataSourceStats};
use crate::ui::dashboard::PanelState;
use crate::ui::state::{ActivityLog, LogLevel};
use crate::ui::{components, View};

const LOG_LINES: usize = 50;

/// System tab: backend cache, upstream data sources and the activity log
#[derive(Debug, Default)]
pub struct SystemPanel {
    pub cache: PanelState<CacheStats>,
    pub sources: PanelState<DataSourceStats>,
    pub selected_source: usize,
    pub log: ActivityLog,
}

impl SystemPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sources(&mut self, stats: DataSourceStats) {
        if self.selected_source >= stats.sources.len() {
            self.selected_source = stats.sources.len().saturating_sub(1);
        }
        self.sources = PanelState::Ready(stats);
    }

    pub fn selected_source(&self) -> Option<&DataSource> {
        match &self.sources {
            PanelState::Ready(stats) => stats.sources.get(self.selected_source),
            _ => None,
        }
    }

    pub fn select_next(&mut self) {
        if let PanelState::Ready(stats) = &self.sources {
            if !stats.sources.is_empty() {
                self.selected_source = (self.selected_source + 1) % stats.sources.len();
            }
        }
    }

    pub fn select_previous(&mut self) {
        if let PanelState::Ready(stats) = &self.sources {
            if !stats.sources.is_empty() {
                self.selected_source = self
                    .selected_source
                    .checked_sub(1)
                    .unwrap_or(stats.sources.len() - 1);
            }
        }
    }

    pub fn cache_lines(&self) -> Vec<Line<'static>> {
        let stats = match &self.cache {
            PanelState::Loading => return vec![components::dimmed(format::LOADING)],
            PanelState::Failed => {
                return vec![Line::from(Span::styled(format::LOAD_FAILED, Style::default().fg(Color::Red)))]
            }
            PanelState::Ready(stats) => stats,
        };

        let mut lines = vec![
            components::metric_line("Entries", stats.total_entries.to_string()),
            components::metric_line("Hit rate", format::text_or(stats.hit_rate.as_deref(), format::NOT_AVAILABLE)),
            components::metric_line("Hits / misses", format!("{} / {}", stats.hits, stats.misses)),
            components::metric_line("Sets / deletes", format!("{} / {}", stats.sets, stats.deletes)),
            components::metric_line("Expirations", stats.expirations.to_string()),
        ];
        if !stats.cache_types.is_empty() {
            lines.push(components::heading("By type"));
            for (kind, count) in &stats.cache_types {
                lines.push(components::metric_line(kind, count.to_string()));
            }
        }
        lines
    }

    pub fn source_lines(&self) -> Vec<Line<'static>> {
        let stats = match &self.sources {
            PanelState::Loading => return vec![components::dimmed(format::LOADING)],
            PanelState::Failed => {
                return vec![Line::from(Span::styled(format::LOAD_FAILED, Style::default().fg(Color::Red)))]
            }
            PanelState::Ready(stats) => stats,
        };

        if let Some(message) = &stats.message {
            return vec![components::dimmed(message)];
        }

        let mut lines = vec![
            components::metric_line(
                "Requests",
                format!(
                    "{} ({} ok, {} failed)",
                    stats.total_requests, stats.successful_requests, stats.failed_requests
                ),
            ),
            components::metric_line("Success rate", success_rate(stats.success_rate)),
        ];
        for (index, source) in stats.sources.iter().enumerate() {
            let marker = if index == self.selected_source { "> " } else { "  " };
            let (state, color) = if source.enabled {
                ("on ", Color::Green)
            } else {
                ("off", Color::Red)
            };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(format!(" {:<20}", source.name)),
                Span::styled(success_rate(source.success_rate), Style::default().fg(Color::Gray)),
            ]));
        }
        lines
    }
}

/// Rates arrive as a 0..1 fraction
fn success_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}%", r * 100.0))
        .unwrap_or_else(|| format::NOT_AVAILABLE.to_string())
}

fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Info => Style::default().fg(Color::White),
        LogLevel::Success => Style::default().fg(Color::Green),
        LogLevel::Warning => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red),
    }
}

impl View for SystemPanel {
    fn render(&self, f: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        f.render_widget(
            Paragraph::new(self.cache_lines())
                .block(Block::default().borders(Borders::ALL).title("Cache")),
            columns[0],
        );
        f.render_widget(
            Paragraph::new(self.source_lines())
                .block(Block::default().borders(Borders::ALL).title("Data Sources")),
            columns[1],
        );

        let items: Vec<ListItem> = self
            .log
            .recent(LOG_LINES)
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        entry.timestamp.format("%H:%M:%S ").to_string(),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(entry.message.clone(), level_style(entry.level)),
                ]))
            })
            .collect();
        f.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title("Activity")),
            rows[1],
        );
    }

    fn get_title(&self) -> String {
        "System".to_string()
    }

    fn get_status(&self) -> String {
        "r reload • c clear cache • i invalidate symbol • ↑/↓ source • t toggle".to_string()
    }
}
