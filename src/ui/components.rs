/// Shared widgets for the dashboard panels
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::format;

/// Render a loading indicator
pub fn render_loading_indicator(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let loading = Paragraph::new(message.to_string())
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(loading, area);
}

/// Render a 0-100 score as a labelled bar
pub fn render_score_gauge(f: &mut Frame, area: Rect, label: &str, score: f64) {
    let color = if score >= 70.0 {
        Color::Green
    } else if score >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(label.to_string()))
        .gauge_style(Style::default().fg(color))
        .percent(format::score_bar_percent(score))
        .label(format::format_score(score));

    f.render_widget(gauge, area);
}

/// Signed percent span, green when non-negative and red otherwise
pub fn styled_percentage_change(value: f64) -> Span<'static> {
    let color = if value >= 0.0 { Color::Green } else { Color::Red };
    Span::styled(format::format_signed_percent(value), Style::default().fg(color))
}

/// `label: value` line with the label dimmed
pub fn metric_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::styled(value.into(), Style::default().fg(Color::White)),
    ])
}

pub fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

pub fn dimmed(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(Color::DarkGray)))
}

/// Render error message
pub fn render_error(f: &mut Frame, area: Rect, title: &str, error: &str) {
    let error_paragraph = Paragraph::new(error.to_string())
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(Color::Red));

    f.render_widget(error_paragraph, area);
}

/// Flatten lines into plain text, one per row
pub fn lines_to_text(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
