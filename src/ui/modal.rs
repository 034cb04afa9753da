use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::models::Symbol;

/// Action run by the controller when a dialog is confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    RemoveFromWatchlist(Symbol),
    ClearCache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub title: String,
    pub body: String,
    pub on_confirm: Option<ModalAction>,
}

/// Single modal dialog slot
#[derive(Debug, Default)]
pub struct Modal {
    dialog: Option<Dialog>,
    area: Option<Rect>,
}

impl Modal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, title: impl Into<String>, body: impl Into<String>, on_confirm: Option<ModalAction>) {
        self.dialog = Some(Dialog {
            title: title.into(),
            body: body.into(),
            on_confirm,
        });
    }

    /// Hide without running anything
    pub fn hide(&mut self) {
        self.dialog = None;
        self.area = None;
    }

    /// Hide and hand back the pending action, if any
    pub fn confirm(&mut self) -> Option<ModalAction> {
        let action = self.dialog.take().and_then(|d| d.on_confirm);
        self.area = None;
        action
    }

    pub fn is_visible(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Whether a click at (column, row) lands outside the last drawn dialog.
    /// Until the dialog has been drawn every click counts as inside.
    pub fn is_outside(&self, column: u16, row: u16) -> bool {
        self.area
            .is_some_and(|area| !area.contains(Position { x: column, y: row }))
    }

    /// Draw centred over `area`, remembering where it landed for hit tests
    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let Some(dialog) = &self.dialog else {
            return;
        };

        let popup = centered_rect(60, 30, area);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .margin(1)
            .split(popup);

        let hint = if dialog.on_confirm.is_some() {
            Line::from(vec![
                Span::styled("Enter/y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled(" confirm • ", Style::default().fg(Color::Gray)),
                Span::styled("Esc/n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(" cancel", Style::default().fg(Color::Gray)),
            ])
        } else {
            Line::from(Span::styled("Esc to close", Style::default().fg(Color::Gray)))
        };

        f.render_widget(Clear, popup);
        f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(dialog.title.clone()),
            popup,
        );
        f.render_widget(
            Paragraph::new(dialog.body.clone()).wrap(Wrap { trim: true }),
            chunks[0],
        );
        f.render_widget(Paragraph::new(hint), chunks[1]);

        self.area = Some(popup);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
