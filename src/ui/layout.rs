use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

/// Top-level tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Analysis,
    Watchlist,
    Reports,
    System,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Analysis, Tab::Watchlist, Tab::Reports, Tab::System];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Analysis => "Analysis",
            Tab::Watchlist => "Watchlist",
            Tab::Reports => "Reports",
            Tab::System => "System",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Tab for a `1`-`5` shortcut
    pub fn from_digit(digit: char) -> Option<Tab> {
        let index = digit.to_digit(10)? as usize;
        index.checked_sub(1).and_then(|i| Tab::ALL.get(i).copied())
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn previous(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Centralized layout management to prevent conflicts between views
pub struct TuiLayout {
    pub tab_bar: Rect,
    pub content: Rect,
    pub status_bar: Rect,
}

impl TuiLayout {
    /// Create a new layout from the given area
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tab bar
                Constraint::Min(0),    // Content
                Constraint::Length(4), // Status bar
            ])
            .split(area);

        Self {
            tab_bar: chunks[0],
            content: chunks[1],
            status_bar: chunks[2],
        }
    }

    /// Render the tab bar
    pub fn render_tab_bar(&self, f: &mut Frame, selected: Tab) {
        let titles: Vec<String> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(i, tab)| format!("{} {}", i + 1, tab.title()))
            .collect();

        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Stock Analysis Dashboard"))
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .select(selected.index());

        f.render_widget(tabs, self.tab_bar);
    }

    /// Render key hints, connectivity and the active view's status
    pub fn render_status_bar(&self, f: &mut Frame, online: bool, status_text: &str) {
        let (connection, color) = if online {
            ("online", Color::Green)
        } else {
            ("offline", Color::Red)
        };

        let status_content = vec![
            Line::from(vec![
                Span::styled("Tab", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(" switch views • ", Style::default().fg(Color::Gray)),
                Span::styled("x", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(" close notification • ", Style::default().fg(Color::Gray)),
                Span::styled("Q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(" quit • ", Style::default().fg(Color::Gray)),
                Span::styled(connection, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            ]),
            Line::from(vec![Span::styled(status_text.to_string(), Style::default().fg(Color::Cyan))]),
        ];

        let paragraph = Paragraph::new(status_content)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, self.status_bar);
    }
}
