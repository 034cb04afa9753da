use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::format::{self, FormatKind};
use crate::models::{StockQuote, Symbol};
use crate::row_fetcher::RowId;
use crate::ui::{components, View};

/// Price, P/E and sector of a card once its lookup returns
#[derive(Debug, Clone, PartialEq)]
pub enum CardInfo {
    Loading,
    Loaded {
        price: String,
        pe_ratio: String,
        sector: String,
    },
}

impl CardInfo {
    pub fn from_quote(quote: &StockQuote) -> Self {
        CardInfo::Loaded {
            price: format::price_or(quote.current_price, format::NOT_AVAILABLE),
            pe_ratio: format::first_present([quote.pe_ratio])
                .map(|pe| format::format_value(Some(pe), FormatKind::Ratio))
                .unwrap_or_else(|| format::NOT_AVAILABLE.to_string()),
            sector: format::text_or(quote.sector.as_deref(), format::NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistCard {
    pub row: RowId,
    pub symbol: Symbol,
    pub info: CardInfo,
}

/// Watchlist tab: one card per watched symbol
#[derive(Debug, Default)]
pub struct WatchlistPanel {
    pub cards: Vec<WatchlistCard>,
    pub selected: usize,
    pub batch_running: bool,
}

impl WatchlistPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every card; the previous rows are gone after this
    pub fn replace_cards(&mut self, cards: Vec<WatchlistCard>) {
        self.cards = cards;
        if self.selected >= self.cards.len() {
            self.selected = self.cards.len().saturating_sub(1);
        }
    }

    /// Fill a card if its row still exists; returns false for a stale row
    pub fn fill(&mut self, row: RowId, info: CardInfo) -> bool {
        match self.cards.iter_mut().find(|card| card.row == row) {
            Some(card) => {
                card.info = info;
                true
            }
            None => false,
        }
    }

    pub fn card(&self, symbol: &Symbol) -> Option<&WatchlistCard> {
        self.cards.iter().find(|card| &card.symbol == symbol)
    }

    pub fn selected_symbol(&self) -> Option<&Symbol> {
        self.cards.get(self.selected).map(|card| &card.symbol)
    }

    pub fn select_next(&mut self) {
        if !self.cards.is_empty() {
            self.selected = (self.selected + 1) % self.cards.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.cards.is_empty() {
            self.selected = if self.selected == 0 {
                self.cards.len() - 1
            } else {
                self.selected - 1
            };
        }
    }

    pub fn card_line(card: &WatchlistCard) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!("{:<10}", card.symbol),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )];
        match &card.info {
            CardInfo::Loading => {
                spans.push(Span::styled(format::LOADING, Style::default().fg(Color::DarkGray)));
            }
            CardInfo::Loaded { price, pe_ratio, sector } => {
                spans.push(Span::raw(format!("Price: {:<12}", price)));
                spans.push(Span::raw(format!("P/E: {:<10}", pe_ratio)));
                spans.push(Span::styled(format!("Sector: {}", sector), Style::default().fg(Color::Gray)));
            }
        }
        Line::from(spans)
    }
}

impl View for WatchlistPanel {
    fn render(&self, f: &mut Frame, area: Rect) {
        let title = format!("Watchlist ({})", self.cards.len());

        if self.cards.is_empty() {
            let empty = Paragraph::new(vec![
                components::dimmed("Your watchlist is empty."),
                components::dimmed("Analyze a stock and press a to add it."),
            ])
            .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .cards
            .iter()
            .map(|card| ListItem::new(Self::card_line(card)))
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        f.render_stateful_widget(list, area, &mut state);
    }

    fn get_title(&self) -> String {
        "Watchlist".to_string()
    }

    fn get_status(&self) -> String {
        if self.batch_running {
            "Batch analysis running...".to_string()
        } else {
            "↑/↓ select • d remove • b batch analyze • r reload".to_string()
        }
    }
}
