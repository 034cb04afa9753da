use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::api::ApiError;
use crate::models::{
    AnalysisResult, CacheStats, DataSourceStats, EconomicIndicators, ReportDocument,
    SectorPerformance, StockQuote, Symbol,
};
use crate::row_fetcher::RowId;

const MAX_LOG_MESSAGES: usize = 100;

/// Ordered set of watched symbols, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Watchlist {
    symbols: Vec<Symbol>,
}

impl Watchlist {
    /// Build from backend order, keeping the first occurrence of each symbol
    pub fn from_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut list = Self::default();
        for symbol in symbols {
            list.insert(symbol);
        }
        list
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    /// Append a symbol; returns false if it was already present
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        if self.contains(&symbol) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    pub fn remove(&mut self, symbol: &Symbol) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|s| s != symbol);
        self.symbols.len() != before
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// First `limit` symbols and the number left out
    pub fn preview(&self, limit: usize) -> (&[Symbol], usize) {
        let shown = self.symbols.len().min(limit);
        (&self.symbols[..shown], self.symbols.len() - shown)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The dashboard's client-side state: the analysis on screen and the watchlist
#[derive(Debug, Default)]
pub struct ViewStore {
    current_analysis: Option<AnalysisResult>,
    watchlist: Watchlist,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_analysis(&self) -> Option<&AnalysisResult> {
        self.current_analysis.as_ref()
    }

    pub fn current_symbol(&self) -> Option<&Symbol> {
        self.current_analysis.as_ref().map(|a| &a.symbol)
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    /// Replace the analysis wholesale
    pub fn set_analysis(&mut self, analysis: AnalysisResult) {
        self.current_analysis = Some(analysis);
    }

    pub fn hydrate_watchlist(&mut self, symbols: Vec<Symbol>) {
        self.watchlist = Watchlist::from_symbols(symbols);
    }

    pub fn add_to_watchlist(&mut self, symbol: Symbol) -> bool {
        self.watchlist.insert(symbol)
    }

    pub fn remove_from_watchlist(&mut self, symbol: &Symbol) -> bool {
        self.watchlist.remove(symbol)
    }
}

/// Completion messages sent by request tasks back to the UI task
#[derive(Debug)]
pub enum StateUpdate {
    AnalysisLoaded {
        symbol: Symbol,
        result: Result<AnalysisResult, ApiError>,
    },
    WatchlistLoaded(Result<Vec<Symbol>, ApiError>),
    WatchlistAdded {
        symbol: Symbol,
        result: Result<Option<String>, ApiError>,
    },
    WatchlistRemoved {
        symbol: Symbol,
        result: Result<Option<String>, ApiError>,
    },
    /// Quote for one watchlist card
    RowInfoLoaded {
        row: RowId,
        symbol: Symbol,
        result: Result<StockQuote, ApiError>,
    },
    /// Quote for one dashboard preview row
    PreviewLoaded {
        row: RowId,
        symbol: Symbol,
        result: Result<StockQuote, ApiError>,
    },
    BatchAnalyzed(Result<serde_json::Value, ApiError>),
    EconomicLoaded(Result<EconomicIndicators, ApiError>),
    SectorsLoaded(Result<SectorPerformance, ApiError>),
    ReportLoaded {
        symbol: Symbol,
        result: Result<String, ApiError>,
    },
    ReportDownloaded {
        symbol: Symbol,
        result: Result<ReportDocument, ApiError>,
    },
    CacheStatsLoaded(Result<CacheStats, ApiError>),
    DataSourcesLoaded(Result<DataSourceStats, ApiError>),
    /// Result of a maintenance action (cache clear, invalidation, source toggle)
    MaintenanceDone {
        action: String,
        result: Result<Option<String>, ApiError>,
    },
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Log message with timestamp
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

/// Recent user-relevant events, shown on the System tab
#[derive(Debug, Default)]
pub struct ActivityLog {
    messages: VecDeque<LogMessage>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a log message
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        self.messages.push_back(LogMessage {
            timestamp: Local::now(),
            level,
            message: message.into(),
        });

        // Keep only last 100 log messages
        while self.messages.len() > MAX_LOG_MESSAGES {
            self.messages.pop_front();
        }
    }

    /// Get recent log messages (last N)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &LogMessage> {
        let start = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(start)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
