use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub mod lenient;

use lenient::{lenient_number, lenient_text};

/// Symbol validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("Please enter a stock symbol")]
    Empty,
}

/// Ticker symbol, trimmed and upper-cased
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize raw user or backend input into a symbol
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(SymbolError::Empty);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

// ============================================================================
// Analysis payload
// ============================================================================

/// Full analysis response for one symbol
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalysisResult {
    pub symbol: Symbol,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock_info: StockInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation: Recommendation,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical_indicators: TechnicalIndicators,
}

/// Descriptive and fundamental fields
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StockInfo {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub roe: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub debt_to_equity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub profit_margin: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price_to_book: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub target_price: Option<f64>,
}

/// Derived scores and the investment call
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Recommendation {
    #[serde(default, deserialize_with = "lenient_number")]
    pub overall_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fundamental_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub technical_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub target_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub upside_potential: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: AnalysisDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnalysisDetails {
    #[serde(default, deserialize_with = "null_as_default")]
    pub fundamental_analysis: AnalysisSection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical_analysis: AnalysisSection,
}

/// A `details` section holding `{metric}_analysis` objects of arbitrary shape
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AnalysisSection(pub Map<String, Value>);

impl AnalysisSection {
    /// Read `{metric}.{field}` as a finite number
    pub fn number(&self, metric: &str, field: &str) -> Option<f64> {
        self.0
            .get(metric)
            .and_then(|analysis| analysis.get(field))
            .and_then(lenient::value_as_number)
    }
}

/// Legacy flat indicator fields at the top level of the payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TechnicalIndicators {
    #[serde(default, deserialize_with = "lenient_number")]
    pub rsi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub macd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sma_20: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sma_50: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sma_200: Option<f64>,
}

/// Per-symbol quote from `/api/stocks/{symbol}/info`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StockQuote {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_cap: Option<f64>,
}

// ============================================================================
// Watchlist and market summary payloads
// ============================================================================

/// The backend stores the watchlist either as a bare array or wrapped in `symbols`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WatchlistPayload {
    List(Vec<Value>),
    Wrapped {
        #[serde(default)]
        symbols: Vec<Value>,
    },
}

impl WatchlistPayload {
    /// Valid symbols in backend order; blanks and non-strings are skipped
    pub fn into_symbols(self) -> Vec<Symbol> {
        let raw = match self {
            WatchlistPayload::List(items) => items,
            WatchlistPayload::Wrapped { symbols } => symbols,
        };
        raw.iter()
            .filter_map(Value::as_str)
            .filter_map(|s| Symbol::parse(s).ok())
            .collect()
    }
}

/// Request body for watchlist additions
#[derive(Debug, Serialize)]
pub struct WatchlistRequest<'a> {
    pub symbol: &'a Symbol,
}

/// Request body for batch analysis
#[derive(Debug, Serialize)]
pub struct BatchAnalyzeRequest<'a> {
    pub symbols: &'a [Symbol],
}

/// `{message}` acknowledgement returned by mutating endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Indicator value: the backend mixes numbers and preformatted strings
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Number(n) => write!(f, "{}", n),
            IndicatorValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EconomicIndicator {
    pub code: String,
    pub value: Option<IndicatorValue>,
}

/// Economic indicators in backend order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EconomicIndicators(pub Vec<EconomicIndicator>);

impl<'de> Deserialize<'de> for EconomicIndicators {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let indicators = map
            .into_iter()
            .map(|(code, entry)| {
                let value = match entry.get("value") {
                    Some(Value::Number(n)) => n
                        .as_f64()
                        .filter(|v| v.is_finite())
                        .map(IndicatorValue::Number),
                    Some(Value::String(s)) => Some(IndicatorValue::Text(s.clone())),
                    _ => None,
                };
                EconomicIndicator { code, value }
            })
            .collect();
        Ok(EconomicIndicators(indicators))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorChange {
    pub sector: String,
    pub change_percent: Option<f64>,
}

/// Sector performance in backend order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorPerformance(pub Vec<SectorChange>);

impl<'de> Deserialize<'de> for SectorPerformance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let sectors = map
            .into_iter()
            .map(|(sector, entry)| SectorChange {
                change_percent: entry
                    .get("change_percent")
                    .and_then(lenient::value_as_number),
                sector,
            })
            .collect();
        Ok(SectorPerformance(sectors))
    }
}

// ============================================================================
// Backend maintenance payloads
// ============================================================================

/// `/api/cache/stats`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CacheStats {
    #[serde(default)]
    pub total_entries: u64,
    #[serde(default)]
    pub cache_types: Map<String, Value>,
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub misses: u64,
    #[serde(default)]
    pub sets: u64,
    #[serde(default)]
    pub deletes: u64,
    #[serde(default)]
    pub expirations: u64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub hit_rate: Option<String>,
}

/// One upstream data source of the backend collector
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataSource {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient_number")]
    pub priority: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub success_rate: Option<f64>,
}

/// `/api/data/sources`; a bare `{message}` means the collector is unavailable
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DataSourceStats {
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub successful_requests: u64,
    #[serde(default)]
    pub failed_requests: u64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub sources: Vec<DataSource>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Report body returned by the download endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum ReportDocument {
    Pdf(Vec<u8>),
    Markup(String),
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: Url,
    pub request_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub notification_secs: u64,
    pub download_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let api_base = std::env::var("STOCK_DASHBOARD_API_BASE")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        Ok(Config {
            api_base: Self::parse_api_base(&api_base)?,
            request_timeout_secs: env_number("STOCK_DASHBOARD_TIMEOUT_SECS", 30),
            refresh_interval_secs: env_number("STOCK_DASHBOARD_REFRESH_SECS", 300),
            notification_secs: env_number("STOCK_DASHBOARD_NOTIFICATION_SECS", 5),
            download_dir: std::env::var("STOCK_DASHBOARD_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            log_file: std::env::var("STOCK_DASHBOARD_LOG_FILE").ok().map(PathBuf::from),
            log_filter: std::env::var("STOCK_DASHBOARD_LOG")
                .unwrap_or_else(|_| "stock_dashboard=info".to_string()),
        })
    }

    /// Parse a backend base URL; endpoint paths are appended to it
    pub fn parse_api_base(raw: &str) -> anyhow::Result<Url> {
        let url = Url::parse(raw.trim())
            .map_err(|e| anyhow::anyhow!("Invalid STOCK_DASHBOARD_API_BASE '{}': {}", raw, e))?;
        if url.cannot_be_a_base() {
            return Err(anyhow::anyhow!("STOCK_DASHBOARD_API_BASE '{}' cannot be a base URL", raw));
        }
        Ok(url)
    }
}

fn env_number(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
