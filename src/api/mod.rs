use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::models::{
    AnalysisResult, CacheStats, DataSourceStats, EconomicIndicators, ReportDocument,
    SectorPerformance, StockQuote, Symbol,
};

pub mod analysis_client;
pub use analysis_client::AnalysisClient;

/// Failures of a single backend request
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service could not be reached or the body could not be read
    #[error("could not reach the analysis service: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-2xx response; `message` is the backend's `error` text when it sent one
    #[error("{message}")]
    Backend { status: StatusCode, message: String },

    #[error("unexpected response from the analysis service: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint for {0}")]
    Endpoint(String),
}

impl ApiError {
    /// Text shown after the action prefix in a notification.
    ///
    /// Backend errors are surfaced verbatim, transport errors stay generic.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "could not reach the analysis service".to_string(),
            ApiError::Backend { message, .. } => message.clone(),
            ApiError::Decode(_) => "unexpected response from the analysis service".to_string(),
            ApiError::Endpoint(_) => "invalid request".to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The analysis backend as seen by the dashboard
#[async_trait::async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, symbol: &Symbol) -> ApiResult<AnalysisResult>;

    async fn watchlist(&self) -> ApiResult<Vec<Symbol>>;
    async fn add_to_watchlist(&self, symbol: &Symbol) -> ApiResult<Option<String>>;
    async fn remove_from_watchlist(&self, symbol: &Symbol) -> ApiResult<Option<String>>;
    async fn stock_info(&self, symbol: &Symbol) -> ApiResult<StockQuote>;
    async fn batch_analyze(&self, symbols: &[Symbol]) -> ApiResult<serde_json::Value>;

    async fn economic_indicators(&self) -> ApiResult<EconomicIndicators>;
    async fn sector_performance(&self) -> ApiResult<SectorPerformance>;

    /// Address of the rendered report, for opening outside the dashboard
    fn report_url(&self, symbol: &Symbol) -> ApiResult<Url>;
    async fn report_markup(&self, symbol: &Symbol) -> ApiResult<String>;
    async fn report_document(&self, symbol: &Symbol) -> ApiResult<ReportDocument>;

    async fn cache_stats(&self) -> ApiResult<CacheStats>;
    async fn clear_cache(&self) -> ApiResult<Option<String>>;
    async fn invalidate_cache(&self, symbol: &Symbol) -> ApiResult<Option<String>>;
    async fn data_sources(&self) -> ApiResult<DataSourceStats>;
    async fn toggle_data_source(&self, name: &str, enabled: bool) -> ApiResult<Option<String>>;
}
