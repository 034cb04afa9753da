use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{AnalysisBackend, ApiError, ApiResult};
use crate::models::{
    AnalysisResult, BatchAnalyzeRequest, CacheStats, Config, DataSourceStats, EconomicIndicators,
    MessageResponse, ReportDocument, SectorPerformance, StockQuote, Symbol, WatchlistPayload,
    WatchlistRequest,
};

/// `{error}` body of a failed request
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the stock analysis backend
pub struct AnalysisClient {
    client: Client,
    base: Url,
}

impl AnalysisClient {
    /// Create a new client for the configured backend
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_timeout(config.api_base.clone(), Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_timeout(base: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stock-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, encoding each one
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Endpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(ApiError::Transport)?;
        read_json(response).await
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> ApiResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        read_json(response).await
    }

    async fn message(&self, response: Response) -> ApiResult<Option<String>> {
        let body: MessageResponse = read_json(response).await?;
        Ok(body.message)
    }
}

/// Read a body, turning non-2xx statuses into [`ApiError::Backend`]
async fn read_body(response: Response) -> ApiResult<(Option<String>, Vec<u8>)> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await.map_err(ApiError::Transport)?.to_vec();

    if !status.is_success() {
        return Err(backend_error(status, &body));
    }
    Ok((content_type, body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let (_, body) = read_body(response).await?;
    Ok(serde_json::from_slice(&body)?)
}

fn backend_error(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "request failed with status {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )
        });
    warn!("Backend returned {}: {}", status, message);
    ApiError::Backend { status, message }
}

fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/pdf"))
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl AnalysisBackend for AnalysisClient {
    async fn analyze(&self, symbol: &Symbol) -> ApiResult<AnalysisResult> {
        self.get_json(&["api", "analyze", symbol.as_str()]).await
    }

    async fn watchlist(&self) -> ApiResult<Vec<Symbol>> {
        let payload: WatchlistPayload = self.get_json(&["api", "watchlist"]).await?;
        Ok(payload.into_symbols())
    }

    async fn add_to_watchlist(&self, symbol: &Symbol) -> ApiResult<Option<String>> {
        let body: MessageResponse = self
            .post_json(&["api", "watchlist"], &WatchlistRequest { symbol })
            .await?;
        Ok(body.message)
    }

    async fn remove_from_watchlist(&self, symbol: &Symbol) -> ApiResult<Option<String>> {
        let url = self.endpoint(&["api", "watchlist", symbol.as_str()])?;
        debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await.map_err(ApiError::Transport)?;
        self.message(response).await
    }

    async fn stock_info(&self, symbol: &Symbol) -> ApiResult<StockQuote> {
        self.get_json(&["api", "stocks", symbol.as_str(), "info"]).await
    }

    async fn batch_analyze(&self, symbols: &[Symbol]) -> ApiResult<serde_json::Value> {
        self.post_json(&["api", "batch-analyze"], &BatchAnalyzeRequest { symbols })
            .await
    }

    async fn economic_indicators(&self) -> ApiResult<EconomicIndicators> {
        self.get_json(&["api", "market", "economic"]).await
    }

    async fn sector_performance(&self) -> ApiResult<SectorPerformance> {
        self.get_json(&["api", "market", "sectors"]).await
    }

    fn report_url(&self, symbol: &Symbol) -> ApiResult<Url> {
        self.endpoint(&["api", "reports", symbol.as_str()])
    }

    async fn report_markup(&self, symbol: &Symbol) -> ApiResult<String> {
        let url = self.report_url(symbol)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(ApiError::Transport)?;
        let (_, body) = read_body(response).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn report_document(&self, symbol: &Symbol) -> ApiResult<ReportDocument> {
        let url = self.endpoint(&["api", "reports", symbol.as_str(), "pdf"])?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(ApiError::Transport)?;
        let (content_type, body) = read_body(response).await?;

        if is_pdf(content_type.as_deref()) {
            Ok(ReportDocument::Pdf(body))
        } else {
            Ok(ReportDocument::Markup(String::from_utf8_lossy(&body).into_owned()))
        }
    }

    async fn cache_stats(&self) -> ApiResult<CacheStats> {
        self.get_json(&["api", "cache", "stats"]).await
    }

    async fn clear_cache(&self) -> ApiResult<Option<String>> {
        let body: MessageResponse = self
            .post_json(&["api", "cache", "clear"], &serde_json::json!({}))
            .await?;
        Ok(body.message)
    }

    async fn invalidate_cache(&self, symbol: &Symbol) -> ApiResult<Option<String>> {
        let body: MessageResponse = self
            .post_json(&["api", "cache", "invalidate", symbol.as_str()], &serde_json::json!({}))
            .await?;
        Ok(body.message)
    }

    async fn data_sources(&self) -> ApiResult<DataSourceStats> {
        self.get_json(&["api", "data", "sources"]).await
    }

    async fn toggle_data_source(&self, name: &str, enabled: bool) -> ApiResult<Option<String>> {
        let mut url = self.endpoint(&["api", "data", "sources", name, "toggle"])?;
        url.query_pairs_mut()
            .append_pair("enabled", if enabled { "true" } else { "false" });
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(ApiError::Transport)?;
        self.message(response).await
    }
}
