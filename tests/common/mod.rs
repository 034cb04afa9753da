//! Common test utilities and helpers

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

use stock_dashboard::api::AnalysisClient;
use stock_dashboard::controller::DashboardController;
use stock_dashboard::models::Symbol;
use stock_dashboard::ui::reports::{save_pdf_in, ReportOpener};

/// What the dashboard asked the opener to do
#[derive(Debug, Clone, PartialEq)]
pub enum OpenerCall {
    Url(String),
    Markup { symbol: String, markup: String },
    SavedPdf(PathBuf),
}

/// Opener that records calls instead of launching a viewer; PDFs are really saved
#[derive(Clone)]
pub struct RecordingOpener {
    calls: Arc<Mutex<Vec<OpenerCall>>>,
    download_dir: PathBuf,
}

impl RecordingOpener {
    pub fn new(download_dir: &Path) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            download_dir: download_dir.to_path_buf(),
        }
    }

    pub fn calls(&self) -> Vec<OpenerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: OpenerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ReportOpener for RecordingOpener {
    fn open_url(&mut self, url: &Url) -> Result<()> {
        self.record(OpenerCall::Url(url.to_string()));
        Ok(())
    }

    fn open_markup(&mut self, symbol: &Symbol, markup: &str) -> Result<()> {
        self.record(OpenerCall::Markup {
            symbol: symbol.to_string(),
            markup: markup.to_string(),
        });
        Ok(())
    }

    fn save_pdf(&mut self, symbol: &Symbol, bytes: &[u8]) -> Result<PathBuf> {
        let path = save_pdf_in(&self.download_dir, symbol, bytes)?;
        self.record(OpenerCall::SavedPdf(path.clone()));
        Ok(path)
    }
}

/// A controller wired to a mock analysis service
pub struct TestDashboard {
    pub server: MockServer,
    pub controller: DashboardController,
    pub opener: RecordingOpener,
    pub download_dir: TempDir,
}

impl TestDashboard {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let download_dir = tempfile::tempdir().expect("Failed to create download dir");
        let opener = RecordingOpener::new(download_dir.path());
        let controller = controller_for(&server.uri(), opener.clone());

        Self {
            server,
            controller,
            opener,
            download_dir,
        }
    }

    /// Message of the notification currently shown
    pub fn notification(&self) -> Option<String> {
        self.controller.notification().map(|n| n.message.clone())
    }

    pub fn logged(&self, message: &str) -> bool {
        self.controller
            .system
            .log
            .recent(usize::MAX)
            .any(|entry| entry.message == message)
    }
}

/// Controller against any base URL, e.g. a closed port
pub fn controller_for(base: &str, opener: RecordingOpener) -> DashboardController {
    let client = AnalysisClient::with_timeout(
        Url::parse(base).expect("Invalid base URL"),
        Duration::from_secs(5),
    )
    .expect("Failed to build client");
    DashboardController::new(Arc::new(client), Box::new(opener), Duration::from_secs(5))
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("Invalid symbol")
}

/// Backend payloads
pub mod fixtures {
    use serde_json::{json, Value};

    /// Complete analysis as the service returns it
    pub fn analysis(symbol: &str) -> Value {
        json!({
            "symbol": symbol,
            "stock_info": {
                "name": "Apple Inc.",
                "sector": "Technology",
                "current_price": 189.5,
                "market_cap": 2.95e12,
                "pe_ratio": 29.4
            },
            "recommendation": {
                "overall_score": 78.4,
                "fundamental_score": 72.0,
                "technical_score": 81.5,
                "recommendation": "Buy",
                "current_price": 189.5,
                "target_price": 210.0,
                "upside_potential": 10.82,
                "risk_level": "Medium",
                "confidence": "High",
                "details": {
                    "fundamental_analysis": {"roe_analysis": {"ratio": 0.156}},
                    "technical_analysis": {"rsi_analysis": {"value": 58.21}}
                }
            },
            "technical_indicators": {"rsi": 57.0, "macd": 1.3}
        })
    }

    pub fn quote(price: f64) -> Value {
        json!({
            "name": "Quoted Corp",
            "current_price": price,
            "pe_ratio": 21.5,
            "sector": "Technology"
        })
    }

    pub fn economic() -> Value {
        json!({
            "GDP": {"value": "2.4%"},
            "UNEMPLOYMENT": {"value": 3.9}
        })
    }

    pub fn sectors() -> Value {
        json!({
            "Technology": {"change_percent": 1.25},
            "Energy": {"change_percent": -0.8}
        })
    }
}

/// Logging utilities for tests
pub mod logging {
    use tracing::info;

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }
}
