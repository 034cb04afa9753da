//! Dashboard controller
//!
//! Owns the view store, the tab panels and the overlays. User actions start
//! backend requests on spawned tasks; each task reports back with a
//! [`StateUpdate`] that is applied on the UI task by [`DashboardController::apply_update`],
//! so panel state is only ever touched from one place.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{AnalysisBackend, AnalysisClient, ApiError};
use crate::models::{Config, ReportDocument, Symbol};
use crate::row_fetcher::RowFetcher;
use crate::ui::analysis::{AnalysisPanel, AnalysisView};
use crate::ui::dashboard::{DashboardPanel, PanelState, PreviewRow, WatchlistPreview, PREVIEW_LIMIT};
use crate::ui::layout::Tab;
use crate::ui::modal::{Modal, ModalAction};
use crate::ui::notification::{Notification, Notifier, Severity};
use crate::ui::reports::{ReportOpener, ReportPanel, SystemOpener};
use crate::ui::state::{LogLevel, StateUpdate, ViewStore};
use crate::ui::system::SystemPanel;
use crate::ui::watchlist::{CardInfo, WatchlistCard, WatchlistPanel};

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred, please retry";
const ANALYZE_FIRST: &str = "Please analyze a stock first";

pub struct DashboardController {
    backend: Arc<dyn AnalysisBackend>,
    opener: Box<dyn ReportOpener>,
    store: ViewStore,
    notifier: Notifier,
    modal: Modal,
    active_tab: Tab,
    online: bool,

    pub analysis: AnalysisPanel,
    pub watchlist: WatchlistPanel,
    pub dashboard: DashboardPanel,
    pub reports: ReportPanel,
    pub system: SystemPanel,

    updates_tx: mpsc::UnboundedSender<StateUpdate>,
    updates_rx: mpsc::UnboundedReceiver<StateUpdate>,
    requests: Vec<JoinHandle<()>>,
    card_rows: RowFetcher,
    preview_rows: RowFetcher,
}

impl DashboardController {
    pub fn new(
        backend: Arc<dyn AnalysisBackend>,
        opener: Box<dyn ReportOpener>,
        notification_ttl: Duration,
    ) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            opener,
            store: ViewStore::new(),
            notifier: Notifier::new(notification_ttl),
            modal: Modal::new(),
            active_tab: Tab::Dashboard,
            online: true,
            analysis: AnalysisPanel::new(),
            watchlist: WatchlistPanel::new(),
            dashboard: DashboardPanel::new(),
            reports: ReportPanel::new(),
            system: SystemPanel::new(),
            updates_tx,
            updates_rx,
            requests: Vec::new(),
            card_rows: RowFetcher::new(),
            preview_rows: RowFetcher::new(),
        }
    }

    /// Controller over the configured HTTP backend and the desktop opener
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = AnalysisClient::new(config)?;
        info!("Using analysis service at {}", client.base_url());
        Ok(Self::new(
            Arc::new(client),
            Box::new(SystemOpener::new(config.download_dir.clone())),
            Duration::from_secs(config.notification_secs),
        ))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn store(&self) -> &ViewStore {
        &self.store
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifier.current()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut Modal {
        &mut self.modal
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Show a notification and mirror it into the activity log
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        let level = match severity {
            Severity::Info => LogLevel::Info,
            Severity::Success => LogLevel::Success,
            Severity::Warning => LogLevel::Warning,
            Severity::Error => LogLevel::Error,
        };
        self.system.log.push(level, message.clone());
        self.notifier.show(message, severity);
    }

    pub fn close_notification(&mut self) {
        self.notifier.close();
    }

    // ------------------------------------------------------------------
    // Task plumbing
    // ------------------------------------------------------------------

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = StateUpdate> + Send + 'static,
    {
        let tx = self.updates_tx.clone();
        self.requests.push(tokio::spawn(async move {
            // the receiver only goes away with the controller
            let _ = tx.send(request.await);
        }));
    }

    /// Wait for the next completed request
    pub async fn next_update(&mut self) -> Option<StateUpdate> {
        self.updates_rx.recv().await
    }

    /// Await every in-flight request and apply the results, until nothing is left
    pub async fn settle(&mut self) {
        loop {
            let mut handles: Vec<JoinHandle<()>> = self.requests.drain(..).collect();
            handles.extend(self.card_rows.drain_handles());
            handles.extend(self.preview_rows.drain_handles());

            for handle in handles {
                let _ = handle.await;
            }

            let mut applied = false;
            while let Ok(update) = self.updates_rx.try_recv() {
                self.apply_update(update);
                applied = true;
            }

            if !applied
                && self.requests.is_empty()
                && self.card_rows.in_flight() == 0
                && self.preview_rows.in_flight() == 0
            {
                break;
            }
        }
    }

    /// Periodic housekeeping: expire the notification and drop finished handles
    pub fn tick(&mut self, now: Instant) {
        self.notifier.expire(now);
        self.requests.retain(|handle| !handle.is_finished());
        self.card_rows.reap();
        self.preview_rows.reap();
    }

    // ------------------------------------------------------------------
    // Start-up and navigation
    // ------------------------------------------------------------------

    /// Hydrate the watchlist and load the dashboard
    pub fn bootstrap(&mut self) {
        self.load_watchlist();
        self.refresh_dashboard();
        self.dashboard.touch();
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        debug!("Switching to {:?}", tab);
        self.active_tab = tab;
        match tab {
            Tab::Dashboard => self.refresh_dashboard(),
            Tab::Watchlist => self.render_watchlist(),
            Tab::System => self.load_system(),
            Tab::Analysis | Tab::Reports => {}
        }
    }

    /// Refresh timer; only does work while the dashboard is showing
    pub fn on_refresh_tick(&mut self) {
        if self.active_tab != Tab::Dashboard {
            debug!("Refresh tick skipped, {:?} is active", self.active_tab);
            return;
        }
        self.refresh_dashboard();
        self.dashboard.touch();
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    pub fn analyze(&mut self, raw: &str) {
        let symbol = match Symbol::parse(raw) {
            Ok(symbol) => symbol,
            Err(e) => {
                self.notify(e.to_string(), Severity::Warning);
                return;
            }
        };

        info!("Analyzing {}", symbol);
        self.analysis.loading = true;
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::AnalysisLoaded {
                result: backend.analyze(&symbol).await,
                symbol,
            }
        });
    }

    // ------------------------------------------------------------------
    // Watchlist
    // ------------------------------------------------------------------

    pub fn load_watchlist(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { StateUpdate::WatchlistLoaded(backend.watchlist().await) });
    }

    /// Show the watchlist tab and load its cards from the backend
    pub fn open_watchlist(&mut self) {
        self.switch_tab(Tab::Watchlist);
        self.load_watchlist();
    }

    /// Add the analysed symbol to the watchlist
    pub fn add_to_watchlist(&mut self) {
        let Some(symbol) = self.store.current_symbol().cloned() else {
            self.notify(ANALYZE_FIRST, Severity::Warning);
            return;
        };
        if self.store.watchlist().contains(&symbol) {
            self.notify(format!("{} is already in the watchlist", symbol), Severity::Warning);
            return;
        }

        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::WatchlistAdded {
                result: backend.add_to_watchlist(&symbol).await,
                symbol,
            }
        });
    }

    /// Ask for confirmation before removing the selected card's symbol
    pub fn request_remove(&mut self) {
        let Some(symbol) = self.watchlist.selected_symbol().cloned() else {
            return;
        };
        self.modal.show(
            "Remove from watchlist",
            format!("Remove {} from your watchlist?", symbol),
            Some(ModalAction::RemoveFromWatchlist(symbol)),
        );
    }

    pub fn remove_from_watchlist(&mut self, symbol: Symbol) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::WatchlistRemoved {
                result: backend.remove_from_watchlist(&symbol).await,
                symbol,
            }
        });
    }

    /// Rebuild the cards: placeholders now, one quote lookup per card
    pub fn render_watchlist(&mut self) {
        self.card_rows.cancel_all();

        let symbols = self.store.watchlist().symbols().to_vec();
        let mut cards = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let row = self.card_rows.allocate();
            cards.push(WatchlistCard {
                row,
                symbol: symbol.clone(),
                info: CardInfo::Loading,
            });

            let backend = Arc::clone(&self.backend);
            let tx = self.updates_tx.clone();
            self.card_rows.spawn(row, async move {
                let result = backend.stock_info(&symbol).await;
                let _ = tx.send(StateUpdate::RowInfoLoaded { row, symbol, result });
            });
        }
        self.watchlist.replace_cards(cards);
    }

    pub fn batch_analyze(&mut self) {
        if self.store.watchlist().is_empty() {
            self.notify("Watchlist is empty", Severity::Warning);
            return;
        }

        self.notify("Starting batch analysis...", Severity::Info);
        self.watchlist.batch_running = true;
        let symbols = self.store.watchlist().symbols().to_vec();
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { StateUpdate::BatchAnalyzed(backend.batch_analyze(&symbols).await) });
    }

    // ------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------

    /// Three independent loads; each panel fails on its own
    pub fn refresh_dashboard(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { StateUpdate::EconomicLoaded(backend.economic_indicators().await) });

        let backend = Arc::clone(&self.backend);
        self.spawn(async move { StateUpdate::SectorsLoaded(backend.sector_performance().await) });

        self.render_preview();
    }

    fn render_preview(&mut self) {
        self.preview_rows.cancel_all();

        let (shown, hidden) = self.store.watchlist().preview(PREVIEW_LIMIT);
        let shown = shown.to_vec();
        let mut rows = Vec::with_capacity(shown.len());
        for symbol in shown {
            let row = self.preview_rows.allocate();
            rows.push(PreviewRow {
                row,
                symbol: symbol.clone(),
                price: None,
            });

            let backend = Arc::clone(&self.backend);
            let tx = self.updates_tx.clone();
            self.preview_rows.spawn(row, async move {
                let result = backend.stock_info(&symbol).await;
                let _ = tx.send(StateUpdate::PreviewLoaded { row, symbol, result });
            });
        }
        self.dashboard.preview = WatchlistPreview { rows, hidden };
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Open the analysed symbol's report outside the dashboard
    pub fn open_full_report(&mut self) -> Result<()> {
        let Some(symbol) = self.store.current_symbol().cloned() else {
            self.notify(ANALYZE_FIRST, Severity::Warning);
            return Ok(());
        };
        self.open_report_url(&symbol)
    }

    fn open_report_url(&mut self, symbol: &Symbol) -> Result<()> {
        let url = self.backend.report_url(symbol)?;
        self.opener.open_url(&url)
    }

    pub fn download_report(&mut self) {
        let Some(symbol) = self.store.current_symbol().cloned() else {
            self.notify(ANALYZE_FIRST, Severity::Warning);
            return;
        };

        self.notify("Generating report...", Severity::Info);
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::ReportDownloaded {
                result: backend.report_document(&symbol).await,
                symbol,
            }
        });
    }

    /// Load a report into the Reports tab
    pub fn render_report_inline(&mut self, raw: &str) {
        let symbol = match Symbol::parse(raw) {
            Ok(symbol) => symbol,
            Err(e) => {
                self.notify(e.to_string(), Severity::Warning);
                return;
            }
        };

        self.reports.loading = true;
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::ReportLoaded {
                result: backend.report_markup(&symbol).await,
                symbol,
            }
        });
    }

    fn finish_download(&mut self, symbol: Symbol, result: Result<ReportDocument, ApiError>) {
        match result {
            Ok(ReportDocument::Pdf(bytes)) => match self.opener.save_pdf(&symbol, &bytes) {
                Ok(path) => self.notify(format!("PDF report saved to {}", path.display()), Severity::Success),
                Err(e) => {
                    error!("Failed to save report for {}: {:#}", symbol, e);
                    self.notify(format!("Report generation failed: {}", e), Severity::Error);
                }
            },
            Ok(ReportDocument::Markup(markup)) => match self.opener.open_markup(&symbol, &markup) {
                Ok(()) => self.notify("Report opened in a new window", Severity::Success),
                Err(e) => {
                    error!("Failed to open report for {}: {:#}", symbol, e);
                    self.notify(format!("Report generation failed: {}", e), Severity::Error);
                }
            },
            Err(e) => {
                warn!("Report download for {} failed: {}", symbol, e);
                self.notify(format!("Report generation failed: {}", e.user_message()), Severity::Error);

                match self.open_report_url(&symbol) {
                    Ok(()) => self.notify("Opened HTML version of the report", Severity::Info),
                    Err(fallback) => error!("Fallback report open for {} failed: {:#}", symbol, fallback),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // System
    // ------------------------------------------------------------------

    pub fn load_system(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { StateUpdate::CacheStatsLoaded(backend.cache_stats().await) });

        let backend = Arc::clone(&self.backend);
        self.spawn(async move { StateUpdate::DataSourcesLoaded(backend.data_sources().await) });
    }

    pub fn request_clear_cache(&mut self) {
        self.modal.show(
            "Clear cache",
            "Remove every cached entry on the analysis service?",
            Some(ModalAction::ClearCache),
        );
    }

    pub fn clear_cache(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::MaintenanceDone {
                action: "Cache clear".to_string(),
                result: backend.clear_cache().await,
            }
        });
    }

    /// Drop the analysed symbol's cached data on the backend
    pub fn invalidate_cache(&mut self) {
        let Some(symbol) = self.store.current_symbol().cloned() else {
            self.notify(ANALYZE_FIRST, Severity::Warning);
            return;
        };

        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::MaintenanceDone {
                action: format!("Cache invalidation for {}", symbol),
                result: backend.invalidate_cache(&symbol).await,
            }
        });
    }

    pub fn toggle_source(&mut self) {
        let Some(source) = self.system.selected_source().cloned() else {
            return;
        };

        let enable = !source.enabled;
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            StateUpdate::MaintenanceDone {
                action: format!("{} {}", if enable { "Enabling" } else { "Disabling" }, source.name),
                result: backend.toggle_data_source(&source.name, enable).await,
            }
        });
    }

    // ------------------------------------------------------------------
    // Modal
    // ------------------------------------------------------------------

    /// Confirm the open dialog and run its action
    pub fn confirm_modal(&mut self) {
        match self.modal.confirm() {
            Some(ModalAction::RemoveFromWatchlist(symbol)) => self.remove_from_watchlist(symbol),
            Some(ModalAction::ClearCache) => self.clear_cache(),
            None => {}
        }
    }

    pub fn dismiss_modal(&mut self) {
        self.modal.hide();
    }

    /// Mouse click; a click outside the dialog closes it
    pub fn click(&mut self, column: u16, row: u16) {
        if self.modal.is_visible() && self.modal.is_outside(column, row) {
            self.modal.hide();
        }
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    fn track_connectivity(&mut self, reached: bool) {
        if reached == self.online {
            return;
        }
        self.online = reached;
        if reached {
            info!("Analysis service reachable again");
            self.system.log.push(LogLevel::Success, "Network connection restored");
        } else {
            warn!("Analysis service unreachable");
            self.system.log.push(LogLevel::Warning, "Network connection lost");
        }
    }

    /// Apply one completed request to the store and panels
    pub fn apply_update(&mut self, update: StateUpdate) {
        self.track_connectivity(reachability(&update));

        match update {
            StateUpdate::AnalysisLoaded { symbol, result } => {
                self.analysis.loading = false;
                match result {
                    Ok(analysis) => {
                        self.analysis.view = Some(AnalysisView::from_result(&analysis));
                        self.store.set_analysis(analysis);
                        self.notify(format!("{} analysis complete", symbol), Severity::Success);
                    }
                    Err(e) => {
                        error!("Analysis of {} failed: {}", symbol, e);
                        self.notify(format!("Analysis failed: {}", e.user_message()), Severity::Error);
                    }
                }
            }

            StateUpdate::WatchlistLoaded(result) => {
                let symbols = result.unwrap_or_else(|e| {
                    warn!("Failed to load watchlist: {}", e);
                    self.system.log.push(LogLevel::Warning, format!("Watchlist unavailable: {}", e));
                    Vec::new()
                });
                info!("Loaded {} watchlist symbols", symbols.len());
                self.store.hydrate_watchlist(symbols);
                match self.active_tab {
                    Tab::Dashboard => self.render_preview(),
                    Tab::Watchlist => self.render_watchlist(),
                    _ => {}
                }
            }

            StateUpdate::WatchlistAdded { symbol, result } => match result {
                Ok(message) => {
                    self.store.add_to_watchlist(symbol.clone());
                    self.notify(
                        message.unwrap_or_else(|| format!("{} added to watchlist", symbol)),
                        Severity::Success,
                    );
                    self.render_watchlist();
                }
                Err(e) => {
                    error!("Adding {} to watchlist failed: {}", symbol, e);
                    self.notify(format!("Failed to add: {}", e.user_message()), Severity::Error);
                }
            },

            StateUpdate::WatchlistRemoved { symbol, result } => match result {
                Ok(message) => {
                    self.store.remove_from_watchlist(&symbol);
                    self.notify(
                        message.unwrap_or_else(|| format!("{} removed from watchlist", symbol)),
                        Severity::Success,
                    );
                    self.render_watchlist();
                }
                Err(e) => {
                    error!("Removing {} from watchlist failed: {}", symbol, e);
                    self.notify(format!("Failed to remove: {}", e.user_message()), Severity::Error);
                }
            },

            StateUpdate::RowInfoLoaded { row, symbol, result } => {
                self.card_rows.finish(row);
                match result {
                    Ok(quote) => {
                        if !self.watchlist.fill(row, CardInfo::from_quote(&quote)) {
                            debug!("Card row {} for {} is gone, dropping its info", row.value(), symbol);
                        }
                    }
                    Err(e) => warn!("Failed to load info for {}: {}", symbol, e),
                }
            }

            StateUpdate::PreviewLoaded { row, symbol, result } => {
                self.preview_rows.finish(row);
                match result {
                    Ok(quote) => {
                        if !self.dashboard.fill_preview(row, &quote) {
                            debug!("Preview row {} for {} is gone, dropping its price", row.value(), symbol);
                        }
                    }
                    Err(e) => warn!("Failed to load preview price for {}: {}", symbol, e),
                }
            }

            StateUpdate::BatchAnalyzed(result) => {
                self.watchlist.batch_running = false;
                match result {
                    Ok(results) => {
                        info!("Batch analysis results: {}", results);
                        self.notify("Batch analysis complete", Severity::Success);
                    }
                    Err(e) => {
                        error!("Batch analysis failed: {}", e);
                        self.notify(format!("Batch analysis failed: {}", e.user_message()), Severity::Error);
                    }
                }
            }

            StateUpdate::EconomicLoaded(result) => match result {
                Ok(indicators) => self.dashboard.set_indicators(&indicators),
                Err(e) => {
                    warn!("Failed to load economic indicators: {}", e);
                    self.dashboard.indicators = PanelState::Failed;
                }
            },

            StateUpdate::SectorsLoaded(result) => match result {
                Ok(sectors) => self.dashboard.set_sectors(&sectors),
                Err(e) => {
                    warn!("Failed to load sector performance: {}", e);
                    self.dashboard.sectors = PanelState::Failed;
                }
            },

            StateUpdate::ReportLoaded { symbol, result } => {
                self.reports.loading = false;
                match result {
                    Ok(markup) => self.reports.set_report(symbol, markup),
                    Err(e) => {
                        error!("Report for {} failed: {}", symbol, e);
                        let message = format!("Report generation failed: {}", e.user_message());
                        self.reports.error = Some(message.clone());
                        self.notify(message, Severity::Error);
                    }
                }
            }

            StateUpdate::ReportDownloaded { symbol, result } => self.finish_download(symbol, result),

            StateUpdate::CacheStatsLoaded(result) => match result {
                Ok(stats) => self.system.cache = PanelState::Ready(stats),
                Err(e) => {
                    warn!("Failed to load cache stats: {}", e);
                    self.system.cache = PanelState::Failed;
                }
            },

            StateUpdate::DataSourcesLoaded(result) => match result {
                Ok(stats) => self.system.set_sources(stats),
                Err(e) => {
                    warn!("Failed to load data sources: {}", e);
                    self.system.sources = PanelState::Failed;
                }
            },

            StateUpdate::MaintenanceDone { action, result } => match result {
                Ok(message) => {
                    self.notify(message.unwrap_or_else(|| format!("{} done", action)), Severity::Success);
                    self.load_system();
                }
                Err(e) => {
                    error!("{} failed: {}", action, e);
                    self.notify(format!("{} failed: {}", action, e.user_message()), Severity::Error);
                }
            },
        }
    }
}

fn reached<T>(result: &Result<T, ApiError>) -> bool {
    !matches!(result, Err(e) if e.is_transport())
}

/// Whether the request behind an update got through to the service
fn reachability(update: &StateUpdate) -> bool {
    match update {
        StateUpdate::AnalysisLoaded { result, .. } => reached(result),
        StateUpdate::WatchlistLoaded(result) => reached(result),
        StateUpdate::WatchlistAdded { result, .. } => reached(result),
        StateUpdate::WatchlistRemoved { result, .. } => reached(result),
        StateUpdate::RowInfoLoaded { result, .. } => reached(result),
        StateUpdate::PreviewLoaded { result, .. } => reached(result),
        StateUpdate::BatchAnalyzed(result) => reached(result),
        StateUpdate::EconomicLoaded(result) => reached(result),
        StateUpdate::SectorsLoaded(result) => reached(result),
        StateUpdate::ReportLoaded { result, .. } => reached(result),
        StateUpdate::ReportDownloaded { result, .. } => reached(result),
        StateUpdate::CacheStatsLoaded(result) => reached(result),
        StateUpdate::DataSourcesLoaded(result) => reached(result),
        StateUpdate::MaintenanceDone { result, .. } => reached(result),
    }
}
