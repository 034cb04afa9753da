//! Integration tests for the watchlist manager

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

use crate::common::logging::log_test_step;
use crate::common::{fixtures, symbol, TestDashboard};
use stock_dashboard::models::StockQuote;
use stock_dashboard::ui::layout::Tab;
use stock_dashboard::ui::modal::ModalAction;
use stock_dashboard::ui::notification::Severity;
use stock_dashboard::ui::state::StateUpdate;
use stock_dashboard::ui::watchlist::CardInfo;

async fn mount_watchlist(t: &TestDashboard, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/watchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&t.server)
        .await;
}

async fn mount_quotes(t: &TestDashboard, price: f64) {
    Mock::given(method("GET"))
        .and(path_regex("^/api/stocks/[^/]+/info$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::quote(price)))
        .mount(&t.server)
        .await;
}

async fn mount_analysis(t: &TestDashboard, raw: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/analyze/{}", raw)))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::analysis(raw)))
        .mount(&t.server)
        .await;
}

fn symbols(t: &TestDashboard) -> Vec<String> {
    t.controller
        .store()
        .watchlist()
        .symbols()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_load_accepts_wrapped_payload() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!({"symbols": ["aapl", "", "MSFT", "AAPL", 42]})).await;
    mount_quotes(&t, 100.0).await;

    t.controller.load_watchlist();
    t.controller.settle().await;

    assert_eq!(symbols(&t), vec!["AAPL", "MSFT"]);
}

#[test_log::test(tokio::test)]
async fn test_failed_load_leaves_empty_watchlist() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/watchlist"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "storage offline"})))
        .mount(&t.server)
        .await;

    t.controller.load_watchlist();
    t.controller.settle().await;

    assert!(t.controller.store().watchlist().is_empty());
    // logged only
    assert!(t.controller.notification().is_none());
    assert!(t.logged("Watchlist unavailable: storage offline"));
}

#[test_log::test(tokio::test)]
async fn test_add_requires_analysis() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("POST"))
        .and(path("/api/watchlist"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&t.server)
        .await;

    t.controller.add_to_watchlist();
    t.controller.settle().await;

    let notification = t.controller.notification().unwrap();
    assert_eq!(notification.message, "Please analyze a stock first");
    assert_eq!(notification.severity, Severity::Warning);
}

#[test_log::test(tokio::test)]
async fn test_add_duplicate_is_rejected_locally() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!(["AAPL"])).await;
    mount_quotes(&t, 100.0).await;
    mount_analysis(&t, "AAPL").await;
    Mock::given(method("POST"))
        .and(path("/api/watchlist"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&t.server)
        .await;

    t.controller.bootstrap();
    t.controller.analyze("AAPL");
    t.controller.settle().await;

    t.controller.add_to_watchlist();
    t.controller.settle().await;

    assert_eq!(t.notification().as_deref(), Some("AAPL is already in the watchlist"));
    assert_eq!(symbols(&t), vec!["AAPL"]);
}

#[test_log::test(tokio::test)]
async fn test_add_success_renders_cards() {
    let mut t = TestDashboard::start().await;
    mount_analysis(&t, "NVDA").await;
    mount_quotes(&t, 950.25).await;
    Mock::given(method("POST"))
        .and(path("/api/watchlist"))
        .and(body_json(json!({"symbol": "NVDA"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "NVDA added to watchlist"})))
        .expect(1)
        .mount(&t.server)
        .await;

    t.controller.analyze("nvda");
    t.controller.settle().await;
    t.controller.add_to_watchlist();
    t.controller.settle().await;

    assert_eq!(t.notification().as_deref(), Some("NVDA added to watchlist"));
    assert_eq!(symbols(&t), vec!["NVDA"]);

    let card = t.controller.watchlist.card(&symbol("NVDA")).unwrap();
    assert_eq!(
        card.info,
        CardInfo::Loaded {
            price: "$950.25".into(),
            pe_ratio: "21.50".into(),
            sector: "Technology".into(),
        }
    );
}

#[test_log::test(tokio::test)]
async fn test_add_failure_keeps_watchlist() {
    let mut t = TestDashboard::start().await;
    mount_analysis(&t, "AAPL").await;
    Mock::given(method("POST"))
        .and(path("/api/watchlist"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Watchlist is full"})))
        .mount(&t.server)
        .await;

    t.controller.analyze("AAPL");
    t.controller.settle().await;
    t.controller.add_to_watchlist();
    t.controller.settle().await;

    assert_eq!(t.notification().as_deref(), Some("Failed to add: Watchlist is full"));
    assert!(t.controller.store().watchlist().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_remove_after_confirmation() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!(["AAPL", "MSFT"])).await;
    mount_quotes(&t, 100.0).await;
    Mock::given(method("DELETE"))
        .and(path("/api/watchlist/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "AAPL removed"})))
        .expect(1)
        .mount(&t.server)
        .await;

    t.controller.load_watchlist();
    t.controller.settle().await;
    t.controller.switch_tab(Tab::Watchlist);
    t.controller.settle().await;

    log_test_step("Requesting removal opens the confirmation dialog");
    t.controller.request_remove();
    assert_matches!(
        t.controller.modal().dialog().and_then(|d| d.on_confirm.clone()),
        Some(ModalAction::RemoveFromWatchlist(s)) if s.as_str() == "AAPL"
    );

    t.controller.confirm_modal();
    assert!(!t.controller.modal().is_visible());
    t.controller.settle().await;

    assert_eq!(t.notification().as_deref(), Some("AAPL removed"));
    assert_eq!(symbols(&t), vec!["MSFT"]);
    assert_eq!(t.controller.watchlist.cards.len(), 1);
    assert_eq!(t.controller.watchlist.cards[0].symbol, symbol("MSFT"));
}

#[test_log::test(tokio::test)]
async fn test_dismissed_removal_sends_nothing() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!(["AAPL"])).await;
    mount_quotes(&t, 100.0).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&t.server)
        .await;

    t.controller.load_watchlist();
    t.controller.settle().await;
    t.controller.switch_tab(Tab::Watchlist);
    t.controller.settle().await;

    t.controller.request_remove();
    t.controller.dismiss_modal();
    t.controller.confirm_modal();
    t.controller.settle().await;

    assert_eq!(symbols(&t), vec!["AAPL"]);
}

#[test_log::test(tokio::test)]
async fn test_remove_failure_is_notified() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!(["AAPL"])).await;
    mount_quotes(&t, 100.0).await;
    Mock::given(method("DELETE"))
        .and(path("/api/watchlist/AAPL"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "database is locked"})))
        .mount(&t.server)
        .await;

    t.controller.load_watchlist();
    t.controller.settle().await;
    t.controller.remove_from_watchlist(symbol("AAPL"));
    t.controller.settle().await;

    assert_eq!(t.notification().as_deref(), Some("Failed to remove: database is locked"));
    assert_eq!(symbols(&t), vec!["AAPL"]);
}

#[test_log::test(tokio::test)]
async fn test_stale_row_update_is_ignored() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!(["AAPL"])).await;
    Mock::given(method("GET"))
        .and(path("/api/stocks/AAPL/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::quote(150.0))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&t.server)
        .await;

    t.controller.load_watchlist();
    t.controller.settle().await;
    t.controller.switch_tab(Tab::Watchlist);
    let stale_row = t.controller.watchlist.cards[0].row;

    log_test_step("Re-render before the first lookup returns");
    t.controller.render_watchlist();
    let live_row = t.controller.watchlist.cards[0].row;
    assert_ne!(stale_row, live_row);

    let quote: StockQuote = serde_json::from_value(fixtures::quote(1.0)).unwrap();
    t.controller.apply_update(StateUpdate::RowInfoLoaded {
        row: stale_row,
        symbol: symbol("AAPL"),
        result: Ok(quote),
    });
    assert_eq!(t.controller.watchlist.cards[0].info, CardInfo::Loading);

    t.controller.settle().await;
    assert_matches!(
        &t.controller.watchlist.cards[0].info,
        CardInfo::Loaded { price, .. } if price == "$150.00"
    );
}

#[test_log::test(tokio::test)]
async fn test_batch_analyze_notifies_without_rendering() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!(["AAPL", "MSFT"])).await;
    mount_quotes(&t, 100.0).await;
    Mock::given(method("POST"))
        .and(path("/api/batch-analyze"))
        .and(body_json(json!({"symbols": ["AAPL", "MSFT"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": {"AAPL": {}, "MSFT": {}}})))
        .expect(1)
        .mount(&t.server)
        .await;

    t.controller.load_watchlist();
    t.controller.settle().await;

    t.controller.batch_analyze();
    assert_eq!(t.notification().as_deref(), Some("Starting batch analysis..."));
    assert!(t.controller.watchlist.batch_running);

    t.controller.settle().await;
    assert_eq!(t.notification().as_deref(), Some("Batch analysis complete"));
    assert!(!t.controller.watchlist.batch_running);
    assert!(t.controller.store().current_analysis().is_none());
}

#[test_log::test(tokio::test)]
async fn test_batch_analyze_on_empty_watchlist() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("POST"))
        .and(path("/api/batch-analyze"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&t.server)
        .await;

    t.controller.batch_analyze();
    t.controller.settle().await;

    let notification = t.controller.notification().unwrap();
    assert_eq!(notification.message, "Watchlist is empty");
    assert_eq!(notification.severity, Severity::Warning);
}

#[test_log::test(tokio::test)]
async fn test_open_watchlist_fetches_cards_only() {
    let mut t = TestDashboard::start().await;
    mount_watchlist(&t, json!(["A", "B", "C", "D", "E", "F", "G"])).await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/stocks/[^/]+/info$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::quote(10.0)))
        // one lookup per card, none for the dashboard preview
        .expect(7)
        .mount(&t.server)
        .await;

    t.controller.open_watchlist();
    t.controller.settle().await;

    assert_eq!(t.controller.active_tab(), Tab::Watchlist);
    assert_eq!(t.controller.watchlist.cards.len(), 7);
    assert!(t
        .controller
        .watchlist
        .cards
        .iter()
        .all(|c| matches!(c.info, CardInfo::Loaded { .. })));
    assert!(t.controller.dashboard.preview.rows.is_empty());
}
