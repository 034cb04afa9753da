//! Integration tests for the dashboard summary and its refresh timer

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

use crate::common::logging::log_test_step;
use crate::common::{fixtures, TestDashboard};
use stock_dashboard::ui::dashboard::{IndicatorRow, PanelState};
use stock_dashboard::ui::layout::Tab;

#[test_log::test(tokio::test)]
async fn test_panels_fail_independently() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market/economic"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "FRED unavailable"})))
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/market/sectors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::sectors()))
        .mount(&t.server)
        .await;

    t.controller.refresh_dashboard();
    t.controller.settle().await;

    assert_eq!(t.controller.dashboard.indicators, PanelState::Failed);
    assert_matches!(&t.controller.dashboard.sectors, PanelState::Ready(rows) if rows.len() == 2);
    // panel failures are not notified
    assert!(t.controller.notification().is_none());
}

#[test_log::test(tokio::test)]
async fn test_indicators_keep_backend_order_and_labels() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market/economic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::economic()))
        .mount(&t.server)
        .await;

    t.controller.refresh_dashboard();
    t.controller.settle().await;

    assert_eq!(
        t.controller.dashboard.indicators,
        PanelState::Ready(vec![
            IndicatorRow { label: "GDP".into(), value: "2.4%".into() },
            IndicatorRow { label: "Unemployment Rate".into(), value: "3.9".into() },
        ])
    );
}

#[test_log::test(tokio::test)]
async fn test_preview_shows_first_five_symbols() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/watchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["A", "B", "C", "D", "E", "F", "G"])))
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/stocks/[^/]+/info$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::quote(42.0)))
        .expect(5)
        .mount(&t.server)
        .await;

    t.controller.bootstrap();
    t.controller.settle().await;

    let preview = &t.controller.dashboard.preview;
    let shown: Vec<String> = preview.rows.iter().map(|r| r.symbol.to_string()).collect();
    assert_eq!(shown, vec!["A", "B", "C", "D", "E"]);
    assert!(preview.rows.iter().all(|r| r.price.as_deref() == Some("$42.00")));
    assert_eq!(preview.more_label().as_deref(), Some("+2 more"));
    assert!(t.controller.dashboard.last_update.is_some());
}

#[test_log::test(tokio::test)]
async fn test_refresh_keeps_previous_content_until_results_arrive() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market/sectors"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::sectors())
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&t.server)
        .await;

    t.controller.refresh_dashboard();
    t.controller.settle().await;
    let before = t.controller.dashboard.sectors.clone();
    assert_matches!(&before, PanelState::Ready(_));

    t.controller.refresh_dashboard();
    assert_eq!(t.controller.dashboard.sectors, before);
    t.controller.settle().await;
    assert_eq!(t.controller.dashboard.sectors, before);
}

#[test_log::test(tokio::test)]
async fn test_refresh_tick_only_runs_on_dashboard() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market/economic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::economic()))
        .expect(2)
        .mount(&t.server)
        .await;

    log_test_step("Tick while another tab is active");
    t.controller.switch_tab(Tab::Analysis);
    t.controller.on_refresh_tick();
    t.controller.settle().await;
    assert!(t.controller.dashboard.last_update.is_none());
    assert_eq!(t.controller.dashboard.indicators, PanelState::Loading);

    log_test_step("Returning to the dashboard refreshes, then the tick does too");
    t.controller.switch_tab(Tab::Dashboard);
    t.controller.settle().await;
    t.controller.on_refresh_tick();
    t.controller.settle().await;
    assert!(t.controller.dashboard.last_update.is_some());
}
