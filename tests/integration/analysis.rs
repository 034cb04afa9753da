//! Integration tests for the analysis flow

use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

use crate::common::logging::log_test_step;
use crate::common::{controller_for, fixtures, symbol, RecordingOpener, TestDashboard};
use stock_dashboard::ui::analysis::RecommendationClass;
use stock_dashboard::ui::notification::Severity;

#[test_log::test(tokio::test)]
async fn test_analysis_populates_store_and_view() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyze/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::analysis("AAPL")))
        .expect(1)
        .mount(&t.server)
        .await;

    log_test_step("Analyzing lower-case input");
    t.controller.analyze("  aapl ");
    assert!(t.controller.analysis.loading);
    t.controller.settle().await;

    assert!(!t.controller.analysis.loading);
    assert_eq!(t.controller.store().current_symbol(), Some(&symbol("AAPL")));
    assert_eq!(t.notification().as_deref(), Some("AAPL analysis complete"));

    let view = t.controller.analysis.view.as_ref().unwrap();
    assert_eq!(view.title, "AAPL - Apple Inc.");
    assert_eq!(view.current_price, "$189.50");
    assert_eq!(view.market_cap, "$2.95T");
    assert_eq!(view.upside, "10.8%");
    assert_eq!(view.recommendation_class, RecommendationClass::Buy);
    // nested detail wins over the flat field
    assert!(view.technicals.rows.contains(&("RSI", "58.21".to_string())));
    assert!(view.fundamentals.rows.contains(&("ROE", "15.60%".to_string())));
}

#[test_log::test(tokio::test)]
async fn test_backend_error_is_shown_verbatim() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyze/ZZZZ"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Symbol ZZZZ not found"})))
        .mount(&t.server)
        .await;

    t.controller.analyze("zzzz");
    t.controller.settle().await;

    let notification = t.controller.notification().unwrap();
    assert_eq!(notification.message, "Analysis failed: Symbol ZZZZ not found");
    assert_eq!(notification.severity, Severity::Error);
    assert!(t.controller.store().current_analysis().is_none());
    assert!(t.controller.analysis.view.is_none());
    // the service answered, so it is still online
    assert!(t.controller.is_online());
}

#[test_log::test(tokio::test)]
async fn test_empty_input_sends_no_request() {
    let mut t = TestDashboard::start().await;
    Mock::given(path_regex("^/api/analyze/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&t.server)
        .await;

    t.controller.analyze("   ");
    t.controller.settle().await;

    let notification = t.controller.notification().unwrap();
    assert_eq!(notification.message, "Please enter a stock symbol");
    assert_eq!(notification.severity, Severity::Warning);
    assert!(!t.controller.analysis.loading);
}

#[test_log::test(tokio::test)]
async fn test_later_completion_wins() {
    let mut t = TestDashboard::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyze/MSFT"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::analysis("MSFT"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analyze/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::analysis("AAPL")))
        .mount(&t.server)
        .await;

    log_test_step("MSFT is requested first but answers last");
    t.controller.analyze("MSFT");
    t.controller.analyze("AAPL");
    t.controller.settle().await;

    assert_eq!(t.controller.store().current_symbol(), Some(&symbol("MSFT")));
}

#[test_log::test(tokio::test)]
async fn test_unreachable_service_goes_offline() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = controller_for("http://127.0.0.1:1", RecordingOpener::new(dir.path()));

    controller.analyze("AAPL");
    controller.settle().await;

    assert!(!controller.is_online());
    assert_eq!(
        controller.notification().map(|n| n.message.as_str()),
        Some("Analysis failed: could not reach the analysis service")
    );
    assert!(controller
        .system
        .log
        .recent(usize::MAX)
        .any(|entry| entry.message == "Network connection lost"));
}
