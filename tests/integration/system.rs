//! Integration tests for the System tab maintenance actions

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{fixtures, TestDashboard};
use stock_dashboard::ui::dashboard::PanelState;
use stock_dashboard::ui::layout::Tab;
use stock_dashboard::ui::modal::ModalAction;

async fn mount_stats(t: &TestDashboard) {
    Mock::given(method("GET"))
        .and(path("/api/cache/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_entries": 8,
            "hits": 12,
            "misses": 4,
            "hit_rate": "75.00%",
            "cache_types": {"analysis": 3, "stock_info": 5}
        })))
        .mount(&t.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_requests": 20,
            "successful_requests": 18,
            "failed_requests": 2,
            "success_rate": 0.9,
            "sources": [
                {"name": "yahoo", "enabled": true, "priority": 1, "success_rate": 0.95},
                {"name": "alpha_vantage", "enabled": false, "priority": 2}
            ]
        })))
        .mount(&t.server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_switching_to_system_loads_both_panels() {
    let mut t = TestDashboard::start().await;
    mount_stats(&t).await;

    t.controller.switch_tab(Tab::System);
    t.controller.settle().await;

    assert_matches!(&t.controller.system.cache, PanelState::Ready(stats) if stats.total_entries == 8);
    assert_eq!(
        t.controller.system.selected_source().map(|s| s.name.as_str()),
        Some("yahoo")
    );
}

#[test_log::test(tokio::test)]
async fn test_clear_cache_is_confirmed_first() {
    let mut t = TestDashboard::start().await;
    mount_stats(&t).await;
    Mock::given(method("POST"))
        .and(path("/api/cache/clear"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Cache cleared"})))
        .expect(1)
        .mount(&t.server)
        .await;

    t.controller.request_clear_cache();
    assert_eq!(
        t.controller.modal().dialog().and_then(|d| d.on_confirm.clone()),
        Some(ModalAction::ClearCache)
    );
    t.controller.settle().await;

    t.controller.confirm_modal();
    t.controller.settle().await;

    assert_eq!(t.notification().as_deref(), Some("Cache cleared"));
    // stats are reloaded afterwards
    assert_matches!(&t.controller.system.cache, PanelState::Ready(_));
}

#[test_log::test(tokio::test)]
async fn test_toggle_flips_selected_source() {
    let mut t = TestDashboard::start().await;
    mount_stats(&t).await;
    Mock::given(method("GET"))
        .and(path("/api/data/sources/alpha_vantage/toggle"))
        .and(query_param("enabled", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "alpha_vantage enabled"})))
        .expect(1)
        .mount(&t.server)
        .await;

    t.controller.load_system();
    t.controller.settle().await;
    t.controller.system.select_next();
    t.controller.toggle_source();
    t.controller.settle().await;

    assert_eq!(t.notification().as_deref(), Some("alpha_vantage enabled"));
}

#[test_log::test(tokio::test)]
async fn test_invalidate_uses_analysed_symbol() {
    let mut t = TestDashboard::start().await;
    mount_stats(&t).await;
    Mock::given(method("GET"))
        .and(path("/api/analyze/AMD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::analysis("AMD")))
        .mount(&t.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cache/invalidate/AMD"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "cache backend down"})))
        .expect(1)
        .mount(&t.server)
        .await;

    t.controller.invalidate_cache();
    assert_eq!(t.notification().as_deref(), Some("Please analyze a stock first"));

    t.controller.analyze("AMD");
    t.controller.settle().await;
    t.controller.invalidate_cache();
    t.controller.settle().await;

    assert_eq!(
        t.notification().as_deref(),
        Some("Cache invalidation for AMD failed: cache backend down")
    );
}

#[test_log::test(tokio::test)]
async fn test_click_before_first_draw_keeps_dialog() {
    let mut t = TestDashboard::start().await;

    t.controller.request_clear_cache();
    t.controller.click(0, 0);

    assert!(t.controller.modal().is_visible());
    t.controller.dismiss_modal();
    assert!(!t.controller.modal().is_visible());
}
