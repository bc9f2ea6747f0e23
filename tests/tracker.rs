//! Performance Tracker Integration Tests
//!
//! History recording, derived metrics, and ranking queries.

mod common;

use std::time::Duration;

use serde_json::json;

use common::register_static;
use convoke::domain::{ToolCategory, ToolMetadata};
use convoke::{PerformanceTracker, SortBy, ToolCatalog};

#[test]
fn test_success_rate_after_ten_runs() {
    let tracker = PerformanceTracker::new(30);

    for _ in 0..8 {
        tracker.record("tool_x", true, Duration::from_secs(2), 0.0, 0.9);
    }
    for _ in 0..2 {
        tracker.record("tool_x", false, Duration::from_secs(2), 0.0, 0.5);
    }

    let metrics = tracker.metrics("tool_x").unwrap();
    assert_eq!(metrics.executions, 10);
    assert!((metrics.success_rate - 0.8).abs() < 1e-9);
}

#[test]
fn test_averages_track_inputs() {
    let tracker = PerformanceTracker::new(30);
    tracker.record("tool_x", true, Duration::from_secs(10), 0.02, 1.0);
    tracker.record("tool_x", true, Duration::from_secs(20), 0.04, 0.5);

    let metrics = tracker.metrics("tool_x").unwrap();
    assert!((metrics.avg_duration_secs - 15.0).abs() < 1e-9);
    assert!((metrics.avg_cost_usd - 0.03).abs() < 1e-9);
    assert!((metrics.avg_quality - 0.75).abs() < 1e-9);
}

#[test]
fn test_reliability_includes_recency_bonus() {
    let tracker = PerformanceTracker::new(30);
    // Half successes, all fresh: 0.5 rate + 0.1 recency bonus.
    tracker.record("tool_x", true, Duration::from_secs(1), 0.0, 0.9);
    tracker.record("tool_x", false, Duration::from_secs(1), 0.0, 0.5);

    let metrics = tracker.metrics("tool_x").unwrap();
    assert!((metrics.reliability - 0.6).abs() < 1e-9);
}

#[test]
fn test_rank_map_orders_by_reliability() {
    let tracker = PerformanceTracker::new(30);
    tracker.record("solid", true, Duration::from_secs(1), 0.0, 0.9);
    tracker.record("flaky", false, Duration::from_secs(1), 0.0, 0.5);

    let ranks = tracker.rank_map(SortBy::Reliability);
    assert_eq!(ranks["solid"], 1);
    assert_eq!(ranks["flaky"], 2);
}

#[test]
fn test_ranked_by_cost_prefers_cheap() {
    let tracker = PerformanceTracker::new(30);
    tracker.record("pricey", true, Duration::from_secs(1), 0.10, 0.9);
    tracker.record("cheap", true, Duration::from_secs(1), 0.0, 0.9);

    let ranked = tracker.ranked(SortBy::Cost);
    assert_eq!(ranked[0].tool_name, "cheap");
}

#[test]
fn test_ranked_among_restricts_to_category_names() {
    let catalog = ToolCatalog::new();
    register_static(
        &catalog,
        ToolMetadata::new("nmap_scan", ToolCategory::Scan),
        json!({"port": 80}),
    );
    register_static(
        &catalog,
        ToolMetadata::new("whois_lookup", ToolCategory::Osint),
        json!({"registrar": "x"}),
    );

    let tracker = PerformanceTracker::new(30);
    tracker.record("nmap_scan", true, Duration::from_secs(1), 0.0, 0.9);
    tracker.record("whois_lookup", true, Duration::from_secs(1), 0.0, 0.9);

    let scan_names = catalog.by_category(ToolCategory::Scan);
    let ranked = tracker.ranked_among(&scan_names, SortBy::Reliability);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].tool_name, "nmap_scan");
}

#[test]
fn test_last_success_and_failure_timestamps() {
    let tracker = PerformanceTracker::new(30);
    tracker.record("tool_x", true, Duration::from_secs(1), 0.0, 0.9);
    tracker.record("tool_x", false, Duration::from_secs(1), 0.0, 0.5);

    let metrics = tracker.metrics("tool_x").unwrap();
    assert!(metrics.last_success.is_some());
    assert!(metrics.last_failure.is_some());
    assert!(metrics.last_failure >= metrics.last_success);
}
