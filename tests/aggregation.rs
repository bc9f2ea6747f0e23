//! Aggregation Integration Tests
//!
//! Merge, dedup, conflict detection, and the all-failed degraded path,
//! exercised through full orchestration runs.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::{register_failing, register_static};
use convoke::domain::{OrchestrationRequest, TaskType, ToolCategory, ToolMetadata};
use convoke::{Orchestrator, PerformanceTracker, ToolCatalog};

#[tokio::test]
async fn test_conflicting_port_reported_once() {
    let catalog = Arc::new(ToolCatalog::new());
    register_static(
        &catalog,
        ToolMetadata::new("nmap_scan", ToolCategory::Scan),
        json!({"port": 80}),
    );
    register_static(
        &catalog,
        ToolMetadata::new("masscan", ToolCategory::Scan),
        json!({"port": 8080}),
    );
    let tracker = Arc::new(PerformanceTracker::new(30));
    let orchestrator = Orchestrator::new(catalog, tracker);

    let request = OrchestrationRequest::new(TaskType::Scanning, "scan open ports");
    let report = orchestrator.run(request, None).await;

    assert!(report.success);
    assert_eq!(report.aggregate.conflicts.len(), 1);

    let conflict = &report.aggregate.conflicts[0];
    assert_eq!(conflict.field, "port");
    let tools = [conflict.tool_a.as_str(), conflict.tool_b.as_str()];
    assert!(tools.contains(&"nmap_scan"));
    assert!(tools.contains(&"masscan"));
}

#[tokio::test]
async fn test_all_failed_produces_degraded_aggregate() {
    let catalog = Arc::new(ToolCatalog::new());
    register_failing(&catalog, ToolMetadata::new("nmap_scan", ToolCategory::Scan));
    register_failing(&catalog, ToolMetadata::new("masscan", ToolCategory::Scan));
    let tracker = Arc::new(PerformanceTracker::new(30));
    let orchestrator = Orchestrator::new(catalog, tracker);

    let request = OrchestrationRequest::new(TaskType::Scanning, "scan open ports");
    let report = orchestrator.run(request, None).await;

    assert!(!report.success);
    assert_eq!(
        report.aggregate.primary_findings.get("error"),
        Some(&Value::String("All tools failed".to_string()))
    );
    // Every attempted (failed) tool is attributed.
    let mut attributed = report.aggregate.tool_attribution.clone();
    attributed.sort();
    assert_eq!(attributed, vec!["masscan", "nmap_scan"]);
    assert_eq!(report.aggregate.counts.failed, 2);
}

#[tokio::test]
async fn test_duplicate_values_merged_once() {
    let catalog = Arc::new(ToolCatalog::new());
    register_static(
        &catalog,
        ToolMetadata::new("amass", ToolCategory::Recon),
        json!({"domain": "example.com"}),
    );
    register_static(
        &catalog,
        ToolMetadata::new("subfinder", ToolCategory::Recon),
        json!({"domain": "example.com"}),
    );
    let tracker = Arc::new(PerformanceTracker::new(30));
    let orchestrator = Orchestrator::new(catalog, tracker);

    let request = OrchestrationRequest::new(TaskType::Reconnaissance, "discover domains");
    let report = orchestrator.run(request, None).await;

    assert!(report.success);
    // Agreeing values: one finding, no conflicts.
    assert_eq!(
        report.aggregate.primary_findings.get("domain"),
        Some(&Value::String("example.com".to_string()))
    );
    assert!(report.aggregate.conflicts.is_empty());
    assert_eq!(report.aggregate.supporting_evidence.len(), 2);
}

#[tokio::test]
async fn test_mixed_payload_shapes_are_merged() {
    let catalog = Arc::new(ToolCatalog::new());
    register_static(
        &catalog,
        ToolMetadata::new("list_tool", ToolCategory::Generic),
        json!(["finding-1", "finding-2"]),
    );
    register_static(
        &catalog,
        ToolMetadata::new("scalar_tool", ToolCategory::Generic),
        json!("finding-3"),
    );
    let tracker = Arc::new(PerformanceTracker::new(30));
    let orchestrator = Orchestrator::new(catalog, tracker);

    let request = OrchestrationRequest::new(TaskType::General, "collect findings");
    let report = orchestrator.run(request, None).await;

    assert!(report.success);
    // Flattened list and scalar payloads land in the generic bucket.
    assert!(report.aggregate.primary_findings.contains_key("results"));
}

#[tokio::test]
async fn test_narrative_template_mentions_tool_count() {
    let catalog = Arc::new(ToolCatalog::new());
    register_static(
        &catalog,
        ToolMetadata::new("whois_lookup", ToolCategory::Osint),
        json!({"registrar": "Example Registrar"}),
    );
    let tracker = Arc::new(PerformanceTracker::new(30));
    let orchestrator = Orchestrator::new(catalog, tracker);

    let mut request = OrchestrationRequest::new(TaskType::Osint, "whois for example.com");
    request.synthesize_narrative = true;

    let report = orchestrator.run(request, None).await;
    let narrative = report.aggregate.narrative.unwrap();
    assert!(narrative.contains("1 tool"));
}

#[tokio::test]
async fn test_confidence_reported_per_tool() {
    let catalog = Arc::new(ToolCatalog::new());
    register_static(
        &catalog,
        ToolMetadata::new("fast_tool", ToolCategory::Generic),
        json!({"k": "v"}),
    );
    let tracker = Arc::new(PerformanceTracker::new(30));
    let orchestrator = Orchestrator::new(catalog, tracker);

    let request = OrchestrationRequest::new(TaskType::General, "do the thing");
    let report = orchestrator.run(request, None).await;

    let confidence = report
        .aggregate
        .confidence
        .get("fast_tool")
        .and_then(Value::as_f64)
        .unwrap();
    // Fast, non-empty result: 0.5 + 0.3 + 0.1.
    assert!((confidence - 0.9).abs() < 1e-9);
}
