// Anomaly detection over occurrence-count statistics.
//
// Occurrence counts cast int→float for the mean/stddev math.
#![allow(clippy::cast_precision_loss)]

use chrono::{DateTime, Utc};

use crate::types::{Anomaly, AnomalyKind, Node, Severity};

/// Flag nodes whose occurrence counts stand out from the population, and
/// entities making their first appearance inside the window.
///
/// The population baseline is computed over every node passed in, so the
/// caller should hand over the full stored graph, not just the window.
/// Results are sorted most severe first and NOT capped; callers count
/// before slicing.
pub fn detect_anomalies(nodes: &[Node], window_start: DateTime<Utc>) -> Vec<Anomaly> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let mean = nodes
        .iter()
        .map(|n| n.occurrence_count as f64)
        .sum::<f64>()
        / nodes.len() as f64;
    let variance = nodes
        .iter()
        .map(|n| (n.occurrence_count as f64 - mean).powi(2))
        .sum::<f64>()
        / nodes.len() as f64;
    let std_dev = variance.sqrt();

    let mut anomalies = Vec::new();
    for node in nodes {
        let deviation = if std_dev > 0.0 {
            (node.occurrence_count as f64 - mean) / std_dev
        } else {
            0.0
        };

        // A first sighting inside the window outranks spike classification.
        if node.first_seen_at >= window_start && node.occurrence_count == 1 {
            anomalies.push(Anomaly {
                node: node.clone(),
                kind: AnomalyKind::NewEntity,
                severity: Severity::Low,
                deviation: 0.0,
                description: format!(
                    "New entity \"{}\" appeared for the first time",
                    display_value(node)
                ),
            });
            continue;
        }

        if deviation > 2.0 {
            let severity = if deviation > 4.0 {
                Severity::Critical
            } else if deviation > 3.0 {
                Severity::High
            } else {
                Severity::Medium
            };
            anomalies.push(Anomaly {
                node: node.clone(),
                kind: AnomalyKind::Spike,
                severity,
                deviation,
                description: format!(
                    "\"{}\" occurrence spiked {deviation:.1}σ above average",
                    display_value(node)
                ),
            });
        }
    }

    anomalies.sort_by(|a, b| b.severity.cmp(&a.severity));
    anomalies
}

fn display_value(node: &Node) -> &str {
    if node.value.is_empty() {
        &node.key
    } else {
        &node.value
    }
}
