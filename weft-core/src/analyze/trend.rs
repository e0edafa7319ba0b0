// Trend analysis: occurrence growth over each entity's observed lifespan.
#![allow(clippy::cast_precision_loss)]

use crate::types::{Node, Snapshot, Trend, TrendDirection};

/// Trend lists are capped to the fastest movers.
pub const MAX_TRENDS: usize = 20;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Rate entities by occurrences per hour of lifespan. Entities seen only
/// once have no rate yet and are skipped; lifespans under an hour are
/// floored to one so a fresh burst does not divide by near-zero.
pub fn compute_trends(nodes: &[Node], timeline: &[Snapshot]) -> Vec<Trend> {
    let mut trends: Vec<Trend> = nodes
        .iter()
        .filter(|n| n.occurrence_count > 1)
        .map(|node| {
            let lifespan_ms = (node.last_seen_at - node.first_seen_at).num_milliseconds() as f64;
            let lifespan_hours = (lifespan_ms / MS_PER_HOUR).max(1.0);
            let change_rate = node.occurrence_count as f64 / lifespan_hours;

            let sparkline: Vec<i64> = timeline
                .iter()
                .filter(|s| s.source == node.source)
                .map(|s| s.node_count)
                .collect();

            Trend {
                node: node.clone(),
                direction: if change_rate > 1.0 {
                    TrendDirection::Rising
                } else if change_rate < 0.1 {
                    TrendDirection::Declining
                } else {
                    TrendDirection::Stable
                },
                change_rate: (change_rate * 100.0).round() / 100.0,
                sparkline,
            }
        })
        .collect();

    trends.sort_by(|a, b| {
        b.change_rate
            .partial_cmp(&a.change_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    trends.truncate(MAX_TRENDS);
    trends
}
