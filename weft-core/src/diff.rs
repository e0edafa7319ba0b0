use std::collections::HashMap;

use crate::types::{DiffCounts, DiffKind, Entity, EntityDiff, EntityState};

/// Compare the stored state of a source against a fresh extraction.
///
/// Emits `New` and `Changed` records in the order the current entities
/// appear, then `Disappeared` records for stored keys no longer present,
/// in sorted key order. Entities whose display value is unchanged are
/// stable and produce no record.
pub fn compute_diff(
    previous: &HashMap<String, EntityState>,
    current: &[Entity],
) -> Vec<EntityDiff> {
    let mut diffs = Vec::new();

    for entity in current {
        match previous.get(&entity.key) {
            None => diffs.push(EntityDiff {
                kind: DiffKind::New,
                key: entity.key.clone(),
                entity_kind: entity.kind,
                old_value: None,
                new_value: Some(entity.value.clone()),
                occurrence_delta: 1,
            }),
            Some(state) if state.value != entity.value => diffs.push(EntityDiff {
                kind: DiffKind::Changed,
                key: entity.key.clone(),
                entity_kind: entity.kind,
                old_value: Some(state.value.clone()),
                new_value: Some(entity.value.clone()),
                occurrence_delta: 1,
            }),
            Some(_) => {}
        }
    }

    let mut gone: Vec<(&String, &EntityState)> = previous
        .iter()
        .filter(|(key, _)| !current.iter().any(|e| &e.key == *key))
        .collect();
    gone.sort_by(|a, b| a.0.cmp(b.0));

    for (key, state) in gone {
        diffs.push(EntityDiff {
            kind: DiffKind::Disappeared,
            key: key.clone(),
            entity_kind: state.kind,
            old_value: Some(state.value.clone()),
            new_value: None,
            occurrence_delta: 0,
        });
    }

    diffs
}

/// Tally diff records by kind.
pub fn count_diffs(diffs: &[EntityDiff]) -> DiffCounts {
    let mut counts = DiffCounts::default();
    for diff in diffs {
        match diff.kind {
            DiffKind::New => counts.new += 1,
            DiffKind::Disappeared => counts.disappeared += 1,
            DiffKind::Changed => counts.changed += 1,
            DiffKind::Stable => {}
        }
    }
    counts
}

// ── Tests ──────────────────────────────────────────────────────────
