//! Entity extraction: arbitrary payload JSON → deduplicated typed entities.
//!
//! Pure and total; no payload shape fails. Object keys are visited in
//! `serde_json`'s map order (lexicographic), which fixes one canonical
//! extraction order for any input; downstream capping depends on it.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::types::{Entity, EntityKind};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://").unwrap());
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

/// Display values longer than this (after trimming) are dropped as noise.
const MAX_TEXT_LEN: usize = 100;

/// Walk a payload and return its typed entities, deduplicated by key with
/// the first occurrence winning. The output order is the extraction-visit
/// order and is identical across calls for identical input.
pub fn extract_entities(payload: &Value) -> Vec<Entity> {
    let mut raw = Vec::new();
    walk(payload, "", &mut raw);
    deduplicate(raw)
}

fn walk(value: &Value, prefix: &str, out: &mut Vec<Entity>) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => {}

        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, &format!("{prefix}[{index}]"), out);
            }
        }

        Value::Object(map) => {
            for (key, value) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };

                // The key itself is structural vocabulary, independent of
                // whatever value sits under it.
                out.push(Entity::new(
                    format!("field:{key}"),
                    EntityKind::Field,
                    key.clone(),
                ));

                match value {
                    Value::Object(_) | Value::Array(_) => walk(value, &full_key, out),
                    Value::String(s) => classify_string(s, out),
                    Value::Number(n) => out.push(Entity::new(
                        format!("num:{full_key}:{n}"),
                        EntityKind::Number,
                        n.to_string(),
                    )),
                    Value::Null | Value::Bool(_) => {}
                }
            }
        }

        // Bare string scalar (top level, or an array element reached by
        // recursion): kept verbatim as text, no classification.
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                out.push(Entity::new(
                    format!("text:{}", trimmed.to_lowercase()),
                    EntityKind::Text,
                    trimmed,
                ));
            }
        }
    }
}

/// Classify an object-valued string: URL and ISO-date prefixes get their
/// own kinds; other short strings become text; long or blank strings are
/// dropped.
fn classify_string(raw: &str, out: &mut Vec<Entity>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }

    if URL_RE.is_match(trimmed) {
        out.push(Entity::new(
            format!("url:{trimmed}"),
            EntityKind::Url,
            trimmed,
        ));
    } else if DATE_RE.is_match(trimmed) {
        out.push(Entity::new(
            format!("date:{trimmed}"),
            EntityKind::Date,
            trimmed,
        ));
    } else if trimmed.chars().count() <= MAX_TEXT_LEN {
        out.push(Entity::new(
            format!("text:{}", trimmed.to_lowercase()),
            EntityKind::Text,
            trimmed,
        ));
    }
}

fn deduplicate(entities: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::with_capacity(entities.len());
    entities
        .into_iter()
        .filter(|e| seen.insert(e.key.clone()))
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn flat_article_payload() {
        let payload = json!({
            "title": "Breaking News",
            "link": "https://example.com/a",
            "date": "2024-01-01",
        });
        let entities = extract_entities(&payload);

        // Keys visit in sorted map order: date, link, title.
        assert_eq!(
            keys(&entities),
            vec![
                "field:date",
                "date:2024-01-01",
                "field:link",
                "url:https://example.com/a",
                "field:title",
                "text:breaking news",
            ]
        );
    }

    #[test]
    fn text_key_lowercases_but_value_keeps_case() {
        let payload = json!({"title": "Breaking News"});
        let entities = extract_entities(&payload);
        let text = entities
            .iter()
            .find(|e| e.kind == EntityKind::Text)
            .unwrap();
        assert_eq!(text.key, "text:breaking news");
        assert_eq!(text.value, "Breaking News");
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let payload = json!({"a": "Same", "b": "same"});
        let entities = extract_entities(&payload);
        let texts: Vec<_> = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Text)
            .collect();
        assert_eq!(texts.len(), 1);
        // "a" visits before "b"; the first display value wins.
        assert_eq!(texts[0].value, "Same");
    }

    #[test]
    fn numbers_are_keyed_by_path_and_value() {
        let payload = json!({"stats": {"count": 42, "score": 2.5}});
        let entities = extract_entities(&payload);
        assert!(keys(&entities).contains(&"num:stats.count:42"));
        assert!(keys(&entities).contains(&"num:stats.score:2.5"));
    }

    #[test]
    fn array_paths_carry_indexes() {
        let payload = json!({"items": [{"price": 10}, {"price": 20}]});
        let entities = extract_entities(&payload);
        assert!(keys(&entities).contains(&"num:items[0].price:10"));
        assert!(keys(&entities).contains(&"num:items[1].price:20"));
        // The repeated field name dedupes to one entity.
        let fields: Vec<_> = keys(&entities)
            .into_iter()
            .filter(|k| *k == "field:price")
            .collect();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn array_element_strings_stay_plain_text() {
        // Strings reached as bare array elements skip classification.
        let payload = json!({"tags": ["https://example.com", "2024-01-01"]});
        let entities = extract_entities(&payload);
        assert!(keys(&entities).contains(&"text:https://example.com"));
        assert!(keys(&entities).contains(&"text:2024-01-01"));
        assert!(!entities.iter().any(|e| e.kind == EntityKind::Url));
    }

    #[test]
    fn long_strings_are_dropped() {
        let long = "x".repeat(101);
        let payload = json!({"body": long});
        let entities = extract_entities(&payload);
        assert_eq!(keys(&entities), vec!["field:body"]);
    }

    #[test]
    fn boundary_length_string_is_kept() {
        let exact = "y".repeat(100);
        let payload = json!({"body": exact});
        let entities = extract_entities(&payload);
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn blank_strings_are_dropped() {
        let payload = json!({"a": "", "b": "   "});
        let entities = extract_entities(&payload);
        assert_eq!(keys(&entities), vec!["field:a", "field:b"]);
    }

    #[test]
    fn booleans_and_nulls_produce_no_value_entities() {
        let payload = json!({"active": true, "missing": null});
        let entities = extract_entities(&payload);
        assert_eq!(keys(&entities), vec!["field:active", "field:missing"]);
    }

    #[test]
    fn date_prefix_matches_timestamps() {
        let payload = json!({"published": "2024-01-01T10:30:00Z"});
        let entities = extract_entities(&payload);
        assert!(keys(&entities).contains(&"date:2024-01-01T10:30:00Z"));
    }

    #[test]
    fn top_level_string_is_one_text_entity() {
        let entities = extract_entities(&json!("  Hello World  "));
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].key, "text:hello world");
        assert_eq!(entities[0].value, "Hello World");
    }

    #[test]
    fn degenerate_payloads_are_empty() {
        assert!(extract_entities(&json!(null)).is_empty());
        assert!(extract_entities(&json!({})).is_empty());
        assert!(extract_entities(&json!([])).is_empty());
        assert!(extract_entities(&json!(42)).is_empty());
        assert!(extract_entities(&json!(true)).is_empty());
        assert!(extract_entities(&json!("")).is_empty());
    }

    #[test]
    fn field_entities_match_distinct_key_names() {
        let payload = json!({
            "title": "a",
            "meta": {"title": "b", "author": "c"},
            "items": [{"author": "d", "rank": 1}],
        });
        let entities = extract_entities(&payload);
        let field_count = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Field)
            .count();
        // Distinct key names at any depth: title, meta, author, items, rank.
        assert_eq!(field_count, 5);
    }

    // ── Property-based tests ──────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_json() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(|n| Value::Number(n.into())),
                "[ a-zA-Z0-9:/.-]{0,40}".prop_map(Value::String),
            ];
            leaf.prop_recursive(4, 64, 8, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                    prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                        .prop_map(|m| Value::Object(m.into_iter().collect())),
                ]
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            #[test]
            fn extraction_is_deterministic(payload in arb_json()) {
                let first = extract_entities(&payload);
                let second = extract_entities(&payload);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn extraction_never_duplicates_keys(payload in arb_json()) {
                let entities = extract_entities(&payload);
                let unique: std::collections::HashSet<_> =
                    entities.iter().map(|e| &e.key).collect();
                prop_assert_eq!(unique.len(), entities.len());
            }

            #[test]
            fn keys_carry_their_kind_prefix(payload in arb_json()) {
                for entity in extract_entities(&payload) {
                    let prefix = match entity.kind {
                        EntityKind::Field => "field:",
                        EntityKind::Url => "url:",
                        EntityKind::Date => "date:",
                        EntityKind::Text => "text:",
                        EntityKind::Number => "num:",
                    };
                    prop_assert!(entity.key.starts_with(prefix));
                }
            }
        }
    }
}
