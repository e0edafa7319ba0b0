/// Schema revision recorded in `weft_meta` on open.
pub const SCHEMA_VERSION: &str = "1";

/// Full SQL schema for Weft's `SQLite` database.
pub const SCHEMA_SQL: &str = r"
-- Store metadata, including the schema version row
CREATE TABLE IF NOT EXISTS weft_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Entity nodes, one row per (source, canonical key)
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    key TEXT NOT NULL,
    kind TEXT NOT NULL,
    value TEXT NOT NULL,
    occurrence_count INTEGER NOT NULL DEFAULT 1,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL,
    UNIQUE(source_id, key)
);
CREATE INDEX IF NOT EXISTS idx_nodes_source ON nodes(source_id);
CREATE INDEX IF NOT EXISTS idx_nodes_last_seen ON nodes(last_seen_at);
CREATE INDEX IF NOT EXISTS idx_nodes_occurrence ON nodes(occurrence_count);

-- Co-occurrence edges, one row per unordered endpoint pair (node_a < node_b)
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    node_a INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    node_b INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
    weight INTEGER NOT NULL DEFAULT 1,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL,
    UNIQUE(source_id, node_a, node_b),
    CHECK(node_a < node_b)
);
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
CREATE INDEX IF NOT EXISTS idx_edges_last_seen ON edges(last_seen_at);

-- Per-ingestion graph size records (append-only)
CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    node_count INTEGER NOT NULL,
    edge_count INTEGER NOT NULL,
    anomaly_count INTEGER NOT NULL DEFAULT 0,
    avg_occurrence REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_snapshots_source ON snapshots(source_id, created_at);

-- Entity change records (append-only)
CREATE TABLE IF NOT EXISTS diffs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    run_id TEXT,
    kind TEXT NOT NULL,
    key TEXT NOT NULL,
    entity_kind TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    occurrence_delta INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_diffs_source ON diffs(source_id, created_at);
CREATE INDEX IF NOT EXISTS idx_diffs_kind ON diffs(kind);
";

/// Read-side views over the base tables.
pub const VIEWS_SQL: &str = r"
-- Co-occurrence pairs with their entity keys resolved
CREATE VIEW IF NOT EXISTS cooccurrence_pairs AS
SELECT
    e.source_id,
    na.key AS key_a,
    nb.key AS key_b,
    e.weight,
    e.last_seen_at
FROM edges e
JOIN nodes na ON na.id = e.node_a
JOIN nodes nb ON nb.id = e.node_b;

-- Per-source graph size and freshness
CREATE VIEW IF NOT EXISTS source_activity AS
SELECT
    source_id,
    COUNT(*) AS node_count,
    SUM(occurrence_count) AS total_occurrences,
    MAX(last_seen_at) AS last_seen_at
FROM nodes
GROUP BY source_id;
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_every_table() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        conn.execute_batch(VIEWS_SQL).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"nodes".to_string()));
        assert!(tables.contains(&"edges".to_string()));
        assert!(tables.contains(&"snapshots".to_string()));
        assert!(tables.contains(&"diffs".to_string()));
        assert!(tables.contains(&"weft_meta".to_string()));
    }

    #[test]
    fn node_uniqueness_is_scoped_by_source() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        let insert = "INSERT INTO nodes (source_id, key, kind, value, first_seen_at, last_seen_at)
                      VALUES (?1, ?2, 'text', 'v', 't', 't')";
        conn.execute(insert, ["feed-1", "text:hello"]).unwrap();
        conn.execute(insert, ["feed-2", "text:hello"]).unwrap();

        // Same key within one source must collide.
        let dup = conn.execute(insert, ["feed-1", "text:hello"]);
        assert!(dup.is_err());
    }

    #[test]
    fn version_starts_at_one() {
        assert_eq!(SCHEMA_VERSION, "1");
    }
}
