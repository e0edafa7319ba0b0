use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;
use uuid::Uuid;

use crate::error::{StoreError, WeftError};
use crate::types::{
    DiffCounts, DiffId, DiffKind, DiffRecord, Edge, EdgeFilter, EdgeId, Entity, EntityDiff,
    EntityKind, EntityState, Node, NodeFilter, NodeId, Snapshot, SnapshotId, SourceId, StoreStats,
    canonical_pair,
};

use super::GraphStore;
use super::schema;

/// SQLite-backed implementation of `GraphStore`.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open the database at `path`, creating it on first use.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Non-durable store backed by `:memory:`, used throughout the tests.
    pub fn in_memory() -> crate::error::Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");

        // Performance pragmas
        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(StoreError::Sqlite)?;

        // WAL does not apply to in-memory databases; ignore failure
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");

        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::Sqlite)?;
        conn.execute_batch(schema::VIEWS_SQL)
            .map_err(StoreError::Sqlite)?;

        // Stamp the schema version on first open only
        conn.execute(
            "INSERT OR IGNORE INTO weft_meta (key, value) VALUES ('schema_version', ?1)",
            params![schema::SCHEMA_VERSION],
        )
        .map_err(StoreError::Sqlite)?;

        Ok(())
    }

    /// Helper: parse a kind column back to its enum, tolerating unknown text.
    fn parse_entity_kind(kind_str: &str) -> EntityKind {
        serde_json::from_str(&format!("\"{kind_str}\"")).unwrap_or(EntityKind::Text)
    }

    fn parse_diff_kind(kind_str: &str) -> DiffKind {
        serde_json::from_str(&format!("\"{kind_str}\"")).unwrap_or(DiffKind::Changed)
    }

    /// Helper: parse an RFC 3339 timestamp column, falling back to now.
    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
    }

    /// Hydrate a [`Node`] from a `SELECT *` row.
    fn row_to_node(row: &rusqlite::Row<'_>) -> rusqlite::Result<Node> {
        let kind_str: String = row.get("kind")?;
        let first_seen_str: String = row.get("first_seen_at")?;
        let last_seen_str: String = row.get("last_seen_at")?;

        Ok(Node {
            id: NodeId(row.get("id")?),
            source: SourceId::new(row.get::<_, String>("source_id")?),
            key: row.get("key")?,
            kind: Self::parse_entity_kind(&kind_str),
            value: row.get("value")?,
            occurrence_count: row.get("occurrence_count")?,
            first_seen_at: Self::parse_timestamp(&first_seen_str),
            last_seen_at: Self::parse_timestamp(&last_seen_str),
        })
    }

    /// Helper: read a full edge from a row.
    fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<Edge> {
        let first_seen_str: String = row.get("first_seen_at")?;
        let last_seen_str: String = row.get("last_seen_at")?;

        Ok(Edge {
            id: EdgeId(row.get("id")?),
            source: SourceId::new(row.get::<_, String>("source_id")?),
            node_a: NodeId(row.get("node_a")?),
            node_b: NodeId(row.get("node_b")?),
            weight: row.get("weight")?,
            first_seen_at: Self::parse_timestamp(&first_seen_str),
            last_seen_at: Self::parse_timestamp(&last_seen_str),
        })
    }

    fn row_to_diff(row: &rusqlite::Row<'_>) -> rusqlite::Result<DiffRecord> {
        let kind_str: String = row.get("kind")?;
        let entity_kind_str: String = row.get("entity_kind")?;
        let run_id_str: Option<String> = row.get("run_id")?;
        let created_str: String = row.get("created_at")?;

        Ok(DiffRecord {
            id: DiffId(row.get("id")?),
            source: SourceId::new(row.get::<_, String>("source_id")?),
            run_id: run_id_str.and_then(|s| Uuid::parse_str(&s).ok()),
            kind: Self::parse_diff_kind(&kind_str),
            key: row.get("key")?,
            entity_kind: Self::parse_entity_kind(&entity_kind_str),
            old_value: row.get("old_value")?,
            new_value: row.get("new_value")?,
            occurrence_delta: row.get("occurrence_delta")?,
            created_at: Self::parse_timestamp(&created_str),
        })
    }

    fn row_to_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Snapshot> {
        let created_str: String = row.get("created_at")?;

        Ok(Snapshot {
            id: SnapshotId(row.get("id")?),
            source: SourceId::new(row.get::<_, String>("source_id")?),
            node_count: row.get("node_count")?,
            edge_count: row.get("edge_count")?,
            anomaly_count: row.get("anomaly_count")?,
            avg_occurrence: row.get("avg_occurrence")?,
            created_at: Self::parse_timestamp(&created_str),
        })
    }

    /// Upsert one node row on an existing connection and return its id.
    /// Insert-or-increment is a single statement, so concurrent ingestions
    /// for the same key cannot lose counts.
    fn upsert_node_row(
        conn: &Connection,
        source: &SourceId,
        entity: &Entity,
        now: &str,
    ) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO nodes (source_id, key, kind, value, occurrence_count, first_seen_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
             ON CONFLICT(source_id, key) DO UPDATE SET
                occurrence_count = occurrence_count + 1,
                kind = excluded.kind,
                value = excluded.value,
                last_seen_at = excluded.last_seen_at",
            params![source.as_str(), entity.key, entity.kind.as_str(), entity.value, now],
        )?;

        // last_insert_rowid() keeps the rowid of the prior INSERT when the
        // upsert takes the DO UPDATE arm, so fetch the id explicitly.
        conn.query_row(
            "SELECT id FROM nodes WHERE source_id = ?1 AND key = ?2",
            params![source.as_str(), entity.key],
            |row| row.get(0),
        )
    }

    /// Upsert one edge row on an existing connection and return its id.
    /// Endpoints are canonicalized first; the schema rejects self-pairs.
    fn upsert_edge_row(
        conn: &Connection,
        source: &SourceId,
        a: NodeId,
        b: NodeId,
        now: &str,
    ) -> rusqlite::Result<i64> {
        let (node_a, node_b) = canonical_pair(a, b);

        conn.execute(
            "INSERT INTO edges (source_id, node_a, node_b, weight, first_seen_at, last_seen_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4)
             ON CONFLICT(source_id, node_a, node_b) DO UPDATE SET
                weight = weight + 1,
                last_seen_at = excluded.last_seen_at",
            params![source.as_str(), node_a.0, node_b.0, now],
        )?;

        conn.query_row(
            "SELECT id FROM edges WHERE source_id = ?1 AND node_a = ?2 AND node_b = ?3",
            params![source.as_str(), node_a.0, node_b.0],
            |row| row.get(0),
        )
    }
}

#[async_trait::async_trait]
impl GraphStore for SqliteStore {
    // ── Nodes ──────────────────────────────────────────────────────

    async fn upsert_node(
        &self,
        source: &SourceId,
        entity: &Entity,
        now: DateTime<Utc>,
    ) -> crate::error::Result<NodeId> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let id = Self::upsert_node_row(&conn, source, entity, &now.to_rfc3339())
            .map_err(StoreError::Sqlite)?;
        Ok(NodeId(id))
    }

    async fn upsert_nodes_batch(
        &self,
        source: &SourceId,
        entities: &[Entity],
        now: DateTime<Utc>,
    ) -> crate::error::Result<Vec<Option<NodeId>>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;
        let now_str = now.to_rfc3339();

        let mut ids = Vec::with_capacity(entities.len());
        for chunk in entities.chunks(1000) {
            for entity in chunk {
                match Self::upsert_node_row(&tx, source, entity, &now_str) {
                    Ok(id) => ids.push(Some(NodeId(id))),
                    Err(err) => {
                        warn!(source = %source, key = %entity.key, error = %err,
                            "Skipping node row after write failure");
                        ids.push(None);
                    }
                }
            }
        }
        tx.commit().map_err(StoreError::Sqlite)?;
        Ok(ids)
    }

    async fn get_node(&self, id: NodeId) -> crate::error::Result<Option<Node>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        conn.query_row(
            "SELECT * FROM nodes WHERE id = ?1",
            params![id.0],
            Self::row_to_node,
        )
        .optional()
        .map_err(StoreError::Sqlite)
        .map_err(WeftError::Store)
    }

    async fn get_node_by_key(
        &self,
        source: &SourceId,
        key: &str,
    ) -> crate::error::Result<Option<Node>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        conn.query_row(
            "SELECT * FROM nodes WHERE source_id = ?1 AND key = ?2",
            params![source.as_str(), key],
            Self::row_to_node,
        )
        .optional()
        .map_err(StoreError::Sqlite)
        .map_err(WeftError::Store)
    }

    async fn find_nodes(&self, filter: &NodeFilter) -> crate::error::Result<Vec<Node>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let mut sql = String::from("SELECT * FROM nodes WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(source) = &filter.source {
            let _ = write!(sql, " AND source_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(source.as_str().to_string()));
        }
        if let Some(since) = filter.seen_since {
            let _ = write!(sql, " AND last_seen_at >= ?{}", param_values.len() + 1);
            param_values.push(Box::new(since.to_rfc3339()));
        }
        sql.push_str(" ORDER BY occurrence_count DESC, id ASC");
        if let Some(limit) = filter.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = param_values
            .iter()
            .map(std::convert::AsRef::as_ref)
            .collect();
        let nodes = stmt
            .query_map(params_ref.as_slice(), Self::row_to_node)
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;

        Ok(nodes)
    }

    async fn entity_states(
        &self,
        source: &SourceId,
    ) -> crate::error::Result<HashMap<String, EntityState>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT key, kind, value, occurrence_count FROM nodes WHERE source_id = ?1")
            .map_err(StoreError::Sqlite)?;

        let states = stmt
            .query_map(params![source.as_str()], |row| {
                let key: String = row.get(0)?;
                let kind_str: String = row.get(1)?;
                Ok((
                    key,
                    EntityState {
                        kind: Self::parse_entity_kind(&kind_str),
                        value: row.get(2)?,
                        occurrence_count: row.get(3)?,
                    },
                ))
            })
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<HashMap<_, _>>>()
            .map_err(StoreError::Sqlite)?;

        Ok(states)
    }

    // ── Edges ──────────────────────────────────────────────────────

    async fn upsert_edge(
        &self,
        source: &SourceId,
        a: NodeId,
        b: NodeId,
        now: DateTime<Utc>,
    ) -> crate::error::Result<EdgeId> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let id = Self::upsert_edge_row(&conn, source, a, b, &now.to_rfc3339())
            .map_err(StoreError::Sqlite)?;
        Ok(EdgeId(id))
    }

    async fn upsert_edges_batch(
        &self,
        source: &SourceId,
        pairs: &[(NodeId, NodeId)],
        now: DateTime<Utc>,
    ) -> crate::error::Result<u64> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;
        let now_str = now.to_rfc3339();

        let mut written = 0u64;
        for chunk in pairs.chunks(1000) {
            for &(a, b) in chunk {
                match Self::upsert_edge_row(&tx, source, a, b, &now_str) {
                    Ok(_) => written += 1,
                    Err(err) => {
                        warn!(source = %source, node_a = %a, node_b = %b, error = %err,
                            "Skipping edge row after write failure");
                    }
                }
            }
        }
        tx.commit().map_err(StoreError::Sqlite)?;
        Ok(written)
    }

    async fn find_edges(&self, filter: &EdgeFilter) -> crate::error::Result<Vec<Edge>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let mut sql = String::from("SELECT * FROM edges WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(source) = &filter.source {
            let _ = write!(sql, " AND source_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(source.as_str().to_string()));
        }
        if let Some(since) = filter.seen_since {
            let _ = write!(sql, " AND last_seen_at >= ?{}", param_values.len() + 1);
            param_values.push(Box::new(since.to_rfc3339()));
        }
        sql.push_str(" ORDER BY weight DESC, id ASC");
        if let Some(limit) = filter.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = param_values
            .iter()
            .map(std::convert::AsRef::as_ref)
            .collect();
        let edges = stmt
            .query_map(params_ref.as_slice(), Self::row_to_edge)
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;

        Ok(edges)
    }

    // ── Diff records ───────────────────────────────────────────────

    async fn insert_diffs(
        &self,
        source: &SourceId,
        run_id: Option<Uuid>,
        diffs: &[EntityDiff],
        now: DateTime<Utc>,
    ) -> crate::error::Result<u64> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let tx = conn.unchecked_transaction().map_err(StoreError::Sqlite)?;
        let now_str = now.to_rfc3339();
        let run_id_str = run_id.map(|id| id.to_string());

        let mut written = 0u64;
        for chunk in diffs.chunks(1000) {
            for diff in chunk {
                tx.execute(
                    "INSERT INTO diffs (source_id, run_id, kind, key, entity_kind,
                                        old_value, new_value, occurrence_delta, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        source.as_str(),
                        run_id_str,
                        diff.kind.as_str(),
                        diff.key,
                        diff.entity_kind.as_str(),
                        diff.old_value,
                        diff.new_value,
                        diff.occurrence_delta,
                        now_str,
                    ],
                )
                .map_err(StoreError::Sqlite)?;
                written += 1;
            }
        }
        tx.commit().map_err(StoreError::Sqlite)?;
        Ok(written)
    }

    async fn find_diffs(
        &self,
        source: Option<&SourceId>,
        since: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> crate::error::Result<Vec<DiffRecord>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let mut sql = String::from("SELECT * FROM diffs WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(source) = source {
            let _ = write!(sql, " AND source_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(source.as_str().to_string()));
        }
        if let Some(since) = since {
            let _ = write!(sql, " AND created_at >= ?{}", param_values.len() + 1);
            param_values.push(Box::new(since.to_rfc3339()));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        if let Some(limit) = limit {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = param_values
            .iter()
            .map(std::convert::AsRef::as_ref)
            .collect();
        let records = stmt
            .query_map(params_ref.as_slice(), Self::row_to_diff)
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;

        Ok(records)
    }

    async fn count_diffs(
        &self,
        source: Option<&SourceId>,
        since: Option<DateTime<Utc>>,
    ) -> crate::error::Result<DiffCounts> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let mut sql = String::from("SELECT kind, COUNT(*) FROM diffs WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(source) = source {
            let _ = write!(sql, " AND source_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(source.as_str().to_string()));
        }
        if let Some(since) = since {
            let _ = write!(sql, " AND created_at >= ?{}", param_values.len() + 1);
            param_values.push(Box::new(since.to_rfc3339()));
        }
        sql.push_str(" GROUP BY kind");

        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = param_values
            .iter()
            .map(std::convert::AsRef::as_ref)
            .collect();
        let rows = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
            })
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;

        let mut counts = DiffCounts::default();
        for (kind_str, count) in rows {
            match Self::parse_diff_kind(&kind_str) {
                DiffKind::New => counts.new = count,
                DiffKind::Disappeared => counts.disappeared = count,
                DiffKind::Changed => counts.changed = count,
                DiffKind::Stable => {}
            }
        }
        Ok(counts)
    }

    // ── Snapshots ──────────────────────────────────────────────────

    async fn record_snapshot(
        &self,
        source: &SourceId,
        anomaly_count: i64,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Snapshot> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");

        let node_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM nodes WHERE source_id = ?1",
                params![source.as_str()],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        let edge_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM edges WHERE source_id = ?1",
                params![source.as_str()],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        let avg_occurrence: f64 = conn
            .query_row(
                "SELECT COALESCE(AVG(occurrence_count), 0.0) FROM nodes WHERE source_id = ?1",
                params![source.as_str()],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;

        let created_at = now.to_rfc3339();
        conn.execute(
            "INSERT INTO snapshots (source_id, node_count, edge_count, anomaly_count,
                                    avg_occurrence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                source.as_str(),
                node_count,
                edge_count,
                anomaly_count,
                avg_occurrence,
                created_at,
            ],
        )
        .map_err(StoreError::Sqlite)?;

        Ok(Snapshot {
            id: SnapshotId(conn.last_insert_rowid()),
            source: source.clone(),
            node_count,
            edge_count,
            anomaly_count,
            avg_occurrence,
            created_at: now,
        })
    }

    async fn list_snapshots(
        &self,
        source: Option<&SourceId>,
        since: Option<DateTime<Utc>>,
    ) -> crate::error::Result<Vec<Snapshot>> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");
        let mut sql = String::from("SELECT * FROM snapshots WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(source) = source {
            let _ = write!(sql, " AND source_id = ?{}", param_values.len() + 1);
            param_values.push(Box::new(source.as_str().to_string()));
        }
        if let Some(since) = since {
            let _ = write!(sql, " AND created_at >= ?{}", param_values.len() + 1);
            param_values.push(Box::new(since.to_rfc3339()));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut stmt = conn.prepare(&sql).map_err(StoreError::Sqlite)?;
        let params_ref: Vec<&dyn rusqlite::types::ToSql> = param_values
            .iter()
            .map(std::convert::AsRef::as_ref)
            .collect();
        let snapshots = stmt
            .query_map(params_ref.as_slice(), Self::row_to_snapshot)
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;

        Ok(snapshots)
    }

    // ── Store totals ───────────────────────────────────────────────

    async fn stats(&self) -> crate::error::Result<StoreStats> {
        let conn = self.conn.lock().expect("weft store mutex poisoned");

        let total_nodes: u64 = conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;
        let total_edges: u64 = conn
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;
        let total_snapshots: u64 = conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;
        let total_diffs: u64 = conn
            .query_row("SELECT COUNT(*) FROM diffs", [], |row| row.get(0))
            .map_err(StoreError::Sqlite)?;

        let mut stmt = conn
            .prepare("SELECT source_id, COUNT(*) FROM nodes GROUP BY source_id")
            .map_err(StoreError::Sqlite)?;
        let nodes_by_source: HashMap<String, u64> = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
            })
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<HashMap<_, _>>>()
            .map_err(StoreError::Sqlite)?;

        let db_size_bytes = self
            .db_path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map_or(0, |m| m.len());

        Ok(StoreStats {
            total_nodes,
            total_edges,
            total_snapshots,
            total_diffs,
            nodes_by_source,
            db_size_bytes,
        })
    }
}
