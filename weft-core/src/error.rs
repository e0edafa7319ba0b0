use crate::ingest::IngestStage;
use crate::types::SourceId;

/// Top-level Weft error type.
///
/// All fallible operations in `weft-core` return [`Result<T, WeftError>`](Result).
/// One variant per subsystem, each wrapping that subsystem's own enum, so
/// callers can match on where a failure came from.
#[derive(thiserror::Error, Debug)]
pub enum WeftError {
    /// Error from the graph store layer (`SQLite` operations, schema setup).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error during graph ingestion (a pipeline stage aborted).
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Error at the query façade (validation, degraded reads).
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Bad configuration, whether unparseable or out of range.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl WeftError {
    /// Whether retrying the same operation is safe and worthwhile.
    ///
    /// Store failures qualify: upserts are idempotent increment-or-create
    /// operations, so re-running an aborted ingestion cannot double-count.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Ingest(IngestError::Aborted { .. }))
    }
}

/// Errors from the SQLite-backed graph store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// `SQLite` rejected or failed an operation.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors during the ingestion pipeline.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    /// A pipeline stage failed. Carries the counts committed before the
    /// failure so callers can report partial progress; no snapshot is
    /// written for an aborted run.
    #[error(
        "ingestion for source {source} aborted during {stage} \
         (nodes={nodes_processed}, edges={edges_processed}): {cause}"
    )]
    Aborted {
        stage: IngestStage,
        source: SourceId,
        nodes_processed: u64,
        edges_processed: u64,
        #[source]
        cause: StoreError,
    },
}

/// Errors at the query façade, before any store access.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// The time-range token is not one of the accepted values.
    #[error("invalid time range {0:?} (expected one of: 1h, 6h, 24h, 7d, 30d)")]
    InvalidRange(String),
}

/// Errors in Weft configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file parsed but a value fails validation.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// The file is not valid TOML.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, WeftError>`.
pub type Result<T> = std::result::Result<T, WeftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_retryable() {
        let err = WeftError::Store(StoreError::Sqlite(
            rusqlite::Error::ExecuteReturnedResults,
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let err = WeftError::Query(QueryError::InvalidRange("90d".to_string()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn aborted_ingestion_reports_counts() {
        let err = IngestError::Aborted {
            stage: IngestStage::Upserting,
            source: SourceId::new("feed-1"),
            nodes_processed: 12,
            edges_processed: 0,
            cause: StoreError::Sqlite(rusqlite::Error::ExecuteReturnedResults),
        };
        let msg = err.to_string();
        assert!(msg.contains("feed-1"));
        assert!(msg.contains("nodes=12"));
        assert!(msg.contains("upserting"));
    }
}
