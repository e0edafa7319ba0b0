// Integration test utilities and payload fixtures for Weft.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

use weft_core::config::WeftConfig;
use weft_core::ingest::IngestPipeline;
use weft_core::query::{DEFAULT_ANALYTICS_TIMEOUT, QueryResponse, TimeRange, query_graph};
use weft_core::store::SqliteStore;
use weft_core::types::{IngestReport, SourceId};

/// A graph engine over a throwaway in-memory store.
#[derive(Debug)]
pub struct TestEngine {
    pub store: SqliteStore,
    pub pipeline: IngestPipeline,
}

impl TestEngine {
    pub fn new() -> Self {
        Self {
            store: SqliteStore::in_memory().expect("open in-memory store"),
            pipeline: IngestPipeline::new(&WeftConfig::default()),
        }
    }

    /// Run one scrape payload through the full pipeline at a fixed instant.
    pub async fn ingest_at(&self, source: &str, payload: &Value, at: DateTime<Utc>) -> IngestReport {
        self.pipeline
            .ingest(&self.store, &SourceId::new(source), payload, None, at)
            .await
            .expect("ingestion failed")
    }

    /// Answer a graph query as of a fixed instant.
    pub async fn query_at(
        &self,
        range: TimeRange,
        source: Option<&str>,
        now: DateTime<Utc>,
    ) -> QueryResponse {
        let source = source.map(SourceId::new);
        query_graph(
            &self.store,
            range,
            source.as_ref(),
            DEFAULT_ANALYTICS_TIMEOUT,
            now,
        )
        .await
        .expect("query failed")
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed, readable timestamps on a June 2024 calendar.
pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// A minimal scraped article: headline, link and publication date.
///
/// Extracts six entities (three field names, a text, a URL and a date)
/// which co-occur as a full 15-edge clique.
pub fn article_payload() -> Value {
    json!({
        "title": "Breaking News",
        "link": "https://example.com/a",
        "date": "2024-01-01",
    })
}

/// The same article scraped after its date field stopped rendering.
pub fn article_without_date() -> Value {
    json!({
        "title": "Breaking News",
        "link": "https://example.com/a",
    })
}

/// One page of a scraped news feed. `offset` shifts which stories are
/// on the page, simulating a front page rolling over between scrapes.
pub fn feed_page(items: usize, offset: usize) -> Value {
    let entries: Vec<Value> = (0..items)
        .map(|i| {
            let n = offset + i;
            json!({
                "title": format!("Story {n}"),
                "link": format!("https://news.example.com/story/{n}"),
                "published": format!("2024-06-{:02}", n % 28 + 1),
            })
        })
        .collect();
    json!({
        "site": "Example News",
        "entries": entries,
    })
}
