//! Weft core library: the temporal entity graph engine.
//!
//! The write path is [`ingest::IngestPipeline`], which turns scrape
//! payloads into graph mutations on a [`store::GraphStore`]. The read
//! path is [`query::query_graph`], which assembles the capped
//! visualization graph and the analytics bundle for one time window.

pub mod analyze;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod query;
pub mod store;
pub mod types;
