use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level Weft configuration, matching `.weft/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeftConfig {
    #[serde(default)]
    pub weft: WeftSection,
    #[serde(default)]
    pub ingest: IngestSection,
}

impl WeftConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> crate::error::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.max_entities == 0 {
            return Err(ConfigError::Invalid(
                "ingest.max_entities must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeftSection {
    pub version: String,
}

impl Default for WeftSection {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
        }
    }
}

/// Per-ingestion growth bounds. The response-side caps (node/edge/anomaly
/// limits in query results) are part of the external contract and live as
/// constants in the query module; these bound how much one scrape may grow
/// the stored graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSection {
    /// Entities kept per ingestion, in extraction order.
    pub max_entities: usize,
    /// Co-occurrence pairs upserted per ingestion.
    pub max_edge_pairs: usize,
    /// Diff records persisted per ingestion.
    pub max_diffs: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            max_entities: 200,
            max_edge_pairs: 500,
            max_diffs: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_documented_caps() {
        let config = WeftConfig::default();
        assert_eq!(config.ingest.max_entities, 200);
        assert_eq!(config.ingest.max_edge_pairs, 500);
        assert_eq!(config.ingest.max_diffs, 500);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = WeftConfig::from_toml_str(
            r#"
            [ingest]
            max_entities = 50
            max_edge_pairs = 100
            max_diffs = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.max_entities, 50);
        assert_eq!(config.weft.version, "0.1.0");
    }

    #[test]
    fn empty_toml_is_default() {
        let config = WeftConfig::from_toml_str("").unwrap();
        assert_eq!(config.ingest.max_entities, 200);
    }

    #[test]
    fn zero_entity_cap_is_rejected() {
        let err = WeftConfig::from_toml_str(
            r"
            [ingest]
            max_entities = 0
            max_edge_pairs = 500
            max_diffs = 500
            ",
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_entities"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = WeftConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back = WeftConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.ingest.max_entities, config.ingest.max_entities);
    }
}
