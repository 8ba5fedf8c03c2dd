//! Configuration model and YAML loading
//!
//! Loaded once at startup and immutable afterwards. A rule's zero values
//! mean "disabled": `max_docs: 0` and an empty `max_age` each disable that
//! condition, and `max_segments` below 1 falls back to the engine minimum.

use crate::error::{Result, RolloverError};
use serde::Deserialize;
use std::path::Path;

/// Engine connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Elasticsearch endpoint URLs, tried in order on transport failure
    pub endpoints: Vec<String>,
}

/// Rollover conditions for a single alias
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolloverConditions {
    /// Roll when the backing index holds at least this many documents.
    /// 0 disables the condition.
    #[serde(default)]
    pub max_docs: u64,

    /// Roll when the backing index is at least this old, in the engine's
    /// duration syntax (e.g. "7h"). Empty disables the condition.
    #[serde(default)]
    pub max_age: String,
}

impl RolloverConditions {
    /// True when at least one condition is configured
    pub fn any(&self) -> bool {
        self.max_docs > 0 || !self.max_age.is_empty()
    }
}

/// Post-rollover optimization settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolloverOptimize {
    /// Segment count to merge the retired index down to
    #[serde(default)]
    pub max_segments: i64,
}

impl RolloverOptimize {
    /// Effective merge target, clamped to the engine minimum of 1
    pub fn segment_target(&self) -> i64 {
        self.max_segments.max(1)
    }
}

/// One alias lifecycle rule
#[derive(Debug, Clone, Deserialize)]
pub struct RolloverRule {
    /// Write alias to evaluate
    pub alias: String,

    /// Template for the next backing index name, see [`crate::naming`]
    pub new_name: String,

    /// Conditions under which the alias is rolled over
    #[serde(default)]
    pub conditions: RolloverConditions,

    /// Optimization applied to the index that left write duty
    #[serde(default)]
    pub optimize: RolloverOptimize,
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Engine connection settings
    pub elasticsearch: EngineConfig,

    /// Alias rules, one independent run per rule per cycle
    #[serde(default)]
    pub rollover: Vec<RolloverRule>,
}

impl Config {
    /// Load and validate configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.elasticsearch.endpoints.is_empty() {
            return Err(RolloverError::config(
                "no Elasticsearch endpoints configured",
            ));
        }
        for rule in &self.rollover {
            if rule.alias.is_empty() {
                return Err(RolloverError::config("rollover rule with empty alias"));
            }
            if rule.new_name.is_empty() {
                return Err(RolloverError::config(format!(
                    "rollover rule '{}' has no new_name template",
                    rule.alias
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
elasticsearch:
  endpoints:
    - http://127.0.0.1:9200
    - http://127.0.0.2:9200

rollover:
  - alias: logs-write
    new_name: logs-write-%Y-%m-%d
    conditions:
      max_docs: 1000000
      max_age: 7h
    optimize:
      max_segments: 2
"#;

    #[test]
    fn test_full_config_parses() {
        let cfg = Config::from_yaml(FULL).unwrap();
        assert_eq!(cfg.elasticsearch.endpoints.len(), 2);
        assert_eq!(cfg.rollover.len(), 1);

        let rule = &cfg.rollover[0];
        assert_eq!(rule.alias, "logs-write");
        assert_eq!(rule.new_name, "logs-write-%Y-%m-%d");
        assert_eq!(rule.conditions.max_docs, 1_000_000);
        assert_eq!(rule.conditions.max_age, "7h");
        assert_eq!(rule.optimize.segment_target(), 2);
    }

    #[test]
    fn test_omitted_sections_default_to_disabled() {
        let cfg = Config::from_yaml(
            r#"
elasticsearch:
  endpoints:
    - http://127.0.0.1:9200
rollover:
  - alias: metrics-write
    new_name: metrics-%Y%m%d
"#,
        )
        .unwrap();

        let rule = &cfg.rollover[0];
        assert_eq!(rule.conditions.max_docs, 0);
        assert_eq!(rule.conditions.max_age, "");
        assert!(!rule.conditions.any());
        assert_eq!(rule.optimize.max_segments, 0);
        assert_eq!(rule.optimize.segment_target(), 1);
    }

    #[test]
    fn test_either_condition_alone_counts() {
        let docs_only = RolloverConditions {
            max_docs: 10,
            max_age: String::new(),
        };
        let age_only = RolloverConditions {
            max_docs: 0,
            max_age: "1d".into(),
        };
        assert!(docs_only.any());
        assert!(age_only.any());
    }

    #[test]
    fn test_empty_endpoints_rejected() {
        let err = Config::from_yaml(
            r#"
elasticsearch:
  endpoints: []
rollover: []
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RolloverError::Config(_)));
    }

    #[test]
    fn test_rule_without_new_name_rejected() {
        let err = Config::from_yaml(
            r#"
elasticsearch:
  endpoints:
    - http://127.0.0.1:9200
rollover:
  - alias: logs-write
    new_name: ""
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RolloverError::Config(_)));
    }

    #[test]
    fn test_malformed_yaml_surfaces_parse_error() {
        let err = Config::from_yaml("elasticsearch: [").unwrap_err();
        assert!(matches!(err, RolloverError::Yaml(_)));
    }
}
