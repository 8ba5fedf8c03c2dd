//! Engine client facade
//!
//! The narrow set of Elasticsearch operations the orchestrator sequences:
//! conditional rollover, settings update, flush, force-merge. Each is a
//! single request/response round trip with no local business logic; any
//! transport failure or non-success status surfaces uniformly as an error.
//!
//! The orchestrator consumes these through the [`Engine`] trait so the state
//! machine can be driven by a scripted double in tests; [`EngineClient`] is
//! the production implementation.

use crate::config::RolloverConditions;
use crate::error::{Result, RolloverError};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-request timeout for settings, flush and rollover calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Force-merge is a long-running engine operation and the call blocks until
/// it completes, so it gets its own client with a much larger timeout.
const FORCE_MERGE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Outcome of a conditional rollover request
#[derive(Debug, Clone, Deserialize)]
pub struct RolloverOutcome {
    /// Whether the alias was actually moved
    pub rolled_over: bool,

    /// Index that was receiving writes before the move
    #[serde(default)]
    pub old_index: String,

    /// Index the alias now points at
    #[serde(default)]
    pub new_index: String,
}

/// The remote operations the rollover orchestrator needs
pub trait Engine: Send + Sync {
    /// Apply a JSON settings partial-update to `index`
    fn put_settings(
        &self,
        index: &str,
        body: &Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Force a flush of `index`'s buffered segments to stable storage
    fn flush(&self, index: &str) -> impl Future<Output = Result<()>> + Send;

    /// Merge `index` down to at most `max_segments` segments, waiting for
    /// the engine-side operation to complete
    fn force_merge(
        &self,
        index: &str,
        max_segments: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Conditionally move the write alias to `new_index`, reporting whether
    /// the move happened and the concrete old/new index names
    fn rollover(
        &self,
        alias: &str,
        new_index: &str,
        conditions: &RolloverConditions,
    ) -> impl Future<Output = Result<RolloverOutcome>> + Send;
}

/// Production engine client backed by `reqwest`
///
/// Stateless aside from connection configuration; safe to share across
/// concurrent per-alias tasks.
#[derive(Debug)]
pub struct EngineClient {
    endpoints: Vec<String>,
    client: reqwest::Client,
    merge_client: reqwest::Client,
}

impl EngineClient {
    /// Build a client for the given endpoint list.
    ///
    /// Fails if the list is empty or the underlying HTTP client cannot be
    /// constructed; both are fatal startup errors.
    pub fn new(endpoints: &[String]) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(RolloverError::config(
                "no Elasticsearch endpoints configured",
            ));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let merge_client = reqwest::Client::builder()
            .timeout(FORCE_MERGE_TIMEOUT)
            .build()?;

        Ok(Self {
            endpoints: endpoints
                .iter()
                .map(|e| e.trim_end_matches('/').to_string())
                .collect(),
            client,
            merge_client,
        })
    }

    /// Issue a request against each configured endpoint in order, moving on
    /// only when the endpoint is unreachable. Any response, success or not,
    /// settles the attempt.
    async fn execute(
        &self,
        client: &reqwest::Client,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let mut last_err = None;

        for base in &self.endpoints {
            let url = format!("{base}{path}");
            let mut req = client.request(method.clone(), &url);
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    warn!(endpoint = %base, error = %err, "engine endpoint unreachable");
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(err) => Err(err.into()),
            None => Err(RolloverError::config(
                "no Elasticsearch endpoints configured",
            )),
        }
    }

    /// Map a non-success response to an engine error with its body attached
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RolloverError::engine(status.as_u16(), body))
    }

    /// Build the rollover request body, including only configured conditions
    fn conditions_body(conditions: &RolloverConditions) -> Value {
        let mut cond = serde_json::Map::new();
        if conditions.max_docs > 0 {
            cond.insert("max_docs".into(), json!(conditions.max_docs));
        }
        if !conditions.max_age.is_empty() {
            cond.insert("max_age".into(), json!(conditions.max_age));
        }
        json!({ "conditions": cond })
    }
}

impl Engine for EngineClient {
    async fn put_settings(&self, index: &str, body: &Value) -> Result<()> {
        debug!(index = %index, "PUT _settings");
        let path = format!("/{index}/_settings");
        let resp = self.execute(&self.client, Method::PUT, &path, Some(body)).await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn flush(&self, index: &str) -> Result<()> {
        debug!(index = %index, "POST _flush");
        let path = format!("/{index}/_flush?force=true");
        let resp = self.execute(&self.client, Method::POST, &path, None).await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn force_merge(&self, index: &str, max_segments: i64) -> Result<()> {
        debug!(index = %index, max_segments, "POST _forcemerge");
        let path = format!("/{index}/_forcemerge?max_num_segments={max_segments}");
        let resp = self
            .execute(&self.merge_client, Method::POST, &path, None)
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn rollover(
        &self,
        alias: &str,
        new_index: &str,
        conditions: &RolloverConditions,
    ) -> Result<RolloverOutcome> {
        debug!(alias = %alias, new_index = %new_index, "POST _rollover");
        let path = format!("/{alias}/_rollover/{new_index}");
        let body = Self::conditions_body(conditions);
        let resp = self
            .execute(&self.client, Method::POST, &path, Some(&body))
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json::<RolloverOutcome>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions_body_includes_only_configured_keys() {
        let both = RolloverConditions {
            max_docs: 1000,
            max_age: "7h".into(),
        };
        assert_eq!(
            EngineClient::conditions_body(&both),
            json!({"conditions": {"max_docs": 1000, "max_age": "7h"}})
        );

        let docs_only = RolloverConditions {
            max_docs: 5,
            max_age: String::new(),
        };
        assert_eq!(
            EngineClient::conditions_body(&docs_only),
            json!({"conditions": {"max_docs": 5}})
        );

        let none = RolloverConditions::default();
        assert_eq!(
            EngineClient::conditions_body(&none),
            json!({"conditions": {}})
        );
    }

    #[test]
    fn test_new_rejects_empty_endpoint_list() {
        let err = EngineClient::new(&[]).unwrap_err();
        assert!(matches!(err, RolloverError::Config(_)));
    }

    #[test]
    fn test_new_trims_trailing_slashes() {
        let client =
            EngineClient::new(&["http://127.0.0.1:9200/".to_string()]).unwrap();
        assert_eq!(client.endpoints, vec!["http://127.0.0.1:9200"]);
    }

    #[test]
    fn test_rollover_outcome_decodes_engine_response() {
        let raw = r#"{
            "acknowledged": true,
            "shards_acknowledged": true,
            "old_index": "logs-000007",
            "new_index": "logs-000008",
            "rolled_over": true,
            "dry_run": false,
            "conditions": {"[max_docs: 1000]": true}
        }"#;
        let outcome: RolloverOutcome = serde_json::from_str(raw).unwrap();
        assert!(outcome.rolled_over);
        assert_eq!(outcome.old_index, "logs-000007");
        assert_eq!(outcome.new_index, "logs-000008");
    }
}
