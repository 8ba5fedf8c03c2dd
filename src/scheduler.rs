//! Fixed-interval scheduling of per-alias rollover runs
//!
//! A single outer loop wakes on a fixed interval and launches one
//! independent task per configured rule without waiting for them to finish.
//! Runs share nothing but the read-only engine client; a failure in one
//! alias's run never reaches another. A per-alias in-flight guard keeps a
//! slow run (typically a long force-merge) from overlapping itself on the
//! next tick: the tick skips that alias and the following cycle picks it up
//! again.

use crate::config::RolloverRule;
use crate::engine::Engine;
use crate::rollover;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Default wake-up interval between evaluation cycles
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Set of aliases with a run currently in flight
#[derive(Clone, Default)]
pub struct InFlight(Arc<Mutex<HashSet<String>>>);

impl InFlight {
    /// Create an empty guard set
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `alias` for a run; false when one is still active
    fn claim(&self, alias: &str) -> bool {
        self.lock().insert(alias.to_string())
    }

    /// Release `alias` after its run completed, success or failure
    fn release(&self, alias: &str) {
        self.lock().remove(alias);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Launch one evaluation cycle: spawn an independent run per rule.
///
/// Returns the handles of the runs actually spawned; aliases whose previous
/// run is still in flight are skipped.
pub fn tick<E>(
    engine: &Arc<E>,
    rules: &[RolloverRule],
    inflight: &InFlight,
) -> Vec<JoinHandle<()>>
where
    E: Engine + 'static,
{
    let mut handles = Vec::with_capacity(rules.len());

    for rule in rules {
        if !inflight.claim(&rule.alias) {
            warn!(
                alias = %rule.alias,
                "previous run still in flight, skipping this cycle"
            );
            continue;
        }

        let engine = Arc::clone(engine);
        let inflight = inflight.clone();
        let rule = rule.clone();

        handles.push(tokio::spawn(async move {
            let alias = rule.alias.clone();
            rollover::run(rule, engine.as_ref()).await;
            inflight.release(&alias);
        }));
    }

    handles
}

/// Run a single evaluation cycle and wait for every spawned run to finish
pub async fn run_once<E>(engine: Arc<E>, rules: &[RolloverRule])
where
    E: Engine + 'static,
{
    let inflight = InFlight::new();
    for handle in tick(&engine, rules, &inflight) {
        if let Err(err) = handle.await {
            warn!(error = %err, "rollover task panicked");
        }
    }
}

/// Run evaluation cycles forever on a fixed interval.
///
/// The first cycle fires immediately. Ticks never wait for the previous
/// cycle's runs to complete.
pub async fn run_forever<E>(engine: Arc<E>, rules: Vec<RolloverRule>, interval: Duration)
where
    E: Engine + 'static,
{
    let inflight = InFlight::new();
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        info!("evaluation cycle start");
        tick(&engine, &rules, &inflight);
        info!("evaluation cycle done, sleeping");
    }
}
