//! Rollover orchestration state machine
//!
//! One run per alias per scheduler tick. The run walks a fixed sequence of
//! remote operations, each depending on the success of the previous:
//!
//! ```text
//! Evaluate ──► MakeReadOnly ──► Flush ──► ForceMerge ──► Done
//!    │              │             │            │
//!    └──────────────┴─────────────┴────────────┘
//!            any failure → Done, error recorded
//! ```
//!
//! No step is retried within a run and no rollback is attempted: every step
//! is idempotent or safely skippable, and the next scheduled cycle
//! re-evaluates from the engine's real state rather than resuming from a
//! checkpoint. States are an enum and transitions an explicit `step`
//! function driven by a loop.

use crate::config::RolloverRule;
use crate::engine::Engine;
use crate::error::RolloverError;
use crate::naming;
use chrono::Utc;
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

/// Orchestration states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Evaluate conditions and submit the conditional rollover
    Evaluate,
    /// Block writes on the index that just left write duty
    MakeReadOnly,
    /// Flush its buffered segments to stable storage
    Flush,
    /// Merge it down to the configured segment count
    ForceMerge,
    /// Terminal; error (if any) has been recorded
    Done,
}

/// Ephemeral per-run state, created at run start and dropped at run end
#[derive(Debug)]
pub struct RolloverRun {
    /// The rule being evaluated
    pub rule: RolloverRule,

    /// Name rendered locally from the rule template before the rollover call
    pub requested_index: String,

    /// Index that left write duty, as reported by the engine. Only set once
    /// the engine confirms `rolled_over = true`; the engine's answer is
    /// authoritative over [`Self::requested_index`].
    pub old_index: Option<String>,

    /// Index now receiving writes, as reported by the engine
    pub new_index: Option<String>,

    /// Terminal error, if any step failed
    pub error: Option<RolloverError>,
}

impl RolloverRun {
    fn new(rule: RolloverRule) -> Self {
        Self {
            rule,
            requested_index: String::new(),
            old_index: None,
            new_index: None,
            error: None,
        }
    }

    /// Record a terminal error and end the run
    fn fail(&mut self, err: RolloverError) -> State {
        self.error = Some(err);
        State::Done
    }
}

/// Execute one full orchestration run for `rule`.
///
/// Never returns an error: failures are recorded in the returned run and
/// logged; retry is delegated to the next scheduled cycle.
pub async fn run<E: Engine>(rule: RolloverRule, engine: &E) -> RolloverRun {
    let mut run = RolloverRun::new(rule);
    let mut state = State::Evaluate;

    while state != State::Done {
        state = step(state, &mut run, engine).await;
    }

    if let Some(err) = &run.error {
        let index = run.old_index.as_deref().unwrap_or(&run.rule.alias);
        warn!(index = %index, error = %err, "rollover run failed");
    }

    run
}

/// Execute the work of `state` and return the successor state
async fn step<E: Engine>(state: State, run: &mut RolloverRun, engine: &E) -> State {
    match state {
        State::Evaluate => evaluate(run, engine).await,
        State::MakeReadOnly => make_read_only(run, engine).await,
        State::Flush => flush(run, engine).await,
        State::ForceMerge => force_merge(run, engine).await,
        State::Done => State::Done,
    }
}

async fn evaluate<E: Engine>(run: &mut RolloverRun, engine: &E) -> State {
    info!(alias = %run.rule.alias, "checking rollover");

    run.requested_index = naming::render(&run.rule.new_name, Utc::now());

    if !run.rule.conditions.any() {
        info!(alias = %run.rule.alias, "no rollover condition defined, skipping");
        return State::Done;
    }

    if run.rule.conditions.max_docs > 0 {
        info!(
            alias = %run.rule.alias,
            max_docs = run.rule.conditions.max_docs,
            "adding rollover condition"
        );
    }
    if !run.rule.conditions.max_age.is_empty() {
        info!(
            alias = %run.rule.alias,
            max_age = %run.rule.conditions.max_age,
            "adding rollover condition"
        );
    }

    info!(
        alias = %run.rule.alias,
        new_index = %run.requested_index,
        "performing conditional rollover"
    );

    let outcome = match engine
        .rollover(&run.rule.alias, &run.requested_index, &run.rule.conditions)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => return run.fail(err),
    };

    if !outcome.rolled_over {
        info!(alias = %run.rule.alias, "no condition matched, skipping");
        return State::Done;
    }

    if outcome.old_index.is_empty() {
        return run.fail(RolloverError::config(
            "engine reported rollover without an old index name",
        ));
    }

    info!(
        alias = %run.rule.alias,
        old_index = %outcome.old_index,
        new_index = %outcome.new_index,
        "rolled over"
    );
    run.old_index = Some(outcome.old_index);
    run.new_index = Some(outcome.new_index);
    State::MakeReadOnly
}

async fn make_read_only<E: Engine>(run: &mut RolloverRun, engine: &E) -> State {
    let Some(old) = run.old_index.clone() else {
        return run.fail(RolloverError::config("no rolled-over index recorded"));
    };

    info!(index = %old, "making read-only");
    let body = json!({"index.blocks.write": true});

    match engine.put_settings(&old, &body).await {
        Ok(()) => {
            info!(index = %old, "is now read-only");
            State::Flush
        }
        Err(err) => run.fail(err),
    }
}

async fn flush<E: Engine>(run: &mut RolloverRun, engine: &E) -> State {
    let Some(old) = run.old_index.clone() else {
        return run.fail(RolloverError::config("no rolled-over index recorded"));
    };

    info!(index = %old, "requesting flush");

    match engine.flush(&old).await {
        Ok(()) => {
            info!(index = %old, "flushed");
            State::ForceMerge
        }
        Err(err) => run.fail(err),
    }
}

async fn force_merge<E: Engine>(run: &mut RolloverRun, engine: &E) -> State {
    let Some(old) = run.old_index.clone() else {
        return run.fail(RolloverError::config("no rolled-over index recorded"));
    };

    let target = run.rule.optimize.segment_target();
    let started = Instant::now();
    info!(index = %old, max_num_segments = target, "requesting force-merge");

    match engine.force_merge(&old, target).await {
        Ok(()) => {
            info!(
                index = %old,
                elapsed = ?started.elapsed(),
                "force-merge complete"
            );
            State::Done
        }
        Err(err) => run.fail(err),
    }
}
