//! Polling loop that re-runs the workflow whenever the diff changes.
//!
//! Each tick probes the tree directly and only starts a full run when the
//! diff is non-empty and differs from the last one that triggered a run.
//! Shutdown is only observed between ticks, so a run is never interrupted.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use gitscribe_shared::{ChangeProbe, ChangeSet, GitScribeError, Result, RunResult};

use crate::engine::{ProgressReporter, Workflow};

// ---------------------------------------------------------------------------
// Dedup state
// ---------------------------------------------------------------------------

/// Last non-empty diff that triggered a run.
///
/// Single slot: a tree that goes A → B → A triggers three runs.
#[derive(Debug, Clone, Default)]
pub struct WatchState {
    last_seen: Option<ChangeSet>,
}

impl WatchState {
    /// Returns `true` when `diff` should trigger a run, remembering it.
    pub fn observe(&mut self, diff: &ChangeSet) -> bool {
        if diff.is_empty() || self.last_seen.as_ref() == Some(diff) {
            return false;
        }
        self.last_seen = Some(diff.clone());
        true
    }

    pub fn last_seen(&self) -> Option<&ChangeSet> {
        self.last_seen.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tick outcome & summary
// ---------------------------------------------------------------------------

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Empty or already-seen diff.
    Idle,
    /// A run completed.
    Ran(RunResult),
    /// A run was attempted and aborted. Polling continues.
    RunFailed(GitScribeError),
}

/// Counters returned when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub ticks: u64,
    pub runs: u64,
    pub commits: u64,
    pub failures: u64,
}

impl WatchSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Ran(result) => {
                self.runs += 1;
                if result.is_commit() {
                    self.commits += 1;
                }
            }
            TickOutcome::RunFailed(_) => {
                self.runs += 1;
                self.failures += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// WatchSupervisor
// ---------------------------------------------------------------------------

/// Drives a [`Workflow`] on a fixed delay until told to stop.
pub struct WatchSupervisor<Q, W> {
    probe: Q,
    workflow: W,
    interval: Duration,
}

impl<Q, W> WatchSupervisor<Q, W>
where
    Q: ChangeProbe,
    W: Workflow,
{
    /// `probe` is the cheap pre-check; the workflow probes again on its own.
    pub fn new(probe: Q, workflow: W, interval: Duration) -> Self {
        Self {
            probe,
            workflow,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One poll. A failing pre-check probe is returned as an error; a failing
    /// run is reported and returned as [`TickOutcome::RunFailed`].
    pub async fn tick(
        &self,
        state: &mut WatchState,
        progress: &dyn ProgressReporter,
    ) -> Result<TickOutcome> {
        let diff = self.probe.diff().await?;

        if !state.observe(&diff) {
            debug!(empty = diff.is_empty(), "no new change");
            return Ok(TickOutcome::Idle);
        }

        info!(fingerprint = %diff.fingerprint(), "change detected, running workflow");
        match self.workflow.run(progress).await {
            Ok(result) => Ok(TickOutcome::Ran(result)),
            Err(e) => {
                error!(error = %e, "workflow run failed, continuing to watch");
                Ok(TickOutcome::RunFailed(e))
            }
        }
    }

    /// Poll until `shutdown` resolves. Always performs at least one tick.
    #[instrument(skip_all, fields(interval_ms = self.interval.as_millis() as u64))]
    pub async fn run_until<F>(
        &self,
        shutdown: F,
        progress: &dyn ProgressReporter,
    ) -> Result<WatchSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut state = WatchState::default();
        let mut summary = WatchSummary::default();

        info!("watch loop started");
        loop {
            let outcome = self.tick(&mut state, progress).await?;
            summary.record(&outcome);

            progress.phase("Waiting for changes");
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested, leaving watch loop");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(
            ticks = summary.ticks,
            runs = summary.runs,
            commits = summary.commits,
            failures = summary.failures,
            "watch loop stopped"
        );
        Ok(summary)
    }
}
