//! The commit workflow: probe → describe → stage → commit.
//!
//! Each stage consumes exactly one [`WorkflowEvent`] and produces the next.
//! An empty diff becomes the sentinel [`Description`], which the stage and
//! commit steps pass through, so the no-op path needs no separate abort
//! channel. Any stage error aborts the run and is returned to the caller.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use gitscribe_shared::{
    ChangeProbe, ChangeSet, Committer, Description, DescriptionGenerator, GitScribeError, Result,
    RunId, RunResult,
};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The single in-flight value of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// Nothing probed yet.
    Start,
    /// Fresh diff of the working tree (possibly empty).
    Diff(ChangeSet),
    /// Message for the commit, or the sentinel.
    Message(Description),
    /// Message carried past the staging step unchanged.
    Staged(Description),
    /// Terminal value.
    Stop(RunResult),
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting workflow status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a run reaches its terminal value.
    fn done(&self, result: &RunResult);
    /// Called when a run aborts.
    fn failed(&self, error: &GitScribeError);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &RunResult) {}
    fn failed(&self, _error: &GitScribeError) {}
}

// ---------------------------------------------------------------------------
// Workflow seam
// ---------------------------------------------------------------------------

/// Something that performs one complete run. Implemented by
/// [`WorkflowEngine`]; the watch loop only depends on this.
#[async_trait]
pub trait Workflow: Send + Sync {
    async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunResult>;
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Orchestrates one run over the three collaborators, strictly in order.
pub struct WorkflowEngine<P, D, C> {
    probe: P,
    describer: D,
    committer: C,
    /// Serializes runs; the working tree is the shared resource.
    run_lock: Mutex<()>,
}

impl<P, D, C> WorkflowEngine<P, D, C>
where
    P: ChangeProbe,
    D: DescriptionGenerator,
    C: Committer,
{
    pub fn new(probe: P, describer: D, committer: C) -> Self {
        Self {
            probe,
            describer,
            committer,
            run_lock: Mutex::new(()),
        }
    }

    /// Advance one event. `Stop` is returned unchanged.
    ///
    /// Does not take the run lock; only `traverse` calls it, under that lock.
    pub(crate) async fn step(
        &self,
        event: WorkflowEvent,
        progress: &dyn ProgressReporter,
    ) -> Result<WorkflowEvent> {
        match event {
            WorkflowEvent::Start => self.get_diff(progress).await.map(WorkflowEvent::Diff),
            WorkflowEvent::Diff(diff) => self
                .generate_message(diff, progress)
                .await
                .map(WorkflowEvent::Message),
            WorkflowEvent::Message(message) => self
                .stage_changes(message, progress)
                .await
                .map(WorkflowEvent::Staged),
            WorkflowEvent::Staged(message) => self
                .commit_changes(message, progress)
                .await
                .map(WorkflowEvent::Stop),
            stop @ WorkflowEvent::Stop(_) => Ok(stop),
        }
    }

    #[instrument(skip_all, fields(run_id = %run_id))]
    async fn traverse(&self, run_id: RunId, progress: &dyn ProgressReporter) -> Result<RunResult> {
        let mut event = WorkflowEvent::Start;
        loop {
            event = match self.step(event, progress).await {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "workflow run aborted");
                    progress.failed(&e);
                    return Err(e);
                }
            };

            if let WorkflowEvent::Stop(result) = event {
                info!(%result, "workflow run finished");
                progress.done(&result);
                return Ok(result);
            }
        }
    }

    /// Stage 1: read the working-tree diff.
    async fn get_diff(&self, progress: &dyn ProgressReporter) -> Result<ChangeSet> {
        progress.phase("Retrieving git diff");
        info!("retrieving git diff");

        let diff = self.probe.diff().await?;
        if diff.is_empty() {
            info!("no changes detected");
        } else {
            info!(
                bytes = diff.as_str().len(),
                fingerprint = %diff.fingerprint(),
                "detected changes"
            );
        }
        Ok(diff)
    }

    /// Stage 2: describe the diff, or emit the sentinel for an empty one.
    async fn generate_message(
        &self,
        diff: ChangeSet,
        progress: &dyn ProgressReporter,
    ) -> Result<Description> {
        if diff.is_empty() {
            info!("skipping message generation: no changes detected");
            return Ok(Description::no_changes());
        }

        progress.phase("Generating commit message");
        info!("generating commit message from diff");
        let message = self.describer.describe(&diff).await?;
        info!(%message, "generated message");
        Ok(message)
    }

    /// Stage 3: stage everything, unless carrying the sentinel.
    async fn stage_changes(
        &self,
        message: Description,
        progress: &dyn ProgressReporter,
    ) -> Result<Description> {
        if message.is_no_changes() {
            info!("nothing to stage");
            return Ok(message);
        }

        progress.phase("Staging changes");
        info!("staging all changes");
        self.committer.stage_all().await?;
        info!("changes staged");
        Ok(message)
    }

    /// Stage 4: commit with the message, or stop with the no-op result.
    async fn commit_changes(
        &self,
        message: Description,
        progress: &dyn ProgressReporter,
    ) -> Result<RunResult> {
        if message.is_no_changes() {
            info!("no commit created");
            return Ok(RunResult::NoChanges);
        }

        progress.phase("Committing");
        info!(%message, "committing changes");
        self.committer.commit(&message).await?;
        info!("commit complete");
        Ok(RunResult::Committed { message })
    }
}

#[async_trait]
impl<P, D, C> Workflow for WorkflowEngine<P, D, C>
where
    P: ChangeProbe,
    D: DescriptionGenerator,
    C: Committer,
{
    /// One START→STOP traversal. Concurrent callers queue behind each other.
    async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunResult> {
        let _guard = self.run_lock.lock().await;
        self.traverse(RunId::new(), progress).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    use super::*;

    /// Shared call log so ordering across collaborators can be asserted.
    type CallLog = Arc<StdMutex<Vec<String>>>;

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    struct FixedProbe {
        diff: &'static str,
        log: CallLog,
    }

    #[async_trait]
    impl ChangeProbe for FixedProbe {
        async fn diff(&self) -> Result<ChangeSet> {
            self.log.lock().unwrap().push("diff".into());
            Ok(ChangeSet::new(self.diff))
        }
    }

    struct BrokenProbe;

    #[async_trait]
    impl ChangeProbe for BrokenProbe {
        async fn diff(&self) -> Result<ChangeSet> {
            Err(GitScribeError::Probe("not a git repository".into()))
        }
    }

    struct ScriptedDescriber {
        reply: std::result::Result<&'static str, &'static str>,
        log: CallLog,
    }

    #[async_trait]
    impl DescriptionGenerator for ScriptedDescriber {
        async fn describe(&self, diff: &ChangeSet) -> Result<Description> {
            self.log.lock().unwrap().push(format!("describe:{diff}"));
            match self.reply {
                Ok(text) => Ok(Description::new(text)),
                Err(e) => Err(GitScribeError::Description(e.into())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingCommitter {
        log: CallLog,
        fail_stage: bool,
        fail_commit: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Committer for RecordingCommitter {
        async fn stage_all(&self) -> Result<()> {
            self.log.lock().unwrap().push("stage".into());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_stage {
                return Err(GitScribeError::Stage("index.lock exists".into()));
            }
            Ok(())
        }

        async fn commit(&self, message: &Description) -> Result<()> {
            self.log.lock().unwrap().push(format!("commit:{message}"));
            if self.fail_commit {
                return Err(GitScribeError::Commit("hook rejected".into()));
            }
            Ok(())
        }
    }

    fn engine(
        diff: &'static str,
        reply: std::result::Result<&'static str, &'static str>,
    ) -> (
        WorkflowEngine<FixedProbe, ScriptedDescriber, RecordingCommitter>,
        CallLog,
    ) {
        let log = CallLog::default();
        let engine = WorkflowEngine::new(
            FixedProbe {
                diff,
                log: log.clone(),
            },
            ScriptedDescriber {
                reply,
                log: log.clone(),
            },
            RecordingCommitter {
                log: log.clone(),
                ..Default::default()
            },
        );
        (engine, log)
    }

    /// Records what the engine reported.
    #[derive(Default)]
    struct RecordingProgress {
        phases: StdMutex<Vec<String>>,
        done: StdMutex<Option<RunResult>>,
        failed: StdMutex<Option<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.phases.lock().unwrap().push(name.to_string());
        }
        fn done(&self, result: &RunResult) {
            *self.done.lock().unwrap() = Some(result.clone());
        }
        fn failed(&self, error: &GitScribeError) {
            *self.failed.lock().unwrap() = Some(error.to_string());
        }
    }

    #[tokio::test]
    async fn empty_diff_is_a_no_op() {
        let (engine, log) = engine("", Ok("unused"));

        let result = engine.run(&SilentProgress).await.unwrap();

        assert_eq!(result, RunResult::NoChanges);
        assert_eq!(result.to_string(), "No changes detected.");
        assert_eq!(calls(&log), vec!["diff"]);
    }

    #[tokio::test]
    async fn whitespace_only_diff_is_a_no_op() {
        let (engine, log) = engine("  \n\n", Ok("unused"));
        assert_eq!(engine.run(&SilentProgress).await.unwrap(), RunResult::NoChanges);
        assert_eq!(calls(&log), vec!["diff"]);
    }

    #[tokio::test]
    async fn change_is_described_staged_and_committed_in_order() {
        let (engine, log) = engine("+added line", Ok("Add a line"));

        let result = engine.run(&SilentProgress).await.unwrap();

        assert_eq!(result.to_string(), "Committed with message: Add a line");
        assert_eq!(
            calls(&log),
            vec!["diff", "describe:+added line", "stage", "commit:Add a line"]
        );
    }

    #[tokio::test]
    async fn describer_failure_aborts_before_staging() {
        let (engine, log) = engine("+added line", Err("connection refused"));

        let err = engine.run(&SilentProgress).await.unwrap_err();

        assert!(matches!(err, GitScribeError::Description(_)));
        assert_eq!(calls(&log), vec!["diff", "describe:+added line"]);
    }

    #[tokio::test]
    async fn probe_failure_propagates() {
        let log = CallLog::default();
        let engine = WorkflowEngine::new(
            BrokenProbe,
            ScriptedDescriber {
                reply: Ok("unused"),
                log: log.clone(),
            },
            RecordingCommitter {
                log: log.clone(),
                ..Default::default()
            },
        );

        let err = engine.run(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, GitScribeError::Probe(_)));
        assert!(calls(&log).is_empty());
    }

    #[tokio::test]
    async fn stage_failure_skips_commit() {
        let log = CallLog::default();
        let engine = WorkflowEngine::new(
            FixedProbe {
                diff: "+x",
                log: log.clone(),
            },
            ScriptedDescriber {
                reply: Ok("Add x"),
                log: log.clone(),
            },
            RecordingCommitter {
                log: log.clone(),
                fail_stage: true,
                ..Default::default()
            },
        );

        let err = engine.run(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, GitScribeError::Stage(_)));
        assert_eq!(calls(&log), vec!["diff", "describe:+x", "stage"]);
    }

    #[tokio::test]
    async fn commit_failure_is_reported() {
        let log = CallLog::default();
        let engine = WorkflowEngine::new(
            FixedProbe {
                diff: "+x",
                log: log.clone(),
            },
            ScriptedDescriber {
                reply: Ok("Add x"),
                log: log.clone(),
            },
            RecordingCommitter {
                log: log.clone(),
                fail_commit: true,
                ..Default::default()
            },
        );
        let progress = RecordingProgress::default();

        let err = engine.run(&progress).await.unwrap_err();

        assert!(matches!(err, GitScribeError::Commit(_)));
        assert!(progress.done.lock().unwrap().is_none());
        let failed = progress.failed.lock().unwrap().clone().unwrap();
        assert!(failed.contains("hook rejected"));
    }

    #[tokio::test]
    async fn sentinel_from_describer_short_circuits() {
        let (engine, log) = engine("+x", Ok("No changes detected."));

        let result = engine.run(&SilentProgress).await.unwrap();

        assert_eq!(result, RunResult::NoChanges);
        assert_eq!(calls(&log), vec!["diff", "describe:+x"]);
    }

    #[tokio::test]
    async fn step_walks_the_state_machine() {
        let (engine, _log) = engine("+x", Ok("Add x"));
        let progress = SilentProgress;

        let diff = engine.step(WorkflowEvent::Start, &progress).await.unwrap();
        assert_eq!(diff, WorkflowEvent::Diff(ChangeSet::new("+x")));

        let message = engine.step(diff, &progress).await.unwrap();
        assert_eq!(message, WorkflowEvent::Message(Description::new("Add x")));

        let staged = engine.step(message, &progress).await.unwrap();
        assert_eq!(staged, WorkflowEvent::Staged(Description::new("Add x")));

        let stop = engine.step(staged, &progress).await.unwrap();
        let expected = WorkflowEvent::Stop(RunResult::Committed {
            message: Description::new("Add x"),
        });
        assert_eq!(stop, expected);

        assert_eq!(engine.step(stop, &progress).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn progress_sees_phases_and_result() {
        let (engine, _log) = engine("+x", Ok("Add x"));
        let progress = RecordingProgress::default();

        engine.run(&progress).await.unwrap();

        assert_eq!(
            *progress.phases.lock().unwrap(),
            vec![
                "Retrieving git diff",
                "Generating commit message",
                "Staging changes",
                "Committing"
            ]
        );
        assert!(progress.done.lock().unwrap().as_ref().unwrap().is_commit());
    }

    #[tokio::test]
    async fn concurrent_runs_do_not_interleave() {
        let log = CallLog::default();
        let engine = Arc::new(WorkflowEngine::new(
            FixedProbe {
                diff: "+x",
                log: log.clone(),
            },
            ScriptedDescriber {
                reply: Ok("Add x"),
                log: log.clone(),
            },
            RecordingCommitter {
                log: log.clone(),
                delay: Some(Duration::from_millis(20)),
                ..Default::default()
            },
        ));

        let a = tokio::spawn({
            let engine = engine.clone();
            async move { engine.run(&SilentProgress).await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            async move { engine.run(&SilentProgress).await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let one_run = ["diff", "describe:+x", "stage", "commit:Add x"];
        let expected: Vec<String> = one_run
            .iter()
            .chain(one_run.iter())
            .map(|s| s.to_string())
            .collect();
        assert_eq!(calls(&log), expected);
    }
}
