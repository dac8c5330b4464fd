//! Workflow orchestration for gitscribe.
//!
//! Ties the collaborator seams from `gitscribe-shared` into the commit
//! workflow (`engine`) and the polling loop that repeats it (`watch`).

pub mod engine;
pub mod watch;

pub use engine::{ProgressReporter, SilentProgress, Workflow, WorkflowEngine, WorkflowEvent};
pub use watch::{TickOutcome, WatchState, WatchSummary, WatchSupervisor};
