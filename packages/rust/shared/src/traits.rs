//! Collaborator seams consumed by the workflow engine.
//!
//! The engine only ever talks to version control and text generation through
//! these traits, so tests can swap in scripted implementations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChangeSet, Description};

/// Read-only query of the working tree's pending modifications.
#[async_trait]
pub trait ChangeProbe: Send + Sync {
    /// Current unstaged diff, trimmed. Empty means no pending changes.
    async fn diff(&self) -> Result<ChangeSet>;
}

/// Turns a non-empty diff into a short commit message.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    /// `diff` is never empty when called by the engine.
    async fn describe(&self, diff: &ChangeSet) -> Result<Description>;
}

/// Side-effecting staging and commit against the tracked root.
#[async_trait]
pub trait Committer: Send + Sync {
    /// Stage every modified, added, and removed path.
    async fn stage_all(&self) -> Result<()>;
    /// Record the staged content with `message`.
    async fn commit(&self, message: &Description) -> Result<()>;
}

#[async_trait]
impl<T: ChangeProbe + ?Sized> ChangeProbe for Arc<T> {
    async fn diff(&self) -> Result<ChangeSet> {
        (**self).diff().await
    }
}

#[async_trait]
impl<T: ChangeProbe + ?Sized> ChangeProbe for &T {
    async fn diff(&self) -> Result<ChangeSet> {
        (**self).diff().await
    }
}

#[async_trait]
impl<T: DescriptionGenerator + ?Sized> DescriptionGenerator for Arc<T> {
    async fn describe(&self, diff: &ChangeSet) -> Result<Description> {
        (**self).describe(diff).await
    }
}

#[async_trait]
impl<T: Committer + ?Sized> Committer for Arc<T> {
    async fn stage_all(&self) -> Result<()> {
        (**self).stage_all().await
    }

    async fn commit(&self, message: &Description) -> Result<()> {
        (**self).commit(message).await
    }
}
