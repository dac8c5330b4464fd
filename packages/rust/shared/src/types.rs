//! Core domain types flowing through the commit workflow.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Sentinel description marking a run that found nothing to commit.
pub const NO_CHANGES: &str = "No changes detected.";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one workflow run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RepoLocation
// ---------------------------------------------------------------------------

/// Root of the version-controlled tree being operated on.
///
/// Resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation(PathBuf);

impl RepoLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for RepoLocation {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// Unstaged modifications of the working tree as raw diff text.
///
/// Always trimmed. The empty value means "no pending modifications".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChangeSet(String);

impl ChangeSet {
    pub fn new(diff: impl AsRef<str>) -> Self {
        Self(diff.as_ref().trim().to_string())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short SHA-256 prefix of the diff text, for log fields.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        format!("{digest:x}")[..12].to_string()
    }
}

impl std::fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

/// A commit message, or the [`NO_CHANGES`] sentinel.
///
/// The sentinel is a plain value so that staging and committing can pass it
/// through instead of needing a separate abort channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(String);

impl Description {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn no_changes() -> Self {
        Self(NO_CHANGES.to_string())
    }

    /// Exact text comparison against the sentinel.
    pub fn is_no_changes(&self) -> bool {
        self.0 == NO_CHANGES
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Description {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RunResult
// ---------------------------------------------------------------------------

/// Terminal value of one workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// Nothing was staged or committed.
    NoChanges,
    /// A commit was created with this message.
    Committed { message: Description },
}

impl RunResult {
    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoChanges => f.write_str(NO_CHANGES),
            Self::Committed { message } => write!(f, "Committed with message: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_set_is_trimmed() {
        let diff = ChangeSet::new("\n  +added line \n\n");
        assert_eq!(diff.as_str(), "+added line");
        assert!(ChangeSet::new(" \n\t").is_empty());
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = ChangeSet::new("+x");
        assert_eq!(a.fingerprint(), ChangeSet::new("+x\n").fingerprint());
        assert_ne!(a.fingerprint(), ChangeSet::new("+y").fingerprint());
        assert_eq!(a.fingerprint().len(), 12);
    }

    #[test]
    fn sentinel_matches_by_text() {
        assert!(Description::no_changes().is_no_changes());
        assert!(Description::new("No changes detected.").is_no_changes());
        assert!(!Description::new("Add a line").is_no_changes());
    }

    #[test]
    fn run_result_display() {
        assert_eq!(RunResult::NoChanges.to_string(), "No changes detected.");
        let committed = RunResult::Committed {
            message: Description::new("Add a line"),
        };
        assert_eq!(committed.to_string(), "Committed with message: Add a line");
        assert!(committed.is_commit());
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
