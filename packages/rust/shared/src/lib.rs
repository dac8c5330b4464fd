//! Shared types, error model, collaborator traits, and configuration for gitscribe.
//!
//! This crate is the foundation depended on by all other gitscribe crates.
//! It provides:
//! - [`GitScribeError`], the unified error type
//! - Domain types ([`ChangeSet`], [`Description`], [`RunResult`], [`RepoLocation`], [`RunId`])
//! - Collaborator seams ([`ChangeProbe`], [`DescriptionGenerator`], [`Committer`])
//! - Configuration ([`AppConfig`], [`DescriberConfig`], [`WatchSettings`], config loading)

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DescriberConfig, OllamaConfig, WatchConfig, WatchSettings, config_dir,
    config_file_path, load_config, load_config_from, validate,
};
pub use error::{GitScribeError, Result};
pub use traits::{ChangeProbe, Committer, DescriptionGenerator};
pub use types::{ChangeSet, Description, NO_CHANGES, RepoLocation, RunId, RunResult};
