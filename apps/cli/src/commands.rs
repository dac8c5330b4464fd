//! CLI definition, config merging, tracing setup, and mode dispatch.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use gitscribe_core::{ProgressReporter, WatchSupervisor, Workflow, WorkflowEngine};
use gitscribe_describe::OllamaDescriber;
use gitscribe_git::{GitRepo, resolve_repo_location};
use gitscribe_shared::{
    AppConfig, DescriberConfig, GitScribeError, RunResult, WatchSettings, load_config,
    load_config_from, validate,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// gitscribe: commit working-tree changes with generated messages.
#[derive(Parser, Debug)]
#[command(
    name = "gitscribe",
    version,
    about = "Describe and commit working-tree changes, once or continuously.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// once: commit pending changes now; watch: poll and commit each new change.
    #[arg(value_enum, default_value = "once")]
    pub mode: Mode,

    /// Directory inside the repository (defaults to the current directory).
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Config file (defaults to ~/.gitscribe/gitscribe.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ollama model used to write commit messages.
    #[arg(long, env = "GITSCRIBE_MODEL")]
    pub model: Option<String>,

    /// Ollama server base URL.
    #[arg(long, env = "GITSCRIBE_OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Seconds between polls in watch mode.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Single-shot or continuous operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Mode {
    Once,
    Watch,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "gitscribe=info",
        1 => "gitscribe=debug",
        _ => "gitscribe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Config merging
// ---------------------------------------------------------------------------

/// Config file (explicit or default), then CLI/env overrides, then validation.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(model) = &cli.model {
        config.ollama.model = model.clone();
    }
    if let Some(url) = &cli.ollama_url {
        config.ollama.base_url = url.clone();
    }
    if let Some(secs) = cli.interval {
        config.watch.interval_secs = secs;
    }

    validate(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the selected mode.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    let start = match &cli.repo {
        Some(path) => path.clone(),
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };
    let location = resolve_repo_location(&start).await;
    info!(repo = %location, model = %config.ollama.model, mode = ?cli.mode, "starting");

    let repo = Arc::new(GitRepo::new(location));
    let describer = OllamaDescriber::new(&DescriberConfig::from(&config))?;
    let engine = WorkflowEngine::new(repo.clone(), describer, repo.clone());

    match cli.mode {
        Mode::Once => cmd_once(&engine).await,
        Mode::Watch => cmd_watch(repo, engine, WatchSettings::from(&config)).await,
    }
}

async fn cmd_once(engine: &impl Workflow) -> Result<()> {
    let progress = CliProgress::new(false);
    let result = engine.run(&progress).await;
    progress.finish();

    result?;
    Ok(())
}

async fn cmd_watch(
    repo: Arc<GitRepo>,
    engine: impl Workflow,
    settings: WatchSettings,
) -> Result<()> {
    println!(
        "Watching {} (polling every {}s). Press Ctrl-C to stop.",
        repo.location(),
        settings.interval.as_secs()
    );

    let supervisor = WatchSupervisor::new(repo, engine, settings.interval);
    let progress = CliProgress::new(true);
    let summary = supervisor.run_until(shutdown_signal(), &progress).await;
    progress.finish();

    let summary = summary?;
    println!(
        "Stopped after {} polls: {} runs, {} commits, {} failed.",
        summary.ticks, summary.runs, summary.commits, summary.failures
    );
    Ok(())
}

/// Resolves once Ctrl-C is received.
///
/// The listener is spawned up front so an interrupt during a run is
/// captured instead of killing the process mid-commit. Git children run in
/// their own process group (see `gitscribe-git`), so the terminal's SIGINT
/// does not reach them either.
fn shutdown_signal() -> impl Future<Output = ()> {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, stopping after the current poll");
                let _ = tx.send(());
            }
            Err(e) => error!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    async move {
        let _ = rx.await;
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    /// Watch mode prints failures and keeps going; once mode lets the
    /// error surface through the exit path instead.
    print_failures: bool,
}

impl CliProgress {
    fn new(print_failures: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            print_failures,
        }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, result: &RunResult) {
        // `println` on a hidden bar is a no-op; suspend always prints.
        self.spinner.suspend(|| println!("Result: {result}"));
    }

    fn failed(&self, error: &GitScribeError) {
        if self.print_failures {
            self.spinner.suspend(|| eprintln!("Run failed: {error}"));
        }
    }
}
