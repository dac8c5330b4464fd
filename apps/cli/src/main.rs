//! gitscribe CLI: commit working-tree changes with generated messages.
//!
//! Runs the commit workflow once, or keeps watching the repository and
//! commits every new change until interrupted.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
