//! mirreview CLI: headless parsing and export of Month in Review documents.
//!
//! The interactive review lives in `mirreview-tui`; this binary covers
//! batch work: listing a document's publications, writing exports, and
//! managing autosaves.

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
