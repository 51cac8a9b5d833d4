//! mirreview TUI, the interactive topic review.
//!
//! Load a document, walk its publications one at a time assigning topics,
//! then write the CSV and markdown exports. Every step is autosaved so a
//! closed session resumes where it stopped.
//!
//! Usage: `mirreview-tui [DOCUMENT]`

mod app;
mod screens;
mod widgets;

use std::fs::File;
use std::sync::Mutex;

use color_eyre::eyre::Result;

use mirreview_shared::{config_dir, load_config};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = load_config()?;
    let initial_path = std::env::args().nth(1);
    let app = app::App::new(config, initial_path)?;
    app::run(app)
}

/// Log to `~/.mirreview/mirreview-tui.log`; the terminal belongs to the UI.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let Ok(dir) = config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join("mirreview-tui.log")) else {
        return;
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mirreview=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}
