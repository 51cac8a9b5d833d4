//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use mirreview_core::{
    ExportKind, Ingestor, PandocConverter, ProgressReporter, ReviewAction, ReviewSession,
    write_export,
};
use mirreview_shared::{
    AppConfig, ConverterOptions, HeaderStyle, LoadedDocument, MarkdownOrder, autosave_db_path,
    init_config, load_config, load_config_from,
};
use mirreview_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// mirreview: assign topics to the publications in a monthly review document.
#[derive(Parser)]
#[command(
    name = "mirreview",
    version,
    about = "Parse Month in Review documents and export topic assignments.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.mirreview/mirreview.toml.
    #[arg(long, env = "MIRREVIEW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Record order inside each topic of the markdown export.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OrderArg {
    Identifier,
    Title,
}

impl From<OrderArg> for MarkdownOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Identifier => Self::Identifier,
            OrderArg::Title => Self::Title,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Parse a document and list its publications.
    Parse {
        /// Document to parse (.docx or .md).
        file: PathBuf,

        /// Print the parsed document as JSON.
        #[arg(long)]
        json: bool,

        /// Require the `\` marker on topic header lines.
        #[arg(long)]
        strict_headers: bool,
    },

    /// Write CSV and/or markdown exports for a document.
    Export {
        /// Document to export (.docx or .md).
        file: PathBuf,

        /// Write the CSV table.
        #[arg(long)]
        csv: bool,

        /// Write the topic-grouped markdown document.
        #[arg(long)]
        markdown: bool,

        /// Output directory (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Record order within each markdown topic.
        #[arg(long)]
        order: Option<OrderArg>,

        /// Export the autosaved review of this document instead of a fresh parse.
        #[arg(long)]
        use_autosave: bool,
    },

    /// Inspect or clear autosaved reviews.
    Autosave {
        #[command(subcommand)]
        action: AutosaveAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Autosave subcommands.
#[derive(Subcommand)]
pub(crate) enum AutosaveAction {
    /// List autosaved reviews, newest first.
    List,
    /// Show one autosaved review.
    Show {
        /// Fingerprint or unique fingerprint prefix. Omit for the most recent.
        fingerprint: Option<String>,
    },
    /// Delete one autosaved review, or all of them.
    Clear {
        /// Fingerprint or unique fingerprint prefix. Omit to clear everything.
        fingerprint: Option<String>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "mirreview=info",
        1 => "mirreview=debug",
        _ => "mirreview=trace",
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
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Parse {
            file,
            json,
            strict_headers,
        } => cmd_parse(&config, &file, json, strict_headers).await,
        Command::Export {
            file,
            csv,
            markdown,
            out,
            order,
            use_autosave,
        } => {
            let opts = ExportOpts {
                csv,
                markdown,
                out,
                order: order.map(MarkdownOrder::from),
                use_autosave,
            };
            cmd_export(&config, &file, opts).await
        }
        Command::Autosave { action } => match action {
            AutosaveAction::List => cmd_autosave_list(&config).await,
            AutosaveAction::Show { fingerprint } => {
                cmd_autosave_show(&config, fingerprint.as_deref()).await
            }
            AutosaveAction::Clear { fingerprint } => {
                cmd_autosave_clear(&config, fingerprint.as_deref()).await
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Load `path` with a spinner while conversion and parsing run.
async fn load_document(config: &AppConfig, path: &Path) -> Result<LoadedDocument> {
    let converter = PandocConverter::new(&ConverterOptions::from(config));
    let ingestor = Ingestor::from_config(config, converter)?;
    let reporter = CliProgress::new();
    let result = ingestor.load_path(path, &reporter).await;
    reporter.spinner.finish_and_clear();
    Ok(result?)
}

async fn cmd_parse(config: &AppConfig, file: &Path, json: bool, strict: bool) -> Result<()> {
    let mut config = config.clone();
    if strict {
        config.parser.header_style = HeaderStyle::Strict;
    }

    let document = load_document(&config, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    for record in &document.publications {
        let topics = if record.original_topics.is_empty() {
            "(no topic)".to_string()
        } else {
            record.original_topics.join(", ")
        };
        println!("{:<16} {:<18} {}", record.identifier, record.date, record.title);
        println!("{:<16} {topics}", "");
    }

    let stats = document.stats;
    println!();
    println!("  File:         {}", document.file_name);
    println!("  Fingerprint:  {}", document.fingerprint.short());
    println!("  Publications: {}", stats.records);
    println!("  Candidates:   {}", stats.candidates);
    println!("  Duplicates:   {}", stats.duplicates_merged);
    println!("  Dropped:      {}", stats.dropped_blocks);
    println!();

    Ok(())
}

struct ExportOpts {
    csv: bool,
    markdown: bool,
    out: Option<PathBuf>,
    order: Option<MarkdownOrder>,
    use_autosave: bool,
}

async fn cmd_export(config: &AppConfig, file: &Path, opts: ExportOpts) -> Result<()> {
    if !opts.csv && !opts.markdown {
        return Err(eyre!("nothing to export: pass --csv and/or --markdown"));
    }

    let document = load_document(config, file).await?;
    let db_path = autosave_db_path(config)?;

    let storage = match Storage::open(&db_path).await {
        Ok(storage) => Some(storage),
        Err(e) => {
            warn!(error = %e, "autosave database unavailable, exports will not be logged");
            None
        }
    };

    let mut session = ReviewSession::new().apply(ReviewAction::Load(document.clone()));
    if opts.use_autosave {
        let storage = storage
            .as_ref()
            .ok_or_else(|| eyre!("--use-autosave needs the autosave database at {}", db_path.display()))?;
        match storage.load_snapshot(&document.fingerprint).await? {
            Some(snapshot) => {
                info!(cursor = snapshot.cursor, "using autosaved review");
                session = ReviewSession::from_snapshot(snapshot);
            }
            None => {
                return Err(eyre!(
                    "no autosaved review for {} (fingerprint {})",
                    document.file_name,
                    document.fingerprint.short()
                ));
            }
        }
    }

    let out_dir = opts
        .out
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));
    let order = opts.order.unwrap_or(config.defaults.markdown_order);

    let mut kinds = Vec::new();
    if opts.csv {
        kinds.push(ExportKind::Csv);
    }
    if opts.markdown {
        kinds.push(ExportKind::Markdown);
    }

    for kind in kinds {
        let path = write_export(&session, kind, order, &out_dir)?;
        println!("  Wrote {}", path.display());
        if let Some(storage) = &storage {
            storage
                .record_export(&document.fingerprint, kind.as_str(), &path.to_string_lossy())
                .await?;
        }
    }

    let changes = session.changes();
    if !changes.is_empty() {
        println!();
        println!("  {} changes made:", changes.len());
        for change in changes {
            println!("    {change}");
        }
    }

    Ok(())
}

async fn open_autosaves_readonly(config: &AppConfig) -> Result<Storage> {
    let path = autosave_db_path(config)?;
    Ok(Storage::open_readonly(&path).await?)
}

async fn cmd_autosave_list(config: &AppConfig) -> Result<()> {
    let storage = open_autosaves_readonly(config).await?;
    let snapshots = storage.list_snapshots().await?;

    if snapshots.is_empty() {
        println!("No autosaved reviews.");
        return Ok(());
    }

    for s in snapshots {
        println!(
            "{}  {:>4}/{:<4}  {}  {}",
            s.fingerprint.short(),
            s.cursor,
            s.total,
            s.saved_at.format("%Y-%m-%d %H:%M"),
            s.file_name
        );
    }
    Ok(())
}

/// Resolve a fingerprint prefix against the stored autosaves.
async fn resolve_fingerprint(
    storage: &Storage,
    prefix: &str,
) -> Result<mirreview_shared::DocumentFingerprint> {
    let matches: Vec<_> = storage
        .list_snapshots()
        .await?
        .into_iter()
        .filter(|s| s.fingerprint.0.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.fingerprint.clone()),
        [] => Err(eyre!("no autosave matches '{prefix}'")),
        _ => Err(eyre!("'{prefix}' matches {} autosaves", matches.len())),
    }
}

async fn cmd_autosave_show(config: &AppConfig, prefix: Option<&str>) -> Result<()> {
    let storage = open_autosaves_readonly(config).await?;
    let snapshot = match prefix {
        Some(prefix) => {
            let fingerprint = resolve_fingerprint(&storage, prefix).await?;
            storage
                .load_snapshot(&fingerprint)
                .await?
                .ok_or_else(|| eyre!("autosave {prefix} disappeared"))?
        }
        None => storage
            .latest_snapshot()
            .await?
            .ok_or_else(|| eyre!("no autosaved reviews"))?,
    };
    let exports = storage.list_exports(&snapshot.document.fingerprint).await?;

    let session = ReviewSession::from_snapshot(snapshot.clone());
    let progress = session.progress();

    println!();
    println!("  File:     {}", snapshot.document.file_name);
    println!("  Saved:    {}", snapshot.saved_at.to_rfc3339());
    println!(
        "  Progress: {} / {} ({}%)",
        progress.position, progress.total, progress.percent
    );
    if let Some(current) = session.current() {
        println!("  Next:     {} {}", current.identifier, current.title);
    }

    let reassigned = session
        .publications()
        .iter()
        .filter(|r| r.is_reassigned())
        .count();
    println!("  Reassigned: {reassigned} record(s)");

    let changes = session.changes();
    println!("  Changes:  {}", changes.len());
    for change in changes {
        println!("    {change}");
    }

    if !exports.is_empty() {
        println!("  Exports:");
        for e in exports {
            println!("    {:<8} {}  {}", e.kind, e.created_at.format("%Y-%m-%d %H:%M"), e.path);
        }
    }
    println!();
    Ok(())
}

async fn cmd_autosave_clear(config: &AppConfig, prefix: Option<&str>) -> Result<()> {
    let path = autosave_db_path(config)?;
    if !path.exists() {
        println!("No autosaved reviews.");
        return Ok(());
    }
    let storage = Storage::open(&path).await?;

    match prefix {
        Some(prefix) => {
            let fingerprint = resolve_fingerprint(&storage, prefix).await?;
            storage.delete_snapshot(&fingerprint).await?;
            println!("Cleared autosave {}", fingerprint.short());
        }
        None => {
            let removed = storage.clear_snapshots().await?;
            println!("Cleared {removed} autosave(s)");
        }
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, document: &LoadedDocument) {
        self.spinner.finish_and_clear();
        info!(
            records = document.publications.len(),
            "loaded {}", document.file_name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_flags_parse() {
        let cli = Cli::try_parse_from([
            "mirreview",
            "export",
            "may.docx",
            "--csv",
            "--markdown",
            "--order",
            "title",
            "--use-autosave",
        ])
        .unwrap();
        match cli.command {
            Command::Export {
                csv,
                markdown,
                order,
                use_autosave,
                ..
            } => {
                assert!(csv && markdown && use_autosave);
                assert!(matches!(order, Some(OrderArg::Title)));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn autosave_show_defaults_to_latest() {
        let cli = Cli::try_parse_from(["mirreview", "autosave", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Autosave {
                action: AutosaveAction::Show { fingerprint: None }
            }
        ));
        let cli = Cli::try_parse_from(["mirreview", "autosave", "show", "ab12"]).unwrap();
        match cli.command {
            Command::Autosave {
                action: AutosaveAction::Show { fingerprint },
            } => assert_eq!(fingerprint.as_deref(), Some("ab12")),
            _ => panic!("expected autosave show"),
        }
    }

    #[test]
    fn autosave_show_prints_latest_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.autosave_db =
            Some(dir.path().join("autosave.db").to_string_lossy().to_string());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            assert!(cmd_autosave_show(&config, None).await.is_err());

            let storage = Storage::open(&autosave_db_path(&config).unwrap()).await.unwrap();
            let mut record =
                mirreview_shared::PublicationRecord::new("GAO-24-1", "T", "", "u", Some("Energy"));
            record.assigned_topics = vec!["Space".into()];
            let document = LoadedDocument {
                file_name: "may.md".into(),
                fingerprint: mirreview_shared::DocumentFingerprint::of(b"may"),
                publications: vec![record],
                stats: Default::default(),
            };
            storage
                .save_snapshot(&mirreview_shared::ReviewSnapshot::new(document, 1))
                .await
                .unwrap();
            drop(storage);

            cmd_autosave_show(&config, None).await.unwrap();
        });
    }

    #[test]
    fn autosave_clear_without_fingerprint() {
        let cli = Cli::try_parse_from(["mirreview", "autosave", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Autosave {
                action: AutosaveAction::Clear { fingerprint: None }
            }
        ));
    }
}
