use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use view_export::config::AppConfig;
use view_export::host::{
    export_view, ActiveSelectionProvider, Base, CursorTracking, FirstAvailable, Manual, SelectionMode,
};
use view_export::models::{ExportFormat, ExportRequest};

#[derive(Parser)]
#[command(name = "view_export")]
#[command(about = "Export a table view from a base snapshot to CSV or Excel")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables and views of a base snapshot
    Tables {
        /// Path to the base snapshot (JSON)
        snapshot: PathBuf,
    },

    /// Export one view to CSV or Excel
    Export(ExportArgs),

    /// Show the configuration, or write the defaults with --init
    Config {
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Path to the base snapshot (JSON)
    snapshot: PathBuf,

    /// Table id or name
    #[arg(short, long, requires = "view", conflicts_with_all = ["cursor", "first"])]
    table: Option<String>,

    /// View id or name
    #[arg(long, requires = "table")]
    view: Option<String>,

    /// Use the active table and view of the snapshot's cursor
    #[arg(long, conflicts_with = "first")]
    cursor: bool,

    /// Use the first table and its first view
    #[arg(long)]
    first: bool,

    /// Output format: csv or xlsx
    #[arg(short, long)]
    format: Option<ExportFormat>,

    /// Custom filename; the extension is added when missing
    #[arg(short = 'n', long)]
    filename: Option<String>,

    /// Worksheet name (xlsx only)
    #[arg(long)]
    sheet_name: Option<String>,

    /// Directory to write the file to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Fail instead of writing a header-only file when the view has no records
    #[arg(long)]
    require_records: bool,

    /// Write the payload to stdout instead of a file
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::config_path()?,
    };
    let config = load_config(&config_path)?;

    match cli.command {
        Commands::Tables { snapshot } => list_tables(&snapshot).await,
        Commands::Export(args) => run_export(args, &config).await,
        Commands::Config { init } => show_config(&config_path, &config, init),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let config = AppConfig::load_from(path)?;
    let problems = config.validate();
    for problem in &problems {
        warn!(config = %path.display(), "{}", problem);
    }
    if !problems.is_empty() {
        bail!("Invalid configuration in {}", path.display());
    }
    Ok(config)
}

async fn list_tables(snapshot: &Path) -> Result<()> {
    let base = Base::load(snapshot)
        .await
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;

    for table in &base.tables {
        let active_table = base.cursor.active_table_id.as_deref() == Some(table.id.as_str());
        println!(
            "{}{} ({}) - {} fields, {} records",
            if active_table { "* " } else { "  " },
            table.name,
            table.id,
            table.fields.len(),
            table.records.len()
        );

        for view in &table.views {
            let active_view = active_table && base.cursor.active_view_id.as_deref() == Some(view.id.as_str());
            println!(
                "    {}{} ({}) - {} records",
                if active_view { "* " } else { "  " },
                view.name,
                view.id,
                table.view_records(view).len()
            );
        }
    }

    Ok(())
}

fn selection_provider(args: &ExportArgs, config: &AppConfig) -> Result<Box<dyn ActiveSelectionProvider>> {
    if let (Some(table), Some(view)) = (&args.table, &args.view) {
        return Ok(Box::new(Manual::new(table, view)));
    }

    let cursor = CursorTracking::new().with_fallback(config.fallback_to_first);
    if args.cursor {
        return Ok(Box::new(cursor));
    }
    if args.first {
        return Ok(Box::new(FirstAvailable));
    }

    match config.selection_mode {
        SelectionMode::Cursor => Ok(Box::new(cursor)),
        SelectionMode::First => Ok(Box::new(FirstAvailable)),
        SelectionMode::Manual => bail!("Manual selection requires --table and --view"),
    }
}

async fn run_export(args: ExportArgs, config: &AppConfig) -> Result<()> {
    let provider = selection_provider(&args, config)?;

    let base = Base::load(&args.snapshot)
        .await
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;

    let mut request = ExportRequest::new(args.format.unwrap_or(config.default_format))
        .require_records(args.require_records || !config.allow_empty_export);
    request.filename = args.filename.clone();
    request.sheet_name = args.sheet_name.clone();

    let result = export_view(&base, provider.as_ref(), &request, &config.exporter()?)?;
    debug!(mime = result.mime_type, "payload ready");

    if args.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&result.bytes)?;
        stdout.flush()?;
        eprintln!("Exported {} records", result.record_count);
        return Ok(());
    }

    let dir = args
        .output_dir
        .clone()
        .or_else(|| config.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&dir).await?;

    let path = dir.join(&result.suggested_filename);
    tokio::fs::write(&path, &result.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Exported {} records to {}", result.record_count, path.display());
    Ok(())
}

fn show_config(path: &Path, config: &AppConfig, init: bool) -> Result<()> {
    if init {
        config.save_to(path)?;
        println!("Wrote configuration to {}", path.display());
    } else {
        println!("# {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
