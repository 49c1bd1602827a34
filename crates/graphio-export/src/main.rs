//! Command-line exporter: loads a prototype data directory, runs the
//! attainability pipeline, and writes the framed export stream.

mod config;

use clap::Parser;
use config::{ConfigError, ConfigFile, DEFAULT_CONFIG_FILE, ExportConfig};
use graphio_core::filter::PrototypeSets;
use graphio_core::solver::{SolveError, solve};
use graphio_core::view::{PrunedView, ViewError};
use graphio_data::DataLoadError;
use graphio_wire::emit::{EmitError, emit_document};
use graphio_wire::frame::FramedWriter;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "graphio-export")]
#[command(about = "Extracts pruned factory-game rule data as a framed byte stream")]
struct Cli {
    /// Config file (defaults to graphio-export.toml if present).
    config: Option<PathBuf>,

    /// Directory holding the prototype data files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where to write the export stream.
    #[arg(long)]
    output: Option<PathBuf>,

    /// How aggressively to prune unreachable prototypes (0, 1, or 2).
    #[arg(long)]
    prune_level: Option<u8>,

    /// Log every emitted entry.
    #[arg(long)]
    log_entries: bool,
}

#[derive(Debug, thiserror::Error)]
enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] DataLoadError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("cannot write output {file}: {source}")]
    Output {
        file: PathBuf,
        source: std::io::Error,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // --log-entries surfaces the per-entry debug events.
        if cli.log_entries {
            tracing_subscriber::EnvFilter::new("debug")
        } else {
            tracing_subscriber::EnvFilter::new("info")
        }
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    if let Err(err) = run(cli) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), ExportError> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default.exists() {
                ConfigFile::load(&default)?
            } else {
                ConfigFile::default()
            }
        }
    };
    let config = ExportConfig::resolve(
        file,
        cli.data_dir,
        cli.output,
        cli.prune_level,
        cli.log_entries,
    )?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        prune_level = config.prune_level.index(),
        "loading prototype data",
    );
    let mut registry = graphio_data::load_registry(&config.data_dir)?;

    let sets = PrototypeSets::partition(&registry);
    let attainable = solve(&mut registry, config.prune_level)?;
    let view = PrunedView::build(&sets, &attainable)?;

    tracing::info!(
        machines = view.crafting_machines.len(),
        beacons = view.beacons.len(),
        recipes = view.recipes.len(),
        items = view.items.len(),
        fluids = view.fluids.len(),
        "pruned snapshot ready",
    );

    // Emit fully in memory first; the output file appears only for a
    // completed document.
    let mut writer = FramedWriter::new(Vec::new());
    emit_document(&view, &mut writer)?;
    let stream = writer.into_inner();
    std::fs::write(&config.output, &stream).map_err(|source| ExportError::Output {
        file: config.output.clone(),
        source,
    })?;

    tracing::info!(
        output = %config.output.display(),
        bytes = stream.len(),
        "export complete",
    );
    Ok(())
}
