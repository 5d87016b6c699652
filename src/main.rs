//! CLI entry point for the commodity transport inventory builder.
//!
//! Provides subcommands for computing weighted transport distances from the
//! Commodity Flow Survey, building the openLCA JSON-LD archive from them,
//! running both in sequence, and listing the SCTG commodity codes.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commodity_transport::{
    analyzers::types::DistanceOptions,
    config::Settings,
    fetch::BasicClient,
    pipeline::{build_objects, calculate_distances},
    sctg,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "commodity_transport")]
#[command(about = "Builds commodity transport unit processes from CFS shipment data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Directory overrides shared by every stage.
#[derive(Args, Debug, Default)]
struct DirArgs {
    /// Directory holding the distance table and the flow mapping
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory holding the flow/process metadata and bibliography
    #[arg(long)]
    meta_dir: Option<PathBuf>,

    /// Directory the archive is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory downloaded sources are cached in
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct DistanceArgs {
    /// Path or URL of the CFS public use file (CSV, gzip or zip)
    #[arg(long, value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// Drop shipments flagged as exports
    #[arg(long, default_value_t = false)]
    exclude_exports: bool,

    /// Drop hazardous-material shipments
    #[arg(long, default_value_t = false)]
    exclude_hazmat: bool,

    /// Only aggregate these SCTG codes (repeatable, or comma separated)
    #[arg(long, value_delimiter = ',')]
    sctg: Vec<String>,

    /// Download the source again even when a cached copy exists
    #[arg(long, default_value_t = false)]
    refresh: bool,
}

#[derive(Args, Debug, Default)]
struct BuildArgs {
    /// Archive name, without extension
    #[arg(short, long)]
    name: Option<String>,

    /// Data year used for validity dates and `[YEAR]` placeholders
    #[arg(short, long)]
    year: Option<i32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute weighted transport distances per commodity and mode
    Distances {
        #[command(flatten)]
        dirs: DirArgs,
        #[command(flatten)]
        distance: DistanceArgs,
    },
    /// Build the openLCA archive from a previously written distance table
    Build {
        #[command(flatten)]
        dirs: DirArgs,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Run both stages
    Run {
        #[command(flatten)]
        dirs: DirArgs,
        #[command(flatten)]
        distance: DistanceArgs,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// List the SCTG commodity codes
    Codes,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/commodity_transport.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("commodity_transport.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Distances { dirs, distance } => {
            let settings = settings(&dirs, &distance, &BuildArgs::default())?;
            distances(&settings, &distance).await?;
        }
        Commands::Build { dirs, build } => {
            let settings = settings(&dirs, &DistanceArgs::default(), &build)?;
            build_archive(&settings)?;
        }
        Commands::Run {
            dirs,
            distance,
            build,
        } => {
            let settings = settings(&dirs, &distance, &build)?;
            distances(&settings, &distance).await?;
            build_archive(&settings)?;
        }
        Commands::Codes => {
            for (code, name) in sctg::codes() {
                println!("{code}\t{name}");
            }
        }
    }

    Ok(())
}

/// Environment settings with CLI flags applied on top.
fn settings(dirs: &DirArgs, distance: &DistanceArgs, build: &BuildArgs) -> Result<Settings> {
    let mut settings = Settings::from_env()?;

    if let Some(dir) = &dirs.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(dir) = &dirs.meta_dir {
        settings.meta_dir = dir.clone();
    }
    if let Some(dir) = &dirs.output_dir {
        settings.output_dir = dir.clone();
    }
    if let Some(dir) = &dirs.cache_dir {
        settings.cache_dir = dir.clone();
    }
    if let Some(source) = &distance.source {
        settings.puf_source = source.clone();
    }
    if let Some(name) = &build.name {
        settings.archive_name = name.clone();
    }
    if let Some(year) = build.year {
        settings.year = year;
    }

    Ok(settings)
}

async fn distances(settings: &Settings, args: &DistanceArgs) -> Result<()> {
    let mut sctg_codes = std::collections::HashSet::new();
    for raw in &args.sctg {
        match sctg::normalize(raw) {
            Some(code) => {
                sctg_codes.insert(code.to_string());
            }
            None => warn!(code = %raw, "Ignoring unknown SCTG code"),
        }
    }

    let options = DistanceOptions {
        exclude_exports: args.exclude_exports,
        exclude_hazmat: args.exclude_hazmat,
        sctg_codes,
    };

    let client = BasicClient::new();
    let report = calculate_distances(settings, &options, &client, args.refresh).await?;

    info!(
        records = report.records,
        rows = report.rows.len(),
        suppressed_commodity = report.skipped.suppressed_commodity,
        excluded_mode = report.skipped.excluded_mode,
        filtered = report.skipped.filtered,
        path = %report.path.display(),
        "Distance stage complete"
    );
    Ok(())
}

fn build_archive(settings: &Settings) -> Result<()> {
    let summary = build_objects(settings)?;

    info!(
        processes = summary.processes,
        flows = summary.flows,
        new_flows = summary.new_flows,
        missing_codes = summary.missing_codes.len(),
        skipped_commodities = summary.skipped_commodities.len(),
        archive = %summary.archive.display(),
        "Build stage complete"
    );
    Ok(())
}
