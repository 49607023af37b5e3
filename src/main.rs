//! CLI entry point for the traffic reconciliation pipeline.
//!
//! Provides subcommands for importing traffic-count workbooks, placemark
//! records, and incident reports, cleaning up the intersection registry,
//! and rebuilding the 15-minute aggregated windows.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use traffic_reconciler::{
    aggregate::rebuild,
    config::{SheetMappings, load_synonyms},
    incidents::{link_incidents, load_incident_rows, write_incidents},
    ingest::{ImportOptions, cleanup_intersections, import_workbook},
    matcher::RegistrySnapshot,
    placemark::{import_placemarks, load_placemarks},
    report::RunSummary,
    sheet::load_workbook_dir,
    store::{CsvStore, IntersectionRegistry},
};

#[derive(Parser)]
#[command(name = "traffic_reconciler")]
#[command(about = "Reconcile and aggregate traffic-count data", long_about = None)]
struct Cli {
    /// Root directory of the data store
    #[arg(long, default_value = "data", global = true)]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import traffic volumes from a workbook directory (one CSV per sheet)
    ImportVolumes {
        /// Directory holding the workbook's sheets
        #[arg(value_name = "WORKBOOK_DIR")]
        workbook_dir: String,

        /// JSON file mapping sheet names to intersection names
        #[arg(short, long)]
        mapping: Option<String>,

        /// JSON file overriding the direction-synonym table
        #[arg(long)]
        synonyms: Option<String>,

        /// Report what would be written without saving anything
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Import intersections from a placemark JSON file
    ImportPlacemarks {
        /// Path to the placemark records (JSON array)
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Import incident tickets from a CSV export and link them to intersections
    ImportIncidents {
        /// Path to the incident CSV export
        #[arg(value_name = "FILE")]
        file: String,

        /// Output CSV for the linked incidents
        #[arg(short, long, default_value = "incidents.csv")]
        output: String,
    },
    /// Normalize intersection names and delete records that are not a
    /// two-road crossing
    CleanupIntersections,
    /// Rebuild all 15-minute aggregated windows from raw observations
    Aggregate,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/traffic_reconciler.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("traffic_reconciler.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut store = CsvStore::open(&cli.data_dir)?;

    match cli.command {
        Commands::ImportVolumes {
            workbook_dir,
            mapping,
            synonyms,
            dry_run,
        } => {
            let workbook = load_workbook_dir(Path::new(&workbook_dir))?;
            info!(sheets = workbook.sheets.len(), dir = %workbook_dir, "Workbook loaded");

            let options = ImportOptions {
                dry_run,
                mappings: match mapping {
                    Some(path) => SheetMappings::load(&path)?,
                    None => SheetMappings::default(),
                },
                synonyms: load_synonyms(synonyms.as_deref())?,
            };
            import_workbook(&mut store, &workbook, &options)?;
        }
        Commands::ImportPlacemarks { file } => {
            let placemarks = load_placemarks(&file)?;
            info!(placemarks = placemarks.len(), file = %file, "Placemarks loaded");
            let created = import_placemarks(&mut store, &placemarks)?;
            info!(created, "Placemark import complete");
        }
        Commands::ImportIncidents { file, output } => {
            let rows = load_incident_rows(Path::new(&file))?;
            info!(rows = rows.len(), file = %file, "Incident rows loaded");

            let snapshot = RegistrySnapshot::from_intersections(store.list()?);
            let mut summary = RunSummary::new();
            let incidents = link_incidents(rows, &snapshot, &mut summary);
            write_incidents(Path::new(&output), &incidents)?;
            summary.records_written = incidents.len();
            summary.log();
        }
        Commands::CleanupIntersections => {
            let report = cleanup_intersections(&mut store)?;
            info!(
                cleaned = report.cleaned,
                deleted = report.deleted,
                "Intersection cleanup complete"
            );
        }
        Commands::Aggregate => {
            let windows = rebuild(&mut store)?;
            info!(windows, "Aggregation complete");
        }
    }

    Ok(())
}
