//! DRE Shopee - income statement generator for marketplace sales
//!
//! A CLI tool that reads a Shopee order export, filters out cancelled
//! and unpaid orders, and writes a DRE summary spreadsheet.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable file, missing column, write failure, etc.)
//!   2 - Marketplace not supported yet

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod workbook;

use analysis::{Aggregator, ColumnLookup};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Report, ReportMetadata};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use workbook::LoadedSheet;

/// Env var holding an optional `RUST_LOG`-style filter.
const LOG_ENV: &str = "DRE_LOG";

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Unsupported marketplaces stop before the input is looked at
    if let Err(e) = args.check_marketplace() {
        eprintln!("⛔ {}", e);
        std::process::exit(2);
    }

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is loaded before logging so `[general] verbose` can raise the level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, config.general.verbose);

    info!("DRE Shopee v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    info!("{}", config_source);

    match run_report(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report generation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .dre.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize column aliases, status filters, and output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `DRE_LOG` takes precedence over the --verbose/--quiet flags when set.
fn init_logging(args: &Args, config_verbose: bool) {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        return;
    }

    let level = if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete DRE workflow. Returns the exit code.
fn run_report(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let input = args
        .input
        .clone()
        .context("No input spreadsheet given")?;

    // Step 1: Read the spreadsheet
    println!("📥 Reading spreadsheet: {}", input.display());
    let spinner = make_spinner(!args.quiet, "Processando... aguarde");
    let loaded = workbook::read_path(&input, args.sheet.as_deref());
    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }
    let loaded = loaded?;

    // Handle --dry-run: resolve columns and exit
    if args.dry_run {
        return handle_dry_run(&loaded, &config);
    }

    // Step 2: Aggregate
    println!("🧮 Aggregating {} rows...", loaded.table.row_count());
    let sheet_name = loaded.sheet_name.clone();
    let aggregator = Aggregator::from_config(&config);
    let summary = aggregator.run(loaded.table)?;

    let metadata = ReportMetadata {
        source_file: input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        sheet_name,
        marketplace: args.marketplace.to_string(),
        generated_at: Utc::now(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let report = Report { metadata, summary };

    // Step 3: Write the report
    println!("\n📝 Generating report...");
    let output_path = config.output_path(args.format.extension());
    match args.format {
        OutputFormat::Xlsx => report::write_xlsx_report(&report, &output_path, &config.report)?,
        OutputFormat::Json => report::write_json_report(&report, &output_path)?,
    }

    // Print summary
    let stats = &report.summary.stats;
    println!("\n📊 DRE Summary:\n");
    print!("{}", report::generate_text_summary(&report));
    println!(
        "\n   Rows read: {} | Kept: {} | Cancelled/unpaid: {} | Returned: {}",
        stats.rows_read, stats.rows_kept, stats.rows_excluded, stats.rows_returned
    );
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!(
        "\n✅ Report generated successfully! Saved to: {}",
        output_path.display()
    );

    Ok(0)
}

/// Handle --dry-run: show how columns resolve, write nothing.
fn handle_dry_run(loaded: &LoadedSheet, config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: resolving columns (no report written)...\n");

    let table = loaded.table.clone().normalize_columns();
    println!(
        "   Sheet '{}': {} columns, {} rows after cleanup\n",
        loaded.sheet_name,
        table.column_count(),
        table.row_count()
    );

    let mut missing_required = 0;
    for (field, lookup) in analysis::resolve_all(table.headers(), &config.columns) {
        match lookup {
            ColumnLookup::Found { header, .. } => {
                println!("     ✅ {:<24} → {}", field.name(), header);
            }
            ColumnLookup::NotFound if field.is_required() => {
                missing_required += 1;
                println!("     ❌ {:<24} (required, not found)", field.name());
            }
            ColumnLookup::NotFound => {
                println!("     ➖ {:<24} (optional, not found)", field.name());
            }
        }
    }

    if missing_required > 0 {
        println!(
            "\n⚠️  {} required column(s) missing. A real run would fail.",
            missing_required
        );
    } else {
        println!("\n✅ Dry run complete. All required columns found.");
    }
    Ok(0)
}

fn make_spinner(show: bool, message: &'static str) -> Option<ProgressBar> {
    if !show {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so the second value describes where the
/// configuration came from for logging afterwards.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, format!("Loaded config from {}", config_path.display())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, format!("Loaded default config from {}", CONFIG_FILE_NAME))),
        Ok(None) => Ok((Config::default(), "No config file found, using defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE_NAME, e);
            Ok((Config::default(), "Using default config".to_string()))
        }
    }
}
