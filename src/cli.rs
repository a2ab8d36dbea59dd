//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::workbook::reader::{is_supported, SUPPORTED_EXTENSIONS};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// DRE Shopee - income statement generator for marketplace sales
///
/// Reads a Shopee order export (.xls/.xlsx), drops cancelled and unpaid
/// orders, and writes a DRE summary spreadsheet with revenue, fees,
/// coupons, returns, direct-delivery shipping and order count.
///
/// Examples:
///   dre-shopee --input Order.all.20240101_20240131.xlsx
///   dre-shopee --input pedidos.xlsx --output-dir relatorios
///   dre-shopee --input pedidos.xlsx --format json
///   dre-shopee --input pedidos.xlsx --dry-run
///   dre-shopee --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Sales spreadsheet exported from the marketplace
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Marketplace the spreadsheet was exported from
    #[arg(short, long, default_value = "shopee", env = "DRE_MARKETPLACE")]
    pub marketplace: Marketplace,

    /// Worksheet to read (defaults to the first one)
    #[arg(short, long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Directory the report is written to
    ///
    /// Created if it does not exist. Defaults to `uploads` or the config value.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name of the report
    #[arg(long, value_name = "NAME")]
    pub output_file: Option<String>,

    /// Output format (xlsx, json)
    #[arg(long, default_value = "xlsx", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .dre.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: read the spreadsheet and resolve columns without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .dre.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel spreadsheet (default)
    #[default]
    Xlsx,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
        }
    }
}

/// Marketplace selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Marketplace {
    #[default]
    Shopee,
    MercadoLivre,
    Amazon,
}

impl Marketplace {
    /// Only Shopee exports are processed for now.
    pub fn is_supported(&self) -> bool {
        matches!(self, Marketplace::Shopee)
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marketplace::Shopee => write!(f, "Shopee"),
            Marketplace::MercadoLivre => write!(f, "Mercado Livre"),
            Marketplace::Amazon => write!(f, "Amazon"),
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Reject marketplaces that cannot be processed yet.
    ///
    /// Runs before [`Args::validate`], so nothing about the input is checked.
    pub fn check_marketplace(&self) -> Result<(), String> {
        if self.init_config || self.marketplace.is_supported() {
            return Ok(());
        }
        Err(format!(
            "{} spreadsheets are not supported yet. Only Shopee exports can be processed.",
            self.marketplace
        ))
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let input = self
            .input
            .as_ref()
            .ok_or_else(|| "An input spreadsheet is required (--input)".to_string())?;

        if !input.exists() {
            return Err(format!("Input file does not exist: {}", input.display()));
        }
        if !input.is_file() {
            return Err(format!("Input path is not a file: {}", input.display()));
        }

        let name = input.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !is_supported(name) {
            return Err(format!(
                "Input must be a spreadsheet ({}): {}",
                SUPPORTED_EXTENSIONS.join(", "),
                input.display()
            ));
        }

        if let Some(ref file) = self.output_file {
            if file.trim().is_empty() {
                return Err("Output file name cannot be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_args(input: Option<PathBuf>) -> Args {
        Args {
            input,
            marketplace: Marketplace::Shopee,
            sheet: None,
            output_dir: None,
            output_file: None,
            format: OutputFormat::Xlsx,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"placeholder").unwrap();
        path
    }

    #[test]
    fn test_validation_accepts_xlsx() {
        let dir = TempDir::new().unwrap();
        let args = make_args(Some(touch(&dir, "pedidos.xlsx")));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_csv() {
        let dir = TempDir::new().unwrap();
        let args = make_args(Some(touch(&dir, "pedidos.csv")));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input() {
        let args = make_args(Some(PathBuf::from("/nonexistent/pedidos.xlsx")));
        assert!(args.validate().is_err());

        let args = make_args(None);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_init_config_skips_input() {
        let mut args = make_args(None);
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let dir = TempDir::new().unwrap();
        let mut args = make_args(Some(touch(&dir, "pedidos.xls")));
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(None);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_marketplace_support() {
        assert!(Marketplace::Shopee.is_supported());
        assert!(!Marketplace::MercadoLivre.is_supported());
        assert!(!Marketplace::Amazon.is_supported());
        assert_eq!(Marketplace::MercadoLivre.to_string(), "Mercado Livre");
    }

    #[test]
    fn test_unsupported_marketplace_rejected_before_input_checks() {
        let mut args = make_args(Some(PathBuf::from("/nonexistent/pedidos.xlsx")));
        args.marketplace = Marketplace::Amazon;

        let err = args.check_marketplace().unwrap_err();
        assert!(err.contains("Amazon"));

        args.marketplace = Marketplace::Shopee;
        assert!(args.check_marketplace().is_ok());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "dre-shopee",
            "--input",
            "pedidos.xlsx",
            "--marketplace",
            "mercado-livre",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.input, Some(PathBuf::from("pedidos.xlsx")));
        assert_eq!(args.marketplace, Marketplace::MercadoLivre);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.format.extension(), "json");
    }
}
