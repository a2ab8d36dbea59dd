//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.dre.toml` files.

use crate::analysis::LogicalField;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".dre.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Accepted header names per logical field.
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Row filter settings.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the report is written to (created on demand).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the spreadsheet report.
    #[serde(default = "default_output_file")]
    pub output_file: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            output_file: default_output_file(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_output_file() -> String {
    crate::report::REPORT_FILE_NAME.to_string()
}

/// Header aliases for each logical field, checked in priority order.
///
/// An exact (case-insensitive) match on any alias wins over a substring
/// match, so `Taxa de comissão bruta` is preferred over a column that merely
/// contains `Taxa de comissão`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default = "default_order_status")]
    pub order_status: Vec<String>,

    #[serde(default = "default_order_id")]
    pub order_id: Vec<String>,

    #[serde(default = "default_subtotal")]
    pub subtotal: Vec<String>,

    #[serde(default = "default_commission_fee")]
    pub commission_fee: Vec<String>,

    #[serde(default = "default_service_fee")]
    pub service_fee: Vec<String>,

    #[serde(default = "default_seller_coupon")]
    pub seller_coupon: Vec<String>,

    #[serde(default = "default_platform_coupon")]
    pub platform_coupon: Vec<String>,

    #[serde(default = "default_return_status")]
    pub return_status: Vec<String>,

    #[serde(default = "default_shipping_method")]
    pub shipping_method: Vec<String>,

    #[serde(default = "default_shipping_cost")]
    pub shipping_cost: Vec<String>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            order_status: default_order_status(),
            order_id: default_order_id(),
            subtotal: default_subtotal(),
            commission_fee: default_commission_fee(),
            service_fee: default_service_fee(),
            seller_coupon: default_seller_coupon(),
            platform_coupon: default_platform_coupon(),
            return_status: default_return_status(),
            shipping_method: default_shipping_method(),
            shipping_cost: default_shipping_cost(),
        }
    }
}

impl ColumnsConfig {
    /// Returns the alias list configured for a logical field.
    pub fn aliases(&self, field: LogicalField) -> &[String] {
        match field {
            LogicalField::OrderStatus => &self.order_status,
            LogicalField::OrderId => &self.order_id,
            LogicalField::Subtotal => &self.subtotal,
            LogicalField::CommissionFee => &self.commission_fee,
            LogicalField::ServiceFee => &self.service_fee,
            LogicalField::SellerCoupon => &self.seller_coupon,
            LogicalField::PlatformCoupon => &self.platform_coupon,
            LogicalField::ReturnStatus => &self.return_status,
            LogicalField::ShippingMethod => &self.shipping_method,
            LogicalField::ShippingCost => &self.shipping_cost,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_order_status() -> Vec<String> {
    strings(&["Status do pedido"])
}

fn default_order_id() -> Vec<String> {
    strings(&["ID do pedido", "Número do pedido"])
}

fn default_subtotal() -> Vec<String> {
    strings(&["Preço acordado", "Subtotal do produto"])
}

fn default_commission_fee() -> Vec<String> {
    strings(&["Taxa de comissão bruta", "Taxa de comissão"])
}

fn default_service_fee() -> Vec<String> {
    strings(&["Taxa de serviço bruta", "Taxa de serviço"])
}

fn default_seller_coupon() -> Vec<String> {
    strings(&["Cupom do vendedor"])
}

fn default_platform_coupon() -> Vec<String> {
    strings(&["Cupom Shopee"])
}

fn default_return_status() -> Vec<String> {
    strings(&["Status da devolução", "Reembolso"])
}

fn default_shipping_method() -> Vec<String> {
    strings(&["Opção de envio", "Método de envio"])
}

fn default_shipping_cost() -> Vec<String> {
    strings(&["Valor estimado do frete", "Frete estimado"])
}

/// Row filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Case-insensitive markers; a status containing any of them is excluded.
    #[serde(default = "default_excluded_status")]
    pub excluded_status: Vec<String>,

    /// Case-insensitive marker identifying direct-delivery shipping methods.
    #[serde(default = "default_direct_delivery_marker")]
    pub direct_delivery_marker: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_status: default_excluded_status(),
            direct_delivery_marker: default_direct_delivery_marker(),
        }
    }
}

fn default_excluded_status() -> Vec<String> {
    // Stems cover cancelado/cancelada/cancelados and não pago/não paga.
    strings(&["cancelad", "não pag", "nao pag"])
}

fn default_direct_delivery_marker() -> String {
    "entrega direta".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Worksheet name in the generated spreadsheet.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// ARGB fill colour of highlighted lines.
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,

    /// Render highlighted lines in bold.
    #[serde(default = "default_true")]
    pub bold_highlights: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sheet_name: default_sheet_name(),
            highlight_color: default_highlight_color(),
            bold_highlights: true,
        }
    }
}

fn default_sheet_name() -> String {
    "DRE".to_string()
}

fn default_highlight_color() -> String {
    "FFFFFF00".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(ref file) = args.output_file {
            self.general.output_file = file.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Full path of the report for the given extension.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.general
            .output_dir
            .join(&self.general.output_file)
            .with_extension(extension)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output_dir, PathBuf::from("uploads"));
        assert_eq!(config.general.output_file, "DRE_shopee.xlsx");
        assert_eq!(
            config.columns.commission_fee,
            vec!["Taxa de comissão bruta", "Taxa de comissão"]
        );
        assert!(config.filters.excluded_status.contains(&"cancelad".to_string()));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "relatorios"
verbose = true

[columns]
subtotal = ["Subtotal"]

[filters]
direct_delivery_marker = "entrega rápida"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, PathBuf::from("relatorios"));
        assert_eq!(config.general.output_file, "DRE_shopee.xlsx");
        assert!(config.general.verbose);
        assert_eq!(config.columns.subtotal, vec!["Subtotal"]);
        assert_eq!(config.columns.order_status, vec!["Status do pedido"]);
        assert_eq!(config.filters.direct_delivery_marker, "entrega rápida");
        assert_eq!(config.report.sheet_name, "DRE");
    }

    #[test]
    fn test_aliases_lookup() {
        let config = ColumnsConfig::default();
        assert_eq!(
            config.aliases(LogicalField::PlatformCoupon),
            &["Cupom Shopee".to_string()]
        );
        assert_eq!(config.aliases(LogicalField::ServiceFee).len(), 2);
    }

    #[test]
    fn test_output_path() {
        let config = Config::default();
        assert_eq!(
            config.output_path("xlsx"),
            PathBuf::from("uploads").join("DRE_shopee.xlsx")
        );
        assert_eq!(
            config.output_path("json"),
            PathBuf::from("uploads").join("DRE_shopee.json")
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[columns]"));
        assert!(toml_str.contains("[filters]"));
        assert!(toml_str.contains("[report]"));
    }
}
