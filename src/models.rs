//! Data models for the DRE generator.
//!
//! This module contains the core data structures used throughout
//! the application for representing the input table, summary lines,
//! and the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of the input spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Returns true for empty cells and whitespace-only text.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s.trim()),
            // Integral floats print without the trailing ".0" so numeric order ids
            // compare equal to their text form.
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                write!(f, "{:.0}", n)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// The uploaded order table: one header row plus data rows.
///
/// Rows are padded or truncated to the header width on construction, so a
/// row can be indexed by any column position of the header.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTable {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl InputTable {
    /// Builds a table, normalizing every row to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Drops unnamed and fully empty columns, and trims header names.
    ///
    /// A header is unnamed when it is blank or carries the auto-generated
    /// `Unnamed: N` placeholder that spreadsheet exporters emit.
    pub fn normalize_columns(self) -> Self {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&col| {
                let name = self.headers[col].trim();
                if name.is_empty() || name.starts_with("Unnamed") {
                    return false;
                }
                self.rows.iter().any(|row| !row[col].is_null())
            })
            .collect();

        let headers = keep
            .iter()
            .map(|&col| self.headers[col].trim().to_string())
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| keep.iter().map(|&col| row[col].clone()).collect())
            .collect();

        Self { headers, rows }
    }
}

/// Fixed vocabulary of DRE lines, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLabel {
    Revenue,
    CommissionFee,
    ServiceFee,
    SellerCoupon,
    PlatformCoupon,
    TotalCommission,
    ReturnedValue,
    DirectDeliveryShipping,
    OrderCount,
}

impl SummaryLabel {
    /// All labels in the order they appear in the report.
    #[allow(dead_code)] // Reference ordering, checked by tests
    pub const ALL: [SummaryLabel; 9] = [
        SummaryLabel::Revenue,
        SummaryLabel::CommissionFee,
        SummaryLabel::ServiceFee,
        SummaryLabel::SellerCoupon,
        SummaryLabel::PlatformCoupon,
        SummaryLabel::TotalCommission,
        SummaryLabel::ReturnedValue,
        SummaryLabel::DirectDeliveryShipping,
        SummaryLabel::OrderCount,
    ];

    /// Description printed in the first column of the report.
    pub fn description(&self) -> &'static str {
        match self {
            SummaryLabel::Revenue => "Faturamento Shopee",
            SummaryLabel::CommissionFee => "Taxa de comissão bruta",
            SummaryLabel::ServiceFee => "Taxa de serviço bruta",
            SummaryLabel::SellerCoupon => "Cupom do vendedor",
            SummaryLabel::PlatformCoupon => "Cupom Shopee",
            SummaryLabel::TotalCommission => "Comissão Shopee",
            SummaryLabel::ReturnedValue => "Valor Devolvido",
            SummaryLabel::DirectDeliveryShipping => "Frete Entrega Direta",
            SummaryLabel::OrderCount => "Quantidade de Pedidos",
        }
    }

    /// Lines rendered with a highlight fill in the output spreadsheet.
    pub fn is_highlighted(&self) -> bool {
        matches!(
            self,
            SummaryLabel::Revenue
                | SummaryLabel::TotalCommission
                | SummaryLabel::ReturnedValue
                | SummaryLabel::OrderCount
        )
    }

    /// Whether the value is a count rather than a currency amount.
    pub fn is_count(&self) -> bool {
        matches!(self, SummaryLabel::OrderCount)
    }
}

impl fmt::Display for SummaryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// One (label, value) line of the DRE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: SummaryLabel,
    pub description: String,
    pub value: f64,
}

impl SummaryLine {
    pub fn new(label: SummaryLabel, value: f64) -> Self {
        Self {
            label,
            description: label.description().to_string(),
            value,
        }
    }
}

/// Header that satisfied a logical field during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    pub field: String,
    pub header: String,
}

/// Row statistics gathered while running the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Data rows after column normalization.
    pub rows_read: usize,
    /// Rows left after excluding cancelled/unpaid orders.
    pub rows_kept: usize,
    /// Rows removed by the status filter.
    pub rows_excluded: usize,
    /// Rows flagged with a return/refund status.
    pub rows_returned: usize,
}

/// Output of the aggregation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreSummary {
    pub lines: Vec<SummaryLine>,
    pub stats: RunStats,
    pub columns: Vec<ResolvedColumn>,
}

impl DreSummary {
    /// Looks up the value of a line.
    #[allow(dead_code)] // Lookup helper for callers that need a single figure
    pub fn value(&self, label: SummaryLabel) -> f64 {
        self.lines
            .iter()
            .find(|line| line.label == label)
            .map(|line| line.value)
            .unwrap_or(0.0)
    }
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Name of the uploaded spreadsheet.
    pub source_file: String,
    /// Worksheet the orders were read from.
    pub sheet_name: String,
    /// Marketplace the export belongs to.
    pub marketplace: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete DRE report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: DreSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_cell_display_integral_number() {
        assert_eq!(CellValue::Number(250123.0).to_string(), "250123");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(text("  A1 ").to_string(), "A1");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_cell_is_null() {
        assert!(CellValue::Empty.is_null());
        assert!(text("   ").is_null());
        assert!(!text("Reembolsado").is_null());
        assert!(!CellValue::Number(0.0).is_null());
    }

    #[test]
    fn test_table_pads_short_rows() {
        let table = InputTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![text("x")], vec![text("y"), text("z"), text("extra")]],
        );
        assert_eq!(table.rows()[0], vec![text("x"), CellValue::Empty]);
        assert_eq!(table.rows()[1].len(), 2);
    }

    #[test]
    fn test_normalize_columns_drops_unnamed_and_empty() {
        let table = InputTable::new(
            vec![
                " ID do pedido ".to_string(),
                "".to_string(),
                "Unnamed: 2".to_string(),
                "Observação".to_string(),
                "Preço acordado".to_string(),
            ],
            vec![
                vec![text("A1"), text("junk"), text("junk"), CellValue::Empty, CellValue::Number(10.0)],
                vec![text("A2"), CellValue::Empty, CellValue::Empty, text(" "), CellValue::Number(20.0)],
            ],
        );

        let normalized = table.normalize_columns();

        assert_eq!(normalized.headers(), &["ID do pedido", "Preço acordado"]);
        assert_eq!(normalized.rows()[1], vec![text("A2"), CellValue::Number(20.0)]);
    }

    #[test]
    fn test_summary_label_order_and_highlight() {
        assert_eq!(SummaryLabel::ALL[0], SummaryLabel::Revenue);
        assert_eq!(SummaryLabel::ALL[8], SummaryLabel::OrderCount);
        assert!(SummaryLabel::Revenue.is_highlighted());
        assert!(!SummaryLabel::SellerCoupon.is_highlighted());
        assert_eq!(SummaryLabel::TotalCommission.to_string(), "Comissão Shopee");
    }

    #[test]
    fn test_summary_value_lookup() {
        let summary = DreSummary {
            lines: vec![
                SummaryLine::new(SummaryLabel::Revenue, 100.0),
                SummaryLine::new(SummaryLabel::OrderCount, 3.0),
            ],
            stats: RunStats::default(),
            columns: Vec::new(),
        };
        assert_eq!(summary.value(SummaryLabel::Revenue), 100.0);
        assert_eq!(summary.value(SummaryLabel::ReturnedValue), 0.0);
    }
}
