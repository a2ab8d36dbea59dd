//! DRE report generation.
//!
//! This module renders the summary as an xlsx spreadsheet (two columns,
//! highlighted key lines), as JSON, and as a plain-text table for the
//! terminal.

use crate::config::ReportConfig;
use crate::error::DreError;
use crate::models::{Report, SummaryLine};
use anyhow::{anyhow, Context, Result};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// File name offered for download.
pub const REPORT_FILE_NAME: &str = "DRE_shopee.xlsx";

/// MIME type of the xlsx report.
#[allow(dead_code)] // For front ends serving the report as a download
pub const REPORT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER_DESCRIPTION: &str = "Descrição";
const HEADER_VALUE: &str = "Valor";
const CURRENCY_FORMAT: &str = "#,##0.00";

/// Build the report workbook in memory.
pub fn render_workbook(
    report: &Report,
    config: &ReportConfig,
) -> Result<umya_spreadsheet::Spreadsheet> {
    let mut book = umya_spreadsheet::new_file();
    let ws = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| anyhow!("default worksheet missing"))?;
    ws.set_name(config.sheet_name.clone());

    ws.get_cell_mut((1u32, 1u32)).set_value(HEADER_DESCRIPTION);
    ws.get_cell_mut((2u32, 1u32)).set_value(HEADER_VALUE);
    ws.get_style_mut((1u32, 1u32)).get_font_mut().set_bold(true);
    ws.get_style_mut((2u32, 1u32)).get_font_mut().set_bold(true);

    for (i, line) in report.summary.lines.iter().enumerate() {
        let row = (i + 2) as u32;
        ws.get_cell_mut((1u32, row)).set_value(line.description.clone());
        ws.get_cell_mut((2u32, row)).set_value_number(line.value);

        if !line.label.is_count() {
            ws.get_style_mut((2u32, row))
                .get_number_format_mut()
                .set_format_code(CURRENCY_FORMAT);
        }

        if line.label.is_highlighted() {
            for col in 1..=2u32 {
                let style = ws.get_style_mut((col, row));
                style.set_background_color(config.highlight_color.clone());
                if config.bold_highlights {
                    style.get_font_mut().set_bold(true);
                }
            }
        }
    }

    ws.get_column_dimension_mut("A").set_width(32.0);
    ws.get_column_dimension_mut("B").set_width(18.0);

    Ok(book)
}

/// Serialize the report workbook to xlsx bytes.
pub fn generate_xlsx_report(report: &Report, config: &ReportConfig) -> Result<Vec<u8>> {
    let book = render_workbook(report, config)?;

    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| anyhow!("{}", e))
        .context("Failed to serialize workbook")?;

    Ok(out.into_inner())
}

/// Write the xlsx report, creating the parent directory if needed.
pub fn write_xlsx_report(
    report: &Report,
    path: &Path,
    config: &ReportConfig,
) -> Result<(), DreError> {
    let bytes =
        generate_xlsx_report(report, config).map_err(|e| DreError::write(path, format!("{:#}", e)))?;
    write_bytes(path, &bytes)?;

    info!("Wrote xlsx report ({} bytes) to {}", bytes.len(), path.display());
    Ok(())
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a JSON report, creating the parent directory if needed.
pub fn write_json_report(report: &Report, path: &Path) -> Result<(), DreError> {
    let content = generate_json_report(report).map_err(|e| DreError::write(path, e))?;
    write_bytes(path, content.as_bytes())?;

    info!("Wrote JSON report to {}", path.display());
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), DreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        debug!("Ensuring output directory {}", parent.display());
        std::fs::create_dir_all(parent).map_err(|e| DreError::write(path, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| DreError::write(path, e))
}

/// Render the summary as an aligned text table for the terminal.
pub fn generate_text_summary(report: &Report) -> String {
    let width = report
        .summary
        .lines
        .iter()
        .map(|l| l.description.chars().count())
        .max()
        .unwrap_or(0)
        .max(HEADER_DESCRIPTION.chars().count());

    let mut output = String::new();
    output.push_str(&format!(
        "   {:<width$}  {:>18}\n",
        HEADER_DESCRIPTION,
        HEADER_VALUE,
        width = width
    ));
    output.push_str(&format!("   {}  {}\n", "-".repeat(width), "-".repeat(18)));

    for line in &report.summary.lines {
        let marker = if line.label.is_highlighted() { "▶" } else { " " };
        output.push_str(&format!(
            " {} {:<width$}  {:>18}\n",
            marker,
            line.description,
            format_value(line),
            width = width
        ));
    }

    output
}

fn format_value(line: &SummaryLine) -> String {
    if line.label.is_count() {
        format!("{:.0}", line.value)
    } else {
        format_brl(line.value)
    }
}

/// Format an amount in Brazilian currency style, e.g. `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::new();
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DreSummary, ReportMetadata, RunStats, SummaryLabel};
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_report() -> Report {
        let values = [1500.0, 150.0, 60.0, 10.0, 5.0, 225.0, 99.9, 35.5, 12.0];
        Report {
            metadata: ReportMetadata {
                source_file: "Order.all.xlsx".to_string(),
                sheet_name: "orders".to_string(),
                marketplace: "Shopee".to_string(),
                generated_at: Utc::now(),
                duration_seconds: 0.4,
            },
            summary: DreSummary {
                lines: SummaryLabel::ALL
                    .iter()
                    .zip(values)
                    .map(|(label, value)| SummaryLine::new(*label, value))
                    .collect(),
                stats: RunStats {
                    rows_read: 20,
                    rows_kept: 15,
                    rows_excluded: 5,
                    rows_returned: 1,
                },
                columns: Vec::new(),
            },
        }
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(1234.5), "R$ 1.234,50");
        assert_eq!(format_brl(1234567.891), "R$ 1.234.567,89");
        assert_eq!(format_brl(-42.0), "-R$ 42,00");
        assert_eq!(format_brl(999.999), "R$ 1.000,00");
    }

    #[test]
    fn test_generate_text_summary() {
        let report = create_test_report();
        let text = generate_text_summary(&report);

        assert!(text.contains("Descrição"));
        assert!(text.contains("Faturamento Shopee"));
        assert!(text.contains("R$ 1.500,00"));
        assert!(text.contains("▶ Comissão Shopee"));
        assert!(text.contains("Quantidade de Pedidos"));
        assert!(text.lines().any(|l| l.trim_end().ends_with(" 12")));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"source_file\""));
        assert!(json.contains("\"total_commission\""));
        assert!(json.contains("\"Valor Devolvido\""));
    }

    #[test]
    fn test_xlsx_report_layout() {
        let report = create_test_report();
        let bytes = generate_xlsx_report(&report, &ReportConfig::default()).unwrap();

        let mut wb = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = wb.worksheet_range("DRE").unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0][0], Data::String("Descrição".to_string()));
        assert_eq!(rows[0][1], Data::String("Valor".to_string()));
        assert_eq!(rows[1][0], Data::String("Faturamento Shopee".to_string()));
        assert_eq!(rows[1][1], Data::Float(1500.0));
        assert_eq!(rows[9][0], Data::String("Quantidade de Pedidos".to_string()));
        assert_eq!(rows[9][1], Data::Float(12.0));
    }

    #[test]
    fn test_only_key_lines_highlighted() {
        let report = create_test_report();
        let config = ReportConfig::default();
        let book = render_workbook(&report, &config).unwrap();
        let ws = book.get_sheet_by_name("DRE").unwrap();

        for (i, line) in report.summary.lines.iter().enumerate() {
            let row = (i + 2) as u32;
            for col in 1..=2u32 {
                let style = ws.get_cell((col, row)).unwrap().get_style();
                let fill = style
                    .get_background_color()
                    .map(|c| c.get_argb().to_string());
                let bold = style.get_font().map(|f| *f.get_bold()).unwrap_or(false);

                if line.label.is_highlighted() {
                    assert_eq!(fill.as_deref(), Some("FFFFFF00"), "{}", line.description);
                    assert!(bold, "{}", line.description);
                } else {
                    assert_eq!(fill, None, "{}", line.description);
                    assert!(!bold, "{}", line.description);
                }
            }
        }

        let highlighted: Vec<&str> = report
            .summary
            .lines
            .iter()
            .filter(|l| l.label.is_highlighted())
            .map(|l| l.description.as_str())
            .collect();
        assert_eq!(
            highlighted,
            vec![
                "Faturamento Shopee",
                "Comissão Shopee",
                "Valor Devolvido",
                "Quantidade de Pedidos"
            ]
        );
    }

    #[test]
    fn test_write_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uploads").join(REPORT_FILE_NAME);

        write_xlsx_report(&create_test_report(), &path, &ReportConfig::default()).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_json_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("DRE_shopee.json");

        write_json_report(&create_test_report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Faturamento Shopee"));
    }
}
