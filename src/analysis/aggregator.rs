//! DRE aggregation over the order table.
//!
//! This module turns the normalized order table into the fixed list of
//! summary lines: revenue, fees, coupons, returns, direct-delivery shipping
//! and order count.

use super::columns::ResolvedColumns;
use super::numeric::{sum_column, MissingPolicy};
use crate::config::{ColumnsConfig, Config, FilterConfig};
use crate::error::DreError;
use crate::models::{CellValue, DreSummary, InputTable, RunStats, SummaryLabel, SummaryLine};
use std::collections::HashSet;
use tracing::{debug, info};

type Row<'a> = &'a [CellValue];

/// Runs the aggregation pipeline with a fixed set of aliases and filters.
#[derive(Debug, Clone)]
pub struct Aggregator {
    columns: ColumnsConfig,
    excluded_status: Vec<String>,
    direct_delivery_marker: String,
}

impl Aggregator {
    pub fn new(columns: ColumnsConfig, filters: &FilterConfig) -> Self {
        // An empty marker would match every row.
        let excluded_status = filters
            .excluded_status
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            columns,
            excluded_status,
            direct_delivery_marker: filters.direct_delivery_marker.trim().to_lowercase(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.columns.clone(), &config.filters)
    }

    /// Aggregate a table into the DRE summary.
    ///
    /// Fails only when a required column cannot be resolved; unreadable
    /// numbers are absorbed by the per-column missing policy.
    pub fn run(&self, table: InputTable) -> Result<DreSummary, DreError> {
        let table = table.normalize_columns();
        let cols = ResolvedColumns::resolve(table.headers(), &self.columns)?;

        let all: Vec<Row> = table.rows().iter().map(Vec::as_slice).collect();
        let kept = self.exclude_status(&all, cols.order_status);
        debug!(
            "{} of {} rows kept after status filter",
            kept.len(),
            all.len()
        );

        let revenue = sum_column(kept.iter().copied(), cols.subtotal, MissingPolicy::Skip);

        // Fees and coupons are repeated on every line item of an order.
        let per_order = match cols.order_id {
            Some(id) => dedupe_by_id(&kept, id),
            None => kept.clone(),
        };
        let commission_fee = sum_column(
            per_order.iter().copied(),
            cols.commission_fee,
            MissingPolicy::Zero,
        );
        let service_fee = sum_column(
            per_order.iter().copied(),
            cols.service_fee,
            MissingPolicy::Zero,
        );
        let seller_coupon = sum_column(
            per_order.iter().copied(),
            cols.seller_coupon,
            MissingPolicy::Zero,
        );
        let platform_coupon = sum_column(
            per_order.iter().copied(),
            cols.platform_coupon,
            MissingPolicy::Zero,
        );
        let total_commission = commission_fee + service_fee + seller_coupon + platform_coupon;

        let returned_rows: Vec<Row> = match cols.return_status {
            Some(status) => kept
                .iter()
                .copied()
                .filter(|row| !row[status].is_null())
                .collect(),
            None => Vec::new(),
        };
        let returned_value = sum_column(
            returned_rows.iter().copied(),
            cols.subtotal,
            MissingPolicy::Skip,
        );

        let shipping = self.direct_delivery_shipping(&kept, &cols);
        let order_count = self.order_count(&kept, &cols);

        let lines = vec![
            SummaryLine::new(SummaryLabel::Revenue, revenue),
            SummaryLine::new(SummaryLabel::CommissionFee, commission_fee),
            SummaryLine::new(SummaryLabel::ServiceFee, service_fee),
            SummaryLine::new(SummaryLabel::SellerCoupon, seller_coupon),
            SummaryLine::new(SummaryLabel::PlatformCoupon, platform_coupon),
            SummaryLine::new(SummaryLabel::TotalCommission, total_commission),
            SummaryLine::new(SummaryLabel::ReturnedValue, returned_value),
            SummaryLine::new(SummaryLabel::DirectDeliveryShipping, shipping),
            SummaryLine::new(SummaryLabel::OrderCount, order_count as f64),
        ];

        info!(
            "Aggregated {} rows: revenue {:.2}, commission {:.2}, {} orders",
            kept.len(),
            revenue,
            total_commission,
            order_count
        );

        Ok(DreSummary {
            lines,
            stats: RunStats {
                rows_read: all.len(),
                rows_kept: kept.len(),
                rows_excluded: all.len() - kept.len(),
                rows_returned: returned_rows.len(),
            },
            columns: cols.matched().to_vec(),
        })
    }

    /// Drop cancelled and unpaid orders.
    fn exclude_status<'a>(&self, rows: &[Row<'a>], status: usize) -> Vec<Row<'a>> {
        rows.iter()
            .copied()
            .filter(|row| !self.is_excluded(&row[status]))
            .collect()
    }

    fn is_excluded(&self, cell: &CellValue) -> bool {
        match cell.as_text() {
            Some(text) => {
                let text = text.to_lowercase();
                self.excluded_status
                    .iter()
                    .any(|marker| text.contains(marker.as_str()))
            }
            None => false,
        }
    }

    /// Estimated shipping of direct-delivery orders, counted once per order.
    fn direct_delivery_shipping(&self, kept: &[Row], cols: &ResolvedColumns) -> f64 {
        let (Some(id), Some(method), Some(cost)) =
            (cols.order_id, cols.shipping_method, cols.shipping_cost)
        else {
            debug!("Shipping columns incomplete, direct-delivery cost is 0");
            return 0.0;
        };

        let orders = self.exclude_status(&dedupe_by_id(kept, id), cols.order_status);
        let direct: Vec<Row> = orders
            .into_iter()
            .filter(|row| {
                row[method]
                    .as_text()
                    .map(|m| m.to_lowercase().contains(&self.direct_delivery_marker))
                    .unwrap_or(false)
            })
            .collect();

        debug!("{} direct-delivery orders", direct.len());
        sum_column(direct, cost, MissingPolicy::Zero)
    }

    /// Distinct order ids among the kept rows.
    fn order_count(&self, kept: &[Row], cols: &ResolvedColumns) -> usize {
        let Some(id) = cols.order_id else {
            return 0;
        };

        self.exclude_status(&dedupe_by_id(kept, id), cols.order_status)
            .iter()
            .filter(|row| !row[id].is_null())
            .count()
    }
}

/// Keep the first row of each order id.
///
/// Rows without an id share one empty key, so only the first of them is kept.
pub fn dedupe_by_id<'a>(rows: &[Row<'a>], id: usize) -> Vec<Row<'a>> {
    let mut seen = HashSet::new();
    rows.iter()
        .copied()
        .filter(|row| seen.insert(row[id].to_string()))
        .collect()
}
