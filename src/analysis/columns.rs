//! Header resolution for logical fields.
//!
//! Marketplace exports rename columns between versions, so each logical field
//! carries an ordered list of accepted header names. Resolution is
//! case-insensitive: an exact match on any alias is preferred, then a
//! substring match, both in alias priority order.

use crate::config::ColumnsConfig;
use crate::error::DreError;
use crate::models::ResolvedColumn;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A semantic column of the order export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    OrderStatus,
    OrderId,
    Subtotal,
    CommissionFee,
    ServiceFee,
    SellerCoupon,
    PlatformCoupon,
    ReturnStatus,
    ShippingMethod,
    ShippingCost,
}

impl LogicalField {
    pub const ALL: [LogicalField; 10] = [
        LogicalField::OrderStatus,
        LogicalField::OrderId,
        LogicalField::Subtotal,
        LogicalField::CommissionFee,
        LogicalField::ServiceFee,
        LogicalField::SellerCoupon,
        LogicalField::PlatformCoupon,
        LogicalField::ReturnStatus,
        LogicalField::ShippingMethod,
        LogicalField::ShippingCost,
    ];

    /// Required fields, in the order their absence is reported.
    pub const REQUIRED: [LogicalField; 6] = [
        LogicalField::Subtotal,
        LogicalField::SellerCoupon,
        LogicalField::CommissionFee,
        LogicalField::ServiceFee,
        LogicalField::PlatformCoupon,
        LogicalField::OrderStatus,
    ];

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogicalField::OrderStatus => "status do pedido",
            LogicalField::OrderId => "ID do pedido",
            LogicalField::Subtotal => "preço acordado",
            LogicalField::CommissionFee => "taxa de comissão",
            LogicalField::ServiceFee => "taxa de serviço",
            LogicalField::SellerCoupon => "cupom do vendedor",
            LogicalField::PlatformCoupon => "cupom Shopee",
            LogicalField::ReturnStatus => "status da devolução",
            LogicalField::ShippingMethod => "opção de envio",
            LogicalField::ShippingCost => "valor estimado do frete",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of looking up one logical field in the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLookup {
    Found { header: String, index: usize },
    NotFound,
}

impl ColumnLookup {
    pub fn index(&self) -> Option<usize> {
        match self {
            ColumnLookup::Found { index, .. } => Some(*index),
            ColumnLookup::NotFound => None,
        }
    }
}

/// Look up the first header matching the aliases.
pub fn lookup(headers: &[String], aliases: &[String]) -> ColumnLookup {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let aliases: Vec<String> = aliases
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();

    let exact = aliases
        .iter()
        .find_map(|alias| lowered.iter().position(|h| h == alias));
    let index = exact.or_else(|| {
        aliases
            .iter()
            .find_map(|alias| lowered.iter().position(|h| h.contains(alias.as_str())))
    });

    match index {
        Some(index) => ColumnLookup::Found {
            header: headers[index].clone(),
            index,
        },
        None => ColumnLookup::NotFound,
    }
}

/// Resolve every logical field, without failing on missing ones.
pub fn resolve_all(headers: &[String], columns: &ColumnsConfig) -> Vec<(LogicalField, ColumnLookup)> {
    LogicalField::ALL
        .iter()
        .map(|&field| (field, lookup(headers, columns.aliases(field))))
        .collect()
}

/// Column positions the pipeline reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub order_status: usize,
    pub subtotal: usize,
    pub commission_fee: usize,
    pub service_fee: usize,
    pub seller_coupon: usize,
    pub platform_coupon: usize,
    pub order_id: Option<usize>,
    pub return_status: Option<usize>,
    pub shipping_method: Option<usize>,
    pub shipping_cost: Option<usize>,
    matched: Vec<ResolvedColumn>,
}

impl ResolvedColumns {
    /// Resolve all fields, failing on the first missing required one.
    pub fn resolve(headers: &[String], columns: &ColumnsConfig) -> Result<Self, DreError> {
        let lookups = resolve_all(headers, columns);
        let find = |field: LogicalField| -> Option<usize> {
            lookups
                .iter()
                .find(|(f, _)| *f == field)
                .and_then(|(_, lookup)| lookup.index())
        };

        for field in LogicalField::REQUIRED {
            if find(field).is_none() {
                return Err(DreError::MissingColumn {
                    field,
                    aliases: columns.aliases(field).join(", "),
                });
            }
        }

        let matched: Vec<ResolvedColumn> = lookups
            .iter()
            .filter_map(|(field, lookup)| match lookup {
                ColumnLookup::Found { header, .. } => {
                    debug!("Resolved '{}' to column '{}'", field, header);
                    Some(ResolvedColumn {
                        field: field.name().to_string(),
                        header: header.clone(),
                    })
                }
                ColumnLookup::NotFound => {
                    debug!("Optional field '{}' not present", field);
                    None
                }
            })
            .collect();

        // Required fields were checked above.
        let required = |field: LogicalField| find(field).unwrap_or_default();

        Ok(Self {
            order_status: required(LogicalField::OrderStatus),
            subtotal: required(LogicalField::Subtotal),
            commission_fee: required(LogicalField::CommissionFee),
            service_fee: required(LogicalField::ServiceFee),
            seller_coupon: required(LogicalField::SellerCoupon),
            platform_coupon: required(LogicalField::PlatformCoupon),
            order_id: find(LogicalField::OrderId),
            return_status: find(LogicalField::ReturnStatus),
            shipping_method: find(LogicalField::ShippingMethod),
            shipping_cost: find(LogicalField::ShippingCost),
            matched,
        })
    }

    /// Headers that satisfied each resolved field.
    pub fn matched(&self) -> &[ResolvedColumn] {
        &self.matched
    }
}
