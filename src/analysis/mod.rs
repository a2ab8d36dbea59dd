//! Analysis modules.
//!
//! Column resolution, numeric coercion and the DRE aggregation pipeline.

pub mod aggregator;
pub mod columns;
pub mod numeric;

pub use aggregator::Aggregator;
pub use columns::{resolve_all, ColumnLookup, LogicalField};
