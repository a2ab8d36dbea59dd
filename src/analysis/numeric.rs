//! Numeric coercion of spreadsheet cells.
//!
//! Coercion never fails: a value that cannot be read as a number is either
//! skipped or counted as zero, depending on the column being summed.

use crate::models::CellValue;

/// What to do with a cell that has no numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Leave the cell out of the sum.
    Skip,
    /// Count the cell as 0.
    Zero,
}

/// Read a cell as a finite number.
pub fn coerce(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Number(_) | CellValue::Empty => None,
        CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    }
}

/// Coerce a cell under the given policy.
pub fn coerce_with(cell: &CellValue, policy: MissingPolicy) -> Option<f64> {
    match (coerce(cell), policy) {
        (Some(n), _) => Some(n),
        (None, MissingPolicy::Zero) => Some(0.0),
        (None, MissingPolicy::Skip) => None,
    }
}

/// Sum one column over a set of rows.
pub fn sum_column<'a, I>(rows: I, column: usize, policy: MissingPolicy) -> f64
where
    I: IntoIterator<Item = &'a [CellValue]>,
{
    rows.into_iter()
        .filter_map(|row| coerce_with(&row[column], policy))
        .sum()
}
