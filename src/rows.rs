//! Row splitting and projection helpers.
//!
//! The data path treats rows as raw text: a line is split on the
//! single-character separator with empty trailing fields preserved, and a
//! projection re-joins the fields at the selected indices in selection order.
//! No quoting or escaping is applied; a field containing the separator is not
//! supported by the format contract.

use itertools::Itertools;

/// Splits a line on `separator`, preserving empty fields, including trailing
/// ones (`"a,b,"` has three columns).
pub fn split_row(line: &str, separator: char) -> Vec<&str> {
    line.split(separator).collect()
}

/// A line is blank when it is empty after trimming; blank lines are never
/// rows and never errors.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Rewrites a split row to the fields at `selected`, in selection order,
/// joined with `separator`. Callers validate indices against the row width
/// beforehand; an out-of-range index projects as an empty field.
pub fn project(fields: &[&str], selected: &[usize], separator: char) -> String {
    selected
        .iter()
        .map(|&index| fields.get(index).copied().unwrap_or(""))
        .join(&separator.to_string())
}
