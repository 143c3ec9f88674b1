//! Column selection parsing and header-name resolution.
//!
//! A selection spec is either `*` (all columns in header order) or a
//! comma-separated list of 1-based column numbers; the parser emits 0-based
//! indices, preserving order and duplicates so output columns can be
//! reordered or repeated. [`HeaderIndex`] maps trimmed header names to
//! positions for the filter compiler.

use std::collections::HashMap;

use anyhow::{Result, anyhow};

/// Parses a column-selection spec against a header of `total_columns` columns.
///
/// Empty or `*` specs (after trimming) select every column. Any other spec is
/// a comma-separated list of 1-based positive integers; tokens that are not
/// integers or fall outside `1..=total_columns` are rejected.
pub fn parse_selection(spec: &str, total_columns: usize) -> Result<Vec<usize>> {
    let trimmed = spec.trim();
    if trimmed.is_empty() || trimmed == "*" {
        return Ok((0..total_columns).collect());
    }
    trimmed
        .split(',')
        .map(|token| {
            let token = token.trim();
            let number: usize = token
                .parse()
                .map_err(|_| anyhow!("Column selection token '{token}' is not a number"))?;
            if number < 1 || number > total_columns {
                return Err(anyhow!(
                    "Column number {number} is out of range 1..={total_columns}"
                ));
            }
            Ok(number - 1)
        })
        .collect()
}

/// Lookup table from trimmed header names to 0-based positions. When a name
/// appears more than once in the header, the last occurrence wins.
#[derive(Debug)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(header: &[String]) -> Self {
        let mut positions = HashMap::with_capacity(header.len());
        for (index, name) in header.iter().enumerate() {
            positions.insert(name.trim().to_string(), index);
        }
        Self { positions }
    }

    /// Position of the trimmed `name`, or `None` for unknown or empty names.
    pub fn get(&self, name: &str) -> Option<usize> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.positions.get(trimmed).copied()
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.get(name)
            .ok_or_else(|| anyhow!("Column '{}' not found in header", name.trim()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
