//! The compiled, immutable per-run processing plan.
//!
//! A [`ProcessingContext`] is built once from the header line, the column
//! selection spec, and the filter expression, then shared by reference with
//! every worker. It owns the single row transformation all engines apply:
//! split on the separator, validate the column count, evaluate the filter,
//! project the selected columns. Engines differ only in how they schedule
//! that transformation and merge its results.

use anyhow::{Context as _, Result};

use crate::{
    columns::{self, HeaderIndex},
    filter::{self, FilterNode},
    rows,
};

#[derive(Debug)]
pub struct ProcessingContext {
    pub header: Vec<String>,
    pub total_columns: usize,
    pub selected: Vec<usize>,
    pub filter: Option<FilterNode>,
    pub separator: char,
}

/// Outcome of transforming one data line.
#[derive(Debug, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row passed validation and the filter; payload is the projected line.
    Row(String),
    /// The row failed the filter. Not an error.
    Filtered,
    /// The row's column count differs from the header's; payload is the count
    /// found.
    BadColumns(usize),
}

/// Per-run row accounting. Valid and error counts only grow; filtered-out
/// rows are counted by neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    pub valid_lines: u64,
    pub error_lines: u64,
}

impl RowStats {
    pub fn absorb(&mut self, other: RowStats) {
        self.valid_lines += other.valid_lines;
        self.error_lines += other.error_lines;
    }
}

impl ProcessingContext {
    pub fn build(
        header_line: &str,
        columns_spec: &str,
        filter_expression: Option<&str>,
        separator: char,
    ) -> Result<Self> {
        let header: Vec<String> = rows::split_row(header_line, separator)
            .into_iter()
            .map(str::to_string)
            .collect();
        let total_columns = header.len();
        let selected = columns::parse_selection(columns_spec, total_columns)
            .with_context(|| format!("Parsing column selection '{columns_spec}'"))?;
        let index = HeaderIndex::new(&header);
        let filter = filter_expression.and_then(|expression| filter::compile(expression, &index));
        Ok(Self {
            header,
            total_columns,
            selected,
            filter,
            separator,
        })
    }

    /// The output header line: selected column names in selection order.
    pub fn projected_header(&self) -> String {
        let fields: Vec<&str> = self.header.iter().map(String::as_str).collect();
        rows::project(&fields, &self.selected, self.separator)
    }

    /// Applies validation, filter, and projection to one data line.
    pub fn transform(&self, line: &str) -> RowOutcome {
        let fields = rows::split_row(line, self.separator);
        if fields.len() != self.total_columns {
            return RowOutcome::BadColumns(fields.len());
        }
        if let Some(filter) = &self.filter
            && !filter.matches(&fields)
        {
            return RowOutcome::Filtered;
        }
        RowOutcome::Row(rows::project(&fields, &self.selected, self.separator))
    }
}
