//! Row-level filter compilation and evaluation.
//!
//! Translates a `--filter` expression such as
//! `age >= 18 AND stress >= 7 OR city = "Roma"` into a [`FilterNode`] tree
//! and evaluates it against split rows during streaming. `OR` binds looser
//! than `AND`: the expression is first split on case-insensitive,
//! word-bounded `OR`, and each branch on `AND`, so the example reads
//! `(age>=18 ∧ stress>=7) ∨ city="Roma"`.
//!
//! Compilation is tolerant: a condition naming an unknown column or lacking
//! an operator is dropped with a warning and the rest of the expression
//! survives. An expression with no surviving conditions compiles to `None`
//! and every row passes.
//!
//! Evaluation is a total function over rows. An out-of-range column index, a
//! value that fails numeric parsing, or an ordering operator applied to a
//! string literal all evaluate to `false` rather than failing the run;
//! structurally broken rows are handled by the column-count check upstream.

use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use thiserror::Error;

use crate::columns::HeaderIndex;

/// Comparison operators recognised between a column name and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// Exact equality (`=`).
    Eq,
    /// Inequality (`!=`).
    NotEq,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
}

/// A single `column op literal` leaf. `numeric` records how the literal was
/// classified at compile time: unquoted and parseable as a double.
#[derive(Debug, Clone)]
pub struct Condition {
    pub column: usize,
    pub operator: ComparisonOperator,
    pub literal: String,
    pub numeric: bool,
}

/// Compiled filter tree. `And`/`Or` children short-circuit left to right.
#[derive(Debug, Clone)]
pub enum FilterNode {
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Condition(Condition),
}

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("no comparison operator in '{0}'")]
    MissingOperator(String),
    #[error("column '{0}' not found in header")]
    UnknownColumn(String),
}

// Two-character operators first so `<=`/`>=` are not misread as `<`/`>`
// followed by a literal starting with `=`.
const OPERATORS: [(&str, ComparisonOperator); 6] = [
    ("<=", ComparisonOperator::Le),
    (">=", ComparisonOperator::Ge),
    ("!=", ComparisonOperator::NotEq),
    ("=", ComparisonOperator::Eq),
    ("<", ComparisonOperator::Lt),
    (">", ComparisonOperator::Gt),
];

fn or_splitter() -> &'static Regex {
    static OR_SPLIT: OnceLock<Regex> = OnceLock::new();
    OR_SPLIT.get_or_init(|| Regex::new(r"(?i)\bor\b").expect("valid OR pattern"))
}

fn and_splitter() -> &'static Regex {
    static AND_SPLIT: OnceLock<Regex> = OnceLock::new();
    AND_SPLIT.get_or_init(|| Regex::new(r"(?i)\band\b").expect("valid AND pattern"))
}

/// Compiles `expression` against the header. Returns `None` for blank
/// expressions and for expressions whose every condition was dropped.
pub fn compile(expression: &str, header: &HeaderIndex) -> Option<FilterNode> {
    let expression = expression.trim();
    if expression.is_empty() {
        return None;
    }

    let mut branches = Vec::new();
    for branch in or_splitter().split(expression) {
        let mut conditions = Vec::new();
        for fragment in and_splitter().split(branch) {
            if fragment.trim().is_empty() {
                continue;
            }
            match parse_condition(fragment, header) {
                Ok(condition) => conditions.push(FilterNode::Condition(condition)),
                Err(err) => warn!("Dropping filter condition: {err}"),
            }
        }
        match conditions.len() {
            0 => {}
            1 => branches.push(conditions.remove(0)),
            _ => branches.push(FilterNode::And(conditions)),
        }
    }

    match branches.len() {
        0 => None,
        1 => Some(branches.remove(0)),
        _ => Some(FilterNode::Or(branches)),
    }
}

fn parse_condition(fragment: &str, header: &HeaderIndex) -> Result<Condition, ConditionError> {
    for (needle, operator) in OPERATORS {
        if let Some(at) = fragment.find(needle) {
            let name = fragment[..at].trim();
            let raw = fragment[at + needle.len()..].trim();
            let column = header
                .get(name)
                .ok_or_else(|| ConditionError::UnknownColumn(name.to_string()))?;
            let quoted = is_quoted(raw);
            let literal = if quoted {
                raw[1..raw.len() - 1].to_string()
            } else {
                raw.to_string()
            };
            let numeric = !quoted && raw.parse::<f64>().is_ok();
            return Ok(Condition {
                column,
                operator,
                literal,
                numeric,
            });
        }
    }
    Err(ConditionError::MissingOperator(fragment.trim().to_string()))
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

fn unquote(value: &str) -> &str {
    if is_quoted(value) {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

impl FilterNode {
    /// Evaluates the tree against a split row.
    pub fn matches(&self, fields: &[&str]) -> bool {
        match self {
            FilterNode::And(children) => children.iter().all(|child| child.matches(fields)),
            FilterNode::Or(children) => children.iter().any(|child| child.matches(fields)),
            FilterNode::Condition(condition) => condition.matches(fields),
        }
    }
}

impl Condition {
    fn matches(&self, fields: &[&str]) -> bool {
        let Some(value) = fields.get(self.column) else {
            return false;
        };
        if self.numeric {
            let (Ok(left), Ok(right)) = (
                value.trim().parse::<f64>(),
                self.literal.parse::<f64>(),
            ) else {
                return false;
            };
            match self.operator {
                ComparisonOperator::Eq => left == right,
                ComparisonOperator::NotEq => left != right,
                ComparisonOperator::Gt => left > right,
                ComparisonOperator::Ge => left >= right,
                ComparisonOperator::Lt => left < right,
                ComparisonOperator::Le => left <= right,
            }
        } else {
            let left = unquote(value);
            match self.operator {
                ComparisonOperator::Eq => left == self.literal,
                ComparisonOperator::NotEq => left != self.literal,
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[&str]) -> HeaderIndex {
        let header: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        HeaderIndex::new(&header)
    }

    fn matches(filter: &FilterNode, row: &[&str]) -> bool {
        filter.matches(row)
    }

    #[test]
    fn compile_blank_expression_is_absent() {
        let header = index(&["a"]);
        assert!(compile("", &header).is_none());
        assert!(compile("   ", &header).is_none());
    }

    #[test]
    fn compile_single_numeric_condition() {
        let header = index(&["name", "age"]);
        let filter = compile("age >= 18", &header).expect("filter");
        assert!(matches(&filter, &["alice", "30"]));
        assert!(!matches(&filter, &["bob", "17"]));
        assert!(matches(&filter, &["edge", "18"]));
    }

    #[test]
    fn compile_two_char_operators_win_over_one_char() {
        let header = index(&["age"]);
        let FilterNode::Condition(condition) =
            compile("age <= 5", &header).expect("filter")
        else {
            panic!("expected a single condition");
        };
        assert_eq!(condition.operator, ComparisonOperator::Le);

        let FilterNode::Condition(condition) =
            compile("age != 5", &header).expect("filter")
        else {
            panic!("expected a single condition");
        };
        assert_eq!(condition.operator, ComparisonOperator::NotEq);
    }

    #[test]
    fn or_binds_looser_than_and() {
        let header = index(&["age", "stress", "city"]);
        let filter =
            compile("age >= 18 AND stress >= 7 OR city = \"X\"", &header).expect("filter");
        // (age>=18 ∧ stress>=7) ∨ city="X"
        assert!(matches(&filter, &["20", "9", "Y"]));
        assert!(matches(&filter, &["10", "1", "X"]));
        assert!(!matches(&filter, &["20", "1", "Y"]));
        assert!(!matches(&filter, &["10", "9", "Y"]));
    }

    #[test]
    fn connectives_are_case_insensitive_and_word_bounded() {
        let header = index(&["color", "brand"]);
        let filter = compile("color = \"red\" or brand = \"acme\"", &header).expect("filter");
        assert!(matches(&filter, &["red", "generic"]));
        assert!(matches(&filter, &["blue", "acme"]));
        assert!(!matches(&filter, &["blue", "generic"]));
    }

    #[test]
    fn quoted_string_equality_strips_quotes_on_both_sides() {
        let header = index(&["city"]);
        let filter = compile("city = \"Coyoacan\"", &header).expect("filter");
        assert!(matches(&filter, &["Coyoacan"]));
        assert!(matches(&filter, &["\"Coyoacan\""]));
        assert!(!matches(&filter, &["Roma"]));
    }

    #[test]
    fn quoted_number_compares_as_string() {
        let header = index(&["age"]);
        let filter = compile("age = \"30\"", &header).expect("filter");
        assert!(matches(&filter, &["30"]));
        assert!(!matches(&filter, &["30.0"]));
    }

    #[test]
    fn ordering_operator_on_string_literal_is_false() {
        let header = index(&["city"]);
        let filter = compile("city > \"Roma\"", &header).expect("filter");
        assert!(!matches(&filter, &["Zurich"]));
        assert!(!matches(&filter, &["Roma"]));
    }

    #[test]
    fn numeric_parse_failure_evaluates_false() {
        let header = index(&["age"]);
        let filter = compile("age >= 18", &header).expect("filter");
        assert!(!matches(&filter, &["not-a-number"]));
        assert!(!matches(&filter, &[""]));
    }

    #[test]
    fn out_of_range_column_evaluates_false() {
        let header = index(&["a", "b", "c"]);
        let filter = compile("c = \"x\"", &header).expect("filter");
        assert!(!matches(&filter, &["only", "two"]));
    }

    #[test]
    fn unknown_column_drops_condition_and_rest_survives() {
        let header = index(&["age"]);
        let filter = compile("nope = \"x\" OR age >= 18", &header).expect("filter");
        assert!(matches(&filter, &["20"]));
        assert!(!matches(&filter, &["10"]));
    }

    #[test]
    fn unknown_column_alone_compiles_to_absent_filter() {
        let header = index(&["age"]);
        assert!(compile("nope = \"x\"", &header).is_none());
    }

    #[test]
    fn missing_operator_drops_condition() {
        let header = index(&["age"]);
        assert!(compile("age", &header).is_none());
        let filter = compile("age OR age >= 18", &header).expect("filter");
        assert!(matches(&filter, &["19"]));
    }

    #[test]
    fn and_group_with_no_valid_leaves_vanishes_from_or() {
        let header = index(&["age"]);
        let filter = compile("nope = 1 AND other = 2 OR age >= 18", &header).expect("filter");
        assert!(matches(&filter, &["20"]));
        assert!(!matches(&filter, &["10"]));
    }

    #[test]
    fn single_child_groups_collapse() {
        let header = index(&["age"]);
        let filter = compile("age >= 18", &header).expect("filter");
        assert!(matches!(filter, FilterNode::Condition(_)));
    }

    #[test]
    fn numeric_comparison_accepts_decimal_literals() {
        let header = index(&["score"]);
        let filter = compile("score > 7.5", &header).expect("filter");
        assert!(matches(&filter, &["7.6"]));
        assert!(!matches(&filter, &["7.5"]));
    }
}
