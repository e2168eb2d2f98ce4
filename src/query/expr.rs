//! Row predicates for the in-memory backend
//!
//! Evaluation is three-valued like SQL: a null or missing cell makes a
//! predicate unknown, and unknown rows are filtered out even under `not`.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::{FilterQueryError, Result};
use crate::filter::{parse_timestamp, FilterValue};
use crate::query::memory::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn parse(operator: &str) -> Option<Self> {
        match operator {
            "eq" => Some(CompareOp::Eq),
            "neq" => Some(CompareOp::Neq),
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Gte),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Neq => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: FilterValue,
    },
    In {
        column: String,
        values: Vec<FilterValue>,
    },
    Like {
        column: String,
        pattern: Regex,
    },
    Overlaps {
        column: String,
        values: Vec<FilterValue>,
    },
    Contains {
        column: String,
        values: Vec<FilterValue>,
    },
    IsNull {
        column: String,
    },
    Not(Box<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub(crate) fn compare(column: &str, op: CompareOp, value: &FilterValue) -> Self {
        Predicate::Compare {
            column: column.to_string(),
            op,
            value: value.clone(),
        }
    }

    pub(crate) fn like(column: &str, pattern: &str) -> Result<Self> {
        Ok(Predicate::Like {
            column: column.to_string(),
            pattern: like_regex(pattern)?,
        })
    }

    /// Build a predicate from raw `operator` and `value` text, the way the
    /// REST backend reads `column=operator.value`
    pub(crate) fn parse(column: &str, operator: &str, value: &str) -> Result<Self> {
        if let Some(op) = CompareOp::parse(operator) {
            return Ok(Predicate::compare(column, op, &FilterValue::from(value)));
        }

        let column = column.to_string();
        let predicate = match operator {
            "like" | "ilike" => Predicate::Like {
                pattern: like_regex(value)?,
                column,
            },
            "in" => Predicate::In {
                values: parse_list(value, '(', ')')?,
                column,
            },
            "ov" => Predicate::Overlaps {
                values: parse_list(value, '{', '}')?,
                column,
            },
            "cs" => Predicate::Contains {
                values: parse_list(value, '{', '}')?,
                column,
            },
            "is" => match value {
                "null" => Predicate::IsNull { column },
                "true" | "false" => Predicate::Compare {
                    column,
                    op: CompareOp::Eq,
                    value: FilterValue::Boolean(value == "true"),
                },
                _ => return Err(malformed(format!("is.{}", value))),
            },
            "not" => {
                let (inner_op, inner_value) = value
                    .split_once('.')
                    .ok_or_else(|| malformed(format!("not.{}", value)))?;
                Predicate::Not(Box::new(Predicate::parse(&column, inner_op, inner_value)?))
            }
            other => return Err(malformed(format!("{}.{}", other, value))),
        };
        Ok(predicate)
    }

    /// Parse a comma-separated list of `column.operator.value` filters into
    /// their disjunction
    pub(crate) fn parse_or(expression: &str) -> Result<Self> {
        let mut branches = Vec::new();
        for segment in split_segments(expression) {
            let mut parts = segment.splitn(3, '.');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(column), Some(operator), Some(value)) if !column.is_empty() => {
                    branches.push(Predicate::parse(column, operator, value)?);
                }
                _ => {
                    warn!(segment = %segment, "Unparsable logic tree segment");
                    return Err(malformed(expression.to_string()));
                }
            }
        }
        Ok(Predicate::Or(branches))
    }

    /// `Some(true)` keeps the row, `Some(false)` and `None` drop it
    pub(crate) fn evaluate(&self, row: &Row) -> Option<bool> {
        match self {
            Predicate::IsNull { column } => Some(cell(row, column).is_none()),
            Predicate::Not(inner) => inner.evaluate(row).map(|matched| !matched),
            Predicate::Or(branches) => {
                let mut unknown = false;
                for branch in branches {
                    match branch.evaluate(row) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
            Predicate::Compare { column, op, value } => {
                let cell = cell(row, column)?;
                Some(compare_literal(cell, value).is_some_and(|ord| op.holds(ord)))
            }
            Predicate::In { column, values } => {
                let cell = cell(row, column)?;
                Some(values.iter().any(|v| literal_equals(cell, v)))
            }
            Predicate::Like { column, pattern } => {
                let cell = cell(row, column)?;
                Some(match cell {
                    JsonValue::String(s) => pattern.is_match(s),
                    JsonValue::Number(n) => pattern.is_match(&n.to_string()),
                    _ => false,
                })
            }
            Predicate::Overlaps { column, values } => {
                let items = cell(row, column)?.as_array()?;
                Some(
                    items
                        .iter()
                        .any(|item| values.iter().any(|v| literal_equals(item, v))),
                )
            }
            Predicate::Contains { column, values } => {
                let items = cell(row, column)?.as_array()?;
                Some(
                    values
                        .iter()
                        .all(|v| items.iter().any(|item| literal_equals(item, v))),
                )
            }
        }
    }
}

fn malformed(expression: String) -> FilterQueryError {
    FilterQueryError::MalformedExpression(expression)
}

/// Non-null cell of a row
pub(crate) fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a JsonValue> {
    row.get(column).filter(|value| !value.is_null())
}

/// Translate a LIKE pattern: `%` and `*` match any run, `_` one character,
/// a backslash escapes the next character
fn like_regex(pattern: &str) -> Result<Regex> {
    let mut source = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' | '*' => source.push_str(".*"),
            '_' => source.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    source.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|_| malformed(pattern.to_string()))
}

/// Parse `(a,b)` or `{a,b}`; double-quoted items may contain delimiters
fn parse_list(raw: &str, open: char, close: char) -> Result<Vec<FilterValue>> {
    let inner = raw
        .strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .ok_or_else(|| malformed(raw.to_string()))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(split_top_level(inner)
        .into_iter()
        .map(|item| {
            let item = item.trim();
            let item = item
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(item);
            FilterValue::from(item)
        })
        .collect())
}

/// Operators that may open a logic tree segment
const SEGMENT_OPERATORS: &[&str] = &[
    "eq", "neq", "gt", "gte", "lt", "lte", "like", "ilike", "in", "ov", "cs", "is", "not",
];

/// Whether `text` opens with `column.operator.`, optionally negated as
/// `column.not.operator.`
fn starts_segment(text: &str) -> bool {
    let Some((column, rest)) = text.split_once('.') else {
        return false;
    };
    if column.is_empty() || !column.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return false;
    }
    let rest = rest.strip_prefix("not.").unwrap_or(rest);
    rest.split_once('.')
        .is_some_and(|(operator, _)| SEGMENT_OPERATORS.contains(&operator))
}

/// Split an `or` expression into its segments.
///
/// Values are interpolated unquoted, so brackets and commas inside them
/// carry no structure; a comma only separates segments when the text after
/// it opens a new one.
fn split_segments(expression: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (idx, c) in expression.char_indices() {
        if c == ',' && starts_segment(&expression[idx + 1..]) {
            segments.push(&expression[start..idx]);
            start = idx + 1;
        }
    }
    segments.push(&expression[start..]);
    segments
}

/// Split on commas that are not nested in brackets or quotes
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '(' | '{' if !quoted => depth += 1,
            ')' | '}' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn literal_equals(cell: &JsonValue, literal: &FilterValue) -> bool {
    compare_literal(cell, literal) == Some(Ordering::Equal)
}

/// Order a cell against a literal. `None` when the two cannot be compared:
/// `NaN`, mismatched kinds, or a timestamp against a non-timestamp.
pub(crate) fn compare_literal(cell: &JsonValue, literal: &FilterValue) -> Option<Ordering> {
    match cell {
        JsonValue::Number(n) => n.as_f64()?.partial_cmp(&literal.to_number()),
        JsonValue::String(s) => match literal {
            FilterValue::String(l) => compare_text(s, l),
            FilterValue::Number(l) => s.trim().parse::<f64>().ok()?.partial_cmp(l),
            FilterValue::Boolean(l) => s.parse::<bool>().ok().map(|b| b.cmp(l)),
        },
        JsonValue::Bool(b) => match literal {
            FilterValue::Boolean(l) => Some(b.cmp(l)),
            FilterValue::String(l) => l.parse::<bool>().ok().map(|l| b.cmp(&l)),
            FilterValue::Number(_) => None,
        },
        _ => None,
    }
}

/// Timestamps compare chronologically, other text lexicographically
fn compare_text(left: &str, right: &str) -> Option<Ordering> {
    match (parse_timestamp(left), parse_timestamp(right)) {
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        (None, None) => Some(left.cmp(right)),
        _ => None,
    }
}

/// Total order between two non-null cells, used for sorting and min/max
pub(crate) fn compare_cells(left: &JsonValue, right: &JsonValue) -> Ordering {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => {
            let l = l.as_f64().unwrap_or(f64::NAN);
            let r = r.as_f64().unwrap_or(f64::NAN);
            l.total_cmp(&r)
        }
        (JsonValue::String(l), JsonValue::String(r)) => {
            compare_text(l, r).unwrap_or_else(|| l.cmp(r))
        }
        (JsonValue::Bool(l), JsonValue::Bool(r)) => l.cmp(r),
        _ => kind_rank(left).cmp(&kind_rank(right)),
    }
}

fn kind_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}
