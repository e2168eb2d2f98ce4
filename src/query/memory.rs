//! In-memory backend
//!
//! [`MemoryQuery`] records each handle call as a [`QueryOp`] and only
//! interprets the log when [`MemoryQuery::execute`] runs, so tests can
//! inspect exactly what the compiler asked for and what it would return.

use std::cmp::Ordering;
use std::sync::Arc;

use ahash::AHashMap;
use serde_json::Value as JsonValue;
use smallvec::SmallVec;

use crate::error::{FilterQueryError, Result};
use crate::filter::FilterValue;
use crate::query::expr::{cell, compare_cells, CompareOp, Predicate};
use crate::query::{CountMode, QueryClient, QueryHandle, RowRange};

/// One table row
pub type Row = serde_json::Map<String, JsonValue>;

/// A set of named in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    tables: AHashMap<String, Arc<Vec<Row>>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table; non-object rows are skipped
    pub fn with_table<I>(mut self, name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = JsonValue>,
    {
        let rows: Vec<Row> = rows
            .into_iter()
            .filter_map(|row| match row {
                JsonValue::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.tables.insert(name.into(), Arc::new(rows));
        self
    }
}

impl QueryClient for MemoryClient {
    type Handle = MemoryQuery;

    fn from(&self, table: &str) -> MemoryQuery {
        MemoryQuery {
            table: table.to_string(),
            rows: self.tables.get(table).cloned(),
            ops: Vec::new(),
        }
    }
}

/// A recorded handle call
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    Schema(String),
    Select {
        projection: String,
        count: Option<CountMode>,
    },
    Eq {
        column: String,
        value: FilterValue,
    },
    Neq {
        column: String,
        value: FilterValue,
    },
    In {
        column: String,
        values: Vec<FilterValue>,
    },
    Not {
        column: String,
        operator: String,
        value: String,
    },
    Ilike {
        column: String,
        pattern: String,
    },
    Overlaps {
        column: String,
        values: Vec<FilterValue>,
    },
    Contains {
        column: String,
        values: Vec<FilterValue>,
    },
    Gt {
        column: String,
        value: FilterValue,
    },
    Gte {
        column: String,
        value: FilterValue,
    },
    Lt {
        column: String,
        value: FilterValue,
    },
    Lte {
        column: String,
        value: FilterValue,
    },
    Or(String),
    Order {
        column: String,
        ascending: bool,
    },
    Range {
        from: i64,
        to: i64,
    },
}

impl QueryOp {
    /// Whether this call narrows the row set
    pub fn is_predicate(&self) -> bool {
        !matches!(
            self,
            QueryOp::Schema(_) | QueryOp::Select { .. } | QueryOp::Order { .. } | QueryOp::Range { .. }
        )
    }

    fn to_predicate(&self) -> Result<Option<Predicate>> {
        fn compare(column: &str, op: CompareOp, value: &FilterValue) -> Result<Option<Predicate>> {
            Ok(Some(Predicate::compare(column, op, value)))
        }

        match self {
            QueryOp::Eq { column, value } => compare(column, CompareOp::Eq, value),
            QueryOp::Neq { column, value } => compare(column, CompareOp::Neq, value),
            QueryOp::Gt { column, value } => compare(column, CompareOp::Gt, value),
            QueryOp::Gte { column, value } => compare(column, CompareOp::Gte, value),
            QueryOp::Lt { column, value } => compare(column, CompareOp::Lt, value),
            QueryOp::Lte { column, value } => compare(column, CompareOp::Lte, value),
            QueryOp::In { column, values } => Ok(Some(Predicate::In {
                column: column.clone(),
                values: values.clone(),
            })),
            QueryOp::Overlaps { column, values } => Ok(Some(Predicate::Overlaps {
                column: column.clone(),
                values: values.clone(),
            })),
            QueryOp::Contains { column, values } => Ok(Some(Predicate::Contains {
                column: column.clone(),
                values: values.clone(),
            })),
            QueryOp::Ilike { column, pattern } => Predicate::like(column, pattern).map(Some),
            QueryOp::Not {
                column,
                operator,
                value,
            } => Predicate::parse(column, operator, value)
                .map(|inner| Some(Predicate::Not(Box::new(inner)))),
            QueryOp::Or(expression) => Predicate::parse_or(expression).map(Some),
            QueryOp::Schema(_)
            | QueryOp::Select { .. }
            | QueryOp::Order { .. }
            | QueryOp::Range { .. } => Ok(None),
        }
    }
}

/// Rows returned by [`MemoryQuery::execute`]
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<JsonValue>,
    /// Matching rows before the range was applied, when a count was requested
    pub count: Option<usize>,
}

/// Recorded query over one in-memory table
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    table: String,
    rows: Option<Arc<Vec<Row>>>,
    ops: Vec<QueryOp>,
}

impl MemoryQuery {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Every recorded call, in order
    pub fn ops(&self) -> &[QueryOp] {
        &self.ops
    }

    /// Only the row-narrowing calls
    pub fn predicate_ops(&self) -> Vec<&QueryOp> {
        self.ops.iter().filter(|op| op.is_predicate()).collect()
    }

    fn push(mut self, op: QueryOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Interpret the recorded calls over the table's rows
    pub fn execute(&self) -> Result<QueryResult> {
        let rows = self
            .rows
            .as_ref()
            .ok_or_else(|| FilterQueryError::UnknownTable(self.table.clone()))?;

        let mut predicates = Vec::new();
        let mut projection = "*";
        let mut count_mode = None;
        let mut ordering: SmallVec<[(&str, bool); 2]> = SmallVec::new();
        let mut range = None;

        for op in &self.ops {
            match op {
                QueryOp::Select { projection: p, count } => {
                    projection = p.as_str();
                    count_mode = *count;
                }
                QueryOp::Order { column, ascending } => ordering.push((column.as_str(), *ascending)),
                QueryOp::Range { from, to } => range = Some(RowRange { from: *from, to: *to }),
                other => {
                    if let Some(predicate) = other.to_predicate()? {
                        predicates.push(predicate);
                    }
                }
            }
        }

        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| {
                predicates
                    .iter()
                    .all(|predicate| predicate.evaluate(row) == Some(true))
            })
            .collect();
        let count = count_mode.map(|_| matched.len());

        let items = parse_projection(projection);
        if items.iter().any(|item| matches!(item, Projection::Aggregate { .. })) {
            return Ok(QueryResult {
                rows: vec![aggregate_row(&items, &matched)],
                count,
            });
        }

        if !ordering.is_empty() {
            matched.sort_by(|a, b| compare_rows(a, b, &ordering));
        }

        let window: Vec<&Row> = match range {
            Some(range) => {
                let skip = usize::try_from(range.from).unwrap_or(0);
                matched.into_iter().skip(skip).take(range.len()).collect()
            }
            None => matched,
        };

        Ok(QueryResult {
            rows: window.into_iter().map(|row| project_row(&items, row)).collect(),
            count,
        })
    }
}

impl QueryHandle for MemoryQuery {
    fn schema(self, schema: &str) -> Self {
        self.push(QueryOp::Schema(schema.to_string()))
    }

    fn select(self, projection: &str, count: Option<CountMode>) -> Self {
        self.push(QueryOp::Select {
            projection: projection.to_string(),
            count,
        })
    }

    fn eq(self, column: &str, value: &FilterValue) -> Self {
        self.push(QueryOp::Eq {
            column: column.to_string(),
            value: value.clone(),
        })
    }

    fn neq(self, column: &str, value: &FilterValue) -> Self {
        self.push(QueryOp::Neq {
            column: column.to_string(),
            value: value.clone(),
        })
    }

    fn in_(self, column: &str, values: &[FilterValue]) -> Self {
        self.push(QueryOp::In {
            column: column.to_string(),
            values: values.to_vec(),
        })
    }

    fn not(self, column: &str, operator: &str, value: &str) -> Self {
        self.push(QueryOp::Not {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
        })
    }

    fn ilike(self, column: &str, pattern: &str) -> Self {
        self.push(QueryOp::Ilike {
            column: column.to_string(),
            pattern: pattern.to_string(),
        })
    }

    fn overlaps(self, column: &str, values: &[FilterValue]) -> Self {
        self.push(QueryOp::Overlaps {
            column: column.to_string(),
            values: values.to_vec(),
        })
    }

    fn contains(self, column: &str, values: &[FilterValue]) -> Self {
        self.push(QueryOp::Contains {
            column: column.to_string(),
            values: values.to_vec(),
        })
    }

    fn gt(self, column: &str, value: &FilterValue) -> Self {
        self.push(QueryOp::Gt {
            column: column.to_string(),
            value: value.clone(),
        })
    }

    fn gte(self, column: &str, value: &FilterValue) -> Self {
        self.push(QueryOp::Gte {
            column: column.to_string(),
            value: value.clone(),
        })
    }

    fn lt(self, column: &str, value: &FilterValue) -> Self {
        self.push(QueryOp::Lt {
            column: column.to_string(),
            value: value.clone(),
        })
    }

    fn lte(self, column: &str, value: &FilterValue) -> Self {
        self.push(QueryOp::Lte {
            column: column.to_string(),
            value: value.clone(),
        })
    }

    fn or(self, filters: &str) -> Self {
        self.push(QueryOp::Or(filters.to_string()))
    }

    fn order(self, column: &str, ascending: bool) -> Self {
        self.push(QueryOp::Order {
            column: column.to_string(),
            ascending,
        })
    }

    fn range(self, from: i64, to: i64) -> Self {
        self.push(QueryOp::Range { from, to })
    }
}

/// Nulls sort last ascending and first descending
fn compare_rows(a: &Row, b: &Row, ordering: &[(&str, bool)]) -> Ordering {
    for (column, ascending) in ordering {
        let ord = match (cell(a, column), cell(b, column)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(l), Some(r)) => compare_cells(l, r),
        };
        let ord = if *ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[derive(Debug, Clone, PartialEq)]
enum Projection<'a> {
    All,
    Column { alias: &'a str, column: &'a str },
    Embed { alias: &'a str },
    Aggregate { alias: &'a str, column: &'a str, function: &'a str },
}

fn parse_projection(projection: &str) -> Vec<Projection<'_>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in projection.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(parse_projection_item(&projection[start..idx]));
                start = idx + 1;
            }
            _ => {}
        }
    }
    items.push(parse_projection_item(&projection[start..]));
    items.into_iter().flatten().collect()
}

fn parse_projection_item(item: &str) -> Option<Projection<'_>> {
    let item = item.trim();
    if item.is_empty() {
        return None;
    }
    if item == "*" {
        return Some(Projection::All);
    }

    let (alias, body) = match item.split_once(':') {
        Some((alias, body)) => (Some(alias.trim()), body.trim()),
        None => (None, item),
    };

    // `column.min()` style aggregates
    if let Some((column, function)) = body
        .strip_suffix("()")
        .and_then(|call| call.rsplit_once('.'))
    {
        return Some(Projection::Aggregate {
            alias: alias.unwrap_or(function),
            column,
            function,
        });
    }

    // `table(...)` embeds
    if let Some((table, _)) = body.split_once('(') {
        return Some(Projection::Embed {
            alias: alias.unwrap_or(table),
        });
    }

    Some(Projection::Column {
        alias: alias.unwrap_or(body),
        column: body,
    })
}

fn project_row(items: &[Projection<'_>], row: &Row) -> JsonValue {
    let mut out = Row::new();
    for item in items {
        match item {
            Projection::All => {
                for (key, value) in row {
                    out.insert(key.clone(), value.clone());
                }
            }
            Projection::Column { alias, column } => {
                let value = row.get(*column).cloned().unwrap_or(JsonValue::Null);
                out.insert(alias.to_string(), value);
            }
            Projection::Embed { alias } => {
                let value = row.get(*alias).cloned().unwrap_or(JsonValue::Null);
                out.insert(alias.to_string(), value);
            }
            Projection::Aggregate { .. } => {}
        }
    }
    JsonValue::Object(out)
}

fn aggregate_row(items: &[Projection<'_>], rows: &[&Row]) -> JsonValue {
    let mut out = Row::new();
    for item in items {
        if let Projection::Aggregate {
            alias,
            column,
            function,
        } = item
        {
            let cells = rows.iter().filter_map(|row| cell(row, column));
            let value = match *function {
                "min" => cells.min_by(|a, b| compare_cells(a, b)).cloned(),
                "max" => cells.max_by(|a, b| compare_cells(a, b)).cloned(),
                "count" => Some(JsonValue::from(cells.count())),
                _ => None,
            };
            out.insert(alias.to_string(), value.unwrap_or(JsonValue::Null));
        }
    }
    JsonValue::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> MemoryClient {
        MemoryClient::new().with_table(
            "clients",
            vec![
                json!({"id": 1, "name": "Acme", "revenue": 30, "tags": ["vip"], "owner": {"name": "Ana"}}),
                json!({"id": 2, "name": "Globex", "revenue": 10, "tags": ["new"], "owner": null}),
                json!({"id": 3, "name": "Initech", "revenue": null, "tags": [], "owner": null}),
                json!({"id": 4, "name": "Umbrella", "revenue": 20, "tags": ["vip", "new"], "owner": null}),
            ],
        )
    }

    fn ids(result: &QueryResult) -> Vec<i64> {
        result
            .rows
            .iter()
            .filter_map(|row| row.get("id").and_then(JsonValue::as_i64))
            .collect()
    }

    #[test]
    fn test_records_ops_in_order() {
        let query = client()
            .from("clients")
            .select("*", None)
            .eq("name", &FilterValue::from("Acme"))
            .order("id", true);
        assert_eq!(query.ops().len(), 3);
        assert_eq!(query.predicate_ops().len(), 1);
        assert_eq!(
            query.ops()[1],
            QueryOp::Eq {
                column: "name".into(),
                value: FilterValue::from("Acme")
            }
        );
    }

    #[test]
    fn test_unknown_table_errors() {
        let err = client().from("nope").execute().unwrap_err();
        assert!(matches!(err, FilterQueryError::UnknownTable(name) if name == "nope"));
    }

    #[test]
    fn test_filters_sort_and_range() {
        let result = client()
            .from("clients")
            .select("*", Some(CountMode::Exact))
            .gte("revenue", &FilterValue::from(10))
            .order("revenue", false)
            .range(0, 1)
            .execute()
            .unwrap();
        assert_eq!(ids(&result), vec![1, 4]);
        assert_eq!(result.count, Some(3));
    }

    #[test]
    fn test_nulls_sort_last_ascending() {
        let result = client()
            .from("clients")
            .select("id", None)
            .order("revenue", true)
            .execute()
            .unwrap();
        assert_eq!(ids(&result), vec![2, 4, 1, 3]);
        assert_eq!(result.count, None);
    }

    #[test]
    fn test_projection_and_embed() {
        let result = client()
            .from("clients")
            .select("id, label:name, owner:team_members(*)", None)
            .eq("id", &FilterValue::from(1))
            .execute()
            .unwrap();
        assert_eq!(
            result.rows,
            vec![json!({"id": 1, "label": "Acme", "owner": {"name": "Ana"}})]
        );
    }

    #[test]
    fn test_min_max_aggregate() {
        let result = client()
            .from("clients")
            .select("min:revenue.min(),max:revenue.max()", None)
            .execute()
            .unwrap();
        assert_eq!(result.rows, vec![json!({"min": 10, "max": 30})]);
    }

    #[test]
    fn test_array_and_not_filters() {
        let vip = [FilterValue::from("vip")];
        let result = client()
            .from("clients")
            .overlaps("tags", &vip)
            .not("name", "ilike", "%umb%")
            .execute()
            .unwrap();
        assert_eq!(ids(&result), vec![1]);
    }

    #[test]
    fn test_malformed_or_surfaces_on_execute() {
        let query = client().from("clients").or("broken,name.ilike.%a%");
        assert!(matches!(
            query.execute(),
            Err(FilterQueryError::MalformedExpression(_))
        ));
    }

    #[test]
    fn test_empty_window() {
        let result = client().from("clients").range(0, -1).execute().unwrap();
        assert!(result.rows.is_empty());
    }
}
