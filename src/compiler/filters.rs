//! Filter dispatch
//!
//! Each `(type, operator)` pair maps onto one or two handle calls. Pairs
//! outside the operator table are skipped: the handle comes back
//! untouched and the outcome says so.

use tracing::debug;

use crate::filter::{
    DateOperator, Filter, FilterValue, MultiOptionOperator, NumberOperator, Operation,
    OptionOperator, TextOperator, INVALID_DATE,
};
use crate::query::QueryHandle;

/// What a single filter did to the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Applied,
    /// Unknown `(type, operator)` pair, handle unchanged
    NoOp,
}

impl FilterOutcome {
    pub fn is_applied(self) -> bool {
        self == FilterOutcome::Applied
    }
}

/// Apply one filter and report whether it matched the dispatch table.
///
/// Operands are never validated: a missing value becomes an empty
/// string, `NaN` or an invalid date and the predicate is issued anyway.
pub fn apply_filter<H: QueryHandle>(query: H, filter: &Filter) -> (H, FilterOutcome) {
    let Some(operation) = filter.operation() else {
        debug!(
            column = %filter.column_id,
            filter_type = %filter.filter_type,
            operator = %filter.operator,
            "Skipping filter with unknown operator"
        );
        return (query, FilterOutcome::NoOp);
    };

    let column = filter.column_id.as_str();
    let query = match operation {
        Operation::Text(op) => {
            let pattern = format!("%{}%", text_operand(filter, 0));
            match op {
                TextOperator::Contains => query.ilike(column, &pattern),
                TextOperator::DoesNotContain => query.not(column, "ilike", &pattern),
            }
        }
        Operation::Option(op) => match op {
            OptionOperator::Is => query.eq(column, &raw_operand(filter, 0)),
            OptionOperator::IsNot => query.neq(column, &raw_operand(filter, 0)),
            OptionOperator::IsAnyOf => query.in_(column, &filter.values),
            // values are joined as-is; a comma inside one splits it
            OptionOperator::IsNoneOf => query.not(column, "in", &literal_list(&filter.values)),
        },
        Operation::MultiOption(op) => match op {
            MultiOptionOperator::IncludeAnyOf => query.overlaps(column, &filter.values),
            MultiOptionOperator::IncludeAllOf => query.contains(column, &filter.values),
            MultiOptionOperator::ExcludeIfAnyOf => {
                query.not(column, "ov", &array_literal(&filter.values))
            }
        },
        Operation::Number(op) => {
            let value = number_operand(filter, 0);
            match op {
                NumberOperator::Is => query.eq(column, &value),
                NumberOperator::IsNot => query.neq(column, &value),
                NumberOperator::GreaterThan => query.gt(column, &value),
                NumberOperator::GreaterThanOrEqual => query.gte(column, &value),
                NumberOperator::LessThan => query.lt(column, &value),
                NumberOperator::LessThanOrEqual => query.lte(column, &value),
                // bounds are issued in the order given, reversed or not
                NumberOperator::IsBetween => query
                    .gte(column, &value)
                    .lte(column, &number_operand(filter, 1)),
            }
        }
        Operation::Date(op) => {
            let value = date_operand(filter, 0);
            match op {
                DateOperator::Is => query.eq(column, &value),
                DateOperator::IsNot => query.neq(column, &value),
                DateOperator::IsAfter => query.gt(column, &value),
                DateOperator::IsOnOrAfter => query.gte(column, &value),
                DateOperator::IsBefore => query.lt(column, &value),
                DateOperator::IsOnOrBefore => query.lte(column, &value),
            }
        }
    };

    (query, FilterOutcome::Applied)
}

/// Apply every filter in order; all of them combine by AND
pub fn apply_filters<'a, H, I>(query: H, filters: I) -> H
where
    H: QueryHandle,
    I: IntoIterator<Item = &'a Filter>,
{
    filters
        .into_iter()
        .fold(query, |query, filter| apply_filter(query, filter).0)
}

fn raw_operand(filter: &Filter, index: usize) -> FilterValue {
    filter
        .values
        .get(index)
        .cloned()
        .unwrap_or_else(|| FilterValue::String(String::new()))
}

fn text_operand(filter: &Filter, index: usize) -> String {
    filter
        .values
        .get(index)
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn number_operand(filter: &Filter, index: usize) -> FilterValue {
    let n = filter
        .values
        .get(index)
        .map(FilterValue::to_number)
        .unwrap_or(f64::NAN);
    FilterValue::Number(n)
}

fn date_operand(filter: &Filter, index: usize) -> FilterValue {
    let iso = filter
        .values
        .get(index)
        .map(FilterValue::to_iso_date)
        .unwrap_or_else(|| INVALID_DATE.to_string());
    FilterValue::String(iso)
}

fn join(values: &[FilterValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn literal_list(values: &[FilterValue]) -> String {
    format!("({})", join(values))
}

fn array_literal(values: &[FilterValue]) -> String {
    format!("{{{}}}", join(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterType;
    use crate::query::{MemoryClient, PostgrestClient, QueryClient, QueryOp};

    fn rendered(filter: Filter) -> Vec<(String, String)> {
        let query = PostgrestClient::new("http://localhost").from("clients");
        let (query, outcome) = apply_filter(query, &filter);
        assert_eq!(outcome, FilterOutcome::Applied);
        query.params().to_vec()
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_text_operators() {
        assert_eq!(
            rendered(Filter::new("name", FilterType::Text, "contains", ["Acme"])),
            vec![pair("name", "ilike.%Acme%")]
        );
        assert_eq!(
            rendered(Filter::new("name", FilterType::Text, "does not contain", ["Acme"])),
            vec![pair("name", "not.ilike.%Acme%")]
        );
    }

    #[test]
    fn test_option_operators() {
        assert_eq!(
            rendered(Filter::new("status", FilterType::Option, "is", ["active"])),
            vec![pair("status", "eq.active")]
        );
        assert_eq!(
            rendered(Filter::new("status", FilterType::Option, "is not", ["active"])),
            vec![pair("status", "neq.active")]
        );
        assert_eq!(
            rendered(Filter::new("status", FilterType::Option, "is any of", ["a", "b"])),
            vec![pair("status", "in.(a,b)")]
        );
        assert_eq!(
            rendered(Filter::new("status", FilterType::Option, "is none of", ["a", "b"])),
            vec![pair("status", "not.in.(a,b)")]
        );
    }

    #[test]
    fn test_every_legal_pair_renders() {
        const DAY: &str = "2024-03-01T00:00:00.000Z";
        let text = |v: &str| vec![FilterValue::from(v)];
        let list = |v: &[&str]| v.iter().map(|s| FilterValue::from(*s)).collect::<Vec<_>>();
        let number = |v: &[f64]| v.iter().map(|n| FilterValue::Number(*n)).collect::<Vec<_>>();

        let cases: Vec<(FilterType, &str, &str, Vec<FilterValue>, Vec<&str>)> = vec![
            (FilterType::Text, "contains", "name", text("Acme"), vec!["ilike.%Acme%"]),
            (FilterType::Text, "does not contain", "name", text("Acme"), vec!["not.ilike.%Acme%"]),
            (FilterType::Option, "is", "status", text("active"), vec!["eq.active"]),
            (FilterType::Option, "is not", "status", text("active"), vec!["neq.active"]),
            (FilterType::Option, "is any of", "status", list(&["a", "b"]), vec!["in.(a,b)"]),
            (FilterType::Option, "is none of", "status", list(&["a", "b"]), vec!["not.in.(a,b)"]),
            (FilterType::MultiOption, "include any of", "tags", list(&["x", "y"]), vec!["ov.{x,y}"]),
            (FilterType::MultiOption, "include all of", "tags", list(&["x", "y"]), vec!["cs.{x,y}"]),
            (FilterType::MultiOption, "exclude if any of", "tags", list(&["x"]), vec!["not.ov.{x}"]),
            (FilterType::Number, "is", "revenue", number(&[42.0]), vec!["eq.42"]),
            (FilterType::Number, "is not", "revenue", number(&[42.0]), vec!["neq.42"]),
            (FilterType::Number, "is greater than", "revenue", number(&[42.0]), vec!["gt.42"]),
            (FilterType::Number, "is greater than or equal to", "revenue", number(&[42.0]), vec!["gte.42"]),
            (FilterType::Number, "is less than", "revenue", number(&[7.5]), vec!["lt.7.5"]),
            (FilterType::Number, "is less than or equal to", "revenue", number(&[7.5]), vec!["lte.7.5"]),
            (FilterType::Number, "is between", "revenue", number(&[10.0, 20.0]), vec!["gte.10", "lte.20"]),
            (FilterType::Date, "is", "created_at", text("2024-03-01"), vec!["eq."]),
            (FilterType::Date, "is not", "created_at", text("2024-03-01"), vec!["neq."]),
            (FilterType::Date, "is after", "created_at", text("2024-03-01"), vec!["gt."]),
            (FilterType::Date, "is on or after", "created_at", text("2024-03-01"), vec!["gte."]),
            (FilterType::Date, "is before", "created_at", text("2024-03-01"), vec!["lt."]),
            (FilterType::Date, "is on or before", "created_at", text("2024-03-01"), vec!["lte."]),
        ];

        let legal: usize = [
            FilterType::Text,
            FilterType::Option,
            FilterType::MultiOption,
            FilterType::Number,
            FilterType::Date,
        ]
        .iter()
        .map(|t| t.operators().len())
        .sum();
        assert_eq!(cases.len(), legal);

        for (filter_type, operator, column, values, expected) in cases {
            assert!(filter_type.operators().contains(&operator), "{} {}", filter_type, operator);
            let expected: Vec<_> = expected
                .into_iter()
                .map(|value| match filter_type {
                    FilterType::Date => pair(column, &format!("{}{}", value, DAY)),
                    _ => pair(column, value),
                })
                .collect();
            assert_eq!(
                rendered(Filter::new(column, filter_type, operator, values)),
                expected,
                "{} {}",
                filter_type,
                operator
            );
        }
    }

    #[test]
    fn test_none_of_does_not_escape_commas() {
        assert_eq!(
            rendered(Filter::new("type", FilterType::Option, "is none of", ["llc", "s,corp"])),
            vec![pair("type", "not.in.(llc,s,corp)")]
        );
    }

    #[test]
    fn test_multi_option_operators() {
        assert_eq!(
            rendered(Filter::new("tags", FilterType::MultiOption, "include any of", ["a", "b"])),
            vec![pair("tags", "ov.{a,b}")]
        );
        assert_eq!(
            rendered(Filter::new("tags", FilterType::MultiOption, "include all of", ["a", "b"])),
            vec![pair("tags", "cs.{a,b}")]
        );
        assert_eq!(
            rendered(Filter::new("tags", FilterType::MultiOption, "exclude if any of", ["a"])),
            vec![pair("tags", "not.ov.{a}")]
        );
    }

    #[test]
    fn test_number_operators_parse_operand() {
        assert_eq!(
            rendered(Filter::new("revenue", FilterType::Number, "is greater than", ["42"])),
            vec![pair("revenue", "gt.42")]
        );
        assert_eq!(
            rendered(Filter::new("revenue", FilterType::Number, "is less than or equal to", [7.5])),
            vec![pair("revenue", "lte.7.5")]
        );
        assert_eq!(
            rendered(Filter::new("revenue", FilterType::Number, "is", ["lots"])),
            vec![pair("revenue", "eq.NaN")]
        );
    }

    #[test]
    fn test_between_keeps_bound_order() {
        assert_eq!(
            rendered(Filter::new("revenue", FilterType::Number, "is between", [10, 20])),
            vec![pair("revenue", "gte.10"), pair("revenue", "lte.20")]
        );
        assert_eq!(
            rendered(Filter::new("revenue", FilterType::Number, "is between", [20, 10])),
            vec![pair("revenue", "gte.20"), pair("revenue", "lte.10")]
        );
    }

    #[test]
    fn test_date_operators_use_iso_form() {
        assert_eq!(
            rendered(Filter::new("created_at", FilterType::Date, "is on or after", ["2024-03-01"])),
            vec![pair("created_at", "gte.2024-03-01T00:00:00.000Z")]
        );
        assert_eq!(
            rendered(Filter::new("created_at", FilterType::Date, "is before", ["someday"])),
            vec![pair("created_at", "lt.Invalid Date")]
        );
    }

    #[test]
    fn test_missing_values_degrade() {
        assert_eq!(
            rendered(Filter::new("name", FilterType::Text, "contains", Vec::<String>::new())),
            vec![pair("name", "ilike.%%")]
        );
        assert_eq!(
            rendered(Filter::new("revenue", FilterType::Number, "is between", [5])),
            vec![pair("revenue", "gte.5"), pair("revenue", "lte.NaN")]
        );
        assert_eq!(
            rendered(Filter::new("created_at", FilterType::Date, "is", Vec::<String>::new())),
            vec![pair("created_at", "eq.Invalid Date")]
        );
    }

    #[test]
    fn test_unknown_pair_is_noop() {
        let query = MemoryClient::new().from("clients");
        let filter = Filter::new("name", FilterType::Text, "fuzzy-match", ["acme"]);
        let (query, outcome) = apply_filter(query, &filter);
        assert_eq!(outcome, FilterOutcome::NoOp);
        assert!(!outcome.is_applied());
        assert!(query.ops().is_empty());

        // operator valid for another type
        let filter = Filter::new("name", FilterType::Text, "is between", [1, 2]);
        assert_eq!(apply_filter(MemoryClient::new().from("clients"), &filter).1, FilterOutcome::NoOp);
    }

    #[test]
    fn test_same_column_filters_narrow_independently() {
        let filters = vec![
            Filter::new("revenue", FilterType::Number, "is greater than", [10]),
            Filter::new("revenue", FilterType::Number, "is less than", [50]),
        ];
        let query = apply_filters(MemoryClient::new().from("clients"), &filters);
        assert_eq!(
            query.ops(),
            &[
                QueryOp::Gt {
                    column: "revenue".into(),
                    value: FilterValue::Number(10.0)
                },
                QueryOp::Lt {
                    column: "revenue".into(),
                    value: FilterValue::Number(50.0)
                },
            ]
        );
    }
}
