//! PostgREST request builder
//!
//! Renders handle calls into the query parameters and headers of a
//! PostgREST (Supabase REST) request. Parameters are kept unencoded in
//! insertion order; the HTTP client that sends the request encodes them.

use std::fmt;

use serde_json::{json, Map, Value as JsonValue};

use crate::filter::FilterValue;
use crate::query::{CountMode, QueryClient, QueryHandle};

const REST_PATH: &str = "/rest/v1";

/// Values containing these must be quoted inside `in.(...)` lists
const RESERVED_CHARS: [char; 3] = [',', '(', ')'];

/// Builds requests against one PostgREST endpoint
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
}

impl PostgrestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl QueryClient for PostgrestClient {
    type Handle = PostgrestQuery;

    fn from(&self, table: &str) -> PostgrestQuery {
        PostgrestQuery {
            url: format!("{}{}/{}", self.base_url, REST_PATH, table),
            params: Vec::new(),
            headers: Vec::new(),
        }
    }
}

/// Request shape of a PostgREST read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgrestQuery {
    url: String,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl PostgrestQuery {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a query parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a query parameter, in order
    pub fn param_values(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `key=value` pairs joined with `&`, unencoded
    pub fn query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full request shape: method, URL with query string and headers.
    ///
    /// `Display` only renders the URL; schema and count mode travel in
    /// headers, so anything handing the request to a client needs this.
    pub fn to_request_json(&self) -> JsonValue {
        let headers: Map<String, JsonValue> = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), JsonValue::String(value.clone())))
            .collect();
        json!({
            "method": "GET",
            "url": self.to_string(),
            "headers": headers,
        })
    }

    fn append(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    fn set(mut self, key: &str, value: String) -> Self {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.params.push((key.to_string(), value)),
        }
        self
    }

    fn set_header(mut self, name: &str, value: String) -> Self {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value,
            None => self.headers.push((name.to_string(), value)),
        }
        self
    }

    fn filter(self, column: &str, operator: &str, value: impl fmt::Display) -> Self {
        self.append(column, format!("{}.{}", operator, value))
    }
}

/// Strip whitespace outside double quotes
fn clean_projection(projection: &str) -> String {
    let mut quoted = false;
    projection
        .chars()
        .filter(|c| {
            if *c == '"' {
                quoted = !quoted;
            }
            quoted || !c.is_whitespace()
        })
        .collect()
}

fn in_list(values: &[FilterValue]) -> String {
    values
        .iter()
        .map(|value| match value {
            FilterValue::String(s) if s.contains(RESERVED_CHARS) => format!("\"{}\"", s),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn array_literal(values: &[FilterValue]) -> String {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("{{{}}}", items.join(","))
}

impl QueryHandle for PostgrestQuery {
    fn schema(self, schema: &str) -> Self {
        self.set_header("Accept-Profile", schema.to_string())
    }

    fn select(self, projection: &str, count: Option<CountMode>) -> Self {
        let query = self.set("select", clean_projection(projection));
        match count {
            Some(mode) => query.set_header("Prefer", format!("count={}", mode.as_str())),
            None => query,
        }
    }

    fn eq(self, column: &str, value: &FilterValue) -> Self {
        self.filter(column, "eq", value)
    }

    fn neq(self, column: &str, value: &FilterValue) -> Self {
        self.filter(column, "neq", value)
    }

    fn in_(self, column: &str, values: &[FilterValue]) -> Self {
        self.filter(column, "in", format!("({})", in_list(values)))
    }

    fn not(self, column: &str, operator: &str, value: &str) -> Self {
        self.append(column, format!("not.{}.{}", operator, value))
    }

    fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    fn overlaps(self, column: &str, values: &[FilterValue]) -> Self {
        self.filter(column, "ov", array_literal(values))
    }

    fn contains(self, column: &str, values: &[FilterValue]) -> Self {
        self.filter(column, "cs", array_literal(values))
    }

    fn gt(self, column: &str, value: &FilterValue) -> Self {
        self.filter(column, "gt", value)
    }

    fn gte(self, column: &str, value: &FilterValue) -> Self {
        self.filter(column, "gte", value)
    }

    fn lt(self, column: &str, value: &FilterValue) -> Self {
        self.filter(column, "lt", value)
    }

    fn lte(self, column: &str, value: &FilterValue) -> Self {
        self.filter(column, "lte", value)
    }

    fn or(self, filters: &str) -> Self {
        self.append("or", format!("({})", filters))
    }

    fn order(self, column: &str, ascending: bool) -> Self {
        let key = format!("{}.{}", column, if ascending { "asc" } else { "desc" });
        let order = match self.param("order") {
            Some(existing) => format!("{},{}", existing, key),
            None => key,
        };
        self.set("order", order)
    }

    fn range(self, from: i64, to: i64) -> Self {
        self.set("offset", from.to_string())
            .set("limit", to.saturating_sub(from).saturating_add(1).to_string())
    }
}

impl fmt::Display for PostgrestQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.url)
        } else {
            write!(f, "{}?{}", self.url, self.query_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PostgrestClient {
        PostgrestClient::new("https://db.example.com/")
    }

    #[test]
    fn test_from_builds_table_url() {
        let query = client().from("clients");
        assert_eq!(query.url(), "https://db.example.com/rest/v1/clients");
        assert_eq!(query.to_string(), "https://db.example.com/rest/v1/clients");
    }

    #[test]
    fn test_select_with_count() {
        let query = client()
            .from("clients")
            .select("*, owner:team_members(*)", Some(CountMode::Exact));
        assert_eq!(query.param("select"), Some("*,owner:team_members(*)"));
        assert_eq!(query.header("prefer"), Some("count=exact"));
    }

    #[test]
    fn test_projection_keeps_quoted_whitespace() {
        assert_eq!(clean_projection("id, \"full name\""), "id,\"full name\"");
    }

    #[test]
    fn test_comparison_filters() {
        let query = client()
            .from("clients")
            .eq("status", &FilterValue::from("active"))
            .gte("revenue", &FilterValue::from(10))
            .lt("created_at", &FilterValue::from("2024-01-01T00:00:00.000Z"));
        assert_eq!(
            query.query_string(),
            "status=eq.active&revenue=gte.10&created_at=lt.2024-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_in_quotes_reserved_values() {
        let query = client().from("clients").in_(
            "type",
            &[FilterValue::from("llc"), FilterValue::from("s,corp")],
        );
        assert_eq!(query.param("type"), Some("in.(llc,\"s,corp\")"));
    }

    #[test]
    fn test_not_passes_value_verbatim() {
        let query = client().from("clients").not("type", "in", "(llc,s,corp)");
        assert_eq!(query.param("type"), Some("not.in.(llc,s,corp)"));
    }

    #[test]
    fn test_array_operators() {
        let tags = [FilterValue::from("vip"), FilterValue::from("new")];
        let query = client()
            .from("clients")
            .overlaps("tags", &tags)
            .contains("tags", &tags);
        assert_eq!(query.param_values("tags"), vec!["ov.{vip,new}", "cs.{vip,new}"]);
    }

    #[test]
    fn test_same_column_filters_accumulate() {
        let query = client()
            .from("clients")
            .gte("revenue", &FilterValue::from(10))
            .lte("revenue", &FilterValue::from(20));
        assert_eq!(query.param_values("revenue"), vec!["gte.10", "lte.20"]);
    }

    #[test]
    fn test_order_appends_keys() {
        let query = client()
            .from("clients")
            .order("status", true)
            .order("created_at", false);
        assert_eq!(query.param("order"), Some("status.asc,created_at.desc"));
    }

    #[test]
    fn test_range_sets_offset_and_limit() {
        let query = client().from("clients").range(50, 74).range(0, 9);
        assert_eq!(query.param("offset"), Some("0"));
        assert_eq!(query.param("limit"), Some("10"));
        assert_eq!(query.param_values("offset").len(), 1);
    }

    #[test]
    fn test_request_json_carries_headers() {
        let query = client()
            .from("clients")
            .schema("crm")
            .select("status", Some(CountMode::Exact));
        let request = query.to_request_json();

        assert_eq!(request["method"], "GET");
        assert_eq!(request["url"], "https://db.example.com/rest/v1/clients?select=status");
        assert_eq!(request["headers"]["Accept-Profile"], "crm");
        assert_eq!(request["headers"]["Prefer"], "count=exact");

        let public = client().from("clients").schema("public");
        assert_ne!(public.to_request_json(), client().from("clients").schema("crm").to_request_json());
    }

    #[test]
    fn test_schema_and_or() {
        let query = client()
            .from("clients")
            .schema("crm")
            .or("name.ilike.%acme%,email.ilike.%acme%");
        assert_eq!(query.header("Accept-Profile"), Some("crm"));
        assert_eq!(query.param("or"), Some("(name.ilike.%acme%,email.ilike.%acme%)"));
    }
}
