//! Python bindings
//!
//! JSON in, strings out. Compiled queries come back as PostgREST request
//! JSON (`method`, `url`, `headers`); value sets come back as JSON arrays.

use pyo3::prelude::*;

use crate::compiler::{build_faceted_count_query, build_min_max_query, build_query};
use crate::equality::Value;
use crate::error::Result;
use crate::filter::{filters_from_json, QuerySpec};
use crate::query::PostgrestClient;
use crate::value_set::{add_uniq, uniq};

fn values_from_json(json: &str) -> Result<Vec<Value>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(values.into_iter().map(Value::from).collect())
}

fn values_to_json(values: &[Value]) -> String {
    serde_json::Value::Array(values.iter().map(Value::to_json).collect()).to_string()
}

// ============================================================================
// Query compilation
// ============================================================================

/// Compile a listing query spec (camelCase JSON) into a request
#[pyfunction]
fn compile_listing_query(base_url: &str, spec_json: &str) -> PyResult<String> {
    let spec = QuerySpec::from_json(spec_json)?;
    Ok(build_query(&PostgrestClient::new(base_url), &spec)
        .to_request_json()
        .to_string())
}

#[pyfunction]
fn compile_faceted_count_query(
    base_url: &str,
    table: &str,
    column: &str,
    filters_json: &str,
) -> PyResult<String> {
    let filters = filters_from_json(filters_json)?;
    let client = PostgrestClient::new(base_url);
    Ok(build_faceted_count_query(&client, table, column, &filters)
        .to_request_json()
        .to_string())
}

#[pyfunction]
fn compile_min_max_query(
    base_url: &str,
    table: &str,
    column: &str,
    filters_json: &str,
) -> PyResult<String> {
    let filters = filters_from_json(filters_json)?;
    let client = PostgrestClient::new(base_url);
    Ok(build_min_max_query(&client, table, column, &filters)
        .to_request_json()
        .to_string())
}

// ============================================================================
// Value sets
// ============================================================================

#[pyfunction]
fn uniq_values(values_json: &str) -> PyResult<String> {
    let values = values_from_json(values_json)?;
    Ok(values_to_json(&uniq(&values)))
}

/// Append values to a multi-select set, dropping deep duplicates
#[pyfunction]
fn add_uniq_values(set_json: &str, values_json: &str) -> PyResult<String> {
    let set = values_from_json(set_json)?;
    let values = values_from_json(values_json)?;
    Ok(values_to_json(&add_uniq(&set, &values)))
}

// ============================================================================
// Python Module
// ============================================================================

/// Python module definition
#[pymodule]
fn filter_query_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compile_listing_query, m)?)?;
    m.add_function(wrap_pyfunction!(compile_faceted_count_query, m)?)?;
    m.add_function(wrap_pyfunction!(compile_min_max_query, m)?)?;
    m.add_function(wrap_pyfunction!(uniq_values, m)?)?;
    m.add_function(wrap_pyfunction!(add_uniq_values, m)?)?;
    Ok(())
}
