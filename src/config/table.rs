//! Table configuration structures

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{FilterQueryError, Result};
use crate::filter::{
    FilterType, QuerySpec, Relationships, SortConfig, DEFAULT_SCHEMA,
};

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_page_size() -> u32 {
    25
}

/// A filterable column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Fixed choices for option columns; empty means "ask the facet query"
    #[serde(default)]
    pub options: Vec<String>,
}

impl ColumnConfig {
    pub fn new(id: impl Into<String>, label: impl Into<String>, filter_type: FilterType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            filter_type,
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// One dashboard feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub table: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub search_columns: Vec<String>,
    #[serde(default)]
    pub default_sort: Vec<SortConfig>,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl TableConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: default_schema(),
            columns: Vec::new(),
            search_columns: Vec::new(),
            default_sort: Vec::new(),
            relationships: Relationships::new(),
            page_size: default_page_size(),
        }
    }

    pub fn column(&self, id: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// Type of a configured column
    pub fn filter_type(&self, column: &str) -> Option<FilterType> {
        self.column(column).map(|column| column.filter_type)
    }

    /// First page of the table with its default search columns, sort and
    /// relationships; filters and search term are left to the caller.
    pub fn query_spec(&self) -> QuerySpec {
        let mut spec = QuerySpec::new(self.table.clone())
            .with_schema(self.schema.clone())
            .with_sorting(self.default_sort.clone())
            .with_page(0, self.page_size);
        spec.search_columns = self.search_columns.clone();
        spec.relationships = self.relationships.clone();
        spec
    }

    fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(FilterQueryError::InvalidConfig(
                "table name must not be empty".to_string(),
            ));
        }

        let mut seen = AHashSet::new();
        for column in &self.columns {
            if !seen.insert(column.id.as_str()) {
                return Err(FilterQueryError::InvalidConfig(format!(
                    "duplicate column '{}' in table '{}'",
                    column.id, self.table
                )));
            }
        }
        Ok(())
    }
}

/// Every table the dashboard knows about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl DashboardConfig {
    /// Load and validate a dashboard configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|table| table.table == name)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let mut seen = AHashSet::new();
        for table in &self.tables {
            table.validate()?;
            if !seen.insert(table.table.as_str()) {
                return Err(FilterQueryError::InvalidConfig(format!(
                    "duplicate table '{}'",
                    table.table
                )));
            }
        }
        Ok(())
    }
}
