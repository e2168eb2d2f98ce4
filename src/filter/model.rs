//! Filter, sort, relationship and query specification shapes

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::filter::operators::{FilterType, Operation};
use crate::filter::value::FilterValue;

/// Schema used when a spec does not name one
pub const DEFAULT_SCHEMA: &str = "public";

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

/// One predicate specification over a column.
///
/// `operator` stays a free string: pairs outside the operator table are
/// carried through untouched and skipped at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub column_id: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub operator: String,
    #[serde(default)]
    pub values: Vec<FilterValue>,
}

impl Filter {
    pub fn new<I, V>(
        column_id: impl Into<String>,
        filter_type: FilterType,
        operator: impl Into<String>,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self {
            column_id: column_id.into(),
            filter_type,
            operator: operator.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The typed operation, if `(type, operator)` is in the table
    pub fn operation(&self) -> Option<Operation> {
        Operation::parse(self.filter_type, &self.operator)
    }
}

/// Ordered filters, combined by AND
pub type FiltersState = Vec<Filter>;

/// Parse a filters state from the dashboard's JSON
pub fn filters_from_json(json: &str) -> Result<FiltersState> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One key of a multi-key sort; earlier keys take precedence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub column: String,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn ascending(&self) -> bool {
        self.direction == SortDirection::Asc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    Single,
    Many,
}

/// A related table embedded into wildcard selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRelationship {
    pub table: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

impl TableRelationship {
    pub fn single(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            relationship_type: RelationshipType::Single,
        }
    }

    pub fn many(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            relationship_type: RelationshipType::Many,
        }
    }
}

/// Alias → relationship map that remembers insertion order.
///
/// Serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships(Vec<(String, TableRelationship)>);

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced alias keeps its original position
    pub fn insert(&mut self, alias: impl Into<String>, relationship: TableRelationship) {
        let alias = alias.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == alias) {
            Some((_, slot)) => *slot = relationship,
            None => self.0.push((alias, relationship)),
        }
    }

    pub fn get(&self, alias: &str) -> Option<&TableRelationship> {
        self.0
            .iter()
            .find(|(existing, _)| existing == alias)
            .map(|(_, relationship)| relationship)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableRelationship)> {
        self.0.iter().map(|(alias, rel)| (alias.as_str(), rel))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, TableRelationship)> for Relationships {
    fn from_iter<I: IntoIterator<Item = (K, TableRelationship)>>(iter: I) -> Self {
        let mut relationships = Relationships::new();
        for (alias, relationship) in iter {
            relationships.insert(alias, relationship);
        }
        relationships
    }
}

impl Serialize for Relationships {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (alias, relationship) in &self.0 {
            map.serialize_entry(alias, relationship)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Relationships {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RelationshipsVisitor;

        impl<'de> Visitor<'de> for RelationshipsVisitor {
            type Value = Relationships;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of alias to relationship")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Relationships, A::Error> {
                let mut relationships = Relationships::new();
                while let Some((alias, relationship)) =
                    access.next_entry::<String, TableRelationship>()?
                {
                    relationships.insert(alias, relationship);
                }
                Ok(relationships)
            }
        }

        deserializer.deserialize_map(RelationshipsVisitor)
    }
}

/// Everything needed to build one listing query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub table: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Explicit projection; bypasses relationship expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    #[serde(default)]
    pub filters: FiltersState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default)]
    pub search_columns: Vec<String>,
    #[serde(default)]
    pub relationships: Relationships,
    /// Zero-based page index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub sorting: Vec<SortConfig>,
}

impl QuerySpec {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: default_schema(),
            select: None,
            filters: Vec::new(),
            search_term: None,
            search_columns: Vec::new(),
            relationships: Relationships::new(),
            page: None,
            page_size: None,
            sorting: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn with_filters(mut self, filters: FiltersState) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_search<I, S>(mut self, term: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_term = Some(term.into());
        self.search_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_relationship(
        mut self,
        alias: impl Into<String>,
        relationship: TableRelationship,
    ) -> Self {
        self.relationships.insert(alias, relationship);
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    pub fn with_sorting(mut self, sorting: Vec<SortConfig>) -> Self {
        self.sorting = sorting;
        self
    }
}
