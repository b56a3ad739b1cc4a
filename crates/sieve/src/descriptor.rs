//! Filter, sort and pagination descriptors.
//!
//! Descriptors are the untrusted input: field paths and operator tokens as
//! strings, values as raw JSON scalars. They deserialize from the JSON shapes
//!
//! ```text
//! Query  = { page?, pageSize?, sorts?: Sort[], filters?: Filter[] }
//! Sort   = { field, direction?: "asc" | "desc", json?: bool }
//! Filter = { field?, operator?, values?: any[], vector?: bool, json?: bool, or?: Filter[] }
//! ```
//!
//! with keys accepted in camelCase, lower case or PascalCase. A filter with a
//! non-empty `or` list is an OR-group; any other filter is a leaf and needs a
//! `field`. A missing `operator` means `==`.

use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::{Result, SieveError};
use crate::ordering::Dir;

/// A leaf filter: one field, one operator, any number of values.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    /// Dotted field path.
    pub field: String,
    /// Operator token.
    pub operator: String,
    /// Raw operand values.
    pub values: Vec<Json>,
    /// The path addresses a node inside a JSON member.
    pub is_json: bool,
    /// Hand the values to the full-text backend.
    pub is_vector: bool,
}

impl FilterLeaf {
    /// Creates a leaf without values.
    pub fn new(field: impl Into<String>, operator: impl Into<String>) -> Self {
        FilterLeaf {
            field: field.into(),
            operator: operator.into(),
            values: Vec::new(),
            is_json: false,
            is_vector: false,
        }
    }

    /// Appends a value.
    pub fn value(mut self, value: impl Into<Json>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Appends several values.
    pub fn values<V: Into<Json>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    /// Marks the path as a JSON path.
    pub fn json(mut self) -> Self {
        self.is_json = true;
        self
    }

    /// Marks the leaf as a full-text search.
    pub fn vector(mut self) -> Self {
        self.is_vector = true;
        self
    }
}

/// A filter descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawFilter")]
pub enum FilterDescriptor {
    /// A single comparison.
    Leaf(FilterLeaf),
    /// Holds when any child holds.
    OrGroup(Vec<FilterDescriptor>),
}

impl FilterDescriptor {
    /// Shorthand for a leaf with values.
    pub fn leaf<V: Into<Json>>(
        field: impl Into<String>,
        operator: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        FilterLeaf::new(field, operator).values(values).into()
    }

    /// Shorthand for an OR-group.
    pub fn or(children: impl IntoIterator<Item = FilterDescriptor>) -> Self {
        FilterDescriptor::OrGroup(children.into_iter().collect())
    }

    /// Returns the leaf, if this is one.
    pub fn as_leaf(&self) -> Option<&FilterLeaf> {
        match self {
            FilterDescriptor::Leaf(leaf) => Some(leaf),
            FilterDescriptor::OrGroup(_) => None,
        }
    }
}

impl From<FilterLeaf> for FilterDescriptor {
    fn from(leaf: FilterLeaf) -> Self {
        FilterDescriptor::Leaf(leaf)
    }
}

#[derive(Deserialize)]
struct RawFilter {
    #[serde(default, alias = "Field")]
    field: Option<String>,
    #[serde(default, alias = "Operator")]
    operator: Option<String>,
    #[serde(default, alias = "Values")]
    values: Vec<Json>,
    #[serde(default, alias = "Vector", alias = "isVector", alias = "IsVector")]
    vector: bool,
    #[serde(default, alias = "Json", alias = "isJson", alias = "IsJson")]
    json: bool,
    #[serde(default, alias = "Or", alias = "OR")]
    or: Vec<FilterDescriptor>,
}

impl TryFrom<RawFilter> for FilterDescriptor {
    type Error = String;

    fn try_from(raw: RawFilter) -> std::result::Result<Self, Self::Error> {
        if !raw.or.is_empty() {
            return Ok(FilterDescriptor::OrGroup(raw.or));
        }
        let field = raw
            .field
            .filter(|f| !f.trim().is_empty())
            .ok_or("filter needs a field or a non-empty 'or' list")?;
        Ok(FilterDescriptor::Leaf(FilterLeaf {
            field,
            operator: raw.operator.unwrap_or_else(|| "==".to_string()),
            values: raw.values,
            is_json: raw.json,
            is_vector: raw.vector,
        }))
    }
}

/// A sort descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSort")]
pub struct SortDescriptor {
    /// Dotted field path, custom sort name, or JSON path.
    pub field: String,
    /// Direction.
    pub direction: Dir,
    /// The path addresses a node inside a JSON member.
    pub is_json: bool,
}

impl SortDescriptor {
    /// Creates a sort descriptor.
    pub fn new(field: impl Into<String>, direction: Dir) -> Self {
        SortDescriptor {
            field: field.into(),
            direction,
            is_json: false,
        }
    }

    /// Ascending by `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Dir::Asc)
    }

    /// Descending by `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Dir::Desc)
    }

    /// Marks the path as a JSON path.
    pub fn json(mut self) -> Self {
        self.is_json = true;
        self
    }
}

#[derive(Deserialize)]
struct RawSort {
    #[serde(alias = "Field")]
    field: String,
    #[serde(default, alias = "Direction")]
    direction: Option<String>,
    #[serde(default, alias = "Json", alias = "isJson", alias = "IsJson")]
    json: bool,
}

impl TryFrom<RawSort> for SortDescriptor {
    type Error = String;

    fn try_from(raw: RawSort) -> std::result::Result<Self, Self::Error> {
        let direction = match raw.direction.as_deref() {
            None => Dir::Asc,
            Some(s) => Dir::parse(s).ok_or_else(|| format!("unknown sort direction '{}'", s))?,
        };
        Ok(SortDescriptor {
            field: raw.field,
            direction,
            is_json: raw.json,
        })
    }
}

/// Filters, sorts and a page request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Query {
    /// 1-based page number.
    #[serde(alias = "Page")]
    pub page: Option<i64>,
    /// Records per page.
    #[serde(rename = "pageSize", alias = "pagesize", alias = "PageSize")]
    pub page_size: Option<i64>,
    /// Sort keys, primary first.
    #[serde(alias = "Sorts")]
    pub sorts: Vec<SortDescriptor>,
    /// Filters, AND-combined.
    #[serde(alias = "Filters")]
    pub filters: Vec<FilterDescriptor>,
}

impl Query {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| SieveError::compile(format!("invalid query: {}", e)))
    }

    /// Adds a filter.
    pub fn filter(mut self, filter: impl Into<FilterDescriptor>) -> Self {
        self.filters.push(filter.into());
        self
    }

    /// Adds a sort key.
    pub fn sort(mut self, sort: SortDescriptor) -> Self {
        self.sorts.push(sort);
        self
    }

    /// Sets the page number.
    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    pub fn page_size(mut self, size: i64) -> Self {
        self.page_size = Some(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_defaults() {
        let filter: FilterDescriptor = serde_json::from_value(json!({"field": "name"})).unwrap();
        assert_eq!(filter, FilterLeaf::new("name", "==").into());
    }

    #[test]
    fn leaf_all_keys() {
        let filter: FilterDescriptor = serde_json::from_value(json!({
            "field": "meta.level",
            "operator": "!=*",
            "values": ["a", 1, null, true],
            "json": true,
            "vector": false
        }))
        .unwrap();
        let expected = FilterLeaf::new("meta.level", "!=*")
            .values([json!("a"), json!(1), Json::Null, json!(true)])
            .json();
        assert_eq!(filter, expected.into());
    }

    #[test]
    fn pascal_case_keys() {
        let filter: FilterDescriptor = serde_json::from_value(json!({
            "Field": "bio",
            "Operator": "@=",
            "Values": ["rust"],
            "IsVector": true
        }))
        .unwrap();
        let leaf = filter.as_leaf().unwrap();
        assert!(leaf.is_vector);
        assert_eq!(leaf.operator, "@=");
    }

    #[test]
    fn or_group_nests() {
        let filter: FilterDescriptor = serde_json::from_value(json!({
            "or": [
                {"field": "name", "values": ["alice"]},
                {"Or": [{"field": "age", "operator": ">", "values": [35]}]}
            ]
        }))
        .unwrap();
        let expected = FilterDescriptor::or([
            FilterDescriptor::leaf("name", "==", ["alice"]),
            FilterDescriptor::or([FilterDescriptor::leaf("age", ">", [35])]),
        ]);
        assert_eq!(filter, expected);
    }

    #[test]
    fn leaf_without_field_is_rejected() {
        let err = serde_json::from_value::<FilterDescriptor>(json!({"values": [1]})).unwrap_err();
        assert!(err.to_string().contains("needs a field"));
        assert!(serde_json::from_value::<FilterDescriptor>(json!({"or": []})).is_err());
    }

    #[test]
    fn sort_direction() {
        let sort: SortDescriptor =
            serde_json::from_value(json!({"Field": "age", "Direction": "DESC"})).unwrap();
        assert_eq!(sort, SortDescriptor::desc("age"));

        let sort: SortDescriptor =
            serde_json::from_value(json!({"field": "meta.level", "isJson": true})).unwrap();
        assert_eq!(sort, SortDescriptor::asc("meta.level").json());

        assert!(serde_json::from_value::<SortDescriptor>(json!({"field": "a", "direction": "up"})).is_err());
    }

    #[test]
    fn query_from_json() {
        let query = Query::from_json(
            r#"{
                "page": 2,
                "PageSize": 3,
                "sorts": [{"field": "age"}],
                "filters": [{"field": "name", "operator": "@=", "values": ["a"]}]
            }"#,
        )
        .unwrap();
        let expected = Query::new()
            .page(2)
            .page_size(3)
            .sort(SortDescriptor::asc("age"))
            .filter(FilterDescriptor::leaf("name", "@=", ["a"]));
        assert_eq!(query, expected);

        assert_eq!(Query::from_json("{}").unwrap(), Query::new());
        assert!(matches!(
            Query::from_json(r#"{"filters": [{}]}"#),
            Err(SieveError::CompileFailure(_))
        ));
    }
}
