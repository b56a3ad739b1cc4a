//! JSON sub-document navigation.
//!
//! JSON-typed fields are opaque to the schema: the path segments after the
//! JSON member are object keys, looked up at evaluation time. Navigated values
//! are compared by their text form only.

use std::fmt;

use serde_json::Value as Json;

use crate::error::{Result, SieveError};
use crate::resolve::Access;
use crate::schema::{Kind, Record, Schema};
use crate::value::Value;

/// A JSON member followed by object keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    member: Access,
    keys: Vec<String>,
}

impl JsonPath {
    /// Creates a path reading `member` and then descending through `keys`.
    pub fn new(member: Access, keys: Vec<String>) -> Self {
        JsonPath { member, keys }
    }

    /// Resolves `<member>.<key>[.<key>...]` against a schema. The member must
    /// be a JSON field of the schema itself.
    pub fn resolve(schema: &'static Schema, path: &str) -> Result<JsonPath> {
        let (member, keys) = split_path(path)?;
        let field = schema
            .field(member)
            .ok_or_else(|| SieveError::not_found(member, schema.name()))?;
        if *field.kind() != Kind::Json {
            return Err(SieveError::compile(format!(
                "field '{}' of {} is not a JSON document",
                field.name(),
                schema.name()
            )));
        }
        Ok(JsonPath::new(Access::new(vec![field.name()]), keys))
    }

    /// The accessor chain to the JSON member.
    pub fn member(&self) -> &Access {
        &self.member
    }

    /// The object keys below the member.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Reads the member from a record and navigates to the target node.
    pub fn navigate<'a>(&self, record: &'a dyn Record) -> Option<&'a Json> {
        match self.member.read(record) {
            Value::Json(doc) => navigate(doc, &self.keys),
            _ => None,
        }
    }

    /// Reads the text form of the target node.
    pub fn read_text(&self, record: &dyn Record) -> Option<String> {
        self.navigate(record).and_then(extract_text)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.member)?;
        for key in &self.keys {
            write!(f, ".{}", key)?;
        }
        Ok(())
    }
}

/// Splits a JSON path into the member name and the object keys below it.
///
/// At least one key is required and no segment may be empty.
pub fn split_path(path: &str) -> Result<(&str, Vec<String>)> {
    let invalid = || SieveError::InvalidJsonPath(path.to_string());
    let (member, rest) = path.split_once('.').ok_or_else(invalid)?;
    let keys: Vec<String> = rest.split('.').map(str::to_string).collect();
    if member.is_empty() || keys.iter().any(String::is_empty) {
        return Err(invalid());
    }
    Ok((member, keys))
}

/// Follows object keys from `doc`. Keys match exactly.
pub fn navigate<'a, S: AsRef<str>>(doc: &'a Json, keys: &[S]) -> Option<&'a Json> {
    keys.iter()
        .try_fold(doc, |node, key| node.as_object()?.get(key.as_ref()))
}

/// Text form of a JSON node: strings verbatim, numbers and booleans as JSON
/// text. Null, objects and arrays have none.
pub fn extract_text(node: &Json) -> Option<String> {
    match node {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Null | Json::Object(_) | Json::Array(_) => None,
    }
}
