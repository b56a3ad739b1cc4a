//! Field path resolution.
//!
//! A dotted path such as `comments.text` is resolved segment by segment
//! against an entity's [`Schema`]. Segment names match case-insensitively.
//! When a segment is a collection of records and more segments follow, the
//! rest of the path is resolved against the element schema and wrapped in a
//! [`Step::Any`]: whatever is built from that sub-path holds for the record
//! when it holds for at least one element.

use std::fmt;

use crate::error::{Result, SieveError};
use crate::schema::{FieldDef, Kind, Record, Schema, SchemaRef};
use crate::value::Value;

/// A resolved member access.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Canonical field name, as declared in the schema.
    pub name: &'static str,
    /// Static kind of the field.
    pub kind: Kind,
    /// Whether the field may hold no value.
    pub nullable: bool,
}

impl From<&FieldDef> for Member {
    fn from(field: &FieldDef) -> Self {
        Member {
            name: field.name(),
            kind: field.kind().clone(),
            nullable: field.nullable(),
        }
    }
}

/// One step of a resolved path.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Direct member access.
    Member(Member),
    /// Existential quantifier over the collection read by the preceding
    /// member; `path` is resolved against the element schema. Always last.
    Any { element: SchemaRef, path: FieldPath },
}

/// A dotted path resolved against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    steps: Vec<Step>,
}

impl FieldPath {
    /// The resolved steps.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns `true` if the path crosses a collection.
    pub fn is_existential(&self) -> bool {
        matches!(self.steps.last(), Some(Step::Any { .. }))
    }

    /// The member the path ends on, looking through existential steps.
    pub fn leaf(&self) -> &Member {
        match self.steps.last() {
            Some(Step::Member(member)) => member,
            Some(Step::Any { path, .. }) => path.leaf(),
            None => unreachable!("resolved paths have at least one step"),
        }
    }

    /// Splits the path into the direct accessor chain and, for existential
    /// paths, the element schema with the sub-path under the quantifier.
    pub fn split(&self) -> (Access, Option<(SchemaRef, &FieldPath)>) {
        let mut names = Vec::with_capacity(self.steps.len());
        let mut any = None;
        for step in &self.steps {
            match step {
                Step::Member(member) => names.push(member.name),
                Step::Any { element, path } => any = Some((*element, path)),
            }
        }
        (Access { names }, any)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Member(member) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(member.name)?;
                }
                Step::Any { path, .. } => write!(f, ".{}", path)?,
            }
        }
        Ok(())
    }
}

/// Chain of direct member reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    names: Vec<&'static str>,
}

impl Access {
    /// Creates an accessor chain from canonical field names.
    pub fn new(names: Vec<&'static str>) -> Self {
        Access { names }
    }

    /// The field names read in order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Reads the value at the end of the chain. A missing intermediate
    /// record yields [`Value::None`].
    pub fn read<'a>(&self, record: &'a dyn Record) -> Value<'a> {
        if self.names.is_empty() {
            return Value::Record(record);
        }
        match self.locate(record) {
            Some((parent, name)) => parent.field(name),
            None => Value::None,
        }
    }

    /// Cardinality of the addressed field, read without materialising a
    /// collection.
    pub fn cardinality(&self, record: &dyn Record) -> Option<usize> {
        let (parent, name) = self.locate(record)?;
        parent.field_cardinality(name)
    }

    /// Calls `f` on the elements of the addressed collection until it returns
    /// `true`.
    pub fn any_element(&self, record: &dyn Record, f: &mut dyn FnMut(Value<'_>) -> bool) -> bool {
        self.locate(record)
            .is_some_and(|(parent, name)| parent.any_field_element(name, f))
    }

    // Walks every segment but the last; a missing intermediate record yields
    // `None`.
    fn locate<'a>(&self, record: &'a dyn Record) -> Option<(&'a dyn Record, &'static str)> {
        let (last, init) = self.names.split_last()?;
        let mut current = record;
        for name in init {
            match current.field(name) {
                Value::Record(next) => current = next,
                _ => return None,
            }
        }
        Some((current, *last))
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join("."))
    }
}

/// Resolves a dotted path against a schema.
///
/// Fails with [`SieveError::FieldNotFound`] naming the first segment that is
/// not a field of the schema it was looked up on, including segments that try
/// to navigate into a scalar.
pub fn resolve(schema: &'static Schema, path: &str) -> Result<FieldPath> {
    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(schema, &segments)
}

fn resolve_segments(schema: &'static Schema, segments: &[&str]) -> Result<FieldPath> {
    let mut current = schema;
    let mut steps = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let field = current
            .field(segment)
            .ok_or_else(|| SieveError::not_found(*segment, current.name()))?;
        let member = Member::from(field);
        let rest = &segments[i + 1..];

        if rest.is_empty() {
            steps.push(Step::Member(member));
            break;
        }

        match field.kind() {
            Kind::Record(nested) => {
                current = nested.get();
                steps.push(Step::Member(member));
            }
            Kind::List(element) => match element.as_ref() {
                Kind::Record(nested) => {
                    let path = resolve_segments(nested.get(), rest)?;
                    steps.push(Step::Member(member));
                    steps.push(Step::Any {
                        element: *nested,
                        path,
                    });
                    return Ok(FieldPath { steps });
                }
                other => return Err(SieveError::not_found(rest[0], other.to_string())),
            },
            other => return Err(SieveError::not_found(rest[0], other.to_string())),
        }
    }

    Ok(FieldPath { steps })
}
