//! Compiled filter predicates.
//!
//! A [`Predicate`] is a boolean expression tree over one record type. It is
//! the artifact the filter compiler produces and any execution backend can
//! walk it; [`Predicate::matches`] is the in-memory evaluator.
//!
//! Null semantics: ordering and text comparisons against a missing value are
//! false, including the negated text forms. Equality treats a missing value
//! as different from every operand, so `!=` holds for it.

use std::borrow::Cow;

use crate::config::CustomFilter;
use crate::json::JsonPath;
use crate::op::Op;
use crate::resolve::Access;
use crate::schema::Record;
use crate::search::{SimpleTextSearch, TextSearch};
use crate::value::{compare_values, Scalar, Value};

/// What a comparison reads from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A typed member.
    Field(Access),
    /// The text form of a node inside a JSON member.
    Json(JsonPath),
}

/// Boolean expression over a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Compares the target against a coerced operand.
    Compare {
        target: Target,
        op: Op,
        value: Scalar,
        case_insensitive: bool,
    },
    /// The member holds no value.
    IsNull(Access),
    /// Compares the cardinality of a string or collection.
    Length { field: Access, op: Op, value: u64 },
    /// A collection of scalars holds an element equal to the operand.
    ElementContains {
        field: Access,
        value: Scalar,
        case_insensitive: bool,
    },
    /// At least one record of the collection satisfies `inner`.
    Any {
        collection: Access,
        inner: Box<Predicate>,
    },
    /// Full-text match, delegated to a [`TextSearch`] backend.
    VectorMatch {
        field: Access,
        language: String,
        term: String,
    },
    /// Registered custom filter.
    Custom(CustomFilter),
    /// All children hold.
    And(Vec<Predicate>),
    /// At least one child holds.
    Or(Vec<Predicate>),
    /// The child does not hold.
    Not(Box<Predicate>),
}

impl Predicate {
    /// AND-combines predicates. Returns `None` for an empty list and the
    /// predicate itself for a single one.
    pub fn all(predicates: Vec<Predicate>) -> Option<Predicate> {
        Self::combine(predicates, Predicate::And)
    }

    /// OR-combines predicates. Returns `None` for an empty list and the
    /// predicate itself for a single one.
    pub fn any(predicates: Vec<Predicate>) -> Option<Predicate> {
        Self::combine(predicates, Predicate::Or)
    }

    fn combine(
        mut predicates: Vec<Predicate>,
        node: fn(Vec<Predicate>) -> Predicate,
    ) -> Option<Predicate> {
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(node(predicates)),
        }
    }

    /// Negates a predicate.
    pub fn negate(self) -> Predicate {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    /// Evaluates against a record, using [`SimpleTextSearch`] for full-text
    /// nodes.
    pub fn matches(&self, record: &dyn Record) -> bool {
        self.matches_with(record, &SimpleTextSearch)
    }

    /// Evaluates against a record with the given full-text backend.
    pub fn matches_with(&self, record: &dyn Record, search: &dyn TextSearch) -> bool {
        match self {
            Predicate::Compare {
                target,
                op,
                value,
                case_insensitive,
            } => match target {
                Target::Field(access) => {
                    compare(&access.read(record), *op, value, *case_insensitive)
                }
                Target::Json(path) => {
                    let text = path.read_text(record);
                    let actual = text.as_deref().map_or(Value::None, Value::String);
                    compare(&actual, *op, value, *case_insensitive)
                }
            },
            Predicate::IsNull(access) => access.read(record).is_none(),
            Predicate::Length { field, op, value } => field
                .cardinality(record)
                .is_some_and(|n| op.eval_ordering((n as u64).cmp(value))),
            Predicate::ElementContains {
                field,
                value,
                case_insensitive,
            } => field.any_element(record, &mut |item: Value<'_>| {
                compare(&item, Op::Eq, value, *case_insensitive)
            }),
            Predicate::Any { collection, inner } => {
                collection.any_element(record, &mut |item: Value<'_>| {
                    item.as_record()
                        .is_some_and(|element| inner.matches_with(element, search))
                })
            }
            Predicate::VectorMatch {
                field,
                language,
                term,
            } => match field.read(record) {
                Value::String(text) => search.matches(text, language, term),
                Value::List(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|text| search.matches(text, language, term)),
                _ => false,
            },
            Predicate::Custom(filter) => filter.matches(record),
            Predicate::And(children) => children.iter().all(|p| p.matches_with(record, search)),
            Predicate::Or(children) => children.iter().any(|p| p.matches_with(record, search)),
            Predicate::Not(inner) => !inner.matches_with(record, search),
        }
    }
}

fn fold(s: &str, case_insensitive: bool) -> Cow<'_, str> {
    if case_insensitive {
        Cow::Owned(s.to_lowercase())
    } else {
        Cow::Borrowed(s)
    }
}

fn compare(actual: &Value<'_>, op: Op, operand: &Scalar, case_insensitive: bool) -> bool {
    if op == Op::Ne {
        return !compare(actual, Op::Eq, operand, case_insensitive);
    }
    if actual.is_none() && op != Op::Eq {
        return false;
    }

    let expected = operand.as_value();
    if let (Some(a), Some(b)) = (actual.as_str(), expected.as_str()) {
        let (a, b) = (fold(a, case_insensitive), fold(b, case_insensitive));
        return match op {
            Op::Contains => a.contains(b.as_ref()),
            Op::StartsWith => a.starts_with(b.as_ref()),
            Op::EndsWith => a.ends_with(b.as_ref()),
            Op::NotContains => !a.contains(b.as_ref()),
            Op::NotStartsWith => !a.starts_with(b.as_ref()),
            Op::NotEndsWith => !a.ends_with(b.as_ref()),
            _ => op.eval_ordering(a.cmp(&b)),
        };
    }
    if op.is_text() {
        return false;
    }
    compare_values(actual, &expected).is_some_and(|ordering| op.eval_ordering(ordering))
}
