//! Sort compilation.
//!
//! Sort descriptors compile into a [`SortChain`]: an ordered list of keys,
//! each with a [`Dir`]. The chain compares lexicographically, so a later key
//! only breaks ties left by all earlier keys. Sorting with it goes through the
//! stable `slice::sort_by`, so records equal on every key keep their input
//! order.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::config::{CustomSort, Registry};
use crate::descriptor::SortDescriptor;
use crate::error::{Result, SieveError};
use crate::json::{split_path, JsonPath};
use crate::options::SieveOptions;
use crate::resolve::{resolve, Access};
use crate::schema::{Record, Schema};
use crate::value::{compare_values, Number, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first, nulls last).
    #[default]
    Asc,
    /// Descending order (largest first, nulls first).
    Desc,
}

impl Dir {
    /// Parses `asc` or `desc`, ignoring case.
    pub fn parse(s: &str) -> Option<Dir> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("asc") {
            Some(Dir::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Dir::Desc)
        } else {
            None
        }
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a sort term orders by.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    /// A scalar member.
    Field(Access),
    /// The text form of a node inside a JSON member.
    Json(JsonPath),
    /// A registered custom sort key.
    Custom(CustomSort),
}

impl SortKey {
    fn compare(&self, a: &dyn Record, b: &dyn Record) -> Ordering {
        match self {
            SortKey::Field(access) => compare_keys(&access.read(a), &access.read(b)),
            SortKey::Json(path) => {
                let (x, y) = (path.read_text(a), path.read_text(b));
                compare_keys(&text_value(&x), &text_value(&y))
            }
            SortKey::Custom(sort) => {
                let (x, y) = (sort.key(a), sort.key(b));
                compare_keys(&x.as_value(), &y.as_value())
            }
        }
    }
}

fn text_value(text: &Option<String>) -> Value<'_> {
    text.as_deref().map_or(Value::None, Value::String)
}

// Total order over sort keys: NaN after every number, nulls last, and
// mismatched types by variant rank.
fn compare_keys(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(*x, *y),
        _ => compare_values(a, b).unwrap_or_else(|| rank(a).cmp(&rank(b))),
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    let nan = |n: Number| matches!(n, Number::F64(f) if f.is_nan());
    match (nan(a), nan(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn rank(value: &Value<'_>) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Uuid(_) => 3,
        Value::DateTime(_) => 4,
        Value::Date(_) => 5,
        Value::Time(_) => 6,
        Value::Duration(_) => 7,
        Value::Enum(_) => 8,
        Value::Json(_) | Value::Record(_) | Value::List(_) => 9,
        Value::None => 10,
    }
}

/// One key of a sort chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SortTerm {
    /// What to order by.
    pub key: SortKey,
    /// Which way.
    pub dir: Dir,
}

impl SortTerm {
    /// Compares two records on this key alone.
    pub fn compare(&self, a: &dyn Record, b: &dyn Record) -> Ordering {
        self.dir.apply(self.key.compare(a, b))
    }
}

/// Compiled multi-key ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortChain {
    terms: Vec<SortTerm>,
}

impl SortChain {
    /// Creates a chain from terms, primary key first.
    pub fn new(terms: Vec<SortTerm>) -> Self {
        SortChain { terms }
    }

    /// The terms, primary key first.
    pub fn terms(&self) -> &[SortTerm] {
        &self.terms
    }

    /// Returns `true` if the chain imposes no order.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Compares two records: the first term that tells them apart decides.
    pub fn compare(&self, a: &dyn Record, b: &dyn Record) -> Ordering {
        for term in &self.terms {
            let ordering = term.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Sorts records in place. Stable.
    pub fn sort<T: Record>(&self, items: &mut [T]) {
        if !self.is_empty() {
            items.sort_by(|a, b| self.compare(a, b));
        }
    }

    /// Sorts borrowed records in place. Stable.
    pub fn sort_refs<T: Record>(&self, items: &mut [&T]) {
        if !self.is_empty() {
            items.sort_by(|a, b| self.compare(*a, *b));
        }
    }
}

/// Compiles sort descriptors for the entity described by `schema`.
///
/// In lenient mode descriptors that fail to compile are dropped; malformed
/// JSON paths are reported regardless.
pub fn compile_sorts(
    sorts: &[SortDescriptor],
    schema: &'static Schema,
    registry: &Registry,
    options: &SieveOptions,
) -> Result<SortChain> {
    let mut terms = Vec::with_capacity(sorts.len());

    for sort in sorts {
        match compile_key(sort, schema, registry) {
            Ok(key) => terms.push(SortTerm {
                key,
                dir: sort.direction,
            }),
            Err(err) if !options.throw_on_invalid_fields && err.is_policy() => {
                debug!(entity = schema.name(), field = %sort.field, error = %err, "skipping sort descriptor");
            }
            Err(err) => return Err(err),
        }
    }

    let chain = SortChain::new(terms);
    trace!(entity = schema.name(), ?chain, "compiled sort chain");
    Ok(chain)
}

fn compile_key(sort: &SortDescriptor, schema: &'static Schema, registry: &Registry) -> Result<SortKey> {
    if sort.is_json {
        split_path(&sort.field)?;
    }

    let entity = schema.type_id();
    let config = registry.field(entity, &sort.field);
    if config.is_some_and(|c| !c.sortable) {
        return Err(SieveError::FieldNotSortable(sort.field.clone()));
    }
    let path = config.map_or(sort.field.as_str(), |c| c.name.as_str());

    if let Some(custom) = registry.custom_sort(entity, path) {
        return Ok(SortKey::Custom(custom.clone()));
    }

    if sort.is_json {
        return JsonPath::resolve(schema, path).map(SortKey::Json);
    }

    let resolved = resolve(schema, path)?;
    if resolved.is_existential() || !resolved.leaf().kind.is_scalar() {
        return Err(SieveError::not_found(path, schema.name()));
    }
    let (access, _) = resolved.split();
    Ok(SortKey::Field(access))
}
