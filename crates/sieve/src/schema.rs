//! Static field tables for queryable entities.
//!
//! Every entity type carries a [`Schema`]: its name and the list of its
//! fields with their [`Kind`]. The table is built once per type (normally by
//! `#[derive(Entity)]`) and consulted by the field resolver. Field values are
//! read at execution time through [`Record::field`].
//!
//! # Manual Implementation
//!
//! ```
//! use once_cell::sync::OnceCell;
//! use sieve::{Entity, FieldValue, Record, Schema, Value};
//! use std::any::Any;
//!
//! struct Tag {
//!     label: String,
//!     weight: u32,
//! }
//!
//! impl Record for Tag {
//!     fn field(&self, name: &str) -> Value<'_> {
//!         match name {
//!             "label" => self.label.value(),
//!             "weight" => self.weight.value(),
//!             _ => Value::None,
//!         }
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! impl Entity for Tag {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceCell<Schema> = OnceCell::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::builder::<Tag>("Tag")
//!                 .field::<String>("label")
//!                 .field::<u32>("weight")
//!                 .build()
//!         })
//!     }
//! }
//!
//! assert!(Tag::schema().field("LABEL").is_some());
//! ```

use std::any::{Any, TypeId};
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::value::{Number, Value};

/// A record whose fields can be read by name.
///
/// `field` is only ever called with the canonical field names listed in the
/// entity's [`Schema`]; unknown names return [`Value::None`].
pub trait Record: Any {
    /// Returns the value of a field.
    fn field(&self, name: &str) -> Value<'_>;

    /// Returns `self` as [`Any`], used to hand typed records to custom hooks.
    fn as_any(&self) -> &dyn Any;

    /// Returns the cardinality of a field without reading it as a [`Value`].
    /// See [`FieldValue::cardinality`].
    fn field_cardinality(&self, name: &str) -> Option<usize> {
        self.field(name).len()
    }

    /// Calls `f` on the elements of a collection field until it returns
    /// `true`. See [`FieldValue::any_element`].
    fn any_field_element(&self, name: &str, f: &mut dyn FnMut(Value<'_>) -> bool) -> bool {
        match self.field(name) {
            Value::List(items) => items.into_iter().any(f),
            _ => false,
        }
    }
}

impl dyn Record {
    /// Downcasts to the concrete record type.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// A record type with a static field table.
pub trait Entity: Record + Sized {
    /// Returns the field table for this type.
    fn schema() -> &'static Schema;
}

/// A Rust type that can appear as an entity field.
///
/// Implemented for strings, numbers, booleans, UUIDs, `chrono` date/time
/// types, `serde_json::Value`, `Option<T>` and `Vec<T>`. The derive macro
/// implements it for entities (as nested records) and for fieldless enums.
pub trait FieldValue {
    /// The kind of this type.
    fn kind() -> Kind;

    /// Whether the field may hold no value.
    fn nullable() -> bool {
        false
    }

    /// Reads the value.
    fn value(&self) -> Value<'_>;

    /// Character count of a string, element count of a collection.
    fn cardinality(&self) -> Option<usize> {
        None
    }

    /// Calls `f` on each element until it returns `true`.
    fn any_element(&self, _f: &mut dyn FnMut(Value<'_>) -> bool) -> bool {
        false
    }
}

/// Static type of an entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    String,
    Int,
    UInt,
    Float,
    Bool,
    Uuid,
    DateTime,
    Date,
    Time,
    Duration,
    /// Enum with its variant names in declaration order.
    Enum(&'static [&'static str]),
    /// Arbitrary JSON sub-document.
    Json,
    /// Nested entity.
    Record(SchemaRef),
    /// Collection of elements.
    List(Box<Kind>),
}

impl Kind {
    /// Returns `true` for collection kinds. Strings are never collections.
    pub fn is_collection(&self) -> bool {
        matches!(self, Kind::List(_))
    }

    /// Returns the element kind of a collection.
    pub fn element(&self) -> Option<&Kind> {
        match self {
            Kind::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the schema of a nested entity.
    pub fn schema(&self) -> Option<&'static Schema> {
        match self {
            Kind::Record(schema) => Some(schema.get()),
            _ => None,
        }
    }

    /// Returns `true` for kinds that hold a single comparable value.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Kind::Json | Kind::Record(_) | Kind::List(_))
    }

    /// Returns `true` for kinds with a natural ordering.
    pub fn is_ordered(&self) -> bool {
        self.is_scalar() && !matches!(self, Kind::Bool)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::String => f.write_str("string"),
            Kind::Int => f.write_str("int"),
            Kind::UInt => f.write_str("uint"),
            Kind::Float => f.write_str("float"),
            Kind::Bool => f.write_str("bool"),
            Kind::Uuid => f.write_str("uuid"),
            Kind::DateTime => f.write_str("datetime"),
            Kind::Date => f.write_str("date"),
            Kind::Time => f.write_str("time"),
            Kind::Duration => f.write_str("duration"),
            Kind::Enum(_) => f.write_str("enum"),
            Kind::Json => f.write_str("json"),
            Kind::Record(schema) => f.write_str(schema.get().name()),
            Kind::List(inner) => write!(f, "list<{}>", inner),
        }
    }
}

/// Lazy reference to another entity's schema.
///
/// Stored as a function pointer so that entities may refer to each other
/// (a user has posts, a post has an author) without initialisation cycles.
#[derive(Clone, Copy)]
pub struct SchemaRef(fn() -> &'static Schema);

impl SchemaRef {
    /// Reference the schema of `T`.
    pub fn of<T: Entity>() -> Self {
        SchemaRef(T::schema)
    }

    /// Resolve the referenced schema.
    pub fn get(&self) -> &'static Schema {
        (self.0)()
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaRef({})", self.get().name())
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.get().type_id() == other.get().type_id()
    }
}

/// One field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    name: &'static str,
    kind: Kind,
    nullable: bool,
}

impl FieldDef {
    /// Creates a field definition.
    pub fn new(name: &'static str, kind: Kind, nullable: bool) -> Self {
        FieldDef {
            name,
            kind,
            nullable,
        }
    }

    /// The canonical field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The field's kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Whether the field may hold no value.
    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

/// Field table of an entity type.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    type_id: TypeId,
    fields: Vec<FieldDef>,
}

impl Schema {
    /// Starts a schema for `T`.
    pub fn builder<T: 'static>(name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                name,
                type_id: TypeId::of::<T>(),
                fields: Vec::new(),
            },
        }
    }

    /// The entity name, used in error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The entity's Rust type id, which keys the registry.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a field by name, ignoring ASCII case.
    ///
    /// An exact match wins over a case-insensitive one.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Adds a field whose kind is taken from its Rust type.
    pub fn field<F: FieldValue>(self, name: &'static str) -> Self {
        self.field_of(name, F::kind(), F::nullable())
    }

    /// Adds a field with an explicit kind.
    pub fn field_of(mut self, name: &'static str, kind: Kind, nullable: bool) -> Self {
        self.schema.fields.push(FieldDef::new(name, kind, nullable));
        self
    }

    /// Finishes the schema.
    pub fn build(self) -> Schema {
        self.schema
    }
}

// ============================================================================
// FieldValue implementations
// ============================================================================

impl FieldValue for String {
    fn kind() -> Kind {
        Kind::String
    }

    fn cardinality(&self) -> Option<usize> {
        Some(self.chars().count())
    }

    fn value(&self) -> Value<'_> {
        Value::String(self)
    }
}

macro_rules! numeric_field {
    ($kind:ident: $($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn kind() -> Kind {
                    Kind::$kind
                }

                fn value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }
        )*
    };
}

numeric_field!(Int: i8, i16, i32, i64, isize);
numeric_field!(UInt: u8, u16, u32, u64, usize);
numeric_field!(Float: f32, f64);

impl FieldValue for bool {
    fn kind() -> Kind {
        Kind::Bool
    }

    fn value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl FieldValue for Uuid {
    fn kind() -> Kind {
        Kind::Uuid
    }

    fn value(&self) -> Value<'_> {
        Value::Uuid(*self)
    }
}

impl FieldValue for DateTime<FixedOffset> {
    fn kind() -> Kind {
        Kind::DateTime
    }

    fn value(&self) -> Value<'_> {
        Value::DateTime(*self)
    }
}

impl FieldValue for DateTime<Utc> {
    fn kind() -> Kind {
        Kind::DateTime
    }

    fn value(&self) -> Value<'_> {
        Value::DateTime((*self).into())
    }
}

/// Naive date-times are read as UTC.
impl FieldValue for NaiveDateTime {
    fn kind() -> Kind {
        Kind::DateTime
    }

    fn value(&self) -> Value<'_> {
        Value::DateTime(DateTime::<Utc>::from_naive_utc_and_offset(*self, Utc).into())
    }
}

impl FieldValue for NaiveDate {
    fn kind() -> Kind {
        Kind::Date
    }

    fn value(&self) -> Value<'_> {
        Value::Date(*self)
    }
}

impl FieldValue for NaiveTime {
    fn kind() -> Kind {
        Kind::Time
    }

    fn value(&self) -> Value<'_> {
        Value::Time(*self)
    }
}

impl FieldValue for Duration {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn value(&self) -> Value<'_> {
        Value::Duration(*self)
    }
}

impl FieldValue for serde_json::Value {
    fn kind() -> Kind {
        Kind::Json
    }

    fn value(&self) -> Value<'_> {
        match self {
            serde_json::Value::Null => Value::None,
            json => Value::Json(json),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> Kind {
        T::kind()
    }

    fn nullable() -> bool {
        true
    }

    fn value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.value(),
            None => Value::None,
        }
    }

    fn cardinality(&self) -> Option<usize> {
        self.as_ref().and_then(FieldValue::cardinality)
    }

    fn any_element(&self, f: &mut dyn FnMut(Value<'_>) -> bool) -> bool {
        self.as_ref().is_some_and(|inner| inner.any_element(f))
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn kind() -> Kind {
        Kind::List(Box::new(T::kind()))
    }

    fn value(&self) -> Value<'_> {
        Value::List(self.iter().map(FieldValue::value).collect())
    }

    fn cardinality(&self) -> Option<usize> {
        Some(self.len())
    }

    fn any_element(&self, f: &mut dyn FnMut(Value<'_>) -> bool) -> bool {
        self.iter().any(|item| f(item.value()))
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    fn kind() -> Kind {
        T::kind()
    }

    fn nullable() -> bool {
        T::nullable()
    }

    fn value(&self) -> Value<'_> {
        (**self).value()
    }

    fn cardinality(&self) -> Option<usize> {
        (**self).cardinality()
    }

    fn any_element(&self, f: &mut dyn FnMut(Value<'_>) -> bool) -> bool {
        (**self).any_element(f)
    }
}
