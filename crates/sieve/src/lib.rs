//! Sieve - descriptor compiler for filtering, sorting and paginating typed
//! record collections.
//!
//! Callers describe what they want with small, untrusted descriptors (field
//! paths and operator tokens as strings, values as JSON scalars). Sieve checks
//! them against a static schema of the record type and a per-field access
//! policy, and compiles them into:
//!
//! - a [`Predicate`]: a boolean expression tree with existential quantifiers
//!   over nested collections, case-folding comparisons, cardinality tests and
//!   full-text hand-off;
//! - a [`SortChain`]: a lexicographic, stable multi-key comparator.
//!
//! Both can be evaluated in memory ([`Sieve::apply`]) or walked by another
//! backend.
//!
//! # Quick Start
//!
//! ```rust
//! use sieve::{Entity, FilterDescriptor, Query, Registry, Sieve, SieveOptions, SortDescriptor};
//!
//! #[derive(Entity)]
//! struct Comment {
//!     text: String,
//! }
//!
//! #[derive(Entity)]
//! struct User {
//!     name: String,
//!     age: i32,
//!     comments: Vec<Comment>,
//! }
//!
//! let users = vec![
//!     User { name: "alice".into(), age: 25, comments: vec![Comment { text: "good stuff".into() }] },
//!     User { name: "bob".into(), age: 30, comments: vec![] },
//!     User { name: "eve".into(), age: 40, comments: vec![] },
//! ];
//!
//! let registry = Registry::builder()
//!     .entity::<User>(|e| e.custom_filter("isSenior", |u: &User| u.age >= 40))
//!     .build();
//! let sieve = Sieve::new(registry, SieveOptions::default());
//!
//! let query = Query::new()
//!     .filter(FilterDescriptor::or([
//!         FilterDescriptor::leaf("comments.text", "@=", ["good"]),
//!         FilterDescriptor::leaf("isSenior", "==", [true]),
//!     ]))
//!     .sort(SortDescriptor::desc("age"));
//!
//! let page = sieve.apply(&query, &users).unwrap();
//! let names: Vec<&str> = page.iter().map(|u| u.name.as_str()).collect();
//! assert_eq!(names, ["eve", "alice"]);
//! ```
//!
//! # Operators
//!
//! | Token | Meaning | Combines values with |
//! |-------|---------|----------------------|
//! | `==` | equal | OR |
//! | `!=` | not equal | AND |
//! | `>` `<` `>=` `<=` | ordering | OR |
//! | `@=` `_=` `_-=` | contains / starts with / ends with | OR |
//! | `!@=` `!_=` `!_-=` | negated text forms | OR |
//! | `len==` ... `len<=` | cardinality of a string or collection | first value only |
//!
//! A trailing `*` (`==*`, `@=*`, ...) compares case-insensitively. On a
//! collection of scalars `@=` tests membership.
//!
//! # Strict and lenient mode
//!
//! With [`SieveOptions::throw_on_invalid_fields`] set, the first invalid
//! descriptor aborts compilation with a [`SieveError`]. Otherwise invalid
//! descriptors are skipped (and logged at `debug`), except malformed JSON
//! paths, which are always reported.

mod coerce;
mod config;
mod descriptor;
mod error;
mod filter;
mod json;
mod op;
mod options;
mod ordering;
mod predicate;
mod processor;
mod resolve;
mod schema;
mod search;
mod value;

#[cfg(test)]
mod fixtures;

pub use coerce::{coerce, parse_date, parse_datetime, parse_duration, parse_time};
pub use config::{
    CustomFilter, CustomSort, EntityBuilder, FieldBuilder, FieldConfig, Registry, RegistryBuilder,
};
pub use descriptor::{FilterDescriptor, FilterLeaf, Query, SortDescriptor};
pub use error::{Result, SieveError};
pub use filter::compile_filters;
pub use json::JsonPath;
pub use op::{Combine, Op, Operator};
pub use options::SieveOptions;
pub use ordering::{compile_sorts, Dir, SortChain, SortKey, SortTerm};
pub use predicate::{Predicate, Target};
pub use processor::Sieve;
pub use resolve::{resolve, Access, FieldPath, Member, Step};
pub use schema::{Entity, FieldDef, FieldValue, Kind, Record, Schema, SchemaBuilder, SchemaRef};
pub use search::{SimpleTextSearch, TextSearch};
pub use value::{compare_values, Number, Scalar, Value};

#[cfg(feature = "derive")]
pub use sieve_macros::Entity;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::OnceCell;
}
