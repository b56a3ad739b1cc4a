//! Procedural macros for sieve.
//!
//! - [`Entity`] - Generate the static field table of a record type

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod entity;

/// Derives the sieve field table for a struct, or the enum kind for a
/// fieldless enum.
///
/// On a struct with named fields this implements `sieve::Record`,
/// `sieve::Entity` and `sieve::FieldValue` (so the struct can be nested in
/// other entities, directly, in an `Option` or in a `Vec`), and adds one
/// `&'static str` constant per field. Every field type must implement
/// `sieve::FieldValue`.
///
/// On an enum whose variants carry no data it implements
/// `sieve::FieldValue`, ordering variants by declaration.
///
/// # Attributes
///
/// | Attribute | On | Effect |
/// |-----------|----|--------|
/// | `#[sieve(skip)]` | field | leave the field out of the schema |
/// | `#[sieve(rename = "x")]` | field | descriptor name of the field |
/// | `#[sieve(rename = "x")]` | struct | entity name in error messages |
/// | `#[sieve(rename = "x")]` | variant | name used when parsing values |
///
/// # Example
///
/// ```ignore
/// use sieve::Entity;
///
/// #[derive(Entity)]
/// enum Status {
///     Active,
///     Banned,
/// }
///
/// #[derive(Entity)]
/// struct User {
///     name: String,
///     #[sieve(rename = "years")]
///     age: u32,
///     status: Status,
///     email: Option<String>,
///     #[sieve(skip)]
///     password_hash: String,
/// }
///
/// assert_eq!(User::YEARS, "years");
/// ```
#[proc_macro_derive(Entity, attributes(sieve))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::entity_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
