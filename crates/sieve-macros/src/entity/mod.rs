//! Implementation of the `#[derive(Entity)]` macro.
//!
//! Generates the static field table and accessor that let sieve resolve
//! descriptor paths against a type without runtime reflection.

mod attrs;
mod derive;

pub use derive::entity_derive_impl;
