//! Implementation of the `#[derive(Entity)]` macro.
//!
//! On a struct with named fields this generates `Record`, `Entity` and
//! `FieldValue` implementations plus field name constants. On a fieldless
//! enum it generates a `FieldValue` implementation mapping each variant to
//! its declaration index.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DataEnum, DeriveInput, Error, Fields, FieldsNamed, Ident, Result};

use super::attrs::parse_sieve_attrs;

/// Main implementation of the Entity derive macro.
pub fn entity_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Entity cannot be derived for generic types",
        ));
    }

    let container = parse_sieve_attrs(&input.attrs)?;
    let entity_name = container
        .rename
        .unwrap_or_else(|| input.ident.to_string());

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => struct_impl(&input.ident, &entity_name, named),
            _ => Err(Error::new(
                input.span(),
                "Entity can only be derived for structs with named fields",
            )),
        },
        Data::Enum(data) => enum_impl(&input.ident, data),
        Data::Union(_) => Err(Error::new(
            input.span(),
            "Entity can only be derived for structs and fieldless enums",
        )),
    }
}

fn struct_impl(ident: &Ident, entity_name: &str, fields: &FieldsNamed) -> Result<TokenStream> {
    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut cardinality_matches: Vec<TokenStream> = Vec::new();
    let mut element_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut schema_fields: Vec<TokenStream> = Vec::new();

    for field in fields.named.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_sieve_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let query_name = attrs
            .rename
            .unwrap_or_else(|| field_name.to_string().trim_start_matches("r#").to_string());
        let const_name = format_ident!("{}", to_screaming_snake_case(&query_name));
        let ty = &field.ty;

        field_constants.push(quote! {
            /// Field name constant for type-safe descriptors.
            pub const #const_name: &'static str = #query_name;
        });

        field_matches.push(quote! {
            #query_name => ::sieve::FieldValue::value(&self.#field_name),
        });
        cardinality_matches.push(quote! {
            #query_name => ::sieve::FieldValue::cardinality(&self.#field_name),
        });
        element_matches.push(quote! {
            #query_name => ::sieve::FieldValue::any_element(&self.#field_name, f),
        });

        schema_fields.push(quote! {
            .field::<#ty>(#query_name)
        });
    }

    Ok(quote! {
        impl #ident {
            #(#field_constants)*
        }

        impl ::sieve::Record for #ident {
            fn field(&self, name: &str) -> ::sieve::Value<'_> {
                match name {
                    #(#field_matches)*
                    _ => ::sieve::Value::None,
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn field_cardinality(&self, name: &str) -> ::std::option::Option<usize> {
                match name {
                    #(#cardinality_matches)*
                    _ => ::std::option::Option::None,
                }
            }

            fn any_field_element(
                &self,
                name: &str,
                f: &mut dyn ::std::ops::FnMut(::sieve::Value<'_>) -> bool,
            ) -> bool {
                match name {
                    #(#element_matches)*
                    _ => false,
                }
            }
        }

        impl ::sieve::Entity for #ident {
            fn schema() -> &'static ::sieve::Schema {
                static SCHEMA: ::sieve::__private::OnceCell<::sieve::Schema> =
                    ::sieve::__private::OnceCell::new();
                SCHEMA.get_or_init(|| {
                    ::sieve::Schema::builder::<#ident>(#entity_name)
                        #(#schema_fields)*
                        .build()
                })
            }
        }

        impl ::sieve::FieldValue for #ident {
            fn kind() -> ::sieve::Kind {
                ::sieve::Kind::Record(::sieve::SchemaRef::of::<#ident>())
            }

            fn value(&self) -> ::sieve::Value<'_> {
                ::sieve::Value::Record(self)
            }
        }
    })
}

fn enum_impl(ident: &Ident, data: &DataEnum) -> Result<TokenStream> {
    if data.variants.is_empty() {
        return Err(Error::new(
            ident.span(),
            "Entity cannot be derived for enums without variants",
        ));
    }

    let mut names: Vec<String> = Vec::new();
    let mut arms: Vec<TokenStream> = Vec::new();

    for (index, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new(
                variant.span(),
                "Entity can only be derived for enums whose variants carry no data",
            ));
        }
        let attrs = parse_sieve_attrs(&variant.attrs)?;
        if attrs.skip {
            return Err(Error::new(attrs.span, "enum variants cannot be skipped"));
        }
        let variant_ident = &variant.ident;
        let index = index as u32;

        names.push(attrs.rename.unwrap_or_else(|| variant_ident.to_string()));
        arms.push(quote! {
            #ident::#variant_ident => #index,
        });
    }

    Ok(quote! {
        impl ::sieve::FieldValue for #ident {
            fn kind() -> ::sieve::Kind {
                ::sieve::Kind::Enum(&[#(#names),*])
            }

            fn value(&self) -> ::sieve::Value<'_> {
                ::sieve::Value::Enum(match self {
                    #(#arms)*
                })
            }
        }
    })
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}
