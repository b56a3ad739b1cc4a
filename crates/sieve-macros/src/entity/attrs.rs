//! Attribute parsing for the Entity derive macro.
//!
//! This module provides parsers for the `#[sieve(...)]` attributes accepted
//! on structs, fields and enum variants.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Attributes from `#[sieve(...)]`.
#[derive(Debug, Clone)]
pub struct SieveAttr {
    /// Leave this field out of the schema.
    pub skip: bool,
    /// Name used in descriptors (default: the Rust name).
    pub rename: Option<String>,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for SieveAttr {
    fn default() -> Self {
        SieveAttr {
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for SieveAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = SieveAttr {
            span: input.span(),
            ..SieveAttr::default()
        };

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => {
                    attr.skip = true;
                }

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        let name = s.value();
                        if name.is_empty() || name.contains('.') {
                            return Err(Error::new(
                                s.span(),
                                "rename must be a non-empty name without '.'",
                            ));
                        }
                        attr.rename = Some(name);
                    } else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown sieve attribute. Expected: skip or rename = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract `#[sieve(...)]` attributes. Several attributes are merged.
pub fn parse_sieve_attrs(attrs: &[Attribute]) -> Result<SieveAttr> {
    let mut merged = SieveAttr::default();
    for attr in attrs {
        if attr.path().is_ident("sieve") {
            let parsed = attr.parse_args::<SieveAttr>()?;
            merged.skip |= parsed.skip;
            if parsed.rename.is_some() {
                merged.rename = parsed.rename;
            }
            merged.span = parsed.span;
        }
    }
    Ok(merged)
}
