//! Filter compilation.
//!
//! Turns a list of [`FilterDescriptor`]s into one [`Predicate`] over the root
//! entity. Top-level descriptors are AND-combined and OR-groups recurse. For a
//! leaf, the first matching rule wins:
//!
//! 1. the field's policy must allow filtering;
//! 2. vector leaves (flagged, or configured as vector fields) become
//!    full-text matches;
//! 3. a registered custom filter of that name is used as is, whatever the
//!    operator, though a `len` operator is rejected;
//! 4. JSON leaves compare the text of a node inside a JSON member;
//! 5. otherwise the path is resolved structurally. Crossing a collection of
//!    records wraps the rest of the comparison in [`Predicate::Any`].
//!
//! Within a leaf, each value yields one comparison. `!=` combines them with
//! AND, every other operator with OR. A descriptor that produces no
//! comparison (no values, only skipped nulls) contributes nothing.

use tracing::{debug, trace};

use crate::coerce::{coerce, coerce_length, text};
use crate::config::{FieldConfig, Registry};
use crate::descriptor::{FilterDescriptor, FilterLeaf};
use crate::error::{Result, SieveError};
use crate::json::{split_path, JsonPath};
use crate::op::{is_length_token, Combine, Op, Operator};
use crate::options::SieveOptions;
use crate::predicate::{Predicate, Target};
use crate::resolve::{resolve, Access, FieldPath, Member};
use crate::schema::{Kind, Schema};
use crate::value::Scalar;

/// Compiles filter descriptors for the entity described by `schema`.
///
/// Returns `None` when nothing filters.
pub fn compile_filters(
    filters: &[FilterDescriptor],
    schema: &'static Schema,
    registry: &Registry,
    options: &SieveOptions,
) -> Result<Option<Predicate>> {
    let compiler = FilterCompiler {
        schema,
        registry,
        options,
    };
    let predicate = compiler.compile_all(filters)?;
    trace!(entity = schema.name(), ?predicate, "compiled filters");
    Ok(predicate)
}

struct FilterCompiler<'a> {
    schema: &'static Schema,
    registry: &'a Registry,
    options: &'a SieveOptions,
}

impl FilterCompiler<'_> {
    fn compile_all(&self, filters: &[FilterDescriptor]) -> Result<Option<Predicate>> {
        let mut parts = Vec::with_capacity(filters.len());
        for filter in filters {
            if let Some(predicate) = self.guarded(filter)? {
                parts.push(predicate);
            }
        }
        Ok(Predicate::all(parts))
    }

    /// Compiles one descriptor, dropping it in lenient mode if it fails.
    fn guarded(&self, filter: &FilterDescriptor) -> Result<Option<Predicate>> {
        match self.compile(filter) {
            Err(err) if !self.options.throw_on_invalid_fields && err.is_policy() => {
                let field = filter.as_leaf().map_or("<or>", |leaf| leaf.field.as_str());
                debug!(entity = self.schema.name(), field, error = %err, "skipping filter descriptor");
                Ok(None)
            }
            other => other,
        }
    }

    fn compile(&self, filter: &FilterDescriptor) -> Result<Option<Predicate>> {
        match filter {
            FilterDescriptor::OrGroup(children) => {
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    if let Some(predicate) = self.guarded(child)? {
                        parts.push(predicate);
                    }
                }
                Ok(Predicate::any(parts))
            }
            FilterDescriptor::Leaf(leaf) => self.compile_leaf(leaf),
        }
    }

    fn compile_leaf(&self, leaf: &FilterLeaf) -> Result<Option<Predicate>> {
        if leaf.is_json {
            split_path(&leaf.field)?;
        }

        let config = self.policy(self.schema, &leaf.field)?;
        let path = config.map_or(leaf.field.as_str(), |c| c.name.as_str());

        if leaf.is_vector || config.is_some_and(|c| c.is_vector) {
            let language = config
                .and_then(|c| c.vector_language.clone())
                .unwrap_or_else(|| self.options.default_vector_language.clone());
            return self.vector(path, &language, &leaf.values);
        }

        if !leaf.is_json {
            if let Some(custom) = self.registry.custom_filter(self.schema.type_id(), path) {
                // operator and values are ignored, but a cardinality test is meaningless
                if is_length_token(&leaf.operator) {
                    return Err(SieveError::InvalidOperator(leaf.operator.clone()));
                }
                return Ok(Some(Predicate::Custom(custom.clone())));
            }
        }

        let operator = Operator::parse(&leaf.operator)?;

        if leaf.is_json {
            return self.json(path, operator, &leaf.values);
        }

        let resolved = resolve(self.schema, path)?;
        self.quantify(&resolved, &mut |access, member| {
            self.comparison(access, member, operator, &leaf.values)
        })
    }

    /// Checks that `path` may be filtered on `schema`'s entity and returns its
    /// configuration, if any.
    fn policy(&self, schema: &'static Schema, path: &str) -> Result<Option<&FieldConfig>> {
        let config = self.registry.field(schema.type_id(), path);
        if config.is_some_and(|c| !c.filterable) {
            return Err(SieveError::FieldNotFilterable(path.to_string()));
        }
        Ok(config)
    }

    /// Builds the predicate for the leaf of `path`, wrapping it in one
    /// [`Predicate::Any`] per collection crossed. Element-level policy is
    /// checked for every sub-path under a quantifier.
    fn quantify(
        &self,
        path: &FieldPath,
        build: &mut dyn FnMut(Access, &Member) -> Result<Option<Predicate>>,
    ) -> Result<Option<Predicate>> {
        let (access, any) = path.split();
        match any {
            None => build(access, path.leaf()),
            Some((element, sub)) => {
                self.policy(element.get(), &sub.to_string())?;
                let inner = self.quantify(sub, build)?;
                Ok(inner.map(|inner| Predicate::Any {
                    collection: access,
                    inner: Box::new(inner),
                }))
            }
        }
    }

    fn vector(&self, path: &str, language: &str, values: &[serde_json::Value]) -> Result<Option<Predicate>> {
        let terms: Vec<String> = values.iter().filter_map(text).collect();
        let resolved = resolve(self.schema, path)?;
        self.quantify(&resolved, &mut |access, member| {
            if terms.is_empty() {
                return Ok(None);
            }
            let textual = match &member.kind {
                Kind::String => true,
                Kind::List(element) => **element == Kind::String,
                _ => false,
            };
            if !textual {
                return Err(SieveError::compile(format!(
                    "vector field '{}' is not text",
                    path
                )));
            }
            let parts = terms
                .iter()
                .map(|term| Predicate::VectorMatch {
                    field: access.clone(),
                    language: language.to_string(),
                    term: term.clone(),
                })
                .collect();
            Ok(Predicate::any(parts))
        })
    }

    fn json(&self, path: &str, operator: Operator, values: &[serde_json::Value]) -> Result<Option<Predicate>> {
        if operator.length {
            return Err(SieveError::InvalidOperator(operator.to_string()));
        }
        let target = JsonPath::resolve(self.schema, path)?;
        let parts = values
            .iter()
            .filter_map(text)
            .map(|value| Predicate::Compare {
                target: Target::Json(target.clone()),
                op: operator.op,
                value: Scalar::String(value),
                case_insensitive: operator.case_insensitive,
            })
            .collect();
        Ok(combine(operator, parts))
    }

    fn comparison(
        &self,
        access: Access,
        member: &Member,
        operator: Operator,
        values: &[serde_json::Value],
    ) -> Result<Option<Predicate>> {
        if operator.length {
            return length(access, member, operator, values);
        }

        let invalid = || SieveError::InvalidOperator(operator.to_string());
        let kind = &member.kind;

        if let Kind::List(element) = kind {
            if !matches!(operator.op, Op::Contains | Op::NotContains) || !element.is_scalar() {
                return Err(invalid());
            }
            let mut parts = Vec::with_capacity(values.len());
            for raw in values {
                let value = coerce(raw, element)?;
                if value == Scalar::Null {
                    continue;
                }
                let contains = Predicate::ElementContains {
                    field: access.clone(),
                    value,
                    case_insensitive: operator.case_insensitive,
                };
                parts.push(if operator.op == Op::NotContains {
                    contains.negate()
                } else {
                    contains
                });
            }
            return Ok(combine(operator, parts));
        }

        if operator.op.is_text() && *kind != Kind::String {
            return Err(invalid());
        }
        if operator.op.is_ordering() && !kind.is_ordered() {
            return Err(invalid());
        }

        let mut parts = Vec::with_capacity(values.len());
        for raw in values {
            if raw.is_null() {
                if member.nullable && matches!(operator.op, Op::Eq | Op::Ne) {
                    let is_null = Predicate::IsNull(access.clone());
                    parts.push(if operator.op == Op::Ne {
                        is_null.negate()
                    } else {
                        is_null
                    });
                }
                continue;
            }
            if !kind.is_scalar() {
                return Err(SieveError::compile(format!(
                    "field '{}' of kind {} cannot be compared to a value",
                    access, kind
                )));
            }
            parts.push(Predicate::Compare {
                target: Target::Field(access.clone()),
                op: operator.op,
                value: coerce(raw, kind)?,
                case_insensitive: operator.case_insensitive,
            });
        }
        Ok(combine(operator, parts))
    }
}

fn length(
    access: Access,
    member: &Member,
    operator: Operator,
    values: &[serde_json::Value],
) -> Result<Option<Predicate>> {
    if !matches!(member.kind, Kind::String | Kind::List(_)) {
        return Ok(None);
    }
    let Some(raw) = values.first() else {
        return Ok(None);
    };
    Ok(Some(Predicate::Length {
        field: access,
        op: operator.op,
        value: coerce_length(raw)?,
    }))
}

fn combine(operator: Operator, parts: Vec<Predicate>) -> Option<Predicate> {
    match operator.combine() {
        Combine::And => Predicate::all(parts),
        Combine::Or => Predicate::any(parts),
    }
}
