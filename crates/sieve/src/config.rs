//! Field configuration registry.
//!
//! The registry records, per entity type, which fields may be filtered or
//! sorted, which are full-text (vector) fields, their aliases, and named
//! custom filters and sort keys. Fields that were never configured are fully
//! permitted: access is restricted explicitly, not granted explicitly.
//!
//! A [`Registry`] is produced once by [`RegistryBuilder::build`] and has no
//! mutating methods afterwards, so it can be shared freely between threads.
//!
//! # Example
//!
//! ```ignore
//! let registry = Registry::builder()
//!     .entity::<User>(|e| {
//!         e.not_sortable("email")
//!             .field("bio", |f| f.vector().vector_language("simple"))
//!             .field("fullName", |f| f.alias("name"))
//!             .custom_filter("isAdult", |u: &User| u.age >= 18)
//!             .custom_sort("nameLength", |u: &User| u.name.len())
//!     })
//!     .build();
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::schema::{Entity, Record};
use crate::value::Scalar;

type FilterFn = dyn Fn(&dyn Record) -> bool + Send + Sync;
type SortFn = dyn Fn(&dyn Record) -> Scalar + Send + Sync;

/// Access policy and metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    /// The field name as configured.
    pub name: String,
    /// May appear in sort descriptors.
    pub sortable: bool,
    /// May appear in filter descriptors.
    pub filterable: bool,
    /// Alternative name descriptors may use for this field.
    pub alias: Option<String>,
    /// Filters on this field are handed to the full-text backend.
    pub is_vector: bool,
    /// Full-text language override.
    pub vector_language: Option<String>,
}

impl FieldConfig {
    fn new(name: &str) -> Self {
        FieldConfig {
            name: name.to_string(),
            sortable: true,
            filterable: true,
            alias: None,
            is_vector: false,
            vector_language: None,
        }
    }
}

/// A named predicate registered for an entity.
#[derive(Clone)]
pub struct CustomFilter {
    name: String,
    f: Arc<FilterFn>,
}

impl CustomFilter {
    /// Wraps a typed predicate. Records of any other type never match.
    pub fn new<T, F>(name: impl Into<String>, f: F) -> Self
    where
        T: Record,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        CustomFilter {
            name: name.into(),
            f: Arc::new(move |record: &dyn Record| {
                record.downcast_ref::<T>().is_some_and(|r| f(r))
            }),
        }
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the predicate.
    pub fn matches(&self, record: &dyn Record) -> bool {
        (self.f)(record)
    }
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomFilter").field(&self.name).finish()
    }
}

impl PartialEq for CustomFilter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.f, &other.f)
    }
}

/// A named sort key registered for an entity.
#[derive(Clone)]
pub struct CustomSort {
    name: String,
    f: Arc<SortFn>,
}

impl CustomSort {
    /// Wraps a typed key selector. Records of any other type get a null key.
    pub fn new<T, K, F>(name: impl Into<String>, f: F) -> Self
    where
        T: Record,
        K: Into<Scalar>,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        CustomSort {
            name: name.into(),
            f: Arc::new(move |record: &dyn Record| {
                record
                    .downcast_ref::<T>()
                    .map_or(Scalar::Null, |r| f(r).into())
            }),
        }
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Computes the key for a record.
    pub fn key(&self, record: &dyn Record) -> Scalar {
        (self.f)(record)
    }
}

impl fmt::Debug for CustomSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomSort").field(&self.name).finish()
    }
}

impl PartialEq for CustomSort {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.f, &other.f)
    }
}

#[derive(Debug, Clone, Default)]
struct EntityConfig {
    fields: HashMap<String, FieldConfig>,
    aliases: HashMap<String, String>,
    custom_filters: HashMap<String, CustomFilter>,
    custom_sorts: HashMap<String, CustomSort>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Frozen per-entity field policy.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entities: HashMap<TypeId, EntityConfig>,
}

impl Registry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up a field's configuration by name or alias, ignoring case.
    ///
    /// `None` means the field is unrestricted.
    pub fn field(&self, entity: TypeId, name: &str) -> Option<&FieldConfig> {
        let config = self.entities.get(&entity)?;
        let name = key(name);
        config.fields.get(&name).or_else(|| {
            config
                .aliases
                .get(&name)
                .and_then(|target| config.fields.get(target))
        })
    }

    /// Looks up a named custom filter, ignoring case.
    pub fn custom_filter(&self, entity: TypeId, name: &str) -> Option<&CustomFilter> {
        self.entities
            .get(&entity)?
            .custom_filters
            .get(&key(name))
    }

    /// Looks up a named custom sort key, ignoring case.
    pub fn custom_sort(&self, entity: TypeId, name: &str) -> Option<&CustomSort> {
        self.entities.get(&entity)?.custom_sorts.get(&key(name))
    }
}

/// Builder for [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entities: HashMap<TypeId, EntityConfig>,
}

impl RegistryBuilder {
    /// Configures an entity type. May be called repeatedly for the same type;
    /// later calls add to earlier ones.
    pub fn entity<T: Entity>(
        mut self,
        configure: impl FnOnce(EntityBuilder<T>) -> EntityBuilder<T>,
    ) -> Self {
        let id = TypeId::of::<T>();
        let config = self.entities.remove(&id).unwrap_or_default();
        let built = configure(EntityBuilder {
            config,
            _entity: PhantomData,
        });
        self.entities.insert(id, built.config);
        self
    }

    /// Freezes the configuration.
    pub fn build(self) -> Registry {
        Registry {
            entities: self.entities,
        }
    }
}

/// Configures the fields and hooks of one entity type.
pub struct EntityBuilder<T> {
    config: EntityConfig,
    _entity: PhantomData<fn(&T)>,
}

impl<T: Entity> EntityBuilder<T> {
    /// Configures a field. Nested fields are named by their dotted path.
    pub fn field(mut self, name: &str, configure: impl FnOnce(FieldBuilder) -> FieldBuilder) -> Self {
        let k = key(name);
        let existing = self
            .config
            .fields
            .remove(&k)
            .unwrap_or_else(|| FieldConfig::new(name));
        let previous_alias = existing.alias.as_deref().map(key);

        let field = configure(FieldBuilder { config: existing }).config;

        if let Some(old) = previous_alias {
            self.config.aliases.remove(&old);
        }
        if let Some(alias) = &field.alias {
            self.config.aliases.insert(key(alias), k.clone());
        }
        self.config.fields.insert(k, field);
        self
    }

    /// Excludes a field from sorting.
    pub fn not_sortable(self, name: &str) -> Self {
        self.field(name, |f| f.sortable(false))
    }

    /// Excludes a field from filtering.
    pub fn not_filterable(self, name: &str) -> Self {
        self.field(name, |f| f.filterable(false))
    }

    /// Registers a named filter. A leaf descriptor whose field is `name`
    /// uses this predicate instead of a comparison.
    pub fn custom_filter<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.config
            .custom_filters
            .insert(key(name), CustomFilter::new::<T, F>(name, f));
        self
    }

    /// Registers a named sort key. A sort descriptor whose field is `name`
    /// orders by this key.
    pub fn custom_sort<K, F>(mut self, name: &str, f: F) -> Self
    where
        K: Into<Scalar>,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.config
            .custom_sorts
            .insert(key(name), CustomSort::new::<T, K, F>(name, f));
        self
    }
}

/// Configures one field.
#[derive(Debug)]
pub struct FieldBuilder {
    config: FieldConfig,
}

impl FieldBuilder {
    /// Allows or forbids sorting.
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.config.sortable = sortable;
        self
    }

    /// Allows or forbids filtering.
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.config.filterable = filterable;
        self
    }

    /// Sets an alternative name.
    pub fn alias(mut self, alias: &str) -> Self {
        self.config.alias = Some(alias.to_string());
        self
    }

    /// Marks the field as a full-text field.
    pub fn vector(mut self) -> Self {
        self.config.is_vector = true;
        self
    }

    /// Marks the field as a full-text field with a language override.
    pub fn vector_language(mut self, language: &str) -> Self {
        self.config.is_vector = true;
        self.config.vector_language = Some(language.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{users, Post, User};

    fn registry() -> Registry {
        Registry::builder()
            .entity::<User>(|e| {
                e.not_sortable("Email")
                    .not_filterable("email")
                    .field("name", |f| f.alias("FullName"))
                    .field("comments.text", |f| f.vector_language("simple"))
                    .custom_filter("isAdult", |u: &User| u.age >= 30)
                    .custom_sort("nameLength", |u: &User| u.name.len())
            })
            .build()
    }

    #[test]
    fn unconfigured_fields_are_absent() {
        let registry = registry();
        assert!(registry.field(TypeId::of::<User>(), "age").is_none());
        assert!(registry.field(TypeId::of::<Post>(), "title").is_none());
    }

    #[test]
    fn flags_toggle_independently_and_accumulate() {
        let registry = registry();
        let email = registry.field(TypeId::of::<User>(), "EMAIL").unwrap();
        assert!(!email.sortable);
        assert!(!email.filterable);
        assert_eq!(email.name, "Email");
    }

    #[test]
    fn alias_finds_field() {
        let registry = registry();
        let by_alias = registry.field(TypeId::of::<User>(), "fullname").unwrap();
        assert_eq!(by_alias.name, "name");
        assert!(by_alias.sortable);
    }

    #[test]
    fn vector_language_implies_vector() {
        let registry = registry();
        let text = registry
            .field(TypeId::of::<User>(), "Comments.Text")
            .unwrap();
        assert!(text.is_vector);
        assert_eq!(text.vector_language.as_deref(), Some("simple"));
    }

    #[test]
    fn custom_hooks_are_bound_to_entity_type() {
        let registry = registry();
        let all = users();
        let filter = registry
            .custom_filter(TypeId::of::<User>(), "ISADULT")
            .unwrap();
        assert_eq!(filter.name(), "isAdult");
        assert!(!filter.matches(&all[0]));
        assert!(filter.matches(&all[1]));

        let sort = registry.custom_sort(TypeId::of::<User>(), "namelength").unwrap();
        assert_eq!(sort.key(&all[2]), Scalar::from(7usize));

        assert!(registry.custom_filter(TypeId::of::<Post>(), "isAdult").is_none());
    }

    #[test]
    fn custom_filter_rejects_other_record_types() {
        let filter = CustomFilter::new("always", |_: &Post| true);
        assert!(!filter.matches(&users()[0]));
    }

    #[test]
    fn realiasing_drops_the_old_alias() {
        let registry = Registry::builder()
            .entity::<User>(|e| e.field("name", |f| f.alias("first")))
            .entity::<User>(|e| e.field("name", |f| f.alias("second")))
            .build();
        assert!(registry.field(TypeId::of::<User>(), "first").is_none());
        assert!(registry.field(TypeId::of::<User>(), "second").is_some());
    }
}
