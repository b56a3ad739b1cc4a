//! The [`Sieve`] entry point.
//!
//! A `Sieve` bundles a frozen [`Registry`], [`SieveOptions`] and a full-text
//! backend. It compiles descriptors against an entity's schema and runs the
//! compiled artifacts over in-memory slices. Other backends can call
//! [`Sieve::compile_filters`] and [`Sieve::compile_sorts`] and walk the
//! results themselves.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::Registry;
use crate::descriptor::{FilterDescriptor, Query, SortDescriptor};
use crate::error::Result;
use crate::filter;
use crate::options::SieveOptions;
use crate::ordering::{self, SortChain};
use crate::predicate::Predicate;
use crate::schema::Entity;
use crate::search::{SimpleTextSearch, TextSearch};

/// Compiles and applies descriptors.
#[derive(Clone)]
pub struct Sieve {
    registry: Arc<Registry>,
    options: SieveOptions,
    search: Arc<dyn TextSearch>,
}

impl Default for Sieve {
    fn default() -> Self {
        Sieve::new(Registry::default(), SieveOptions::default())
    }
}

impl fmt::Debug for Sieve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sieve")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Sieve {
    /// Creates a sieve owning `registry`.
    pub fn new(registry: Registry, options: SieveOptions) -> Self {
        Self::shared(Arc::new(registry), options)
    }

    /// Creates a sieve sharing `registry` with others.
    pub fn shared(registry: Arc<Registry>, options: SieveOptions) -> Self {
        Sieve {
            registry,
            options,
            search: Arc::new(SimpleTextSearch),
        }
    }

    /// Replaces the full-text backend.
    pub fn text_search(mut self, search: impl TextSearch + 'static) -> Self {
        self.search = Arc::new(search);
        self
    }

    /// The field registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The options.
    pub fn options(&self) -> &SieveOptions {
        &self.options
    }

    /// Compiles filters for `T`. `None` means nothing filters.
    pub fn compile_filters<T: Entity>(&self, filters: &[FilterDescriptor]) -> Result<Option<Predicate>> {
        filter::compile_filters(filters, T::schema(), &self.registry, &self.options)
    }

    /// Compiles sort keys for `T`.
    pub fn compile_sorts<T: Entity>(&self, sorts: &[SortDescriptor]) -> Result<SortChain> {
        ordering::compile_sorts(sorts, T::schema(), &self.registry, &self.options)
    }

    /// Returns the records matching every filter, in input order.
    pub fn apply_filters<'a, T: Entity>(
        &self,
        filters: &[FilterDescriptor],
        items: &'a [T],
    ) -> Result<Vec<&'a T>> {
        let predicate = self.compile_filters::<T>(filters)?;
        let matched: Vec<&T> = match predicate {
            Some(predicate) => items
                .iter()
                .filter(|item| predicate.matches_with(*item, self.search.as_ref()))
                .collect(),
            None => items.iter().collect(),
        };
        debug!(
            entity = T::schema().name(),
            total = items.len(),
            matched = matched.len(),
            "applied filters"
        );
        Ok(matched)
    }

    /// Sorts records by the sort keys. Stable: records equal on every key
    /// keep their order.
    pub fn apply_sort<'a, T: Entity>(
        &self,
        sorts: &[SortDescriptor],
        mut items: Vec<&'a T>,
    ) -> Result<Vec<&'a T>> {
        let chain = self.compile_sorts::<T>(sorts)?;
        chain.sort_refs(&mut items);
        Ok(items)
    }

    /// Cuts one page out of `items`.
    ///
    /// See [`SieveOptions::page_window`] for how the page and size are
    /// normalised.
    pub fn apply_pagination<U>(&self, page: Option<i64>, page_size: Option<i64>, items: Vec<U>) -> Vec<U> {
        let (skip, take) = self.options.page_window(page, page_size);
        items.into_iter().skip(skip).take(take).collect()
    }

    /// Filters, sorts and paginates.
    pub fn apply<'a, T: Entity>(&self, query: &Query, items: &'a [T]) -> Result<Vec<&'a T>> {
        let matched = self.apply_filters(&query.filters, items)?;
        let sorted = self.apply_sort(&query.sorts, matched)?;
        Ok(self.apply_pagination(query.page, query.page_size, sorted))
    }
}
