//! Global options.
//!
//! Options are plain data with serde support, so they can be embedded in an
//! application's own configuration or loaded from a standalone YAML or JSON
//! file:
//!
//! ```yaml
//! defaultPageSize: 20
//! maxPageSize: 100
//! defaultVectorLanguage: simple
//! throwOnInvalidFields: true
//! ```
//!
//! Missing keys keep their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SieveError};

/// Settings shared by every compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SieveOptions {
    /// Page size used when a query gives none (or a non-positive one).
    pub default_page_size: u32,
    /// Upper bound for any page size.
    pub max_page_size: u32,
    /// Full-text language for vector fields without an override.
    pub default_vector_language: String,
    /// Abort on invalid descriptors instead of skipping them.
    pub throw_on_invalid_fields: bool,
}

impl Default for SieveOptions {
    fn default() -> Self {
        SieveOptions {
            default_page_size: 10,
            max_page_size: 50,
            default_vector_language: "english".to_string(),
            throw_on_invalid_fields: false,
        }
    }
}

impl SieveOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from YAML.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parses options from JSON.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| SieveError::Options(e.to_string()))
    }

    /// Loads options from a file. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SieveError::Options(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Sets the default page size.
    pub fn default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    /// Sets the maximum page size.
    pub fn max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size;
        self
    }

    /// Sets the default full-text language.
    pub fn default_vector_language(mut self, language: impl Into<String>) -> Self {
        self.default_vector_language = language.into();
        self
    }

    /// Enables or disables strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.throw_on_invalid_fields = strict;
        self
    }

    /// Resolves a requested page number and size into `(skip, take)`.
    ///
    /// Pages are 1-based; anything below 1 is page 1. A missing or
    /// non-positive size falls back to the default, and every size is capped
    /// at the maximum.
    pub fn page_window(&self, page: Option<i64>, page_size: Option<i64>) -> (usize, usize) {
        let page = page.unwrap_or(1).max(1);
        let size = match page_size {
            Some(size) if size > 0 => size,
            _ => i64::from(self.default_page_size),
        };
        let size = size.min(i64::from(self.max_page_size)).max(0);

        let take = usize::try_from(size).unwrap_or(usize::MAX);
        let skip = usize::try_from(page - 1)
            .unwrap_or(usize::MAX)
            .saturating_mul(take);
        (skip, take)
    }
}
