//! Full-text matching.
//!
//! Vector filters are not compared directly: the text of the field and the
//! search term are handed to a [`TextSearch`] backend together with the
//! language configured for the field. [`SimpleTextSearch`] is the in-memory
//! default; a database-backed implementation would translate the same
//! arguments into its own full-text query.

/// A full-text matcher.
pub trait TextSearch: Send + Sync {
    /// Returns `true` if `text` matches the search `term` in `language`.
    fn matches(&self, text: &str, language: &str, term: &str) -> bool;
}

/// Case-insensitive word-prefix matcher.
///
/// Every whitespace-separated token of the term must be a prefix of some word
/// in the text. Words are runs of alphanumeric characters. The language is
/// ignored. An empty term matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTextSearch;

impl TextSearch for SimpleTextSearch {
    fn matches(&self, text: &str, _language: &str, term: &str) -> bool {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut tokens = term.split_whitespace().map(str::to_lowercase).peekable();
        if tokens.peek().is_none() {
            return false;
        }
        tokens.all(|token| words.iter().any(|word| word.starts_with(&token)))
    }
}

impl<T: TextSearch + ?Sized> TextSearch for &T {
    fn matches(&self, text: &str, language: &str, term: &str) -> bool {
        (**self).matches(text, language, term)
    }
}
