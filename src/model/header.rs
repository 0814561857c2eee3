//! Header normalization and fuzzy column resolution.
//!
//! Source workbooks name their columns inconsistently — punctuation, casing
//! and wording drift between exports. Lookups therefore go through a
//! normalized form (lowercase, ASCII alphanumerics only) and match by
//! substring containment.

use std::fmt::Debug;

/// Lowercases a header and strips every character that is not an ASCII letter
/// or digit. Idempotent: normalizing a normalized string is a no-op.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Maps the actual header row of a sheet to column indices, resolvable by a
/// normalized semantic key.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct HeaderMap {
    headers: Vec<String>,
    normalized: Vec<String>,
}

impl HeaderMap {
    /// Builds a `HeaderMap` from the actual header row, preserving column
    /// order. Order is significant: resolution returns the first match.
    pub fn new<S, I>(headers: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<String> = headers.into_iter().map(|s| s.into()).collect();
        let normalized = headers.iter().map(|h| normalize_header(h)).collect();
        Self {
            headers,
            normalized,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Resolves a semantic key (e.g. "expense to amortize for period") to the
    /// index of the first column whose normalized header contains the
    /// normalized key as a substring. Returns `None` if no header matches;
    /// callers must treat that as fatal for required columns.
    ///
    /// First match wins. This is a deliberate, fragile heuristic carried over
    /// for compatibility with the source workbooks: when two headers both
    /// contain the key, the leftmost column is chosen.
    pub fn resolve(&self, key: &str) -> Option<usize> {
        let target = normalize_header(key);
        if target.is_empty() {
            return None;
        }
        self.normalized.iter().position(|n| n.contains(&target))
    }

    /// Like [`resolve`](Self::resolve), but returns the original header text.
    pub fn resolve_name(&self, key: &str) -> Option<&str> {
        self.resolve(key).map(|ix| self.headers[ix].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_header("Expense to Amortize for Period ($)"),
            "expensetoamortizeforperiod"
        );
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize_header("Company Proceeds (USD)");
        assert_eq!(normalize_header(&once), once);
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_header("  !! "), "");
    }

    #[test]
    fn test_resolve_by_containment() {
        let map = HeaderMap::new(vec![
            "Entity",
            "Dept",
            "Expense to Amortize for Period ($USD)",
            "Company Proceeds",
        ]);
        assert_eq!(map.resolve("expense to amortize for period"), Some(2));
        assert_eq!(map.resolve("companyproceeds"), Some(3));
    }

    #[test]
    fn test_resolve_first_match_wins() {
        // Both columns contain "debit"; the leftmost one is chosen.
        let map = HeaderMap::new(vec!["Debit (Local)", "Debit (USD)"]);
        assert_eq!(map.resolve("debit"), Some(0));
    }

    #[test]
    fn test_resolve_not_found() {
        let map = HeaderMap::new(vec!["Entity", "Dept"]);
        assert_eq!(map.resolve("credit"), None);
    }

    #[test]
    fn test_resolve_empty_key_never_matches() {
        let map = HeaderMap::new(vec!["Entity"]);
        assert_eq!(map.resolve(""), None);
    }

    #[test]
    fn test_resolve_name() {
        let map = HeaderMap::new(vec!["Entity", "Expense (Fair Value) of Vested"]);
        assert_eq!(
            map.resolve_name("expensefairvalueofvested"),
            Some("Expense (Fair Value) of Vested")
        );
    }
}
