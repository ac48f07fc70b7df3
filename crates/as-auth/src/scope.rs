//! Scope sets and the `scope` claim encoding.
//!
//! A token carries its scopes in a single `scope` claim, joined with one
//! ASCII space. There is no escaping, so a scope can never contain
//! whitespace.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;

/// Separator used in the `scope` claim.
pub const SCOPE_SEPARATOR: char = ' ';

/// An ordered set of scope strings.
///
/// Iteration and [`ScopeSet::to_claim`] are lexicographic, so the encoded
/// claim is stable for a given set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `scope` claim value.
    ///
    /// Splits on single spaces; runs of spaces yield an empty scope, which
    /// is kept so that it is never silently accepted as a registered scope.
    #[must_use]
    pub fn from_claim(claim: &str) -> Self {
        claim.split(SCOPE_SEPARATOR).map(str::to_owned).collect()
    }

    /// Encodes the set as a `scope` claim value.
    #[must_use]
    pub fn to_claim(&self) -> String {
        let mut joined = String::new();
        for (i, scope) in self.0.iter().enumerate() {
            if i > 0 {
                joined.push(SCOPE_SEPARATOR);
            }
            joined.push_str(scope);
        }
        joined
    }

    /// Returns `true` if the set contains `scope`.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// Returns `true` if every scope in `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &ScopeSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns the scopes of `self` that are missing from `other`.
    pub fn difference<'a>(&'a self, other: &'a ScopeSet) -> impl Iterator<Item = &'a str> {
        self.0.difference(&other.0).map(String::as_str)
    }

    /// Number of scopes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set has no scopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the scopes in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Checks that the set can be encoded into a `scope` claim.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the set is empty, or if any scope is
    /// empty or contains whitespace.
    pub fn ensure_issuable(&self) -> AuthResult<()> {
        if self.is_empty() {
            return Err(AuthError::invalid_argument("Token scopes must be specified"));
        }
        if let Some(bad) = self
            .iter()
            .find(|s| s.is_empty() || s.chars().any(char::is_whitespace))
        {
            return Err(AuthError::invalid_argument(format!(
                "Token scope {bad:?} must be non-empty and contain no whitespace"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_claim())
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for ScopeSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScopeSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
