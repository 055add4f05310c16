//! Central prototype registry for the runtime object model.
//!
//! This module provides the [`PrototypeRegistry`], a thread-safe registry
//! holding every prototype known to the process. It is the model-side anchor
//! of the engine: prototypes are registered once by
//! [`PrototypeBuilder`](crate::model::PrototypeBuilder) and thereafter shared
//! immutably with every proxy builder derived from them.
//!
//! # Registry Architecture
//!
//! - **Token-based lookup**: Primary index keyed by [`Token`]
//! - **Name-based lookup**: Secondary index keyed by full name
//! - **Atomic token allocation**: Row indices for prototypes and members are
//!   handed out from atomic counters, so concurrent builders never collide
//!
//! # Thread Safety
//!
//! - Lock-free primary storage (`SkipMap`)
//! - Concurrent hash map for the name index (`DashMap`)
//! - Atomic operations for token generation
//!
//! # Examples
//!
//! ```rust
//! use proxyforge::model::{PrototypeBuilder, PrototypeRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PrototypeRegistry::new());
//! let prototype = PrototypeBuilder::new(registry.clone())
//!     .interface("MyApp", "ICalculator")
//!     .build()?;
//!
//! assert!(registry.get(&prototype.token).is_some());
//! assert!(registry.get_by_fullname("MyApp.ICalculator").is_some());
//! # Ok::<(), proxyforge::Error>(())
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::model::prototype::PrototypeRc;
use crate::model::token::Token;

/// Central registry of all prototypes in the process.
pub struct PrototypeRegistry {
    /// Primary storage, keyed by token
    prototypes: SkipMap<Token, PrototypeRc>,
    /// Secondary index, full name to token
    fullname_index: DashMap<String, Token>,
    /// Next row index for prototype tokens
    next_prototype_row: AtomicU32,
    /// Next row index for member tokens
    next_member_row: AtomicU32,
}

impl PrototypeRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        PrototypeRegistry {
            prototypes: SkipMap::new(),
            fullname_index: DashMap::new(),
            next_prototype_row: AtomicU32::new(1),
            next_member_row: AtomicU32::new(1),
        }
    }

    /// Allocates the next prototype token
    pub(crate) fn next_prototype_token(&self) -> Token {
        Token::prototype(self.next_prototype_row.fetch_add(1, Ordering::Relaxed))
    }

    /// Allocates the next member token
    pub(crate) fn next_member_token(&self) -> Token {
        Token::member(self.next_member_row.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a prototype, making it available for lookup
    pub fn insert(&self, prototype: &PrototypeRc) {
        self.fullname_index
            .insert(prototype.fullname(), prototype.token);
        self.prototypes.insert(prototype.token, prototype.clone());
    }

    /// Looks up a prototype by token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<PrototypeRc> {
        self.prototypes
            .get(token)
            .map(|entry| entry.value().clone())
    }

    /// Looks up a prototype by full name (Namespace.Name)
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<PrototypeRc> {
        self.fullname_index
            .get(fullname)
            .and_then(|token| self.get(token.value()))
    }

    /// Number of registered prototypes
    #[must_use]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// True if no prototype has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Iterates over all registered prototypes
    pub fn iter(&self) -> crossbeam_skiplist::map::Iter<'_, Token, PrototypeRc> {
        self.prototypes.iter()
    }
}

impl Default for PrototypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a PrototypeRegistry {
    type Item = crossbeam_skiplist::map::Entry<'a, Token, PrototypeRc>;
    type IntoIter = crossbeam_skiplist::map::Iter<'a, Token, PrototypeRc>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::prototype::{Prototype, PrototypeFlags, PrototypeKind};

    fn register_sample(registry: &PrototypeRegistry, name: &str) -> PrototypeRc {
        let prototype = Arc::new(Prototype {
            token: registry.next_prototype_token(),
            namespace: "MyApp".to_string(),
            name: name.to_string(),
            kind: PrototypeKind::Interface,
            flags: PrototypeFlags::PUBLIC,
            members: Arc::new(boxcar::Vec::new()),
            constructors: Arc::new(boxcar::Vec::new()),
            generic_params: Arc::new(boxcar::Vec::new()),
            declared_interceptors: Arc::new(boxcar::Vec::new()),
        });
        registry.insert(&prototype);
        prototype
    }

    #[test]
    fn test_insert_and_lookup() {
        let registry = PrototypeRegistry::new();
        let prototype = register_sample(&registry, "ICalculator");

        let by_token = registry.get(&prototype.token).unwrap();
        assert_eq!(by_token.name, "ICalculator");

        let by_name = registry.get_by_fullname("MyApp.ICalculator").unwrap();
        assert_eq!(by_name.token, prototype.token);

        assert!(registry.get_by_fullname("MyApp.Missing").is_none());
    }

    #[test]
    fn test_token_allocation_is_unique() {
        let registry = PrototypeRegistry::new();
        let first = register_sample(&registry, "A");
        let second = register_sample(&registry, "B");

        assert_ne!(first.token, second.token);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_member_tokens_distinct_from_prototype_tokens() {
        let registry = PrototypeRegistry::new();
        let prototype_token = registry.next_prototype_token();
        let member_token = registry.next_member_token();

        assert_ne!(prototype_token.table(), member_token.table());
    }

    #[test]
    fn test_iteration() {
        let registry = PrototypeRegistry::new();
        register_sample(&registry, "A");
        register_sample(&registry, "B");

        let names: Vec<String> = registry
            .iter()
            .map(|entry| entry.value().name.clone())
            .collect();
        assert_eq!(names.len(), 2);
    }
}
