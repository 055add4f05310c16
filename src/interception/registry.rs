//! Ordered interceptor registrations, member-scoped and type-scoped.
//!
//! The registry is the mutable half of a proxy builder's configuration: it
//! holds, per overridable member, the ordered list of member-scoped handler
//! registrations, plus a separate ordered list of type-scoped registrations
//! applied to every qualifying member. Registrations are append-only and
//! ordered by registration sequence.
//!
//! Once the owning builder produces its proxy type the registry is frozen;
//! all further registration fails deterministically with
//! [`Error::BuildAlreadyFinalized`] and causes no partial mutation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::interception::invocation::{InterceptHandlerRc, MemberPredicate};
use crate::model::{MemberRc, Token};
use crate::{Error, Result};

/// Selects which members a member-scoped registration applies to.
#[derive(Clone)]
pub enum MemberSelector {
    /// Every overridable member of the prototype
    All,
    /// An explicit member set; every entry must be an overridable member
    Members(Vec<MemberRc>),
    /// Members matching a predicate
    Filter(MemberPredicate),
}

/// One type-scoped registration: a handler plus its own applicability filter.
#[derive(Clone)]
pub(crate) struct TypeScopedRegistration {
    pub handler: InterceptHandlerRc,
    pub filter: Option<MemberPredicate>,
}

/// Immutable copy of the registration state, taken when the registry freezes.
pub(crate) struct RegistrySnapshot {
    /// Member token to its ordered member-scoped handlers
    pub member_scoped: HashMap<Token, Vec<InterceptHandlerRc>>,
    /// Ordered type-scoped registrations
    pub type_scoped: Vec<TypeScopedRegistration>,
}

struct RegistryState {
    frozen: bool,
    member_scoped: HashMap<Token, Vec<InterceptHandlerRc>>,
    type_scoped: Vec<TypeScopedRegistration>,
}

/// Holds the ordered interceptor registrations for one proxy builder.
pub struct InterceptorRegistry {
    /// The prototype's overridable member set, fixed at analysis time
    members: Vec<MemberRc>,
    state: RwLock<RegistryState>,
}

impl InterceptorRegistry {
    /// Creates an empty registry over the given overridable member set
    pub(crate) fn new(members: Vec<MemberRc>) -> Self {
        InterceptorRegistry {
            members,
            state: RwLock::new(RegistryState {
                frozen: false,
                member_scoped: HashMap::new(),
                type_scoped: Vec::new(),
            }),
        }
    }

    /// The overridable member set the registry validates against
    #[must_use]
    pub fn members(&self) -> &[MemberRc] {
        &self.members
    }

    /// Appends a member-scoped registration for every member the selector matches.
    ///
    /// Matching members receive the handler in call-site order; the explicit
    /// member set form validates every entry before any mutation occurs.
    ///
    /// # Errors
    /// - [`Error::BuildAlreadyFinalized`] if the registry is frozen
    /// - [`Error::InvalidArgument`] if an explicit member set is empty
    /// - [`Error::MemberNotOverridable`] if an explicit member is not part of
    ///   the prototype's overridable member set
    pub fn register(&self, handler: InterceptHandlerRc, selector: &MemberSelector) -> Result<()> {
        let targets = self.resolve_selector(selector)?;

        let mut state = self.state.write().map_err(|_| Error::LockError)?;
        if state.frozen {
            return Err(Error::BuildAlreadyFinalized);
        }
        for token in targets {
            state
                .member_scoped
                .entry(token)
                .or_default()
                .push(handler.clone());
        }
        Ok(())
    }

    /// Appends a type-scoped registration applied to every qualifying member.
    ///
    /// # Errors
    /// Returns [`Error::BuildAlreadyFinalized`] if the registry is frozen.
    pub fn register_for_type(&self, handler: InterceptHandlerRc) -> Result<()> {
        self.push_type_scoped(TypeScopedRegistration {
            handler,
            filter: None,
        })
    }

    /// Appends a type-scoped registration narrowed by its own applicability
    /// predicate.
    ///
    /// # Errors
    /// Returns [`Error::BuildAlreadyFinalized`] if the registry is frozen.
    pub fn register_for_type_filtered(
        &self,
        handler: InterceptHandlerRc,
        filter: MemberPredicate,
    ) -> Result<()> {
        self.push_type_scoped(TypeScopedRegistration {
            handler,
            filter: Some(filter),
        })
    }

    /// True once the owning builder has produced its proxy type
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if the registry lock is poisoned.
    pub fn is_frozen(&self) -> Result<bool> {
        Ok(self.state.read().map_err(|_| Error::LockError)?.frozen)
    }

    /// Freezes the registry and returns the immutable registration snapshot
    /// synthesis compiles from.
    pub(crate) fn freeze(&self) -> Result<RegistrySnapshot> {
        let mut state = self.state.write().map_err(|_| Error::LockError)?;
        state.frozen = true;
        Ok(RegistrySnapshot {
            member_scoped: state.member_scoped.clone(),
            type_scoped: state.type_scoped.clone(),
        })
    }

    fn push_type_scoped(&self, registration: TypeScopedRegistration) -> Result<()> {
        let mut state = self.state.write().map_err(|_| Error::LockError)?;
        if state.frozen {
            return Err(Error::BuildAlreadyFinalized);
        }
        state.type_scoped.push(registration);
        Ok(())
    }

    /// Resolves a selector to the matching member tokens, validating explicit
    /// sets in full before returning.
    fn resolve_selector(&self, selector: &MemberSelector) -> Result<Vec<Token>> {
        match selector {
            MemberSelector::All => Ok(self.members.iter().map(|m| m.token).collect()),
            MemberSelector::Members(list) => {
                if list.is_empty() {
                    return Err(Error::InvalidArgument(
                        "explicit member set is empty".to_string(),
                    ));
                }
                for member in list {
                    if !self.members.iter().any(|m| m.token == member.token) {
                        return Err(Error::MemberNotOverridable(member.name.clone()));
                    }
                }
                Ok(list.iter().map(|m| m.token).collect())
            }
            MemberSelector::Filter(predicate) => Ok(self
                .members
                .iter()
                .filter(|m| predicate(m))
                .map(|m| m.token)
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{ChainValue, Member, MemberFlags, MemberSignature};

    fn member(row: u32, name: &str) -> MemberRc {
        Arc::new(Member {
            token: Token::member(row),
            name: name.to_string(),
            declaring: Token::prototype(1),
            flags: MemberFlags::PUBLIC | MemberFlags::VIRTUAL,
            signature: MemberSignature::default(),
            body: None,
            declared_interceptors: Vec::new(),
        })
    }

    fn noop_handler() -> InterceptHandlerRc {
        Arc::new(|invocation| invocation.proceed())
    }

    #[test]
    fn test_register_all_preserves_order() {
        let registry = InterceptorRegistry::new(vec![member(1, "add"), member(2, "sub")]);
        let first = noop_handler();
        let second = noop_handler();

        registry.register(first.clone(), &MemberSelector::All).unwrap();
        registry.register(second.clone(), &MemberSelector::All).unwrap();

        let snapshot = registry.freeze().unwrap();
        let handlers = &snapshot.member_scoped[&Token::member(1)];
        assert_eq!(handlers.len(), 2);
        assert!(Arc::ptr_eq(&handlers[0], &first));
        assert!(Arc::ptr_eq(&handlers[1], &second));
    }

    #[test]
    fn test_register_explicit_empty_set() {
        let registry = InterceptorRegistry::new(vec![member(1, "add")]);
        let result = registry.register(noop_handler(), &MemberSelector::Members(Vec::new()));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_register_foreign_member_no_partial_mutation() {
        let known = member(1, "add");
        let foreign = member(99, "other");
        let registry = InterceptorRegistry::new(vec![known.clone()]);

        let result = registry.register(
            noop_handler(),
            &MemberSelector::Members(vec![known, foreign]),
        );
        assert!(matches!(result, Err(Error::MemberNotOverridable(name)) if name == "other"));

        // The valid entry of the failed call must not have been appended.
        let snapshot = registry.freeze().unwrap();
        assert!(snapshot.member_scoped.is_empty());
    }

    #[test]
    fn test_register_filter_matches_subset() {
        let registry = InterceptorRegistry::new(vec![member(1, "add"), member(2, "sub")]);
        let selector = MemberSelector::Filter(Arc::new(|m: &Member| m.name == "add"));
        registry.register(noop_handler(), &selector).unwrap();

        let snapshot = registry.freeze().unwrap();
        assert!(snapshot.member_scoped.contains_key(&Token::member(1)));
        assert!(!snapshot.member_scoped.contains_key(&Token::member(2)));
    }

    #[test]
    fn test_frozen_registry_rejects_registration() {
        let registry = InterceptorRegistry::new(vec![member(1, "add")]);
        registry.freeze().unwrap();

        let member_scoped = registry.register(noop_handler(), &MemberSelector::All);
        assert!(matches!(member_scoped, Err(Error::BuildAlreadyFinalized)));

        let type_scoped = registry.register_for_type(noop_handler());
        assert!(matches!(type_scoped, Err(Error::BuildAlreadyFinalized)));

        let handler: InterceptHandlerRc = Arc::new(|_| Ok(ChainValue::void()));
        let filtered = registry.register_for_type_filtered(handler, Arc::new(|_| true));
        assert!(matches!(filtered, Err(Error::BuildAlreadyFinalized)));
    }
}
