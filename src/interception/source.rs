//! Configuration sources feeding ordered registrations into a builder.
//!
//! Attribute-driven configuration is reframed as an ordered enumeration of
//! (handler, selector) pairs per scope: anything that can enumerate its
//! interceptors in order - declarative annotations on the prototype, builder
//! calls, external configuration - satisfies [`InterceptSource`] and can be
//! applied to a proxy builder with
//! [`ProxyBuilder::apply_source`](crate::ProxyBuilder::apply_source).

use crate::interception::invocation::{InterceptHandlerRc, MemberPredicate};
use crate::interception::registry::MemberSelector;
use crate::model::PrototypeRc;

/// An ordered supply of interceptor registrations, split by scope.
pub trait InterceptSource {
    /// Member-scoped (handler, selector) pairs, in registration order
    fn member_scoped(&self) -> Vec<(InterceptHandlerRc, MemberSelector)>;

    /// Type-scoped handlers with their optional applicability predicate, in
    /// registration order
    fn type_scoped(&self) -> Vec<(InterceptHandlerRc, Option<MemberPredicate>)>;
}

/// The interceptors declared on a prototype and its members.
///
/// This is the equivalent of attribute-driven registration: prototypes carry
/// type-scoped declarations, members carry member-scoped ones, and
/// [`ProxyBuilder::new`](crate::ProxyBuilder::new) consumes them through this
/// source before any explicit registration is made.
pub struct DeclaredInterceptors {
    prototype: PrototypeRc,
}

impl DeclaredInterceptors {
    /// Wraps the declared interceptors of `prototype`
    #[must_use]
    pub fn new(prototype: &PrototypeRc) -> Self {
        DeclaredInterceptors {
            prototype: prototype.clone(),
        }
    }
}

impl InterceptSource for DeclaredInterceptors {
    fn member_scoped(&self) -> Vec<(InterceptHandlerRc, MemberSelector)> {
        let mut pairs = Vec::new();
        for (_, member) in self.prototype.members.iter() {
            // Declarations on non-overridable members are inert.
            if !member.is_overridable() {
                continue;
            }
            for handler in &member.declared_interceptors {
                pairs.push((
                    handler.clone(),
                    MemberSelector::Members(vec![member.clone()]),
                ));
            }
        }
        pairs
    }

    fn type_scoped(&self) -> Vec<(InterceptHandlerRc, Option<MemberPredicate>)> {
        self.prototype
            .declared_interceptors
            .iter()
            .map(|(_, declared)| (declared.handler.clone(), declared.filter.clone()))
            .collect()
    }
}
