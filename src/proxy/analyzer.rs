//! Prototype eligibility analysis and overridable member enumeration.
//!
//! The analyzer is the entry gate of every proxy builder: it validates that a
//! prototype is eligible for proxying - a public interface, or a public
//! non-sealed class exposing at least one accessible constructor - and
//! captures its overridable member set into an immutable
//! [`PrototypeDescriptor`]. Constructors, static members, and members sealed
//! against override are excluded; each surviving member carries its generic
//! parameter list and constraints verbatim for reproduction on the generated
//! member.

use crate::model::{MemberRc, PrototypeFlags, PrototypeRc, Token};
use crate::{Error, Result};

/// The analyzed, immutable view of a prototype a proxy builder works from.
///
/// Captured once when the builder is created and never mutated afterwards.
pub struct PrototypeDescriptor {
    prototype: PrototypeRc,
    overridable: Vec<MemberRc>,
}

impl PrototypeDescriptor {
    /// The underlying prototype entry
    #[must_use]
    pub fn prototype(&self) -> &PrototypeRc {
        &self.prototype
    }

    /// The overridable members, in declaration order
    #[must_use]
    pub fn overridable_members(&self) -> &[MemberRc] {
        &self.overridable
    }

    /// Looks up an overridable member by token
    #[must_use]
    pub fn find(&self, token: Token) -> Option<&MemberRc> {
        self.overridable.iter().find(|m| m.token == token)
    }

    /// Looks up an overridable member by name; the first declared match wins
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&MemberRc> {
        self.overridable.iter().find(|m| m.name == name)
    }
}

/// Validates `prototype` and enumerates its overridable members.
///
/// # Errors
/// Returns [`Error::InvalidPrototype`] if the prototype is not public, is a
/// sealed class, or is a class without any accessible constructor.
pub fn analyze(prototype: &PrototypeRc) -> Result<PrototypeDescriptor> {
    if !prototype.flags.contains(PrototypeFlags::PUBLIC) {
        return Err(Error::InvalidPrototype(format!(
            "'{}' is not public",
            prototype.fullname()
        )));
    }
    if !prototype.is_interface() {
        if prototype.flags.contains(PrototypeFlags::SEALED) {
            return Err(Error::InvalidPrototype(format!(
                "class '{}' is sealed",
                prototype.fullname()
            )));
        }
        if !prototype.has_accessible_constructor() {
            return Err(Error::InvalidPrototype(format!(
                "class '{}' exposes no accessible constructor",
                prototype.fullname()
            )));
        }
    }

    let overridable = prototype
        .members
        .iter()
        .filter(|(_, member)| member.is_overridable())
        .map(|(_, member)| member.clone())
        .collect();

    Ok(PrototypeDescriptor {
        prototype: prototype.clone(),
        overridable,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::{ChainValue, PrototypeBuilder, PrototypeRegistry};

    fn registry() -> Arc<PrototypeRegistry> {
        Arc::new(PrototypeRegistry::new())
    }

    #[test]
    fn test_public_interface_is_eligible() {
        let prototype = PrototypeBuilder::new(registry())
            .interface("MyApp", "ICalculator")
            .method("add", |m| {
                m.param::<i32>("a").param::<i32>("b").returns::<i32>()
            })
            .build()
            .unwrap();

        let descriptor = analyze(&prototype).unwrap();
        assert_eq!(descriptor.overridable_members().len(), 1);
    }

    #[test]
    fn test_internal_prototype_is_rejected() {
        let prototype = PrototypeBuilder::new(registry())
            .interface("MyApp", "IHidden")
            .internal()
            .build()
            .unwrap();

        let result = analyze(&prototype);
        assert!(matches!(result, Err(Error::InvalidPrototype(_))));
    }

    #[test]
    fn test_sealed_class_is_rejected() {
        let prototype = PrototypeBuilder::new(registry())
            .class("MyApp", "Sealed")
            .sealed()
            .default_constructor(|_| Ok(Arc::new(())))
            .build()
            .unwrap();

        let result = analyze(&prototype);
        assert!(matches!(result, Err(Error::InvalidPrototype(_))));
    }

    #[test]
    fn test_class_without_constructor_is_rejected() {
        let prototype = PrototypeBuilder::new(registry())
            .class("MyApp", "NoCtor")
            .build()
            .unwrap();

        let result = analyze(&prototype);
        assert!(matches!(result, Err(Error::InvalidPrototype(_))));
    }

    #[test]
    fn test_internal_constructor_is_not_accessible() {
        let prototype = PrototypeBuilder::new(registry())
            .class("MyApp", "HiddenCtor")
            .constructor(|ctor| ctor.internal(), |_| Ok(Arc::new(())))
            .build()
            .unwrap();

        let result = analyze(&prototype);
        assert!(matches!(result, Err(Error::InvalidPrototype(_))));
    }

    #[test]
    fn test_non_overridable_members_excluded() {
        let prototype = PrototypeBuilder::new(registry())
            .class("MyApp", "Mixed")
            .default_constructor(|_| Ok(Arc::new(())))
            .method("virtual_one", |m| {
                m.returns::<i32>().body(|_| Ok(ChainValue::boxed(1i32)))
            })
            .method("plain", |m| {
                m.non_virtual()
                    .returns::<i32>()
                    .body(|_| Ok(ChainValue::boxed(2i32)))
            })
            .method("sealed_one", |m| {
                m.final_member()
                    .returns::<i32>()
                    .body(|_| Ok(ChainValue::boxed(3i32)))
            })
            .method("static_one", |m| {
                m.static_member()
                    .returns::<i32>()
                    .body(|_| Ok(ChainValue::boxed(4i32)))
            })
            .build()
            .unwrap();

        let descriptor = analyze(&prototype).unwrap();
        let names: Vec<&str> = descriptor
            .overridable_members()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["virtual_one"]);
    }

    #[test]
    fn test_descriptor_lookup() {
        let prototype = PrototypeBuilder::new(registry())
            .interface("MyApp", "ICalculator")
            .method("add", |m| m.returns::<i32>())
            .build()
            .unwrap();

        let descriptor = analyze(&prototype).unwrap();
        let member = descriptor.find_by_name("add").unwrap().clone();
        assert!(descriptor.find(member.token).is_some());
        assert!(descriptor.find(Token::member(0xFFFF)).is_none());
    }
}
