//! Member entries, signatures, and attribute flags for the runtime object model.
//!
//! This module defines the representation of one overridable member of a
//! prototype: its attribute bitmask, its positional parameter signature, its
//! declared return type, and its own generic parameter list with captured
//! constraints. Member identity is token identity - two members with the same
//! name but different signatures are distinct entries.
//!
//! # Key Types
//! - [`Member`], [`MemberRc`], [`MemberList`]: The member entry and its shared forms
//! - [`MemberFlags`]: Attribute bitmask controlling overridability
//! - [`MemberSignature`], [`ParamSig`], [`TypeSig`]: Signature shapes
//! - [`GenericParamDef`], [`GenericParamFlags`]: Generic parameters with constraints

use std::sync::Arc;

use bitflags::bitflags;

use crate::interception::invocation::{InterceptHandlerRc, MemberBody};
use crate::model::token::Token;
use crate::model::value::TypeKey;

/// A vector that holds shared `Member` entries
pub type MemberList = Arc<boxcar::Vec<MemberRc>>;
/// Reference to a `Member`
pub type MemberRc = Arc<Member>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Member attribute flags controlling accessibility and overridability
    pub struct MemberFlags: u32 {
        /// Member is accessible outside its declaring prototype
        const PUBLIC = 0x0001;
        /// Member participates in virtual dispatch
        const VIRTUAL = 0x0002;
        /// Member has no implementation of its own
        const ABSTRACT = 0x0004;
        /// Member is sealed against further override
        const FINAL = 0x0008;
        /// Member is not bound to an instance
        const STATIC = 0x0010;
    }
}

impl MemberFlags {
    /// True if a member carrying these flags can be overridden by a proxy type
    #[must_use]
    pub fn is_overridable(&self) -> bool {
        self.contains(MemberFlags::VIRTUAL)
            && !self.contains(MemberFlags::FINAL)
            && !self.contains(MemberFlags::STATIC)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Special constraints and variance of a generic parameter, ECMA-335 II.23.1.7 layout
    pub struct GenericParamFlags: u16 {
        /// Parameter is covariant
        const COVARIANT = 0x0001;
        /// Parameter is contravariant
        const CONTRAVARIANT = 0x0002;
        /// Parameter is constrained to reference types
        const REFERENCE_TYPE = 0x0004;
        /// Parameter is constrained to value types
        const VALUE_TYPE = 0x0008;
        /// Parameter must expose a parameterless constructor
        const DEFAULT_CONSTRUCTOR = 0x0010;
    }
}

/// A generic parameter declared by a member (or prototype), with its
/// constraints captured verbatim for reproduction on the generated member.
#[derive(Debug, Clone)]
pub struct GenericParamDef {
    /// Index of the parameter, numbered left-to-right, from zero
    pub number: u16,
    /// Name of the generic parameter
    pub name: String,
    /// Variance and special constraints
    pub flags: GenericParamFlags,
    /// The base type constraint, if one is declared
    pub base_constraint: Option<TypeKey>,
    /// Interface constraints that apply to this parameter
    pub interface_constraints: Vec<TypeKey>,
}

impl GenericParamDef {
    /// Creates an unconstrained generic parameter
    #[must_use]
    pub fn new(number: u16, name: &str) -> Self {
        GenericParamDef {
            number,
            name: name.to_string(),
            flags: GenericParamFlags::empty(),
            base_constraint: None,
            interface_constraints: Vec::new(),
        }
    }
}

/// The declared type at one signature position.
///
/// Concrete positions name a [`TypeKey`] directly; generic positions refer to
/// the member's own generic parameter list by index and resolve against the
/// type arguments supplied at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSig {
    /// No value; only valid as a return type
    Void,
    /// A concrete type
    Concrete(TypeKey),
    /// The member's generic parameter with the given index
    Var(u16),
}

impl TypeSig {
    /// Shorthand for a concrete signature position of type `T`
    #[must_use]
    pub fn of<T: std::any::Any>() -> Self {
        TypeSig::Concrete(TypeKey::of::<T>())
    }
}

impl Default for TypeSig {
    fn default() -> Self {
        TypeSig::Void
    }
}

/// One positional parameter of a member signature.
#[derive(Debug, Clone)]
pub struct ParamSig {
    /// Name of the parameter
    pub name: String,
    /// Declared type of the parameter
    pub sig: TypeSig,
}

/// The full signature of a member: positional parameters, return type, and
/// the member's own generic parameter list.
#[derive(Debug, Clone, Default)]
pub struct MemberSignature {
    /// Positional parameters, in declaration order
    pub params: Vec<ParamSig>,
    /// Declared return type
    pub returns: TypeSig,
    /// Generic parameters declared by the member itself
    pub generic_params: Vec<GenericParamDef>,
}

impl MemberSignature {
    /// Number of generic parameters the member declares
    #[must_use]
    pub fn generic_arity(&self) -> usize {
        self.generic_params.len()
    }
}

/// One member of a prototype.
///
/// Carries the identity, attribute flags, signature, and - for class members
/// and interface members with a default - the base implementation body that a
/// compiled chain's innermost stage invokes. Members may also carry declared
/// interceptors, the equivalent of member-level interception attributes in
/// attribute-driven configuration; [`ProxyBuilder::new`] consumes them
/// automatically.
///
/// [`ProxyBuilder::new`]: crate::ProxyBuilder::new
pub struct Member {
    /// Token identifying this member
    pub token: Token,
    /// Name of the member
    pub name: String,
    /// Token of the declaring prototype
    pub declaring: Token,
    /// Attribute flags
    pub flags: MemberFlags,
    /// Full signature
    pub signature: MemberSignature,
    /// The original implementation, absent for abstract members and
    /// interface members without a default body
    pub body: Option<MemberBody>,
    /// Declared member-scoped interceptors, in declaration order
    pub declared_interceptors: Vec<InterceptHandlerRc>,
}

impl Member {
    /// True if this member can be overridden by a proxy type
    #[must_use]
    pub fn is_overridable(&self) -> bool {
        self.flags.is_overridable()
    }

    /// True if the member declares its own generic parameters
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.signature.generic_params.is_empty()
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("token", &self.token)
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("flags", &self.flags)
            .field("params", &self.signature.params.len())
            .field("generic_params", &self.signature.generic_params.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overridable_flags() {
        let virt = MemberFlags::PUBLIC | MemberFlags::VIRTUAL;
        assert!(virt.is_overridable());

        assert!(!(MemberFlags::PUBLIC).is_overridable());
        assert!(!(virt | MemberFlags::FINAL).is_overridable());
        assert!(!(virt | MemberFlags::STATIC).is_overridable());
        assert!((virt | MemberFlags::ABSTRACT).is_overridable());
    }

    #[test]
    fn test_type_sig_shorthand() {
        assert_eq!(TypeSig::of::<i32>(), TypeSig::Concrete(TypeKey::of::<i32>()));
        assert_ne!(TypeSig::of::<i32>(), TypeSig::Void);
        assert_ne!(TypeSig::Var(0), TypeSig::Var(1));
    }

    #[test]
    fn test_generic_param_capture() {
        let mut param = GenericParamDef::new(0, "T");
        param.flags |= GenericParamFlags::REFERENCE_TYPE;
        param.base_constraint = Some(TypeKey::of::<String>());
        param.interface_constraints.push(TypeKey::of::<i64>());

        assert_eq!(param.number, 0);
        assert!(param.flags.contains(GenericParamFlags::REFERENCE_TYPE));
        assert_eq!(param.base_constraint, Some(TypeKey::of::<String>()));
        assert_eq!(param.interface_constraints.len(), 1);
    }
}
