//! Prototype entries of the runtime object model.
//!
//! A [`Prototype`] is the type a proxy type is derived from: an interface or
//! an inheritable class, with its member list, constructors, type-level
//! generic parameters, and any declared type-scoped interceptors (the
//! equivalent of type-level interception attributes).

use std::sync::Arc;

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

use crate::interception::invocation::{ConstructorBody, InterceptHandlerRc, MemberPredicate};
use crate::model::member::{GenericParamDef, MemberList, MemberRc, ParamSig};
use crate::model::token::Token;

/// Reference to a `Prototype`
pub type PrototypeRc = Arc<Prototype>;
/// A vector that holds shared `Constructor` entries
pub type ConstructorList = Arc<boxcar::Vec<ConstructorRc>>;
/// Reference to a `Constructor`
pub type ConstructorRc = Arc<Constructor>;

/// The shape of a prototype type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount)]
pub enum PrototypeKind {
    /// An interface; every member is implicitly virtual and bodiless unless
    /// it declares a default
    Interface,
    /// An inheritable class; members opt into virtual dispatch individually
    Class,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Prototype attribute flags controlling eligibility
    pub struct PrototypeFlags: u32 {
        /// Prototype is accessible outside its defining scope
        const PUBLIC = 0x0001;
        /// Prototype cannot be derived from
        const SEALED = 0x0002;
        /// Prototype cannot be instantiated directly
        const ABSTRACT = 0x0004;
    }
}

/// A constructor of a class prototype.
///
/// The body receives the argument vector after it has been checked against
/// the declared parameter signature and produces the state object the proxy
/// instance dispatches against.
pub struct Constructor {
    /// Declared parameters, in declaration order
    pub params: Vec<ParamSig>,
    /// True if the constructor is accessible for instance creation
    pub public: bool,
    /// Factory producing the target state
    pub body: ConstructorBody,
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params.len())
            .field("public", &self.public)
            .finish()
    }
}

/// A declared type-scoped interceptor carried by a prototype.
///
/// The equivalent of a type-level interception attribute: the handler applies
/// to every qualifying member, optionally narrowed by its own applicability
/// predicate.
#[derive(Clone)]
pub struct TypeInterceptor {
    /// The handler to run around qualifying member calls
    pub handler: InterceptHandlerRc,
    /// Applicability predicate; `None` applies to every overridable member
    pub filter: Option<MemberPredicate>,
}

/// Represents a prototype type: the interface or inheritable class a proxy
/// type is derived from.
///
/// Collections are append-only and populated while the entity is constructed
/// by [`PrototypeBuilder`](crate::model::PrototypeBuilder); once registered
/// the entry is treated as immutable.
pub struct Prototype {
    /// Token identifying this prototype
    pub token: Token,
    /// Namespace (can be empty)
    pub namespace: String,
    /// Name of the prototype
    pub name: String,
    /// Whether this is an interface or a class
    pub kind: PrototypeKind,
    /// Attribute flags
    pub flags: PrototypeFlags,
    /// All members this prototype has
    pub members: MemberList,
    /// All constructors this prototype has
    pub constructors: ConstructorList,
    /// Type-level generic parameters (captured, not instantiated here)
    pub generic_params: Arc<boxcar::Vec<GenericParamDef>>,
    /// Declared type-scoped interceptors, in declaration order
    pub declared_interceptors: Arc<boxcar::Vec<TypeInterceptor>>,
}

impl Prototype {
    /// Returns the full name (Namespace.Name) of the entity
    #[must_use]
    pub fn fullname(&self) -> String {
        format!("{0}.{1}", self.namespace, self.name)
    }

    /// True if the prototype is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == PrototypeKind::Interface
    }

    /// Looks up a member by name; the first declared match wins
    #[must_use]
    pub fn member_by_name(&self, name: &str) -> Option<MemberRc> {
        self.members
            .iter()
            .find_map(|(_, member)| (member.name == name).then(|| member.clone()))
    }

    /// Looks up a member by token
    #[must_use]
    pub fn member_by_token(&self, token: Token) -> Option<MemberRc> {
        self.members
            .iter()
            .find_map(|(_, member)| (member.token == token).then(|| member.clone()))
    }

    /// True if any accessible constructor is declared
    #[must_use]
    pub fn has_accessible_constructor(&self) -> bool {
        self.constructors.iter().any(|(_, ctor)| ctor.public)
    }
}

impl std::fmt::Debug for Prototype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prototype")
            .field("token", &self.token)
            .field("fullname", &self.fullname())
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("members", &self.members.count())
            .finish()
    }
}
