//! Synthesized proxy type descriptors and the instances created from them.
//!
//! A [`ProxyTypeDescriptor`] is the product of synthesis: the generated
//! type's identity and its dispatch table mapping member tokens to compiled
//! chain entry points. It is created exactly once per builder, immutable, and
//! shared by every instance created from that builder.
//!
//! A [`ProxyObject`] is one instance of the generated type: the descriptor
//! plus the target state produced by the prototype's constructor. Invoking a
//! member routes the call through the member's compiled chain; class members
//! with no applicable interceptor have no dispatch-table entry and fall
//! through to the inherited implementation directly.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::interception::chain::{self, CompiledChain};
use crate::interception::invocation::{CallFrame, TargetRc};
use crate::model::{ChainValue, MemberRc, PrototypeRc, Token, TypeKey};
use crate::{Error, Result};

/// The identity and dispatch table of one synthesized proxy type.
pub struct ProxyTypeDescriptor {
    pub(crate) token: Token,
    pub(crate) name: String,
    pub(crate) prototype: PrototypeRc,
    /// Every overridable member of the prototype, keyed by token
    pub(crate) members: HashMap<Token, MemberRc>,
    /// Compiled chains for overridden members only
    pub(crate) overrides: HashMap<Token, CompiledChain>,
}

impl ProxyTypeDescriptor {
    /// Token of the synthesized type
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Name of the synthesized type
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prototype the type was derived from
    #[must_use]
    pub fn prototype(&self) -> &PrototypeRc {
        &self.prototype
    }

    /// True if the member carries an override entry in the dispatch table
    #[must_use]
    pub fn is_overridden(&self, token: Token) -> bool {
        self.overrides.contains_key(&token)
    }

    /// Number of override entries in the dispatch table
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Number of interceptor stages compiled for a member, if it is overridden
    #[must_use]
    pub fn stage_count(&self, token: Token) -> Option<usize> {
        self.overrides.get(&token).map(|chain| chain.stages)
    }

    /// Looks up an overridable member by name.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if no overridable member carries
    /// the name.
    pub fn member(&self, name: &str) -> Result<&MemberRc> {
        self.members
            .values()
            .find(|member| member.name == name)
            .ok_or_else(|| {
                Error::InvalidArgument(format!("no overridable member named '{name}'"))
            })
    }
}

impl std::fmt::Debug for ProxyTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyTypeDescriptor")
            .field("token", &self.token)
            .field("name", &self.name)
            .field("members", &self.members.len())
            .field("overrides", &self.overrides.len())
            .finish()
    }
}

/// One instance of a synthesized proxy type.
///
/// Dispatch is stateless with respect to the chain structure; instances may
/// be invoked concurrently and reentrantly from multiple threads.
#[derive(Clone)]
pub struct ProxyObject {
    descriptor: Arc<ProxyTypeDescriptor>,
    target: TargetRc,
}

impl ProxyObject {
    pub(crate) fn new(descriptor: Arc<ProxyTypeDescriptor>, target: TargetRc) -> Self {
        ProxyObject { descriptor, target }
    }

    /// The descriptor of the type this instance belongs to
    #[must_use]
    pub fn descriptor(&self) -> &Arc<ProxyTypeDescriptor> {
        &self.descriptor
    }

    /// The raw target state
    #[must_use]
    pub fn target_raw(&self) -> &(dyn Any + Send + Sync) {
        self.target.as_ref()
    }

    /// The target state downcast to `T`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCastInChain`] if the target is not a `T`.
    pub fn target<T: Any>(&self) -> Result<&T> {
        self.target
            .downcast_ref::<T>()
            .ok_or_else(|| Error::InvalidCastInChain {
                expected: std::any::type_name::<T>().to_string(),
                found: "target of a different type".to_string(),
            })
    }

    /// Invokes a non-generic member with the given argument vector.
    ///
    /// # Errors
    /// - [`Error::MemberNotFound`] if the member is not part of the proxy type
    /// - [`Error::InvalidArgument`] on an argument or generic arity mismatch
    /// - Whatever the member's chain surfaces
    pub fn invoke(&self, member: &MemberRc, args: Vec<ChainValue>) -> Result<ChainValue> {
        self.invoke_generic(member, &[], args)
    }

    /// Invokes a member, binding concrete type arguments for its generic
    /// parameters.
    ///
    /// Every stage of the chain receives the bound type arguments through the
    /// invocation context and may inspect or forward them unchanged.
    ///
    /// # Errors
    /// - [`Error::MemberNotFound`] if the member is not part of the proxy type
    /// - [`Error::InvalidArgument`] on an argument or generic arity mismatch
    /// - Whatever the member's chain surfaces
    pub fn invoke_generic(
        &self,
        member: &MemberRc,
        type_args: &[TypeKey],
        args: Vec<ChainValue>,
    ) -> Result<ChainValue> {
        let Some(member) = self.descriptor.members.get(&member.token) else {
            return Err(Error::MemberNotFound(member.token));
        };

        let signature = &member.signature;
        if args.len() != signature.params.len() {
            return Err(Error::InvalidArgument(format!(
                "member '{}' takes {} argument(s), {} supplied",
                member.name,
                signature.params.len(),
                args.len()
            )));
        }
        if type_args.len() != signature.generic_arity() {
            return Err(Error::InvalidArgument(format!(
                "member '{}' declares {} generic parameter(s), {} type argument(s) supplied",
                member.name,
                signature.generic_arity(),
                type_args.len()
            )));
        }

        let frame = CallFrame {
            target: self.target.clone(),
            args,
            type_args: Arc::from(type_args),
        };

        match self.descriptor.overrides.get(&member.token) {
            Some(compiled) => (compiled.entry)(frame),
            // No override entry: the inherited implementation runs directly.
            None => chain::invoke_base(member, &frame),
        }
    }

    /// Invokes a non-generic member by name.
    ///
    /// # Errors
    /// As [`ProxyObject::invoke`], plus [`Error::InvalidArgument`] if no
    /// overridable member carries the name.
    pub fn invoke_by_name(&self, name: &str, args: Vec<ChainValue>) -> Result<ChainValue> {
        let member = self.descriptor.member(name)?.clone();
        self.invoke(&member, args)
    }

    /// Invokes a generic member by name.
    ///
    /// # Errors
    /// As [`ProxyObject::invoke_generic`], plus [`Error::InvalidArgument`] if
    /// no overridable member carries the name.
    pub fn invoke_generic_by_name(
        &self,
        name: &str,
        type_args: &[TypeKey],
        args: Vec<ChainValue>,
    ) -> Result<ChainValue> {
        let member = self.descriptor.member(name)?.clone();
        self.invoke_generic(&member, type_args, args)
    }
}
