//! Per-call invocation context threaded through compiled chain stages.
//!
//! An invocation is created fresh for every call entering a proxy member and
//! discarded when the call returns. Each stage of a compiled chain observes
//! the call through one of two views:
//!
//! - [`Invocation`] - what an interceptor sees: the target instance, the
//!   member descriptor, the boxed argument vector, the resolved generic
//!   arguments, and the continuation to the next stage
//! - [`BaseCall`] - what a base implementation body sees: the same call data
//!   after marshalling checks, without a continuation
//!
//! An interceptor controls whether the chain continues by invoking (or not
//! invoking) [`Invocation::proceed`]; invoking it zero, one, or multiple
//! times is legal.
//!
//! # Examples
//!
//! ```rust
//! use proxyforge::interception::Invocation;
//! use proxyforge::model::ChainValue;
//! use proxyforge::Result;
//! use std::sync::Arc;
//!
//! // A pass-through interceptor that doubles the result of the rest of the chain.
//! let handler = Arc::new(|invocation: &Invocation<'_>| -> Result<ChainValue> {
//!     let inner = invocation.proceed()?;
//!     let doubled = inner.unbox::<i32>()? * 2;
//!     Ok(ChainValue::boxed(doubled))
//! });
//! # let _ = handler;
//! ```

use std::any::Any;
use std::sync::Arc;

use crate::model::{ChainValue, Member, MemberRc, TypeKey};
use crate::{Error, Result};

/// Shared reference to the state object a proxy instance dispatches against
pub type TargetRc = Arc<dyn Any + Send + Sync>;

/// An interceptor handler: given the invocation context, produce the call result.
///
/// The handler decides whether the chain continues by calling
/// [`Invocation::proceed`] (or [`Invocation::proceed_with`] to substitute
/// arguments); not calling it short-circuits every inner stage including the
/// base implementation.
pub type InterceptHandler = dyn Fn(&Invocation<'_>) -> Result<ChainValue> + Send + Sync;
/// Shared reference to an [`InterceptHandler`]
pub type InterceptHandlerRc = Arc<InterceptHandler>;

/// A predicate over members, used to filter which members a registration applies to
pub type MemberPredicate = Arc<dyn Fn(&Member) -> bool + Send + Sync>;

/// A member's original implementation, invoked by the innermost chain stage
pub type MemberBody = Arc<dyn Fn(&BaseCall<'_>) -> Result<ChainValue> + Send + Sync>;

/// A constructor body: given the checked argument vector, produce the target state
pub type ConstructorBody = Arc<dyn Fn(&[ChainValue]) -> Result<TargetRc> + Send + Sync>;

/// One stage of a compiled chain. Stages are immutable closures shared
/// between all instances of a proxy type and callable concurrently.
pub(crate) type StageFn = Arc<dyn Fn(CallFrame) -> Result<ChainValue> + Send + Sync>;

/// Per-call state threaded through every stage of a compiled chain.
///
/// Cloning a frame shares the target and the boxed argument payloads; a
/// continuation invoked twice observes the same argument vector both times.
#[derive(Clone)]
pub(crate) struct CallFrame {
    /// The instance the call is dispatched against
    pub target: TargetRc,
    /// Boxed argument vector, positionally bound to the member's parameters
    pub args: Vec<ChainValue>,
    /// Concrete type arguments bound at the call site for generic members
    pub type_args: Arc<[TypeKey]>,
}

/// The view of one call observed by an interceptor stage.
pub struct Invocation<'a> {
    member: &'a MemberRc,
    frame: &'a CallFrame,
    next: &'a StageFn,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(member: &'a MemberRc, frame: &'a CallFrame, next: &'a StageFn) -> Self {
        Invocation {
            member,
            frame,
            next,
        }
    }

    /// The member being invoked
    #[must_use]
    pub fn member(&self) -> &MemberRc {
        self.member
    }

    /// The raw target instance
    #[must_use]
    pub fn target_raw(&self) -> &(dyn Any + Send + Sync) {
        self.frame.target.as_ref()
    }

    /// The target instance downcast to `T`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCastInChain`] if the target is not a `T`.
    pub fn target<T: Any>(&self) -> Result<&T> {
        self.frame
            .target
            .downcast_ref::<T>()
            .ok_or_else(|| Error::InvalidCastInChain {
                expected: std::any::type_name::<T>().to_string(),
                found: "target of a different type".to_string(),
            })
    }

    /// The boxed argument vector
    #[must_use]
    pub fn arguments(&self) -> &[ChainValue] {
        &self.frame.args
    }

    /// Argument at position `index`, unboxed as `T`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the index is out of range, or
    /// [`Error::InvalidCastInChain`] if the argument is not a `T`.
    pub fn argument<T: Any>(&self, index: usize) -> Result<&T> {
        self.frame
            .args
            .get(index)
            .ok_or_else(|| Error::InvalidArgument(format!("argument index {index} out of range")))?
            .unbox_ref::<T>()
    }

    /// Concrete type arguments bound at the call site
    #[must_use]
    pub fn type_args(&self) -> &[TypeKey] {
        &self.frame.type_args
    }

    /// Invokes the continuation with the current argument vector.
    ///
    /// # Errors
    /// Propagates whatever the rest of the chain returns.
    pub fn proceed(&self) -> Result<ChainValue> {
        (self.next)(self.frame.clone())
    }

    /// Invokes the continuation with a substituted argument vector.
    ///
    /// The substituted values still cross the base-call boundary through the
    /// normal marshalling checks; an incompatible substitution surfaces
    /// [`Error::InvalidCastInChain`] from the stage that detects it.
    ///
    /// # Errors
    /// Propagates whatever the rest of the chain returns.
    pub fn proceed_with(&self, args: Vec<ChainValue>) -> Result<ChainValue> {
        (self.next)(CallFrame {
            target: self.frame.target.clone(),
            args,
            type_args: self.frame.type_args.clone(),
        })
    }
}

/// The view of one call observed by a base implementation body.
///
/// Arguments have already been checked against the member's declared
/// parameter types when a `BaseCall` is constructed, so the typed accessors
/// only fail if the body requests a type other than the declared one.
pub struct BaseCall<'a> {
    member: &'a MemberRc,
    frame: &'a CallFrame,
}

impl<'a> BaseCall<'a> {
    pub(crate) fn new(member: &'a MemberRc, frame: &'a CallFrame) -> Self {
        BaseCall { member, frame }
    }

    /// The member being invoked
    #[must_use]
    pub fn member(&self) -> &MemberRc {
        self.member
    }

    /// The raw target instance
    #[must_use]
    pub fn target_raw(&self) -> &(dyn Any + Send + Sync) {
        self.frame.target.as_ref()
    }

    /// The target instance downcast to `T`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCastInChain`] if the target is not a `T`.
    pub fn target<T: Any>(&self) -> Result<&T> {
        self.frame
            .target
            .downcast_ref::<T>()
            .ok_or_else(|| Error::InvalidCastInChain {
                expected: std::any::type_name::<T>().to_string(),
                found: "target of a different type".to_string(),
            })
    }

    /// The boxed argument vector
    #[must_use]
    pub fn args(&self) -> &[ChainValue] {
        &self.frame.args
    }

    /// Argument cell at position `index`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the index is out of range.
    pub fn arg_value(&self, index: usize) -> Result<&ChainValue> {
        self.frame
            .args
            .get(index)
            .ok_or_else(|| Error::InvalidArgument(format!("argument index {index} out of range")))
    }

    /// Argument at position `index`, unboxed as `T`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the index is out of range, or
    /// [`Error::InvalidCastInChain`] if the argument is not a `T`.
    pub fn arg<T: Any>(&self, index: usize) -> Result<&T> {
        self.arg_value(index)?.unbox_ref::<T>()
    }

    /// Concrete type argument at position `index`, if one was supplied
    #[must_use]
    pub fn type_arg(&self, index: usize) -> Option<TypeKey> {
        self.frame.type_args.get(index).copied()
    }

    /// Concrete type arguments bound at the call site
    #[must_use]
    pub fn type_args(&self) -> &[TypeKey] {
        &self.frame.type_args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberFlags, MemberSignature, Token};

    fn sample_member() -> MemberRc {
        Arc::new(Member {
            token: Token::member(1),
            name: "sample".to_string(),
            declaring: Token::prototype(1),
            flags: MemberFlags::PUBLIC | MemberFlags::VIRTUAL,
            signature: MemberSignature::default(),
            body: None,
            declared_interceptors: Vec::new(),
        })
    }

    fn frame_with(args: Vec<ChainValue>) -> CallFrame {
        CallFrame {
            target: Arc::new(()),
            args,
            type_args: Arc::from(&[] as &[TypeKey]),
        }
    }

    #[test]
    fn test_invocation_accessors() {
        let member = sample_member();
        let frame = frame_with(vec![ChainValue::boxed(2i32), ChainValue::boxed(3i32)]);
        let next: StageFn = Arc::new(|frame| Ok(frame.args[0].clone()));

        let invocation = Invocation::new(&member, &frame, &next);
        assert_eq!(invocation.member().name, "sample");
        assert_eq!(invocation.arguments().len(), 2);
        assert_eq!(invocation.argument::<i32>(1).unwrap(), &3);
        assert!(invocation.argument::<i32>(2).is_err());
    }

    #[test]
    fn test_proceed_forwards_frame() {
        let member = sample_member();
        let frame = frame_with(vec![ChainValue::boxed(7i32)]);
        let next: StageFn = Arc::new(|frame| frame.args[0].unbox::<i32>().map(ChainValue::boxed));

        let invocation = Invocation::new(&member, &frame, &next);
        assert_eq!(invocation.proceed().unwrap().unbox::<i32>().unwrap(), 7);
    }

    #[test]
    fn test_proceed_with_substitutes_arguments() {
        let member = sample_member();
        let frame = frame_with(vec![ChainValue::boxed(7i32)]);
        let next: StageFn = Arc::new(|frame| frame.args[0].unbox::<i32>().map(ChainValue::boxed));

        let invocation = Invocation::new(&member, &frame, &next);
        let result = invocation
            .proceed_with(vec![ChainValue::boxed(9i32)])
            .unwrap();
        assert_eq!(result.unbox::<i32>().unwrap(), 9);
        // The original frame is untouched.
        assert_eq!(frame.args[0].unbox::<i32>().unwrap(), 7);
    }

    #[test]
    fn test_base_call_typed_accessors() {
        let member = sample_member();
        let frame = frame_with(vec![ChainValue::boxed(String::from("x"))]);

        let call = BaseCall::new(&member, &frame);
        assert_eq!(call.arg::<String>(0).unwrap(), "x");
        assert!(call.arg::<i32>(0).is_err());
        assert!(call.type_arg(0).is_none());
    }
}
