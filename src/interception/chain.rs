//! Interception chain compilation and base-call marshalling.
//!
//! For each member selected by at least one registration, the compiler folds
//! the base call plus every applicable interceptor into a single composed
//! dispatch function. The fold iterates each registration list in reverse
//! registration order, wrapping the previously built stage as the new stage's
//! continuation, so that:
//!
//! - the first-registered member-scoped interceptor is the outermost of its
//!   group, and
//! - the first-registered type-scoped interceptor is outermost overall,
//!
//! giving the outer-to-inner execution order `[type-scoped in registration
//! order] -> [member-scoped in registration order] -> base`.
//!
//! The innermost stage binds the invocation's argument vector to the member's
//! formal parameters positionally, unboxing each argument against the
//! declared parameter type, and checks the body's result against the declared
//! return type on the way back. Generic signature positions resolve their
//! expected type through the type arguments bound at the call site.
//!
//! Compiled chains are immutable `Arc` closures: stateless with respect to
//! chain structure, callable concurrently and reentrantly.

use std::sync::Arc;

use crate::interception::invocation::{
    BaseCall, CallFrame, InterceptHandlerRc, Invocation, StageFn,
};
use crate::model::{ChainValue, MemberRc, TypeKey, TypeSig};
use crate::{Error, Result};

/// The fully compiled chain for one member: the entry point actually invoked
/// by the generated override, plus bookkeeping for introspection.
pub(crate) struct CompiledChain {
    /// The member this chain dispatches
    pub member: MemberRc,
    /// Outermost stage; invoking it runs the whole chain
    pub entry: StageFn,
    /// Number of interceptor stages wrapped around the base call
    pub stages: usize,
}

/// Compiles the chain for `member` from its applicable registrations.
///
/// `member_scoped` and `type_scoped` are each in registration order; the
/// reverse-iteration fold makes the first registration of each scope the
/// outermost stage of its group.
pub(crate) fn compile(
    member: &MemberRc,
    member_scoped: &[InterceptHandlerRc],
    type_scoped: &[InterceptHandlerRc],
) -> CompiledChain {
    let mut entry = base_stage(member.clone());
    let mut stages = 0;

    for handler in member_scoped.iter().rev() {
        entry = wrap(member.clone(), handler.clone(), entry);
        stages += 1;
    }
    for handler in type_scoped.iter().rev() {
        entry = wrap(member.clone(), handler.clone(), entry);
        stages += 1;
    }

    CompiledChain {
        member: member.clone(),
        entry,
        stages,
    }
}

/// Wraps `next` as the continuation of a new stage running `handler`.
fn wrap(member: MemberRc, handler: InterceptHandlerRc, next: StageFn) -> StageFn {
    Arc::new(move |frame: CallFrame| {
        let invocation = Invocation::new(&member, &frame, &next);
        handler(&invocation)
    })
}

/// The innermost stage: marshals into and out of the original implementation.
pub(crate) fn base_stage(member: MemberRc) -> StageFn {
    Arc::new(move |frame: CallFrame| invoke_base(&member, &frame))
}

/// Invokes the member's original implementation directly, applying the
/// marshalling rules at both boundaries.
///
/// # Errors
/// - [`Error::InvalidCastInChain`] on an argument or return type mismatch
/// - [`Error::InvalidArgument`] if a generic signature position has no bound
///   type argument
/// - [`Error::MissingBaseImplementation`] if the member declares no body
pub(crate) fn invoke_base(member: &MemberRc, frame: &CallFrame) -> Result<ChainValue> {
    let signature = &member.signature;

    if frame.args.len() != signature.params.len() {
        return Err(Error::InvalidCastInChain {
            expected: format!("{} argument(s)", signature.params.len()),
            found: format!("{} argument(s)", frame.args.len()),
        });
    }
    for (param, value) in signature.params.iter().zip(&frame.args) {
        let expected = resolve_sig(&param.sig, frame, member)?;
        check_value(expected, value)?;
    }

    let Some(body) = member.body.as_ref() else {
        return Err(Error::MissingBaseImplementation(member.name.clone()));
    };
    let call = BaseCall::new(member, frame);
    let result = body(&call)?;

    let expected = resolve_sig(&signature.returns, frame, member)?;
    check_value(expected, &result)?;
    Ok(result)
}

/// Resolves a declared signature position to the concrete type it expects at
/// this call, or `None` for void.
fn resolve_sig(sig: &TypeSig, frame: &CallFrame, member: &MemberRc) -> Result<Option<TypeKey>> {
    match sig {
        TypeSig::Void => Ok(None),
        TypeSig::Concrete(key) => Ok(Some(*key)),
        TypeSig::Var(var) => frame
            .type_args
            .get(usize::from(*var))
            .copied()
            .map(Some)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "member '{}' has no bound type argument for generic parameter {}",
                    member.name, var
                ))
            }),
    }
}

/// Checks one value against the declared type of its boundary position.
///
/// Null crosses for any declared type; the declared type wins over the
/// runtime type of the payload, so a substituted or covariant mismatch is
/// caught here rather than propagated.
fn check_value(expected: Option<TypeKey>, value: &ChainValue) -> Result<()> {
    match (expected, value) {
        (None, ChainValue::Void) => Ok(()),
        (None, found) => Err(Error::InvalidCastInChain {
            expected: "void".to_string(),
            found: found.describe().to_string(),
        }),
        (Some(_), ChainValue::Null) => Ok(()),
        (Some(key), ChainValue::Boxed { key: found, .. }) if *found == key => Ok(()),
        (Some(key), found) => Err(Error::InvalidCastInChain {
            expected: key.name().to_string(),
            found: found.describe().to_string(),
        }),
    }
}
