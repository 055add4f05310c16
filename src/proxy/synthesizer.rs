//! Proxy type synthesis: dispatch table emission from compiled chains.
//!
//! The synthesizer turns one frozen registration snapshot into a
//! [`ProxyTypeDescriptor`]: it decides which members receive an override
//! entry, compiles one chain per overridden member, and stamps the generated
//! type's identity. Interface members always receive an entry (strict
//! override semantics require a body for every interface member); class
//! members receive one only when at least one interceptor applies, so
//! unintercepted class members fall through to inherited behavior with no
//! chain overhead.
//!
//! Synthesis is pure CPU-bound construction; chain compilation across members
//! is independent and runs in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::interception::chain;
use crate::interception::invocation::InterceptHandlerRc;
use crate::interception::RegistrySnapshot;
use crate::model::{MemberRc, Token, TypeSig};
use crate::proxy::analyzer::PrototypeDescriptor;
use crate::proxy::descriptor::ProxyTypeDescriptor;
use crate::Result;

/// Process-wide row allocator for synthesized type tokens.
static NEXT_PROXY_ROW: AtomicU32 = AtomicU32::new(1);

/// Emits the proxy type for `descriptor` from the frozen `snapshot`.
///
/// # Errors
/// Returns [`Error::TypeSynthesis`](crate::Error::TypeSynthesis) if a member
/// signature cannot be faithfully reproduced on the generated type.
pub(crate) fn synthesize(
    descriptor: &PrototypeDescriptor,
    snapshot: &RegistrySnapshot,
) -> Result<ProxyTypeDescriptor> {
    let prototype = descriptor.prototype();
    let is_interface = prototype.is_interface();

    for member in descriptor.overridable_members() {
        validate_reproducible(member)?;
    }

    // One plan per member that needs an override entry, with its applicable
    // handlers resolved in registration order per scope.
    let plans: Vec<(MemberRc, Vec<InterceptHandlerRc>, Vec<InterceptHandlerRc>)> = descriptor
        .overridable_members()
        .iter()
        .filter_map(|member| {
            let member_scoped = snapshot
                .member_scoped
                .get(&member.token)
                .cloned()
                .unwrap_or_default();
            let type_scoped: Vec<InterceptHandlerRc> = snapshot
                .type_scoped
                .iter()
                .filter(|registration| {
                    registration
                        .filter
                        .as_ref()
                        .map_or(true, |filter| filter(member))
                })
                .map(|registration| registration.handler.clone())
                .collect();

            let intercepted = !member_scoped.is_empty() || !type_scoped.is_empty();
            (is_interface || intercepted)
                .then(|| (member.clone(), member_scoped, type_scoped))
        })
        .collect();

    let overrides: HashMap<Token, chain::CompiledChain> = plans
        .into_par_iter()
        .map(|(member, member_scoped, type_scoped)| {
            let compiled = chain::compile(&member, &member_scoped, &type_scoped);
            (member.token, compiled)
        })
        .collect();

    let members: HashMap<Token, MemberRc> = descriptor
        .overridable_members()
        .iter()
        .map(|member| (member.token, member.clone()))
        .collect();

    Ok(ProxyTypeDescriptor {
        token: Token::proxy(NEXT_PROXY_ROW.fetch_add(1, Ordering::Relaxed)),
        name: format!("<Proxy>{}", prototype.name),
        prototype: prototype.clone(),
        members,
        overrides,
    })
}

/// Checks that a member signature can be reproduced on the generated member:
/// every generic position must refer to a parameter the member declares.
fn validate_reproducible(member: &MemberRc) -> Result<()> {
    let arity = member.signature.generic_arity();
    let check = |sig: &TypeSig| -> Result<()> {
        if let TypeSig::Var(var) = sig {
            if usize::from(*var) >= arity {
                return Err(synthesis_error!(
                    "member '{}' refers to generic parameter {} outside its arity {}",
                    member.name,
                    var,
                    arity
                ));
            }
        }
        Ok(())
    };

    for param in &member.signature.params {
        check(&param.sig)?;
    }
    check(&member.signature.returns)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::interception::{InterceptorRegistry, MemberSelector};
    use crate::model::{
        ChainValue, Member, MemberFlags, MemberSignature, ParamSig, Prototype, PrototypeBuilder,
        PrototypeFlags, PrototypeKind, PrototypeRegistry,
    };
    use crate::proxy::analyzer;
    use crate::Error;

    fn registry() -> Arc<PrototypeRegistry> {
        Arc::new(PrototypeRegistry::new())
    }

    fn snapshot_from(members: Vec<MemberRc>, registered: &[MemberRc]) -> RegistrySnapshot {
        let interceptors = InterceptorRegistry::new(members);
        for member in registered {
            interceptors
                .register(
                    Arc::new(|invocation| invocation.proceed()),
                    &MemberSelector::Members(vec![member.clone()]),
                )
                .unwrap();
        }
        interceptors.freeze().unwrap()
    }

    #[test]
    fn test_interface_members_always_overridden() {
        let prototype = PrototypeBuilder::new(registry())
            .interface("MyApp", "ICalculator")
            .method("add", |m| {
                m.param::<i32>("a").param::<i32>("b").returns::<i32>()
            })
            .build()
            .unwrap();
        let descriptor = analyzer::analyze(&prototype).unwrap();
        let snapshot = snapshot_from(descriptor.overridable_members().to_vec(), &[]);

        let proxy_type = synthesize(&descriptor, &snapshot).unwrap();
        let member = descriptor.find_by_name("add").unwrap();
        assert!(proxy_type.is_overridden(member.token));
        assert_eq!(proxy_type.stage_count(member.token), Some(0));
    }

    #[test]
    fn test_unintercepted_class_members_not_overridden() {
        let prototype = PrototypeBuilder::new(registry())
            .class("MyApp", "Calculator")
            .default_constructor(|_| Ok(Arc::new(())))
            .method("add", |m| {
                m.param::<i32>("a")
                    .param::<i32>("b")
                    .returns::<i32>()
                    .body(|call| {
                        Ok(ChainValue::boxed(call.arg::<i32>(0)? + call.arg::<i32>(1)?))
                    })
            })
            .method("sub", |m| {
                m.param::<i32>("a")
                    .param::<i32>("b")
                    .returns::<i32>()
                    .body(|call| {
                        Ok(ChainValue::boxed(call.arg::<i32>(0)? - call.arg::<i32>(1)?))
                    })
            })
            .build()
            .unwrap();
        let descriptor = analyzer::analyze(&prototype).unwrap();

        let intercepted = descriptor.find_by_name("add").unwrap().clone();
        let snapshot = snapshot_from(
            descriptor.overridable_members().to_vec(),
            &[intercepted.clone()],
        );

        let proxy_type = synthesize(&descriptor, &snapshot).unwrap();
        assert!(proxy_type.is_overridden(intercepted.token));
        let plain = descriptor.find_by_name("sub").unwrap();
        assert!(!proxy_type.is_overridden(plain.token));
        assert_eq!(proxy_type.override_count(), 1);
    }

    #[test]
    fn test_irreproducible_signature_fails_synthesis() {
        // Hand-built member referring to a generic parameter it never
        // declares; the fluent builder rejects this shape, synthesis must too.
        let members = Arc::new(boxcar::Vec::new());
        members.push(Arc::new(Member {
            token: Token::member(900),
            name: "broken".to_string(),
            declaring: Token::prototype(900),
            flags: MemberFlags::PUBLIC | MemberFlags::VIRTUAL,
            signature: MemberSignature {
                params: vec![ParamSig {
                    name: "x".to_string(),
                    sig: TypeSig::Var(0),
                }],
                returns: TypeSig::Void,
                generic_params: Vec::new(),
            },
            body: None,
            declared_interceptors: Vec::new(),
        }));
        let prototype = Arc::new(Prototype {
            token: Token::prototype(900),
            namespace: "MyApp".to_string(),
            name: "IBroken".to_string(),
            kind: PrototypeKind::Interface,
            flags: PrototypeFlags::PUBLIC,
            members,
            constructors: Arc::new(boxcar::Vec::new()),
            generic_params: Arc::new(boxcar::Vec::new()),
            declared_interceptors: Arc::new(boxcar::Vec::new()),
        });
        let descriptor = analyzer::analyze(&prototype).unwrap();
        let snapshot = snapshot_from(descriptor.overridable_members().to_vec(), &[]);

        let result = synthesize(&descriptor, &snapshot);
        assert!(matches!(result, Err(Error::TypeSynthesis { .. })));
    }

    #[test]
    fn test_synthesized_tokens_are_unique() {
        let prototype = PrototypeBuilder::new(registry())
            .interface("MyApp", "IThing")
            .method("get", |m| m.returns::<i32>())
            .build()
            .unwrap();
        let descriptor = analyzer::analyze(&prototype).unwrap();

        let first = synthesize(
            &descriptor,
            &snapshot_from(descriptor.overridable_members().to_vec(), &[]),
        )
        .unwrap();
        let second = synthesize(
            &descriptor,
            &snapshot_from(descriptor.overridable_members().to_vec(), &[]),
        )
        .unwrap();

        assert_ne!(first.token(), second.token());
        assert_eq!(first.name(), "<Proxy>IThing");
    }
}
