//! Interceptor registration, chain compilation, and per-call dispatch context.
//!
//! This module carries the interception half of the engine:
//!
//! - [`InterceptorRegistry`]: ordered member-scoped and type-scoped
//!   registrations, frozen when the owning builder produces its type
//! - chain compilation: each member's applicable interceptors fold into one
//!   immutable composed dispatch function around the base call
//! - [`Invocation`]: the per-call context every interceptor stage observes,
//!   including the continuation to the rest of the chain
//!
//! The ordering contract is fixed for all configurations: outer-to-inner
//! execution order is `[type-scoped in registration order] -> [member-scoped
//! in registration order] -> base`. An interceptor controls whether the chain
//! continues by invoking (or not invoking) its continuation; invoking it
//! zero, one, or multiple times is legal.

pub(crate) mod chain;
pub mod invocation;
mod registry;
mod source;

pub use invocation::{
    BaseCall, ConstructorBody, InterceptHandler, InterceptHandlerRc, Invocation, MemberBody,
    MemberPredicate, TargetRc,
};
pub use registry::{InterceptorRegistry, MemberSelector};
pub(crate) use registry::RegistrySnapshot;
pub use source::{DeclaredInterceptors, InterceptSource};
