//! # proxyforge Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits from the proxyforge library. Import this module to get quick
//! access to the essential types for proxy synthesis and interception.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all proxyforge operations
pub use crate::Error;

/// The result type used throughout proxyforge
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The proxy builder: configuration surface and memoized type synthesis
pub use crate::proxy::ProxyBuilder;

/// Synthesized proxy types and their instances
pub use crate::proxy::{ProxyObject, ProxyTypeDescriptor};

/// The analyzed view of a prototype a builder works from
pub use crate::proxy::PrototypeDescriptor;

// ================================================================================================
// Interception
// ================================================================================================

/// Handler, predicate, and invocation context types for interceptor stages
pub use crate::interception::{
    BaseCall, InterceptHandler, InterceptHandlerRc, Invocation, MemberPredicate,
};

/// Registration selectors and configuration sources
pub use crate::interception::{DeclaredInterceptors, InterceptSource, MemberSelector};

// ================================================================================================
// Runtime Object Model
// ================================================================================================

/// Identity token for model entities
pub use crate::model::Token;

/// Core model entities
pub use crate::model::{
    Member, MemberFlags, MemberRc, Prototype, PrototypeBuilder, PrototypeKind, PrototypeRc,
    PrototypeRegistry,
};

/// Values and type identity crossing chain boundaries
pub use crate::model::{ChainValue, TypeKey, TypeSig, ValueKind};
