// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # proxyforge
//!
//! [![Crates.io](https://img.shields.io/crates/v/proxyforge.svg)](https://crates.io/crates/proxyforge)
//! [![Documentation](https://docs.rs/proxyforge/badge.svg)](https://docs.rs/proxyforge)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/proxyforge/blob/main/LICENSE-APACHE)
//!
//! A runtime proxy synthesis and interception engine, built in pure Rust. Given a prototype
//! type - an interface or an inheritable class - `proxyforge` produces, at process runtime, a
//! concrete proxy type that routes every overridable member call through a configurable,
//! ordered chain of interceptors before (optionally) invoking the original implementation.
//!
//! ## Features
//!
//! - **🧩 Deterministic chain ordering** - Type-scoped interceptors run before member-scoped
//!   ones, each scope in registration order, always
//! - **🔁 Continuation control** - An interceptor may invoke the rest of the chain zero, one,
//!   or multiple times; short-circuits and retries are first-class
//! - **📐 Generic member fidelity** - Generic signatures, parameter constraints, and explicit
//!   type-argument propagation across the generated boundary
//! - **🧊 Freeze semantics** - One memoized build per builder; registration after the build
//!   fails deterministically
//! - **🛡️ Checked marshalling** - Arguments and returns cross the base-call boundary against
//!   the declared types, catching substituted and covariant mismatches at the boundary
//! - **⚡ Concurrent dispatch** - Compiled chains are immutable closures, callable
//!   concurrently and reentrantly without locking
//!
//! ## Quick Start
//!
//! Add `proxyforge` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! proxyforge = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use proxyforge::prelude::*;
//! use std::sync::Arc;
//!
//! // Describe the prototype: an interface with one member.
//! let registry = Arc::new(PrototypeRegistry::new());
//! let prototype = PrototypeBuilder::new(registry)
//!     .interface("Demo", "ICalculator")
//!     .method("add", |m| {
//!         m.param::<i32>("a").param::<i32>("b").returns::<i32>().body(|call| {
//!             Ok(ChainValue::boxed(call.arg::<i32>(0)? + call.arg::<i32>(1)?))
//!         })
//!     })
//!     .build()?;
//!
//! // Configure and build the proxy type.
//! let builder = ProxyBuilder::new(&prototype)?;
//! builder.register_for_type(Arc::new(|invocation| {
//!     // Runs around every member call; forward to the rest of the chain.
//!     invocation.proceed()
//! }))?;
//!
//! let instance = builder.create_instance()?;
//! let result = instance.invoke_by_name(
//!     "add",
//!     vec![ChainValue::boxed(2i32), ChainValue::boxed(3i32)],
//! )?;
//! assert_eq!(result.unbox::<i32>()?, 5);
//! # Ok::<(), proxyforge::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `proxyforge` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`model`] - The runtime object model: prototypes, members, signatures, and values
//! - [`interception`] - Registration, chain compilation, and per-call dispatch context
//! - [`proxy`] - Prototype analysis, the proxy builder, and type synthesis
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### Interception Pipeline
//!
//! A proxy configuration moves through four stages:
//!
//! 1. **Analysis** - the prototype is validated (public interface, or public non-sealed
//!    class with an accessible constructor) and its overridable members are enumerated
//! 2. **Registration** - interceptors are appended, member-scoped (explicit member sets or
//!    predicates) or type-scoped, in call order; interceptors declared on the prototype
//!    itself are consumed first
//! 3. **Synthesis** - the first build request freezes the configuration and compiles one
//!    dispatch chain per member; the result is cached and shared by all instances
//! 4. **Dispatch** - instance calls run purely through the compiled chains, with checked
//!    marshalling at the base-call boundary
//!
//! ### Ordering Contract
//!
//! For every member the outer-to-inner execution order is
//! `[type-scoped in registration order]` → `[member-scoped in registration order]` → base.
//! An interceptor that never invokes its continuation short-circuits everything inner.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with comprehensive error information:
//!
//! ```rust
//! use proxyforge::{Error, ProxyBuilder};
//! use proxyforge::model::{PrototypeBuilder, PrototypeRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PrototypeRegistry::new());
//! let sealed = PrototypeBuilder::new(registry)
//!     .class("Demo", "Sealed")
//!     .sealed()
//!     .build()?;
//!
//! match ProxyBuilder::new(&sealed) {
//!     Ok(_) => println!("builder created"),
//!     Err(Error::InvalidPrototype(reason)) => println!("rejected: {reason}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! # Ok::<(), proxyforge::Error>(())
//! ```
#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the proxyforge library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use proxyforge::prelude::*;
/// use std::sync::Arc;
///
/// let registry = Arc::new(PrototypeRegistry::new());
/// let prototype = PrototypeBuilder::new(registry)
///     .interface("Demo", "IThing")
///     .build()?;
/// let builder = ProxyBuilder::new(&prototype)?;
/// # Ok::<(), proxyforge::Error>(())
/// ```
pub mod prelude;

pub mod interception;
pub mod model;
pub mod proxy;

/// `proxyforge` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust
/// use proxyforge::{ProxyBuilder, Result};
/// use proxyforge::model::PrototypeRc;
///
/// fn build_default(prototype: &PrototypeRc) -> Result<ProxyBuilder> {
///     ProxyBuilder::new(prototype)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `proxyforge` Error type
///
/// The main error type for all operations in this crate. Provides detailed error information
/// for prototype analysis, interceptor registration, type synthesis, and chain dispatch.
pub use error::Error;

/// Main entry point for building proxy types.
///
/// See [`proxy::ProxyBuilder`] for configuration, synthesis, and instance creation.
///
/// # Example
///
/// ```rust
/// use proxyforge::{MemberSelector, ProxyBuilder};
/// use proxyforge::model::{PrototypeBuilder, PrototypeRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(PrototypeRegistry::new());
/// let prototype = PrototypeBuilder::new(registry)
///     .interface("Demo", "IThing")
///     .method("get", |m| m.returns::<i32>())
///     .build()?;
///
/// let builder = ProxyBuilder::new(&prototype)?;
/// let proxy_type = builder.build()?;
/// println!("synthesized {}", proxy_type.name());
/// # Ok::<(), proxyforge::Error>(())
/// ```
pub use proxy::{ProxyBuilder, ProxyObject, ProxyTypeDescriptor};

/// Interceptor registration surface.
///
/// [`MemberSelector`] chooses which members a member-scoped registration applies to;
/// [`Invocation`] is the context every interceptor stage observes.
pub use interception::{Invocation, MemberSelector};
