//! Runtime object model backing the proxy engine.
//!
//! This module is the crate's type system provider: it defines prototypes
//! (interfaces and inheritable classes), their members with full signatures
//! and generic parameter constraints, the registry that holds them, and the
//! canonical value cell that crosses chain stage boundaries. The engine core
//! consumes this model only through descriptors, so an alternative provider
//! with the same surface could back it instead.
//!
//! # Key Components
//!
//! - [`Prototype`]: An interface or inheritable class entry
//! - [`Member`]: One overridable member with signature and flags
//! - [`PrototypeRegistry`]: Central registry for all prototypes in the process
//! - [`PrototypeBuilder`]: Builder pattern for constructing prototypes
//! - [`ChainValue`] / [`TypeKey`]: Boxed values and type identity tokens
//!
//! # Examples
//!
//! ```rust
//! use proxyforge::model::{ChainValue, PrototypeBuilder, PrototypeRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PrototypeRegistry::new());
//! let prototype = PrototypeBuilder::new(registry.clone())
//!     .interface("MyApp", "IGreeter")
//!     .method("greet", |m| {
//!         m.param::<String>("name").returns::<String>().body(|call| {
//!             Ok(ChainValue::boxed(format!("hello {}", call.arg::<String>(0)?)))
//!         })
//!     })
//!     .build()?;
//!
//! assert_eq!(prototype.fullname(), "MyApp.IGreeter");
//! # Ok::<(), proxyforge::Error>(())
//! ```

mod builder;
mod member;
mod prototype;
mod registry;
/// Commonly used entity token type
pub mod token;
mod value;

pub use builder::{CtorSpec, MethodSpec, PrototypeBuilder};
pub use member::{
    GenericParamDef, GenericParamFlags, Member, MemberFlags, MemberList, MemberRc,
    MemberSignature, ParamSig, TypeSig,
};
pub use prototype::{
    Constructor, ConstructorList, ConstructorRc, Prototype, PrototypeFlags, PrototypeKind,
    PrototypeRc, TypeInterceptor,
};
pub use registry::PrototypeRegistry;
pub use token::Token;
pub use value::{ChainValue, TypeKey, ValueKind};
