//! Proxy builder, prototype analysis, and type synthesis.
//!
//! The flow through this module mirrors the life of one proxy configuration:
//! [`analyzer`] validates a prototype and captures its overridable
//! member set, [`ProxyBuilder`] collects interceptor registrations against
//! it, and the synthesizer compiles one dispatch chain per member into a
//! frozen [`ProxyTypeDescriptor`] that every [`ProxyObject`] instance
//! dispatches through.

pub mod analyzer;
mod builder;
mod descriptor;
pub(crate) mod synthesizer;

pub use analyzer::PrototypeDescriptor;
pub use builder::ProxyBuilder;
pub use descriptor::{ProxyObject, ProxyTypeDescriptor};
