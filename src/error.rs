use thiserror::Error;

use crate::model::token::Token;

macro_rules! synthesis_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::TypeSynthesis {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::TypeSynthesis {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur during prototype analysis,
/// interceptor registration, proxy type synthesis, and chain dispatch. Each variant provides
/// specific context about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::InvalidPrototype`] - Prototype type fails the eligibility checks
/// - [`Error::InvalidArgument`] - Null or contradictory registration arguments
/// - [`Error::MemberNotOverridable`] - Explicit member list contains a non-matching member
/// - [`Error::BuildAlreadyFinalized`] - Registration attempted after the proxy type was built
///
/// ## Synthesis Errors
/// - [`Error::TypeSynthesis`] - Proxy type generation failed; fatal for the owning builder
///
/// ## Dispatch Errors
/// - [`Error::InvalidCastInChain`] - Runtime marshalling mismatch at a stage boundary
/// - [`Error::MissingBaseImplementation`] - A chain reached a base stage that has no body
/// - [`Error::MemberNotFound`] - Invocation addressed a member the proxy type does not carry
///
/// ## Instantiation and Infrastructure Errors
/// - [`Error::MissingAccessibleConstructor`] - No constructor matches the supplied arguments
/// - [`Error::LockError`] - Thread synchronization failure
///
/// # Examples
///
/// ```rust
/// use proxyforge::{Error, ProxyBuilder};
/// use proxyforge::model::{PrototypeBuilder, PrototypeRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(PrototypeRegistry::new());
/// let prototype = PrototypeBuilder::new(registry)
///     .class("MyApp", "Sealed")
///     .sealed()
///     .build()?;
///
/// match ProxyBuilder::new(&prototype) {
///     Ok(_) => println!("builder created"),
///     Err(Error::InvalidPrototype(reason)) => {
///         eprintln!("not a valid prototype: {}", reason);
///     }
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// # Ok::<(), proxyforge::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    /// The prototype type is not eligible for proxying.
    ///
    /// A prototype must be a public interface, or a public non-sealed class
    /// exposing at least one accessible constructor. The payload describes
    /// which check failed.
    #[error("Prototype is not eligible for proxying - {0}")]
    InvalidPrototype(String),

    /// A registration argument was null or contradictory.
    ///
    /// Raised for an explicit empty member set, a generic argument list whose
    /// length does not match the member's generic arity, or an argument
    /// vector whose length does not match the member's parameter count.
    #[error("Invalid registration argument - {0}")]
    InvalidArgument(String),

    /// An explicitly listed member is not an overridable member of the prototype.
    ///
    /// The explicit member set form of registration validates every entry
    /// against the prototype's overridable member set before any mutation
    /// occurs; the payload names the offending member.
    #[error("Member is not an overridable member of the prototype - {0}")]
    MemberNotOverridable(String),

    /// The owning builder has already produced its proxy type.
    ///
    /// Once a builder's first build completes (or fails), its configuration is
    /// frozen. Registration calls fail deterministically with this error and
    /// cause no partial mutation.
    #[error("The proxy type has already been built, configuration is frozen")]
    BuildAlreadyFinalized,

    // Synthesis errors
    /// Proxy type generation failed.
    ///
    /// Synthesis is attempted at most once per builder; a failure here
    /// permanently poisons the builder and subsequent build calls re-raise
    /// it. The error includes the source location where the failure was
    /// detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what could not be synthesized
    /// * `file` - Source file in which the error was detected
    /// * `line` - Source line in which the error was detected
    #[error("TypeSynthesis - {file}:{line}: {message}")]
    TypeSynthesis {
        /// The message to be printed for the synthesis failure
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    // Dispatch errors
    /// A value could not be cast at a chain stage boundary.
    ///
    /// Raised when an interceptor substitutes an argument whose type does not
    /// match the declared parameter type, or when a base implementation
    /// returns a value that does not match the member's declared return type.
    /// The declared type always wins; covariant mismatches are caught at the
    /// boundary rather than silently propagated.
    #[error("Value could not be cast at a chain boundary - expected {expected}, found {found}")]
    InvalidCastInChain {
        /// The declared type the boundary expected
        expected: String,
        /// The type that was actually present
        found: String,
    },

    /// A chain ran to its base stage but the member declares no body.
    ///
    /// Interface members without a default body rely on an interceptor
    /// short-circuiting the chain; proceeding past the last interceptor
    /// surfaces this error to the caller of the generated member.
    #[error("Member declares no base implementation - {0}")]
    MissingBaseImplementation(String),

    /// The invoked member is not part of the proxy type.
    ///
    /// The associated [`Token`] identifies the member that was requested.
    #[error("Failed to find member in proxy type - {0}")]
    MemberNotFound(Token),

    // Instantiation errors
    /// Instance creation failed because no accessible constructor matches.
    ///
    /// Raised when the prototype declares no constructor at all, or when the
    /// supplied argument vector matches no declared constructor signature.
    #[error("No accessible constructor matches the supplied arguments")]
    MissingAccessibleConstructor,

    /// Failed to lock target.
    ///
    /// This error occurs when thread synchronization fails, typically
    /// when trying to acquire a rwlock that was poisoned by a panic.
    #[error("Failed to lock target")]
    LockError,
}
