//! The proxy builder: configuration surface and memoized type synthesis.
//!
//! A [`ProxyBuilder`] owns one proxy configuration: the analyzed prototype
//! descriptor plus the interceptor registry. Interceptors declared on the
//! prototype itself (the attribute equivalents) are consumed when the builder
//! is created; explicit registrations are appended afterwards in call order.
//!
//! The first build request freezes the configuration, compiles every chain,
//! and caches the resulting [`ProxyTypeDescriptor`]; subsequent build
//! requests return the cached descriptor. Two threads racing the first build
//! observe the same descriptor - the build runs exactly once. A synthesis
//! failure permanently poisons the builder: later build calls re-raise it,
//! generation is never retried.
//!
//! # Examples
//!
//! ```rust
//! use proxyforge::model::{ChainValue, PrototypeBuilder, PrototypeRegistry};
//! use proxyforge::{MemberSelector, ProxyBuilder};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PrototypeRegistry::new());
//! let prototype = PrototypeBuilder::new(registry)
//!     .interface("MyApp", "ICalculator")
//!     .method("add", |m| {
//!         m.param::<i32>("a").param::<i32>("b").returns::<i32>().body(|call| {
//!             Ok(ChainValue::boxed(call.arg::<i32>(0)? + call.arg::<i32>(1)?))
//!         })
//!     })
//!     .build()?;
//!
//! let builder = ProxyBuilder::new(&prototype)?;
//! builder.register(
//!     Arc::new(|invocation| invocation.proceed()),
//!     &MemberSelector::All,
//! )?;
//!
//! let instance = builder.create_instance()?;
//! let result = instance.invoke_by_name("add", vec![ChainValue::boxed(2i32), ChainValue::boxed(3i32)])?;
//! assert_eq!(result.unbox::<i32>()?, 5);
//! # Ok::<(), proxyforge::Error>(())
//! ```

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::interception::invocation::{InterceptHandlerRc, MemberPredicate, TargetRc};
use crate::interception::{DeclaredInterceptors, InterceptSource, InterceptorRegistry, MemberSelector};
use crate::model::{ChainValue, Constructor, PrototypeRc, TypeSig};
use crate::proxy::analyzer::{self, PrototypeDescriptor};
use crate::proxy::descriptor::{ProxyObject, ProxyTypeDescriptor};
use crate::proxy::synthesizer;
use crate::{Error, Result};

/// Process-wide cache of default builders, keyed by prototype identity.
static DEFAULT_BUILDERS: OnceLock<DashMap<usize, Arc<ProxyBuilder>>> = OnceLock::new();

/// Result of the one-shot build, kept for every later build call.
enum BuildOutcome {
    Built(Arc<ProxyTypeDescriptor>),
    /// Synthesis failed; the message re-raises on every subsequent build
    Failed(String),
}

/// Builds a proxy type from a prototype and a set of interceptor registrations.
pub struct ProxyBuilder {
    descriptor: PrototypeDescriptor,
    registry: InterceptorRegistry,
    built: OnceLock<BuildOutcome>,
}

impl ProxyBuilder {
    /// Creates a builder for `prototype`.
    ///
    /// The prototype is validated and its overridable members enumerated;
    /// interceptors declared on the prototype and its members are consumed
    /// before the builder is handed out, so explicit registrations order
    /// after them within each scope.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrototype`] if the prototype fails the
    /// eligibility checks.
    pub fn new(prototype: &PrototypeRc) -> Result<Self> {
        let descriptor = analyzer::analyze(prototype)?;
        let registry = InterceptorRegistry::new(descriptor.overridable_members().to_vec());

        let builder = ProxyBuilder {
            descriptor,
            registry,
            built: OnceLock::new(),
        };
        builder.apply_source(&DeclaredInterceptors::new(prototype))?;
        Ok(builder)
    }

    /// Returns the process-wide default builder for `prototype`, creating it
    /// on first use.
    ///
    /// Distinct explicitly-created builders for the same prototype may
    /// coexist with the default; only the default is memoized here.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrototype`] if the prototype fails the
    /// eligibility checks.
    pub fn default_for(prototype: &PrototypeRc) -> Result<Arc<ProxyBuilder>> {
        let cache = DEFAULT_BUILDERS.get_or_init(DashMap::new);
        let key = Arc::as_ptr(prototype) as usize;

        if let Some(existing) = cache.get(&key) {
            return Ok(existing.clone());
        }
        let builder = Arc::new(ProxyBuilder::new(prototype)?);
        Ok(cache.entry(key).or_insert(builder).clone())
    }

    /// The analyzed prototype descriptor this builder works from
    #[must_use]
    pub fn descriptor(&self) -> &PrototypeDescriptor {
        &self.descriptor
    }

    /// The prototype this builder derives from
    #[must_use]
    pub fn prototype(&self) -> &PrototypeRc {
        self.descriptor.prototype()
    }

    /// Registers a member-scoped interceptor for every member the selector
    /// matches, preserving call-site order.
    ///
    /// # Errors
    /// - [`Error::BuildAlreadyFinalized`] once the proxy type has been built
    /// - [`Error::InvalidArgument`] if an explicit member set is empty
    /// - [`Error::MemberNotOverridable`] if an explicit member is not part of
    ///   the prototype's overridable member set
    pub fn register(&self, handler: InterceptHandlerRc, selector: &MemberSelector) -> Result<()> {
        self.registry.register(handler, selector)
    }

    /// Registers a type-scoped interceptor applied to every qualifying member.
    ///
    /// # Errors
    /// Returns [`Error::BuildAlreadyFinalized`] once the proxy type has been
    /// built.
    pub fn register_for_type(&self, handler: InterceptHandlerRc) -> Result<()> {
        self.registry.register_for_type(handler)
    }

    /// Registers a type-scoped interceptor narrowed by its own applicability
    /// predicate.
    ///
    /// # Errors
    /// Returns [`Error::BuildAlreadyFinalized`] once the proxy type has been
    /// built.
    pub fn register_for_type_filtered(
        &self,
        handler: InterceptHandlerRc,
        filter: MemberPredicate,
    ) -> Result<()> {
        self.registry.register_for_type_filtered(handler, filter)
    }

    /// Applies every registration an [`InterceptSource`] enumerates, in its
    /// order.
    ///
    /// # Errors
    /// As [`ProxyBuilder::register`] and [`ProxyBuilder::register_for_type`].
    pub fn apply_source(&self, source: &dyn InterceptSource) -> Result<()> {
        for (handler, selector) in source.member_scoped() {
            self.registry.register(handler, &selector)?;
        }
        for (handler, filter) in source.type_scoped() {
            match filter {
                Some(filter) => self.registry.register_for_type_filtered(handler, filter)?,
                None => self.registry.register_for_type(handler)?,
            }
        }
        Ok(())
    }

    /// True once the first build request has run (successfully or not)
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built.get().is_some()
    }

    /// Builds the proxy type, freezing further registration.
    ///
    /// The build runs exactly once per builder; every later call - including
    /// calls racing the first from other threads - observes the same cached
    /// descriptor. A failed build poisons the builder permanently.
    ///
    /// # Errors
    /// Returns [`Error::TypeSynthesis`] if synthesis failed, now or on the
    /// first attempt.
    pub fn build(&self) -> Result<Arc<ProxyTypeDescriptor>> {
        let outcome = self.built.get_or_init(|| {
            let result = self
                .registry
                .freeze()
                .and_then(|snapshot| synthesizer::synthesize(&self.descriptor, &snapshot));
            match result {
                Ok(descriptor) => BuildOutcome::Built(Arc::new(descriptor)),
                Err(error) => BuildOutcome::Failed(error.to_string()),
            }
        });

        match outcome {
            BuildOutcome::Built(descriptor) => Ok(descriptor.clone()),
            BuildOutcome::Failed(message) => Err(synthesis_error!("{}", message)),
        }
    }

    /// Creates an instance of the proxy type using the parameterless
    /// constructor.
    ///
    /// # Errors
    /// - Whatever [`ProxyBuilder::build`] surfaces
    /// - [`Error::MissingAccessibleConstructor`] if no parameterless
    ///   constructor is accessible
    pub fn create_instance(&self) -> Result<ProxyObject> {
        self.create_instance_with(Vec::new())
    }

    /// Creates an instance of the proxy type, selecting the first accessible
    /// constructor whose signature matches the supplied arguments.
    ///
    /// Interfaces without declared constructors accept an empty argument
    /// vector and dispatch against unit state.
    ///
    /// # Errors
    /// - Whatever [`ProxyBuilder::build`] surfaces
    /// - [`Error::MissingAccessibleConstructor`] if no declared constructor
    ///   matches
    pub fn create_instance_with(&self, args: Vec<ChainValue>) -> Result<ProxyObject> {
        let descriptor = self.build()?;
        let prototype = self.prototype();

        let target: TargetRc = match prototype
            .constructors
            .iter()
            .find(|(_, ctor)| constructor_matches(ctor, &args))
        {
            Some((_, ctor)) => (ctor.body)(&args)?,
            None if prototype.is_interface()
                && prototype.constructors.count() == 0
                && args.is_empty() =>
            {
                Arc::new(())
            }
            None => return Err(Error::MissingAccessibleConstructor),
        };

        Ok(ProxyObject::new(descriptor, target))
    }
}

/// True if `ctor` is accessible and its signature accepts `args`.
fn constructor_matches(ctor: &Constructor, args: &[ChainValue]) -> bool {
    ctor.public
        && ctor.params.len() == args.len()
        && ctor
            .params
            .iter()
            .zip(args)
            .all(|(param, arg)| match (&param.sig, arg) {
                (TypeSig::Concrete(key), ChainValue::Boxed { key: found, .. }) => found == key,
                (TypeSig::Concrete(_), ChainValue::Null) => true,
                _ => false,
            })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::{PrototypeBuilder, PrototypeRegistry};

    fn registry() -> Arc<PrototypeRegistry> {
        Arc::new(PrototypeRegistry::new())
    }

    fn calculator(registry: &Arc<PrototypeRegistry>) -> PrototypeRc {
        PrototypeBuilder::new(registry.clone())
            .interface("MyApp", "ICalculator")
            .method("add", |m| {
                m.param::<i32>("a")
                    .param::<i32>("b")
                    .returns::<i32>()
                    .body(|call| {
                        Ok(ChainValue::boxed(call.arg::<i32>(0)? + call.arg::<i32>(1)?))
                    })
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_is_memoized() {
        let builder = ProxyBuilder::new(&calculator(&registry())).unwrap();
        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_registration_after_build_fails() {
        let builder = ProxyBuilder::new(&calculator(&registry())).unwrap();
        builder.build().unwrap();

        let result = builder.register(
            Arc::new(|invocation| invocation.proceed()),
            &MemberSelector::All,
        );
        assert!(matches!(result, Err(Error::BuildAlreadyFinalized)));

        let type_scoped = builder.register_for_type(Arc::new(|invocation| invocation.proceed()));
        assert!(matches!(type_scoped, Err(Error::BuildAlreadyFinalized)));
    }

    #[test]
    fn test_racing_first_builds_observe_same_descriptor() {
        let builder = Arc::new(ProxyBuilder::new(&calculator(&registry())).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let builder = builder.clone();
                std::thread::spawn(move || builder.build().unwrap())
            })
            .collect();

        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for descriptor in &descriptors[1..] {
            assert!(Arc::ptr_eq(&descriptors[0], descriptor));
        }
    }

    #[test]
    fn test_default_builder_is_cached_per_prototype() {
        let registry = registry();
        let prototype = calculator(&registry);

        let first = ProxyBuilder::default_for(&prototype).unwrap();
        let second = ProxyBuilder::default_for(&prototype).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // A distinct explicitly-created builder may coexist with the default.
        let explicit = ProxyBuilder::new(&prototype).unwrap();
        assert!(!std::ptr::eq(first.as_ref(), &explicit));
    }

    #[test]
    fn test_create_instance_with_matching_constructor() {
        let prototype = PrototypeBuilder::new(registry())
            .class("MyApp", "Counter")
            .constructor(
                |ctor| ctor.param::<i32>("seed"),
                |args| {
                    let seed = args[0].unbox::<i32>()?;
                    Ok(Arc::new(Mutex::new(seed)))
                },
            )
            .method("get", |m| {
                m.returns::<i32>().body(|call| {
                    let counter = call.target::<Mutex<i32>>()?;
                    let value = *counter.lock().map_err(|_| Error::LockError)?;
                    Ok(ChainValue::boxed(value))
                })
            })
            .build()
            .unwrap();
        let builder = ProxyBuilder::new(&prototype).unwrap();

        let instance = builder
            .create_instance_with(vec![ChainValue::boxed(41i32)])
            .unwrap();
        let result = instance.invoke_by_name("get", Vec::new()).unwrap();
        assert_eq!(result.unbox::<i32>().unwrap(), 41);
    }

    #[test]
    fn test_create_instance_without_matching_constructor() {
        let prototype = PrototypeBuilder::new(registry())
            .class("MyApp", "Strict")
            .constructor(|ctor| ctor.param::<i32>("seed"), |_| Ok(Arc::new(())))
            .method("noop", |m| m.body(|_| Ok(ChainValue::void())))
            .build()
            .unwrap();
        let builder = ProxyBuilder::new(&prototype).unwrap();

        // Wrong arity.
        let no_args = builder.create_instance();
        assert!(matches!(no_args, Err(Error::MissingAccessibleConstructor)));

        // Wrong argument type.
        let wrong_type =
            builder.create_instance_with(vec![ChainValue::boxed(String::from("seed"))]);
        assert!(matches!(
            wrong_type,
            Err(Error::MissingAccessibleConstructor)
        ));
    }

    #[test]
    fn test_interface_without_constructor_gets_unit_state() {
        let builder = ProxyBuilder::new(&calculator(&registry())).unwrap();
        let instance = builder.create_instance().unwrap();
        assert!(instance.target::<()>().is_ok());
    }

    #[test]
    fn test_invoking_foreign_member_fails() {
        let registry = registry();
        let builder = ProxyBuilder::new(&calculator(&registry)).unwrap();
        let instance = builder.create_instance().unwrap();

        let other = PrototypeBuilder::new(registry)
            .interface("MyApp", "IOther")
            .method("other", |m| m.returns::<i32>())
            .build()
            .unwrap();
        let foreign = other.member_by_name("other").unwrap();

        let result = instance.invoke(&foreign, Vec::new());
        assert!(matches!(result, Err(Error::MemberNotFound(_))));
    }
}
