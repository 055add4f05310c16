//! Builder for prototype specifications.
//!
//! This module provides the [`PrototypeBuilder`] struct, which offers a fluent
//! API for constructing prototype entries - interfaces and inheritable classes
//! with their members, constructors, generic parameters, and declared
//! interceptors - and registering them in the [`PrototypeRegistry`].
//!
//! # Example
//!
//! ```rust
//! use proxyforge::model::{ChainValue, PrototypeBuilder, PrototypeRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PrototypeRegistry::new());
//! let prototype = PrototypeBuilder::new(registry)
//!     .class("MyApp", "Calculator")
//!     .default_constructor(|_| Ok(Arc::new(())))
//!     .method("add", |m| {
//!         m.param::<i32>("a").param::<i32>("b").returns::<i32>().body(|call| {
//!             let sum = call.arg::<i32>(0)? + call.arg::<i32>(1)?;
//!             Ok(ChainValue::boxed(sum))
//!         })
//!     })
//!     .build()?;
//!
//! assert_eq!(prototype.members.count(), 1);
//! # Ok::<(), proxyforge::Error>(())
//! ```

use std::sync::Arc;

use crate::interception::invocation::{
    BaseCall, ConstructorBody, InterceptHandlerRc, MemberBody, MemberPredicate, TargetRc,
};
use crate::model::member::{
    GenericParamDef, Member, MemberFlags, MemberSignature, ParamSig, TypeSig,
};
use crate::model::prototype::{
    Constructor, Prototype, PrototypeFlags, PrototypeKind, PrototypeRc, TypeInterceptor,
};
use crate::model::registry::PrototypeRegistry;
use crate::model::value::ChainValue;
use crate::{Error, Result};

/// Fluent specification of one method while a prototype is being built.
///
/// Obtained through [`PrototypeBuilder::method`]; methods default to public
/// and virtual with a void return.
pub struct MethodSpec {
    name: String,
    flags: MemberFlags,
    params: Vec<ParamSig>,
    returns: TypeSig,
    generic_params: Vec<GenericParamDef>,
    body: Option<MemberBody>,
    declared: Vec<InterceptHandlerRc>,
}

impl MethodSpec {
    fn new(name: &str) -> Self {
        MethodSpec {
            name: name.to_string(),
            flags: MemberFlags::PUBLIC | MemberFlags::VIRTUAL,
            params: Vec::new(),
            returns: TypeSig::Void,
            generic_params: Vec::new(),
            body: None,
            declared: Vec::new(),
        }
    }

    /// Appends a parameter of concrete type `T`
    #[must_use]
    pub fn param<T: std::any::Any>(mut self, name: &str) -> Self {
        self.params.push(ParamSig {
            name: name.to_string(),
            sig: TypeSig::of::<T>(),
        });
        self
    }

    /// Appends a parameter typed by the method's generic parameter `var`
    #[must_use]
    pub fn param_var(mut self, var: u16, name: &str) -> Self {
        self.params.push(ParamSig {
            name: name.to_string(),
            sig: TypeSig::Var(var),
        });
        self
    }

    /// Declares the return type as concrete type `T`
    #[must_use]
    pub fn returns<T: std::any::Any>(mut self) -> Self {
        self.returns = TypeSig::of::<T>();
        self
    }

    /// Declares the return type as the method's generic parameter `var`
    #[must_use]
    pub fn returns_var(mut self, var: u16) -> Self {
        self.returns = TypeSig::Var(var);
        self
    }

    /// Appends an unconstrained generic parameter
    #[must_use]
    pub fn generic_param(mut self, name: &str) -> Self {
        let number = u16::try_from(self.generic_params.len()).unwrap_or(u16::MAX);
        self.generic_params.push(GenericParamDef::new(number, name));
        self
    }

    /// Appends a fully specified generic parameter, constraints included
    #[must_use]
    pub fn generic_param_def(mut self, def: GenericParamDef) -> Self {
        self.generic_params.push(def);
        self
    }

    /// Supplies the original implementation invoked by the base stage
    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&BaseCall<'_>) -> Result<ChainValue> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Removes the member from virtual dispatch
    #[must_use]
    pub fn non_virtual(mut self) -> Self {
        self.flags.remove(MemberFlags::VIRTUAL);
        self
    }

    /// Seals the member against override
    #[must_use]
    pub fn final_member(mut self) -> Self {
        self.flags |= MemberFlags::FINAL;
        self
    }

    /// Marks the member as static
    #[must_use]
    pub fn static_member(mut self) -> Self {
        self.flags |= MemberFlags::STATIC;
        self
    }

    /// Marks the member as abstract (no body of its own)
    #[must_use]
    pub fn abstract_member(mut self) -> Self {
        self.flags |= MemberFlags::ABSTRACT;
        self
    }

    /// Attaches a declared member-scoped interceptor, the equivalent of a
    /// member-level interception attribute
    #[must_use]
    pub fn intercept(mut self, handler: InterceptHandlerRc) -> Self {
        self.declared.push(handler);
        self
    }
}

/// Fluent specification of one constructor while a prototype is being built.
pub struct CtorSpec {
    params: Vec<ParamSig>,
    public: bool,
}

impl CtorSpec {
    fn new() -> Self {
        CtorSpec {
            params: Vec::new(),
            public: true,
        }
    }

    /// Appends a parameter of concrete type `T`
    #[must_use]
    pub fn param<T: std::any::Any>(mut self, name: &str) -> Self {
        self.params.push(ParamSig {
            name: name.to_string(),
            sig: TypeSig::of::<T>(),
        });
        self
    }

    /// Restricts the constructor so it is not accessible for instance creation
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.public = false;
        self
    }
}

/// Provides a fluent API for building prototype specifications.
pub struct PrototypeBuilder {
    /// Prototype registry for storing the prototypes
    registry: Arc<PrototypeRegistry>,
    namespace: String,
    name: String,
    kind: Option<PrototypeKind>,
    flags: PrototypeFlags,
    methods: Vec<MethodSpec>,
    constructors: Vec<(CtorSpec, ConstructorBody)>,
    generic_params: Vec<GenericParamDef>,
    declared_interceptors: Vec<TypeInterceptor>,
}

impl PrototypeBuilder {
    /// Create a new builder with the given registry
    ///
    /// ## Arguments
    /// * 'registry' - The prototype registry to use
    #[must_use]
    pub fn new(registry: Arc<PrototypeRegistry>) -> Self {
        PrototypeBuilder {
            registry,
            namespace: String::new(),
            name: String::new(),
            kind: None,
            flags: PrototypeFlags::PUBLIC,
            methods: Vec::new(),
            constructors: Vec::new(),
            generic_params: Vec::new(),
            declared_interceptors: Vec::new(),
        }
    }

    /// Start building an interface with the given name
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace for the interface
    /// * 'name'      - Name for the interface
    #[must_use]
    pub fn interface(mut self, namespace: &str, name: &str) -> Self {
        self.namespace = namespace.to_string();
        self.name = name.to_string();
        self.kind = Some(PrototypeKind::Interface);
        self
    }

    /// Start building a class with the given name
    ///
    /// ## Arguments
    /// * 'namespace' - Namespace for the class
    /// * 'name'      - Name for the class
    #[must_use]
    pub fn class(mut self, namespace: &str, name: &str) -> Self {
        self.namespace = namespace.to_string();
        self.name = name.to_string();
        self.kind = Some(PrototypeKind::Class);
        self
    }

    /// Seals the prototype against derivation
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= PrototypeFlags::SEALED;
        self
    }

    /// Marks the prototype abstract
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.flags |= PrototypeFlags::ABSTRACT;
        self
    }

    /// Removes public accessibility from the prototype
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.flags.remove(PrototypeFlags::PUBLIC);
        self
    }

    /// Appends a type-level generic parameter (captured verbatim)
    #[must_use]
    pub fn generic_param(mut self, name: &str) -> Self {
        let number = u16::try_from(self.generic_params.len()).unwrap_or(u16::MAX);
        self.generic_params.push(GenericParamDef::new(number, name));
        self
    }

    /// Adds a method, configured through the supplied closure
    #[must_use]
    pub fn method<F>(mut self, name: &str, configure: F) -> Self
    where
        F: FnOnce(MethodSpec) -> MethodSpec,
    {
        self.methods.push(configure(MethodSpec::new(name)));
        self
    }

    /// Adds a constructor, configured through the supplied closure
    #[must_use]
    pub fn constructor<F, B>(mut self, configure: F, body: B) -> Self
    where
        F: FnOnce(CtorSpec) -> CtorSpec,
        B: Fn(&[ChainValue]) -> Result<TargetRc> + Send + Sync + 'static,
    {
        self.constructors
            .push((configure(CtorSpec::new()), Arc::new(body)));
        self
    }

    /// Adds a parameterless constructor
    #[must_use]
    pub fn default_constructor<B>(self, body: B) -> Self
    where
        B: Fn(&[ChainValue]) -> Result<TargetRc> + Send + Sync + 'static,
    {
        self.constructor(|ctor| ctor, body)
    }

    /// Attaches a declared type-scoped interceptor, applied to every
    /// qualifying member
    #[must_use]
    pub fn intercept(mut self, handler: InterceptHandlerRc) -> Self {
        self.declared_interceptors.push(TypeInterceptor {
            handler,
            filter: None,
        });
        self
    }

    /// Attaches a declared type-scoped interceptor narrowed by its own
    /// applicability predicate
    #[must_use]
    pub fn intercept_filtered(mut self, handler: InterceptHandlerRc, filter: MemberPredicate) -> Self {
        self.declared_interceptors.push(TypeInterceptor {
            handler,
            filter: Some(filter),
        });
        self
    }

    /// Registers the prototype and returns the shared entry.
    ///
    /// Interface members are implicitly virtual; signature positions that
    /// refer to a generic parameter are validated against the declaring
    /// method's generic arity.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if no kind was selected or a
    /// signature refers to a generic parameter the method does not declare.
    pub fn build(self) -> Result<PrototypeRc> {
        let Some(kind) = self.kind else {
            return Err(Error::InvalidArgument(
                "prototype kind not selected, call interface() or class() first".to_string(),
            ));
        };

        for spec in &self.methods {
            Self::validate_signature(spec)?;
        }

        let token = self.registry.next_prototype_token();
        let members = Arc::new(boxcar::Vec::new());
        let constructors = Arc::new(boxcar::Vec::new());
        let generic_params = Arc::new(boxcar::Vec::new());
        let declared_interceptors = Arc::new(boxcar::Vec::new());

        for param in self.generic_params {
            generic_params.push(param);
        }
        for interceptor in self.declared_interceptors {
            declared_interceptors.push(interceptor);
        }
        for (spec, body) in self.constructors {
            constructors.push(Arc::new(Constructor {
                params: spec.params,
                public: spec.public,
                body,
            }));
        }

        for spec in self.methods {
            let mut flags = spec.flags;
            // Interface members always participate in virtual dispatch.
            if kind == PrototypeKind::Interface && !flags.contains(MemberFlags::STATIC) {
                flags |= MemberFlags::VIRTUAL;
            }
            if spec.body.is_none() {
                flags |= MemberFlags::ABSTRACT;
            }

            members.push(Arc::new(Member {
                token: self.registry.next_member_token(),
                name: spec.name,
                declaring: token,
                flags,
                signature: MemberSignature {
                    params: spec.params,
                    returns: spec.returns,
                    generic_params: spec.generic_params,
                },
                body: spec.body,
                declared_interceptors: spec.declared,
            }));
        }

        let prototype = Arc::new(Prototype {
            token,
            namespace: self.namespace,
            name: self.name,
            kind,
            flags: self.flags,
            members,
            constructors,
            generic_params,
            declared_interceptors,
        });
        self.registry.insert(&prototype);
        Ok(prototype)
    }

    fn validate_signature(spec: &MethodSpec) -> Result<()> {
        let arity = spec.generic_params.len();
        let out_of_range = |var: u16| {
            Error::InvalidArgument(format!(
                "method '{}' refers to generic parameter {} but declares {} generic parameter(s)",
                spec.name, var, arity
            ))
        };

        for param in &spec.params {
            if let TypeSig::Var(var) = param.sig {
                if usize::from(var) >= arity {
                    return Err(out_of_range(var));
                }
            }
        }
        if let TypeSig::Var(var) = spec.returns {
            if usize::from(var) >= arity {
                return Err(out_of_range(var));
            }
        }
        Ok(())
    }
}
