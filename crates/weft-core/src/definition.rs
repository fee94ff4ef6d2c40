//! Component definitions and their constructor descriptors.
//!
//! Rust has no constructor reflection, so a component author describes
//! each constructor explicitly: an ordered list of [`ParamSpec`]s and a
//! factory closure that receives the resolved arguments through [`Args`].

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use weft_common::error::ArgumentError;
use weft_common::types::{BoxError, Instance, TypeKey};

/// Type-erased factory invoked with the resolved arguments.
pub(crate) type Factory = Box<dyn Fn(&mut Args) -> Result<Instance, BoxError> + Send + Sync>;

/// Type-erased cast from a concrete instance to a capability instance.
pub(crate) type CapabilityCast = Box<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Where the value for a constructor parameter comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    /// A built instance of exactly the parameter's concrete type.
    Type,
    /// The instance registered under the parameter's capability key.
    Capability,
    /// A named value; `None` when the injection-name marker is absent.
    Named(Option<String>),
}

/// A single constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    name: String,
    ty: TypeKey,
    source: ParamSource,
}

impl ParamSpec {
    /// A parameter satisfied by the built instance of `T`.
    #[must_use]
    pub fn of_type<T: Any + Send + Sync>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeKey::of::<T>(),
            source: ParamSource::Type,
        }
    }

    /// A parameter satisfied by whichever instance provides capability `C`.
    #[must_use]
    pub fn capability<C: ?Sized + Send + Sync + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeKey::of::<C>(),
            source: ParamSource::Capability,
        }
    }

    /// A parameter satisfied by the named value registered under `key`.
    ///
    /// A blank `key` leaves the parameter without an injection-name marker.
    #[must_use]
    pub fn named<T: Any + Send + Sync>(name: impl Into<String>, key: &str) -> Self {
        let key = key.trim();
        Self {
            name: name.into(),
            ty: TypeKey::of::<T>(),
            source: ParamSource::Named((!key.is_empty()).then(|| key.to_string())),
        }
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the required type (concrete type or capability).
    #[must_use]
    pub const fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Returns where the value comes from.
    #[must_use]
    pub const fn source(&self) -> &ParamSource {
        &self.source
    }

    /// Describes the parameter for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.source {
            ParamSource::Type | ParamSource::Capability => {
                format!("{}: {}", self.name, self.ty)
            }
            ParamSource::Named(Some(key)) => format!("{} = \"{key}\"", self.name),
            ParamSource::Named(None) => format!("{} = <unmarked>", self.name),
        }
    }
}

/// One constructor of a definition: its parameters and its factory.
pub struct ConstructorDescriptor {
    params: Vec<ParamSpec>,
    factory: Factory,
}

impl ConstructorDescriptor {
    /// Returns the ordered parameter list.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Invokes the factory with resolved arguments.
    pub(crate) fn instantiate(&self, args: &mut Args) -> Result<Instance, BoxError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A capability declared by a definition.
pub struct Capability {
    key: TypeKey,
    cast: CapabilityCast,
}

impl Capability {
    /// Returns the capability key.
    #[must_use]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// Casts a concrete instance into the capability instance.
    pub(crate) fn cast(&self, instance: &Instance) -> Option<Instance> {
        (self.cast)(instance)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// A component type awaiting registration.
///
/// Carries every constructor the author declared; registration accepts it
/// only when there is exactly one.
#[derive(Debug)]
pub struct Definition {
    ty: TypeKey,
    constructors: Vec<ConstructorDescriptor>,
    capabilities: Vec<Capability>,
}

impl Definition {
    /// Starts describing component type `T`.
    #[must_use]
    pub fn of<T: Any + Send + Sync>() -> DefinitionBuilder<T> {
        DefinitionBuilder {
            ty: TypeKey::of::<T>(),
            constructors: Vec::new(),
            capabilities: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the component type.
    #[must_use]
    pub const fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Returns how many constructors were declared.
    #[must_use]
    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub(crate) fn into_parts(self) -> (TypeKey, Vec<ConstructorDescriptor>, Vec<Capability>) {
        (self.ty, self.constructors, self.capabilities)
    }
}

/// A definition that passed registration: it has exactly one constructor.
#[derive(Debug)]
pub struct Blueprint {
    ty: TypeKey,
    constructor: ConstructorDescriptor,
    capabilities: Vec<Capability>,
}

impl Blueprint {
    pub(crate) const fn new(
        ty: TypeKey,
        constructor: ConstructorDescriptor,
        capabilities: Vec<Capability>,
    ) -> Self {
        Self {
            ty,
            constructor,
            capabilities,
        }
    }

    /// Returns the component type.
    #[must_use]
    pub const fn ty(&self) -> TypeKey {
        self.ty
    }

    /// Returns the single constructor.
    #[must_use]
    pub const fn constructor(&self) -> &ConstructorDescriptor {
        &self.constructor
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}

/// Fluent builder for a [`Definition`] of type `T`.
pub struct DefinitionBuilder<T> {
    ty: TypeKey,
    constructors: Vec<ConstructorDescriptor>,
    capabilities: Vec<Capability>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> DefinitionBuilder<T> {
    /// Declares a constructor.
    ///
    /// The factory receives the arguments in `params` order.
    #[must_use]
    pub fn constructor<F>(mut self, params: Vec<ParamSpec>, factory: F) -> Self
    where
        F: Fn(&mut Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorDescriptor {
            params,
            factory: Box::new(move |args: &mut Args| {
                factory(args).map(|value| Arc::new(value) as Instance)
            }),
        });
        self
    }

    /// Declares that `T` provides capability `C`, via the given cast.
    ///
    /// ```rust
    /// # use weft_core::definition::Definition;
    /// trait Greeter: Send + Sync {}
    /// struct English;
    /// impl Greeter for English {}
    ///
    /// let definition = Definition::of::<English>()
    ///     .constructor(vec![], |_| Ok(English))
    ///     .provides::<dyn Greeter>(|english| english)
    ///     .build();
    /// assert_eq!(definition.capabilities().len(), 1);
    /// ```
    #[must_use]
    pub fn provides<C: ?Sized + Send + Sync + 'static>(
        mut self,
        cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self {
        let key = TypeKey::of::<C>();
        self.capabilities.retain(|c| c.key != key);
        self.capabilities.push(Capability {
            key,
            cast: Box::new(move |instance: &Instance| {
                Arc::clone(instance)
                    .downcast::<T>()
                    .ok()
                    .map(|concrete| Arc::new(cast(concrete)) as Instance)
            }),
        });
        self
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> Definition {
        Definition {
            ty: self.ty,
            constructors: self.constructors,
            capabilities: self.capabilities,
        }
    }
}

impl<T: Any + Send + Sync> From<DefinitionBuilder<T>> for Definition {
    fn from(builder: DefinitionBuilder<T>) -> Self {
        builder.build()
    }
}

/// A type that describes its own definition.
pub trait Component: Any + Send + Sync + Sized {
    /// Returns the definition of this component.
    fn definition() -> DefinitionBuilder<Self>;
}

/// A resolved constructor argument.
#[derive(Debug)]
pub(crate) struct Argument {
    pub(crate) param: String,
    pub(crate) value: Instance,
}

/// Resolved arguments handed to a factory, consumed in declaration order.
#[derive(Debug)]
pub struct Args {
    definition: &'static str,
    declared: usize,
    next: usize,
    values: std::vec::IntoIter<Argument>,
}

impl Args {
    pub(crate) fn new(definition: &'static str, values: Vec<Argument>) -> Self {
        Self {
            definition,
            declared: values.len(),
            next: 0,
            values: values.into_iter(),
        }
    }

    /// Takes the next argument as an instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if every argument was taken or the next one is not a `T`.
    pub fn take<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>, ArgumentError> {
        let argument = self.advance()?;
        argument
            .value
            .downcast::<T>()
            .map_err(|_| self.mismatch(argument.param, std::any::type_name::<T>()))
    }

    /// Takes the next argument and clones it out of its shared instance.
    ///
    /// # Errors
    ///
    /// Returns an error if every argument was taken or the next one is not a `T`.
    pub fn take_cloned<T: Any + Send + Sync + Clone>(&mut self) -> Result<T, ArgumentError> {
        self.take::<T>().map(|value| T::clone(&value))
    }

    /// Takes the next argument as capability `C`.
    ///
    /// # Errors
    ///
    /// Returns an error if every argument was taken or the next one does not
    /// hold capability `C`.
    pub fn take_capability<C: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> Result<Arc<C>, ArgumentError> {
        let argument = self.advance()?;
        argument
            .value
            .downcast::<Arc<C>>()
            .map(|capability| Arc::clone(&*capability))
            .map_err(|_| self.mismatch(argument.param, std::any::type_name::<C>()))
    }

    fn advance(&mut self) -> Result<Argument, ArgumentError> {
        let index = self.next;
        let argument = self.values.next().ok_or_else(|| ArgumentError::Exhausted {
            definition: self.definition.to_string(),
            index,
            declared: self.declared,
        })?;
        self.next += 1;
        Ok(argument)
    }

    fn mismatch(&self, parameter: String, expected: &'static str) -> ArgumentError {
        ArgumentError::TypeMismatch {
            definition: self.definition.to_string(),
            parameter,
            expected,
        }
    }
}
