use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::BoxError;
use crate::strategy::ValueDeserializer;
use crate::types::{RawType, ScalarType, TypeDescriptor};
use crate::value::{EnumValue, Value};

/// A function converting text into an instance of a user type.
pub type FactoryFn = Arc<dyn Fn(&str) -> Result<Value, BoxError> + Send + Sync>;

/// A static method declared by a user type.
///
/// Only public static methods named `valueOf` or `fromString` taking a single
/// textual parameter are used, as map key factories.
#[derive(Clone)]
pub struct StaticMethod {
    /// The method name.
    pub name: Arc<str>,
    /// The type of the single parameter.
    pub parameter: TypeDescriptor,
    /// Whether the method is publicly reachable.
    pub public: bool,
    /// Whether the method is static.
    pub is_static: bool,
    /// The method body.
    pub invoke: FactoryFn,
}

impl StaticMethod {
    /// A public static method `name(String)`.
    pub fn new<F>(name: impl Into<Arc<str>>, invoke: F) -> Self
    where
        F: Fn(&str) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameter: TypeDescriptor::string(),
            public: true,
            is_static: true,
            invoke: Arc::new(invoke),
        }
    }

    /// Marks the method as not publicly reachable.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Marks the method as an instance method.
    #[must_use]
    pub fn instance(mut self) -> Self {
        self.is_static = false;
        self
    }

    /// Replaces the parameter type.
    #[must_use]
    pub fn parameter(mut self, parameter: TypeDescriptor) -> Self {
        self.parameter = parameter;
        self
    }

    /// Returns true if the single parameter accepts text.
    #[must_use]
    pub fn accepts_text(&self) -> bool {
        matches!(
            self.parameter.raw(),
            Some(RawType::Scalar(ScalarType::String) | RawType::Any)
        )
    }
}

impl Debug for StaticMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticMethod")
            .field("name", &self.name)
            .field("parameter", &self.parameter)
            .field("public", &self.public)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

/// An enum's constants.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub(crate) name: Arc<str>,
    pub(crate) constants: Vec<Arc<str>>,
    pub(crate) methods: Vec<StaticMethod>,
}

impl EnumDef {
    /// Declares an enum with the given constants, in ordinal order.
    pub fn new<I, S>(name: impl Into<Arc<str>>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            name: name.into(),
            constants: constants.into_iter().map(Into::into).collect(),
            methods: Vec::new(),
        }
    }

    /// Declares a static method on the enum.
    #[must_use]
    pub fn method(mut self, method: StaticMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// The enum's name.
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The number of constants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Returns true if the enum declares no constants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Returns the constant named `name`.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<EnumValue> {
        self.constants
            .iter()
            .position(|constant| &**constant == name)
            .map(|ordinal| EnumValue {
                type_name: self.name.clone(),
                ordinal,
                variant: self.constants[ordinal].clone(),
            })
    }
}

/// A property of a user class.
#[derive(Clone)]
pub struct FieldDef {
    pub(crate) name: Arc<str>,
    pub(crate) declared: TypeDescriptor,
    pub(crate) date_format: Option<Arc<str>>,
    pub(crate) deserializer: Option<Arc<dyn ValueDeserializer>>,
}

impl FieldDef {
    /// A property named `name` of the (possibly generic) type `declared`.
    pub fn new(name: impl Into<Arc<str>>, declared: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            declared,
            date_format: None,
            deserializer: None,
        }
    }

    /// Overrides the date pattern for this property.
    #[must_use]
    pub fn date_format(mut self, pattern: impl Into<Arc<str>>) -> Self {
        self.date_format = Some(pattern.into());
        self
    }

    /// Overrides the deserializer for this property.
    #[must_use]
    pub fn deserializer(mut self, deserializer: Arc<dyn ValueDeserializer>) -> Self {
        self.deserializer = Some(deserializer);
        self
    }
}

impl Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("date_format", &self.date_format)
            .field("custom_deserializer", &self.deserializer.is_some())
            .finish()
    }
}

/// A user class: either an object with properties, or, when its supertype
/// is a map or sequence, a container class.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub(crate) name: Arc<str>,
    pub(crate) type_params: Vec<Arc<str>>,
    pub(crate) supertype: Option<TypeDescriptor>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) constructible: bool,
    pub(crate) date_format: Option<Arc<str>>,
    pub(crate) methods: Vec<StaticMethod>,
}

impl ClassDef {
    /// Declares a constructible, non-generic class with no properties.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            supertype: None,
            fields: Vec::new(),
            constructible: true,
            date_format: None,
            methods: Vec::new(),
        }
    }

    /// Declares the class's type parameters.
    #[must_use]
    pub fn type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the class's supertype, expressed in terms of its own type
    /// parameters.
    #[must_use]
    pub fn extends(mut self, supertype: TypeDescriptor) -> Self {
        self.supertype = Some(supertype);
        self
    }

    /// Declares a property.
    #[must_use]
    pub fn field(self, name: impl Into<Arc<str>>, declared: TypeDescriptor) -> Self {
        self.field_def(FieldDef::new(name, declared))
    }

    /// Declares a property with overrides.
    #[must_use]
    pub fn field_def(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares a static method.
    #[must_use]
    pub fn method(mut self, method: StaticMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Sets the date pattern used by this class's properties that do not
    /// declare their own.
    #[must_use]
    pub fn date_format(mut self, pattern: impl Into<Arc<str>>) -> Self {
        self.date_format = Some(pattern.into());
        self
    }

    /// Marks the class as having no reachable no-argument constructor.
    #[must_use]
    pub fn without_default_constructor(mut self) -> Self {
        self.constructible = false;
        self
    }

    /// The class's name.
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The position of the type parameter `name`.
    #[must_use]
    pub fn type_param_index(&self, name: &str) -> Option<usize> {
        self.type_params.iter().position(|param| &**param == name)
    }
}

/// A registered user type.
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// An enum.
    Enum(Arc<EnumDef>),
    /// A class.
    Class(Arc<ClassDef>),
}

/// The metadata provider: every user type the binder may be asked to
/// decode, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<Arc<str>, TypeDef>,
}

impl TypeRegistry {
    /// Returns an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an enum, replacing any type of the same name.
    #[must_use]
    pub fn with_enum(mut self, definition: EnumDef) -> Self {
        self.register_enum(definition);
        self
    }

    /// Registers a class, replacing any type of the same name.
    #[must_use]
    pub fn with_class(mut self, definition: ClassDef) -> Self {
        self.register_class(definition);
        self
    }

    /// Registers an enum, replacing any type of the same name.
    pub fn register_enum(&mut self, definition: EnumDef) {
        self.types
            .insert(definition.name.clone(), TypeDef::Enum(Arc::new(definition)));
    }

    /// Registers a class, replacing any type of the same name.
    pub fn register_class(&mut self, definition: ClassDef) {
        self.types
            .insert(definition.name.clone(), TypeDef::Class(Arc::new(definition)));
    }

    /// The number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Looks up the enum named by `raw`.
    #[must_use]
    pub fn enum_def(&self, raw: &RawType) -> Option<&Arc<EnumDef>> {
        match raw {
            RawType::Named(name) => match self.types.get(name) {
                Some(TypeDef::Enum(definition)) => Some(definition),
                _ => None,
            },
            _ => None,
        }
    }

    /// Looks up the class named by `raw`.
    #[must_use]
    pub fn class_def(&self, raw: &RawType) -> Option<&Arc<ClassDef>> {
        match raw {
            RawType::Named(name) => match self.types.get(name) {
                Some(TypeDef::Class(definition)) => Some(definition),
                _ => None,
            },
            _ => None,
        }
    }
}
