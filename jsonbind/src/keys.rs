use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BoxError;
use crate::metadata::{FactoryFn, StaticMethod, TypeDef, TypeRegistry};
use crate::types::{RawType, ScalarType, TypeDescriptor};
use crate::value::Value;

/// The method names probed, in order, when looking for a key factory on a
/// user type.
pub const FACTORY_METHODS: [&str; 2] = ["valueOf", "fromString"];

/// A resolved conversion from key text to a key of one type.
#[derive(Clone)]
pub struct KeyFactory {
    method: Arc<str>,
    parse: FactoryFn,
}

impl KeyFactory {
    fn new<F>(method: &str, parse: F) -> Self
    where
        F: Fn(&str) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            method: Arc::from(method),
            parse: Arc::new(parse),
        }
    }

    fn from_method(method: &StaticMethod) -> Self {
        Self {
            method: method.name.clone(),
            parse: method.invoke.clone(),
        }
    }

    /// The name of the method backing this factory.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Converts `text` into a key.
    pub fn parse(&self, text: &str) -> Result<Value, BoxError> {
        (self.parse)(text)
    }
}

impl Debug for KeyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFactory")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Converts JSON object member names into keys of the declared key type.
///
/// The factory found for each raw key type, including the absence of one, is
/// remembered for the lifetime of the cache. The cache is shared by every
/// decode performed through the owning [`Binder`](crate::Binder).
#[derive(Default)]
pub struct KeyCoercionCache {
    factories: RwLock<HashMap<RawType, Option<KeyFactory>>>,
}

impl Debug for KeyCoercionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.factories.read().iter()).finish()
    }
}

impl KeyCoercionCache {
    /// Returns an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of key types looked up so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.read().len()
    }

    /// Returns true if no key type has been looked up.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.read().is_empty()
    }

    /// Returns true if the factory lookup for `raw` has been cached.
    #[must_use]
    pub fn contains(&self, raw: &RawType) -> bool {
        self.factories.read().contains_key(raw)
    }

    /// Returns the factory for keys of type `raw`, looking it up on first
    /// use.
    pub fn factory_for(&self, raw: &RawType, types: &TypeRegistry) -> Option<KeyFactory> {
        if let Some(factory) = self.factories.read().get(raw) {
            return factory.clone();
        }

        let factory = find_factory(raw, types);
        #[cfg(feature = "tracing")]
        tracing::trace!(key_type = %raw, method = ?factory.as_ref().map(KeyFactory::method), "key factory");
        self.factories
            .write()
            .entry(raw.clone())
            .or_insert(factory)
            .clone()
    }

    /// Converts the member name `text` into a key of type `key_type`.
    ///
    /// Textual and unconstrained key types receive the text unchanged. Other
    /// types are converted by their factory; when no factory exists the text
    /// is used as the key. A factory that rejects the text is an error.
    pub fn coerce(
        &self,
        text: &str,
        key_type: &TypeDescriptor,
        types: &TypeRegistry,
    ) -> Result<Value, BoxError> {
        let Some(raw) = key_type.raw() else {
            return Ok(Value::from(text));
        };
        if matches!(raw, RawType::Scalar(ScalarType::String) | RawType::Any) {
            return Ok(Value::from(text));
        }

        match self.factory_for(raw, types) {
            Some(factory) => factory.parse(text),
            None => Ok(Value::from(text)),
        }
    }
}

fn find_factory(raw: &RawType, types: &TypeRegistry) -> Option<KeyFactory> {
    match raw {
        RawType::Scalar(scalar) => scalar_factory(*scalar),
        RawType::Named(name) => match types.get(name)? {
            TypeDef::Enum(definition) => declared_factory(&definition.methods).or_else(|| {
                let definition = definition.clone();
                Some(KeyFactory::new("valueOf", move |text| {
                    definition.constant(text).map(Value::Enum).ok_or_else(|| {
                        format!("no constant `{text}` in enum `{}`", definition.name).into()
                    })
                }))
            }),
            TypeDef::Class(class) => declared_factory(&class.methods),
        },
        RawType::Date(_)
        | RawType::Any
        | RawType::Optional
        | RawType::Sequence(_)
        | RawType::Map(_) => None,
    }
}

fn declared_factory(methods: &[StaticMethod]) -> Option<KeyFactory> {
    FACTORY_METHODS.iter().find_map(|name| {
        methods
            .iter()
            .find(|method| {
                &*method.name == *name && method.public && method.is_static && method.accepts_text()
            })
            .map(KeyFactory::from_method)
    })
}

macro_rules! parse_factory {
    ($primitive:ty, $variant:ident) => {
        Some(KeyFactory::new("valueOf", |text| {
            Ok(Value::$variant(text.parse::<$primitive>()?.into()))
        }))
    };
}

fn scalar_factory(scalar: ScalarType) -> Option<KeyFactory> {
    match scalar {
        ScalarType::String => None,
        ScalarType::Char => Some(KeyFactory::new("valueOf", |text| {
            Ok(Value::Char(text.parse::<char>()?))
        })),
        ScalarType::Bool => Some(KeyFactory::new("valueOf", |text| {
            Ok(Value::Bool(text.parse::<bool>()?))
        })),
        ScalarType::I8 => parse_factory!(i8, Integer),
        ScalarType::I16 => parse_factory!(i16, Integer),
        ScalarType::I32 => parse_factory!(i32, Integer),
        ScalarType::I64 => parse_factory!(i64, Integer),
        ScalarType::U8 => parse_factory!(u8, Unsigned),
        ScalarType::U16 => parse_factory!(u16, Unsigned),
        ScalarType::U32 => parse_factory!(u32, Unsigned),
        ScalarType::U64 => parse_factory!(u64, Unsigned),
        ScalarType::F32 => parse_factory!(f32, Float),
        ScalarType::F64 => parse_factory!(f64, Float),
    }
}
