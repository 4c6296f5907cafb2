use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::io::Read;
use std::sync::Arc;

use crate::de::Deserializer;
use crate::format::{Parser, TokenSource};
use crate::instance::{InstanceCreator, InstanceFactory};
use crate::keys::KeyCoercionCache;
use crate::metadata::TypeRegistry;
use crate::reader::{IoReader, SliceReader};
use crate::resolve::container_view;
use crate::strategy::{StrategyRegistry, ValueDeserializer};
use crate::types::{MapType, RawType, SequenceType, TypeDescriptor};
use crate::value::Value;
use crate::{Error, Result};

/// The nesting depth allowed by [`Config::default`].
pub const DEFAULT_RECURSION_LIMIT: usize = 128;

/// What happens to properties absent from a decoded object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingFields {
    /// Absent properties are left unset.
    #[default]
    Skip,
    /// Absent properties are set to [`Value::Null`].
    Null,
}

/// Binder configuration.
#[derive(Clone)]
#[must_use]
pub struct Config {
    pub(crate) default_map_implementation: RawType,
    pub(crate) default_list_implementation: RawType,
    pub(crate) date_format: Option<Arc<str>>,
    pub(crate) fail_on_unknown_properties: bool,
    pub(crate) missing_fields: MissingFields,
    pub(crate) recursion_limit: Option<usize>,
    pub(crate) instance_creators: HashMap<RawType, Arc<dyn InstanceCreator>>,
    pub(crate) deserializers: HashMap<RawType, Arc<dyn ValueDeserializer>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_map_implementation: RawType::Map(MapType::HashMap),
            default_list_implementation: RawType::Sequence(SequenceType::ArrayList),
            date_format: None,
            fail_on_unknown_properties: false,
            missing_fields: MissingFields::Skip,
            recursion_limit: Some(DEFAULT_RECURSION_LIMIT),
            instance_creators: HashMap::new(),
            deserializers: HashMap::new(),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("default_map_implementation", &self.default_map_implementation)
            .field(
                "default_list_implementation",
                &self.default_list_implementation,
            )
            .field("date_format", &self.date_format)
            .field("fail_on_unknown_properties", &self.fail_on_unknown_properties)
            .field("missing_fields", &self.missing_fields)
            .field("recursion_limit", &self.recursion_limit)
            .field(
                "instance_creators",
                &self.instance_creators.keys().collect::<Vec<_>>(),
            )
            .field("deserializers", &self.deserializers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Config {
    /// Sets the concrete map used where an abstract, unsorted map is
    /// declared. Defaults to `HashMap`.
    pub fn default_map_implementation(mut self, implementation: RawType) -> Self {
        self.default_map_implementation = implementation;
        self
    }

    /// Sets the concrete list used where an abstract list or collection is
    /// declared. Defaults to `ArrayList`.
    pub fn default_list_implementation(mut self, implementation: RawType) -> Self {
        self.default_list_implementation = implementation;
        self
    }

    /// Sets the date pattern, in `strftime` syntax, used where no class or
    /// property pattern applies. Without one, dates are read as ISO-8601.
    pub fn date_format(mut self, pattern: impl Into<Arc<str>>) -> Self {
        self.date_format = Some(pattern.into());
        self
    }

    /// When enabled, object members without a matching property are errors
    /// instead of being skipped.
    pub fn fail_on_unknown_properties(mut self, fail: bool) -> Self {
        self.fail_on_unknown_properties = fail;
        self
    }

    /// Sets the policy for properties absent from the document.
    pub fn missing_fields(mut self, policy: MissingFields) -> Self {
        self.missing_fields = policy;
        self
    }

    /// Sets how deeply values may nest before decoding fails with
    /// [`Error::RecursionLimitExceeded`]. `None` removes the limit, which
    /// allows hostile input to exhaust the stack. Defaults to 128.
    pub fn recursion_limit(mut self, limit: Option<usize>) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Uses `creator` to construct instances of exactly `raw`.
    pub fn instance_creator(mut self, raw: RawType, creator: Arc<dyn InstanceCreator>) -> Self {
        self.instance_creators.insert(raw, creator);
        self
    }

    /// Uses `deserializer` for every value of exactly `raw`.
    pub fn deserializer(mut self, raw: RawType, deserializer: Arc<dyn ValueDeserializer>) -> Self {
        self.deserializers.insert(raw, deserializer);
        self
    }

    fn validate(&self, types: &TypeRegistry) -> Result<()> {
        let map_view = container_view(
            &TypeDescriptor::of(self.default_map_implementation.clone()),
            types,
        );
        match map_view.as_ref().and_then(TypeDescriptor::raw) {
            Some(RawType::Map(kind)) if !kind.is_abstract() && *kind != MapType::EnumMap => {}
            _ => {
                return Err(Error::InvalidConfiguration(format!(
                    "default map implementation `{}` is not a concrete map",
                    self.default_map_implementation
                )))
            }
        }

        let list_view = container_view(
            &TypeDescriptor::of(self.default_list_implementation.clone()),
            types,
        );
        match list_view.as_ref().and_then(TypeDescriptor::raw) {
            Some(RawType::Sequence(kind))
                if !kind.is_abstract() && kind.satisfies(SequenceType::List) => {}
            _ => {
                return Err(Error::InvalidConfiguration(format!(
                    "default list implementation `{}` is not a concrete list",
                    self.default_list_implementation
                )))
            }
        }

        Ok(())
    }
}

/// Decodes JSON documents into [`Value`] graphs shaped by
/// [`TypeDescriptor`]s.
///
/// A binder owns the memoized strategies and key factories for its
/// configuration and type registry. It is `Send + Sync`; concurrent decodes
/// through one binder share those caches.
#[derive(Debug)]
pub struct Binder {
    config: Config,
    types: Arc<TypeRegistry>,
    strategies: StrategyRegistry,
    keys: Arc<KeyCoercionCache>,
    instances: InstanceFactory,
}

impl Default for Binder {
    fn default() -> Self {
        Self::build(Config::default(), Arc::default())
    }
}

impl Binder {
    /// Returns a binder for `config` and the user types in `types`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if a configured default
    /// implementation is not a concrete container of the expected family.
    pub fn new(config: Config, types: impl Into<Arc<TypeRegistry>>) -> Result<Self> {
        let types = types.into();
        config.validate(&types)?;
        Ok(Self::build(config, types))
    }

    fn build(config: Config, types: Arc<TypeRegistry>) -> Self {
        let instances = InstanceFactory::new(
            config.default_map_implementation.clone(),
            config.default_list_implementation.clone(),
            config.instance_creators.clone(),
        );
        Self {
            config,
            types,
            strategies: StrategyRegistry::new(),
            keys: Arc::default(),
            instances,
        }
    }

    /// Replaces the key coercion cache, allowing several binders over the
    /// same registry to share one.
    #[must_use]
    pub fn with_key_cache(mut self, cache: Arc<KeyCoercionCache>) -> Self {
        self.keys = cache;
        self
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The registered user types.
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// The memoized deserializer strategies.
    #[must_use]
    pub const fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// The key coercion cache.
    #[must_use]
    pub fn key_cache(&self) -> &KeyCoercionCache {
        &self.keys
    }

    pub(crate) const fn instances(&self) -> &InstanceFactory {
        &self.instances
    }

    /// Decodes one value of type `ty` from `source`, consuming exactly that
    /// value's events.
    pub fn deserialize(&self, source: &mut dyn TokenSource, ty: &TypeDescriptor) -> Result<Value> {
        Deserializer::new(self, source).deserialize(ty)
    }

    /// Decodes the JSON document `json` as `ty`.
    pub fn from_str(&self, json: &str, ty: &TypeDescriptor) -> Result<Value> {
        self.from_slice(json.as_bytes(), ty)
    }

    /// Decodes the JSON document in `bytes` as `ty`.
    pub fn from_slice(&self, bytes: &[u8], ty: &TypeDescriptor) -> Result<Value> {
        let mut parser = Parser::new(SliceReader::from(bytes));
        let value = self.deserialize(&mut parser, ty)?;
        parser.finish()?;
        Ok(value)
    }

    /// Decodes the JSON document read from `reader` as `ty`.
    pub fn from_reader<R: Read>(&self, reader: R, ty: &TypeDescriptor) -> Result<Value> {
        let mut parser = Parser::new(IoReader::new(reader));
        let value = self.deserialize(&mut parser, ty)?;
        parser.finish()?;
        Ok(value)
    }
}
