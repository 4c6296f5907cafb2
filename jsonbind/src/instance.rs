use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::BoxError;
use crate::metadata::TypeRegistry;
use crate::resolve::container_view;
use crate::types::{MapType, RawType, SequenceType, TypeDescriptor};
use crate::value::{EnumMap, Mapping, Object, Sequence};

/// A freshly constructed, empty container or object.
#[derive(Debug, Clone)]
pub enum Instance {
    /// An empty sequence.
    Sequence(Sequence),
    /// An empty map.
    Mapping(Mapping),
    /// An object with no properties set.
    Object(Object),
}

/// Constructs empty instances of concrete types.
pub trait InstanceCreator: Send + Sync {
    /// Returns an empty instance of `raw`.
    fn create_instance(&self, raw: &RawType, types: &TypeRegistry) -> Result<Instance, BoxError>;
}

impl<F> InstanceCreator for F
where
    F: Fn(&RawType, &TypeRegistry) -> Result<Instance, BoxError> + Send + Sync,
{
    fn create_instance(&self, raw: &RawType, types: &TypeRegistry) -> Result<Instance, BoxError> {
        self(raw, types)
    }
}

/// Constructs built-in concrete containers and registered classes that have
/// a reachable no-argument constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInstanceCreator;

impl InstanceCreator for DefaultInstanceCreator {
    fn create_instance(&self, raw: &RawType, types: &TypeRegistry) -> Result<Instance, BoxError> {
        match raw {
            RawType::Sequence(kind) if !kind.is_abstract() => {
                Ok(Instance::Sequence(Sequence::empty(*kind)))
            }
            RawType::Map(kind) if !kind.is_abstract() => Mapping::empty(*kind)
                .map(Instance::Mapping)
                .ok_or_else(|| BoxError::from("an EnumMap requires its key enum")),
            RawType::Named(_) => {
                let class = types
                    .class_def(raw)
                    .ok_or_else(|| format!("`{raw}` is not a registered class"))?;
                if !class.constructible {
                    return Err(format!("`{raw}` has no accessible no-argument constructor").into());
                }
                match container_view(&TypeDescriptor::of(raw.clone()), types)
                    .as_ref()
                    .and_then(TypeDescriptor::raw)
                {
                    Some(RawType::Sequence(kind)) => Ok(Instance::Sequence(Sequence::empty(*kind))),
                    Some(RawType::Map(kind)) => Mapping::empty(*kind)
                        .map(Instance::Mapping)
                        .ok_or_else(|| BoxError::from("an EnumMap requires its key enum")),
                    _ => Ok(Instance::Object(Object::new(class.name.clone()))),
                }
            }
            _ => Err(format!("`{raw}` is abstract").into()),
        }
    }
}

fn map_kind(raw: &RawType, types: &TypeRegistry) -> Option<MapType> {
    match container_view(&TypeDescriptor::of(raw.clone()), types)?.raw()? {
        RawType::Map(kind) => Some(*kind),
        _ => None,
    }
}

/// Why an instance could not be created.
#[derive(Debug)]
pub struct InstantiationFailure {
    /// The type that could not be constructed.
    pub type_name: String,
    /// The underlying failure.
    pub source: BoxError,
}

impl InstantiationFailure {
    fn new(raw: &RawType, source: impl Into<BoxError>) -> Self {
        Self {
            type_name: raw.to_string(),
            source: source.into(),
        }
    }
}

/// Chooses and constructs the concrete instance for each declared container
/// or object type.
///
/// Abstract map and sequence types are replaced by the configured default
/// implementations, except that sorted requests always receive a sorted
/// implementation and abstract maps keyed by an enum receive an
/// [`EnumMap`]. Concrete types are constructed by the creator registered for
/// the exact type, falling back to [`DefaultInstanceCreator`].
#[derive(Clone)]
pub struct InstanceFactory {
    default_map: RawType,
    default_list: RawType,
    creators: HashMap<RawType, Arc<dyn InstanceCreator>>,
    fallback: Arc<dyn InstanceCreator>,
}

impl Debug for InstanceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceFactory")
            .field("default_map", &self.default_map)
            .field("default_list", &self.default_list)
            .field("creators", &self.creators.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl InstanceFactory {
    /// Returns a factory using the given defaults and per-type creators.
    #[must_use]
    pub fn new(
        default_map: RawType,
        default_list: RawType,
        creators: HashMap<RawType, Arc<dyn InstanceCreator>>,
    ) -> Self {
        Self {
            default_map,
            default_list,
            creators,
            fallback: Arc::new(DefaultInstanceCreator),
        }
    }

    fn construct(&self, raw: &RawType, types: &TypeRegistry) -> Result<Instance, InstantiationFailure> {
        let creator = self.creators.get(raw).unwrap_or(&self.fallback);
        creator
            .create_instance(raw, types)
            .map_err(|source| InstantiationFailure::new(raw, source))
    }

    fn construct_map(
        &self,
        raw: &RawType,
        types: &TypeRegistry,
    ) -> Result<Mapping, InstantiationFailure> {
        match self.construct(raw, types)? {
            Instance::Mapping(mapping) => Ok(mapping),
            _ => Err(InstantiationFailure::new(
                raw,
                "the instance creator did not return a map",
            )),
        }
    }

    fn construct_sequence(
        &self,
        raw: &RawType,
        types: &TypeRegistry,
    ) -> Result<Sequence, InstantiationFailure> {
        match self.construct(raw, types)? {
            Instance::Sequence(sequence) => Ok(sequence),
            _ => Err(InstantiationFailure::new(
                raw,
                "the instance creator did not return a sequence",
            )),
        }
    }

    /// The view of the configured default map as a built-in kind.
    fn default_map_kind(&self, types: &TypeRegistry) -> Option<MapType> {
        map_kind(&self.default_map, types)
    }

    /// Returns an empty map for the declared map type `raw` whose resolved
    /// key type is `key`.
    pub fn create_map(
        &self,
        raw: &RawType,
        key: &TypeDescriptor,
        types: &TypeRegistry,
    ) -> Result<Mapping, InstantiationFailure> {
        let enum_key = key.raw().and_then(|key| types.enum_def(key));
        match raw {
            RawType::Map(kind) if kind.is_abstract() && kind.is_sorted() => {
                if self
                    .default_map_kind(types)
                    .map_or(false, MapType::is_sorted)
                {
                    self.construct_map(&self.default_map, types)
                } else {
                    self.construct_map(&RawType::Map(MapType::TreeMap), types)
                }
            }
            RawType::Map(MapType::Map) => match enum_key {
                Some(definition) => Ok(Mapping::Enum(EnumMap::new(
                    definition.name.clone(),
                    definition.len(),
                ))),
                None => self.construct_map(&self.default_map, types),
            },
            RawType::Map(MapType::EnumMap) | RawType::Named(_)
                if !self.creators.contains_key(raw)
                    && map_kind(raw, types) == Some(MapType::EnumMap) =>
            {
                if types.class_def(raw).map_or(false, |class| !class.constructible) {
                    return Err(InstantiationFailure::new(
                        raw,
                        format!("`{raw}` has no accessible no-argument constructor"),
                    ));
                }
                let definition = enum_key.ok_or_else(|| {
                    InstantiationFailure::new(raw, format!("key type `{key}` is not an enum"))
                })?;
                Ok(Mapping::Enum(EnumMap::new(
                    definition.name.clone(),
                    definition.len(),
                )))
            }
            _ => self.construct_map(raw, types),
        }
    }

    /// Returns an empty sequence for the declared sequence type `raw`.
    pub fn create_sequence(
        &self,
        raw: &RawType,
        types: &TypeRegistry,
    ) -> Result<Sequence, InstantiationFailure> {
        match raw {
            RawType::Sequence(SequenceType::Collection | SequenceType::List) => {
                self.construct_sequence(&self.default_list, types)
            }
            RawType::Sequence(SequenceType::Set) => {
                self.construct_sequence(&RawType::Sequence(SequenceType::HashSet), types)
            }
            RawType::Sequence(SequenceType::SortedSet) => {
                self.construct_sequence(&RawType::Sequence(SequenceType::TreeSet), types)
            }
            RawType::Sequence(SequenceType::Array) if !self.creators.contains_key(raw) => {
                Ok(Sequence::empty(SequenceType::Array))
            }
            _ => self.construct_sequence(raw, types),
        }
    }

    /// Returns an object of the registered class `raw` with no properties
    /// set.
    pub fn create_object(
        &self,
        raw: &RawType,
        types: &TypeRegistry,
    ) -> Result<Object, InstantiationFailure> {
        match self.construct(raw, types)? {
            Instance::Object(object) => Ok(object),
            _ => Err(InstantiationFailure::new(
                raw,
                "the instance creator did not return an object",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassDef, EnumDef};
    use crate::types::ScalarType;

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .with_enum(EnumDef::new("Country", ["CZ", "SK", "US"]))
            .with_class(ClassDef::new("Sealed").without_default_constructor())
            .with_class(ClassDef::new("Ordered").extends(TypeDescriptor::map_of(
                MapType::TreeMap,
                TypeDescriptor::string(),
                TypeDescriptor::any(),
            )))
            .with_class(ClassDef::new("Tally").type_params(["K"]).extends(
                TypeDescriptor::map_of(
                    MapType::EnumMap,
                    TypeDescriptor::variable("K"),
                    TypeDescriptor::scalar(ScalarType::I32),
                ),
            ))
    }

    fn factory(default_map: MapType) -> InstanceFactory {
        InstanceFactory::new(
            RawType::Map(default_map),
            RawType::Sequence(SequenceType::ArrayList),
            HashMap::new(),
        )
    }

    #[test]
    fn sorted_requests_get_sorted_maps() {
        let types = types();
        let string = TypeDescriptor::string();
        let sorted = RawType::Map(MapType::SortedMap);

        let created = factory(MapType::HashMap).create_map(&sorted, &string, &types);
        assert_eq!(created.map(|map| map.kind()).ok(), Some(MapType::TreeMap));

        let configured = InstanceFactory::new(
            RawType::Named(Arc::from("Ordered")),
            RawType::Sequence(SequenceType::ArrayList),
            HashMap::new(),
        );
        assert_eq!(
            configured
                .create_map(&sorted, &string, &types)
                .map(|map| map.kind())
                .ok(),
            Some(MapType::TreeMap)
        );
    }

    #[test]
    fn abstract_maps_use_defaults() {
        let types = types();
        let map = RawType::Map(MapType::Map);
        let string = TypeDescriptor::string();
        for kind in [MapType::HashMap, MapType::LinkedHashMap, MapType::TreeMap] {
            assert_eq!(
                factory(kind)
                    .create_map(&map, &string, &types)
                    .map(|map| map.kind())
                    .ok(),
                Some(kind)
            );
        }
    }

    #[test]
    fn enum_keys_get_enum_maps() {
        let types = types();
        let country = TypeDescriptor::named("Country");
        let Ok(Mapping::Enum(map)) =
            factory(MapType::HashMap).create_map(&RawType::Map(MapType::Map), &country, &types)
        else {
            unreachable!()
        };
        assert_eq!(map.key_type(), "Country");

        let failure = factory(MapType::HashMap)
            .create_map(
                &RawType::Map(MapType::EnumMap),
                &TypeDescriptor::scalar(ScalarType::I32),
                &types,
            )
            .unwrap_err();
        assert_eq!(failure.type_name, "EnumMap");
    }

    #[test]
    fn sequences() {
        let types = types();
        let factory = factory(MapType::HashMap);
        let kind = |sequence: SequenceType| {
            factory
                .create_sequence(&RawType::Sequence(sequence), &types)
                .map(|created| created.kind())
                .ok()
        };
        assert_eq!(kind(SequenceType::List), Some(SequenceType::ArrayList));
        assert_eq!(kind(SequenceType::Set), Some(SequenceType::HashSet));
        assert_eq!(kind(SequenceType::SortedSet), Some(SequenceType::TreeSet));
        assert_eq!(kind(SequenceType::LinkedList), Some(SequenceType::LinkedList));
    }

    #[test]
    fn creators_and_failures() {
        let types = types();
        let sealed = RawType::Named(Arc::from("Sealed"));
        let failure = factory(MapType::HashMap)
            .create_object(&sealed, &types)
            .unwrap_err();
        assert_eq!(failure.type_name, "Sealed");

        let mut creators: HashMap<RawType, Arc<dyn InstanceCreator>> = HashMap::new();
        creators.insert(
            sealed.clone(),
            Arc::new(|_: &RawType, _: &TypeRegistry| -> Result<Instance, BoxError> {
                Ok(Instance::Object(Object::new("Sealed")))
            }),
        );
        let factory = InstanceFactory::new(
            RawType::Map(MapType::HashMap),
            RawType::Sequence(SequenceType::ArrayList),
            creators,
        );
        assert_eq!(
            factory
                .create_object(&sealed, &types)
                .map(|object| object.class)
                .ok(),
            Some(Arc::from("Sealed"))
        );
    }

    #[test]
    fn enum_map_classes_use_the_resolved_key() {
        let types = types();
        let tally = RawType::Named(Arc::from("Tally"));
        let Ok(Mapping::Enum(map)) =
            factory(MapType::HashMap).create_map(&tally, &TypeDescriptor::named("Country"), &types)
        else {
            unreachable!()
        };
        assert_eq!(map.key_type(), "Country");

        assert!(factory(MapType::HashMap)
            .create_map(&tally, &TypeDescriptor::string(), &types)
            .is_err());
    }
}
