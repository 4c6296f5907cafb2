use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::config::Config;
use crate::format::{Event, TokenSource};
use crate::metadata::{ClassDef, EnumDef, TypeDef, TypeRegistry};
use crate::resolve::{container_view, substitute};
use crate::types::{ContainerClass, DateType, RawType, ScalarType, TypeDescriptor};
use crate::value::Value;
use crate::Result;

/// A user-supplied decoder for one type.
///
/// `first` is the value's first event, already consumed from `source`. The
/// implementation must consume exactly the rest of that value. `ty` is the
/// fully resolved target type.
///
/// Errors returned as [`Error::Message`](crate::Error::Message) are reported
/// as malformed values at the current path.
pub trait ValueDeserializer: Send + Sync {
    /// Decodes one value.
    fn deserialize(
        &self,
        first: Event,
        source: &mut dyn TokenSource,
        ty: &TypeDescriptor,
    ) -> Result<Value>;
}

impl<F> ValueDeserializer for F
where
    F: Fn(Event, &mut dyn TokenSource, &TypeDescriptor) -> Result<Value> + Send + Sync,
{
    fn deserialize(
        &self,
        first: Event,
        source: &mut dyn TokenSource,
        ty: &TypeDescriptor,
    ) -> Result<Value> {
        self(first, source, ty)
    }
}

/// How values of one raw type are decoded.
#[derive(Clone)]
pub enum DeserializerKind {
    /// A deserializer registered for the exact type.
    Custom(Arc<dyn ValueDeserializer>),
    /// A textual, boolean or numeric leaf.
    Scalar(ScalarType),
    /// A member of the date family.
    Date(DateType),
    /// The constants of a registered enum.
    Enum(Arc<EnumDef>),
    /// An optional wrapper.
    Optional,
    /// A built-in sequence or a class extending one.
    Sequence(ContainerClass),
    /// A built-in map or a class extending one.
    Map(ContainerClass),
    /// Whatever the document holds.
    Polymorphic,
    /// A user class decoded property by property.
    Object(Arc<ObjectDeserializer>),
}

impl Debug for DeserializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom"),
            Self::Scalar(scalar) => f.debug_tuple("Scalar").field(scalar).finish(),
            Self::Date(date) => f.debug_tuple("Date").field(date).finish(),
            Self::Enum(definition) => f.debug_tuple("Enum").field(&definition.name).finish(),
            Self::Optional => f.write_str("Optional"),
            Self::Sequence(class) => f.debug_tuple("Sequence").field(class).finish(),
            Self::Map(class) => f.debug_tuple("Map").field(class).finish(),
            Self::Polymorphic => f.write_str("Polymorphic"),
            Self::Object(object) => f.debug_tuple("Object").field(&object.class.name).finish(),
        }
    }
}

/// Per-property decoding overrides.
#[derive(Clone, Default)]
pub struct Overrides {
    /// Replaces the deserializer chosen for the property's type.
    pub deserializer: Option<Arc<dyn ValueDeserializer>>,
    /// The date pattern for the property.
    pub date_format: Option<Arc<str>>,
}

impl Overrides {
    /// The overrides that apply to the elements of a container property: the
    /// date pattern carries over, the deserializer does not.
    #[must_use]
    pub fn for_elements(&self) -> Self {
        Self {
            deserializer: None,
            date_format: self.date_format.clone(),
        }
    }
}

impl Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("deserializer", &self.deserializer.is_some())
            .field("date_format", &self.date_format)
            .finish()
    }
}

/// A property of an [`ObjectDeserializer`].
#[derive(Debug, Clone)]
pub struct Property {
    /// The member name.
    pub name: Arc<str>,
    /// The declared type, in terms of the decoded class's type parameters.
    pub declared: TypeDescriptor,
    /// Property-level overrides.
    pub overrides: Overrides,
}

/// The property table of one user class, including inherited properties.
#[derive(Debug)]
pub struct ObjectDeserializer {
    class: Arc<ClassDef>,
    properties: IndexMap<Arc<str>, Property>,
}

impl ObjectDeserializer {
    /// Builds the property table of `class`.
    ///
    /// Properties of object superclasses come first, with their declared
    /// types rewritten in terms of `class`'s own type parameters. A property
    /// redeclared by a subclass replaces the inherited one.
    #[must_use]
    pub fn introspect(class: &Arc<ClassDef>, types: &TypeRegistry) -> Self {
        let mut lineage = vec![(class.clone(), None::<Vec<TypeDescriptor>>)];
        let mut current = class.clone();
        let mut arguments: Option<Vec<TypeDescriptor>> = None;
        while let Some(supertype) = current.supertype.clone() {
            let Some(parent) = supertype.raw().and_then(|raw| types.class_def(raw)).cloned()
            else {
                break;
            };
            if lineage.iter().any(|(seen, _)| Arc::ptr_eq(seen, &parent)) {
                break;
            }
            let parent_arguments = supertype
                .arguments()
                .iter()
                .map(|argument| match &arguments {
                    Some(arguments) => substitute(argument, &current.type_params, arguments),
                    None => argument.clone(),
                })
                .collect::<Vec<_>>();
            lineage.push((parent.clone(), Some(parent_arguments.clone())));
            arguments = Some(parent_arguments);
            current = parent;
        }

        let mut properties = IndexMap::new();
        for (declaring, arguments) in lineage.iter().rev() {
            for field in &declaring.fields {
                let declared = match arguments {
                    Some(arguments) => {
                        substitute(&field.declared, &declaring.type_params, arguments)
                    }
                    None => field.declared.clone(),
                };
                properties.insert(
                    field.name.clone(),
                    Property {
                        name: field.name.clone(),
                        declared,
                        overrides: Overrides {
                            deserializer: field.deserializer.clone(),
                            date_format: field
                                .date_format
                                .clone()
                                .or_else(|| declaring.date_format.clone()),
                        },
                    },
                );
            }
        }

        Self {
            class: class.clone(),
            properties,
        }
    }

    /// The class being decoded.
    #[must_use]
    pub const fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    /// Looks up the property named `name`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Every property, inherited ones first.
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }
}

/// The memoized mapping from raw types to their [`DeserializerKind`].
///
/// Each distinct raw type is classified at most once per registry in the
/// common case. When two threads classify the same type concurrently, the
/// first to publish wins and both use the published instance.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<RawType, DeserializerKind>>,
}

impl Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl StrategyRegistry {
    /// Returns an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of memoized strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.read().len()
    }

    /// Returns true if nothing has been memoized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.read().is_empty()
    }

    /// Returns the strategy for `raw`, classifying it on first use. Returns
    /// `None` for a named type that is not registered.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self, config, types)))]
    pub fn strategy_for(
        &self,
        raw: &RawType,
        config: &Config,
        types: &TypeRegistry,
    ) -> Option<DeserializerKind> {
        if let Some(kind) = self.strategies.read().get(raw) {
            return Some(kind.clone());
        }

        let kind = classify(raw, config, types)?;
        #[cfg(feature = "tracing")]
        tracing::trace!(?kind, "classified");
        Some(
            self.strategies
                .write()
                .entry(raw.clone())
                .or_insert(kind)
                .clone(),
        )
    }
}

fn classify(raw: &RawType, config: &Config, types: &TypeRegistry) -> Option<DeserializerKind> {
    if let Some(custom) = config.deserializers.get(raw) {
        return Some(DeserializerKind::Custom(custom.clone()));
    }

    Some(match raw {
        RawType::Date(date) => DeserializerKind::Date(*date),
        RawType::Map(map) => DeserializerKind::Map(ContainerClass::of_map(*map)),
        RawType::Sequence(sequence) => {
            DeserializerKind::Sequence(ContainerClass::of_sequence(*sequence))
        }
        RawType::Scalar(scalar) => DeserializerKind::Scalar(*scalar),
        RawType::Optional => DeserializerKind::Optional,
        RawType::Any => DeserializerKind::Polymorphic,
        RawType::Named(name) => match types.get(name)? {
            TypeDef::Enum(definition) => DeserializerKind::Enum(definition.clone()),
            TypeDef::Class(class) => {
                let view = container_view(&TypeDescriptor::of(raw.clone()), types);
                match view.as_ref().and_then(TypeDescriptor::raw) {
                    Some(RawType::Map(map)) => DeserializerKind::Map(ContainerClass::of_map(*map)),
                    Some(RawType::Sequence(sequence)) => {
                        DeserializerKind::Sequence(ContainerClass::of_sequence(*sequence))
                    }
                    _ => DeserializerKind::Object(Arc::new(ObjectDeserializer::introspect(
                        class, types,
                    ))),
                }
            }
        },
    })
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::types::{MapType, SequenceType};

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .with_enum(EnumDef::new("Country", ["CZ", "US"]))
            .with_class(
                ClassDef::new("Base")
                    .type_params(["T"])
                    .field("id", TypeDescriptor::variable("T"))
                    .field("tags", TypeDescriptor::list(TypeDescriptor::string())),
            )
            .with_class(
                ClassDef::new("Child")
                    .type_params(["X"])
                    .extends(TypeDescriptor::generic(
                        "Base",
                        [TypeDescriptor::list(TypeDescriptor::variable("X"))],
                    ))
                    .field("name", TypeDescriptor::string())
                    .field("tags", TypeDescriptor::any()),
            )
            .with_class(
                ClassDef::new("Registry").extends(TypeDescriptor::map_of(
                    MapType::TreeMap,
                    TypeDescriptor::string(),
                    TypeDescriptor::any(),
                )),
            )
    }

    #[test]
    fn classification() {
        let registry = StrategyRegistry::new();
        let config = Config::default();
        let types = types();
        let kind = |raw: RawType| registry.strategy_for(&raw, &config, &types);

        assert!(matches!(
            kind(RawType::Map(MapType::SortedMap)),
            Some(DeserializerKind::Map(ContainerClass::OrderedMap))
        ));
        assert!(matches!(
            kind(RawType::Sequence(SequenceType::LinkedHashSet)),
            Some(DeserializerKind::Sequence(ContainerClass::Set))
        ));
        assert!(matches!(
            kind(RawType::Named(Arc::from("Registry"))),
            Some(DeserializerKind::Map(ContainerClass::OrderedMap))
        ));
        assert!(matches!(
            kind(RawType::Named(Arc::from("Country"))),
            Some(DeserializerKind::Enum(_))
        ));
        assert!(matches!(kind(RawType::Any), Some(DeserializerKind::Polymorphic)));
        assert!(kind(RawType::Named(Arc::from("Missing"))).is_none());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn custom_deserializers_take_precedence() {
        let config = Config::default().deserializer(
            RawType::Scalar(ScalarType::I32),
            Arc::new(
                |_: Event, _: &mut dyn TokenSource, _: &TypeDescriptor| -> Result<Value> {
                    Ok(Value::Integer(7))
                },
            ),
        );
        let registry = StrategyRegistry::new();
        assert!(matches!(
            registry.strategy_for(&RawType::Scalar(ScalarType::I32), &config, &types()),
            Some(DeserializerKind::Custom(_))
        ));
    }

    #[test]
    fn inherited_properties_are_rewritten() {
        let types = types();
        let Some(class) = types.class_def(&RawType::Named(Arc::from("Child"))) else {
            unreachable!()
        };
        let object = ObjectDeserializer::introspect(class, &types);
        let names = object
            .properties()
            .map(|property| &*property.name)
            .collect::<Vec<_>>();
        assert_eq!(names, ["id", "tags", "name"]);
        assert_eq!(
            object.property("id").map(|property| &property.declared),
            Some(&TypeDescriptor::list(TypeDescriptor::variable("X")))
        );
        assert_eq!(
            object.property("tags").map(|property| &property.declared),
            Some(&TypeDescriptor::any())
        );
    }

    #[test]
    fn concurrent_lookups_converge() {
        let registry = StrategyRegistry::new();
        let config = Config::default();
        let types = types();
        let raw = RawType::Named(Arc::from("Child"));

        let found = thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| registry.strategy_for(&raw, &config, &types)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(Some(DeserializerKind::Object(object))) => object,
                    _ => unreachable!(),
                })
                .collect::<Vec<_>>()
        });

        assert_eq!(registry.len(), 1);
        let retained = match registry.strategy_for(&raw, &config, &types) {
            Some(DeserializerKind::Object(object)) => object,
            _ => unreachable!(),
        };
        assert!(found
            .iter()
            .all(|object| Arc::ptr_eq(object, &retained)));
    }
}
