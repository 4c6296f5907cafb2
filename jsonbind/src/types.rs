use std::fmt::{self, Display, Write};
use std::sync::Arc;

/// A structural description of a (possibly generic) target type.
///
/// A descriptor is either a raw type applied to zero or more type arguments,
/// or a reference to a type variable that must be bound by an enclosing
/// generic declaration before it can drive decoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// A raw type with its type arguments.
    Type(RawType, Vec<TypeDescriptor>),
    /// An unresolved type variable, such as `T`.
    Variable(Arc<str>),
}

impl TypeDescriptor {
    /// A non-parameterized type.
    #[must_use]
    pub const fn of(raw: RawType) -> Self {
        Self::Type(raw, Vec::new())
    }

    /// A parameterized type.
    #[must_use]
    pub fn parameterized(raw: RawType, arguments: impl IntoIterator<Item = Self>) -> Self {
        Self::Type(raw, arguments.into_iter().collect())
    }

    /// A reference to the type variable `name`.
    #[must_use]
    pub fn variable(name: impl Into<Arc<str>>) -> Self {
        Self::Variable(name.into())
    }

    /// A registered user type (enum, class or container class).
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::of(RawType::Named(name.into()))
    }

    /// A registered generic user type applied to `arguments`.
    #[must_use]
    pub fn generic(name: impl Into<Arc<str>>, arguments: impl IntoIterator<Item = Self>) -> Self {
        Self::parameterized(RawType::Named(name.into()), arguments)
    }

    /// A scalar type.
    #[must_use]
    pub const fn scalar(scalar: ScalarType) -> Self {
        Self::of(RawType::Scalar(scalar))
    }

    /// A date/time type.
    #[must_use]
    pub const fn date(date: DateType) -> Self {
        Self::of(RawType::Date(date))
    }

    /// The textual type.
    #[must_use]
    pub const fn string() -> Self {
        Self::scalar(ScalarType::String)
    }

    /// The unconstrained "any" type.
    #[must_use]
    pub const fn any() -> Self {
        Self::of(RawType::Any)
    }

    /// `Optional<inner>`.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Type(RawType::Optional, vec![inner])
    }

    /// A sequence of `kind` holding `element`.
    #[must_use]
    pub fn sequence(kind: SequenceType, element: Self) -> Self {
        Self::Type(RawType::Sequence(kind), vec![element])
    }

    /// The abstract `List<element>`.
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::sequence(SequenceType::List, element)
    }

    /// A map of `kind` from `key` to `value`.
    #[must_use]
    pub fn map_of(kind: MapType, key: Self, value: Self) -> Self {
        Self::Type(RawType::Map(kind), vec![key, value])
    }

    /// The abstract `Map<key, value>`.
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::map_of(MapType::Map, key, value)
    }

    /// Returns the raw type, or `None` for a type variable.
    #[must_use]
    pub const fn raw(&self) -> Option<&RawType> {
        match self {
            Self::Type(raw, _) => Some(raw),
            Self::Variable(_) => None,
        }
    }

    /// Returns the type arguments. Type variables have none.
    #[must_use]
    pub fn arguments(&self) -> &[Self] {
        match self {
            Self::Type(_, arguments) => arguments,
            Self::Variable(_) => &[],
        }
    }

    /// Returns the argument at `index`, or [`TypeDescriptor::any`] when the
    /// type was used raw.
    #[must_use]
    pub fn argument_or_any(&self, index: usize) -> Self {
        self.arguments().get(index).cloned().unwrap_or_else(Self::any)
    }

    /// Returns true if no type variable appears anywhere in this descriptor.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Type(_, arguments) => arguments.iter().all(Self::is_resolved),
            Self::Variable(_) => false,
        }
    }
}

impl From<RawType> for TypeDescriptor {
    fn from(raw: RawType) -> Self {
        Self::of(raw)
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => f.write_str(name),
            Self::Type(raw, arguments) => {
                Display::fmt(raw, f)?;
                if !arguments.is_empty() {
                    f.write_char('<')?;
                    for (index, argument) in arguments.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        Display::fmt(argument, f)?;
                    }
                    f.write_char('>')?;
                }
                Ok(())
            }
        }
    }
}

/// The raw (unparameterized) identity of a type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawType {
    /// A textual, boolean or numeric leaf.
    Scalar(ScalarType),
    /// A member of the date/time family.
    Date(DateType),
    /// The unconstrained type; decodes whatever the document holds.
    Any,
    /// An optional wrapper around its single type argument.
    Optional,
    /// A built-in sequence type, abstract or concrete.
    Sequence(SequenceType),
    /// A built-in map type, abstract or concrete.
    Map(MapType),
    /// A type registered in the [`TypeRegistry`](crate::metadata::TypeRegistry).
    Named(Arc<str>),
}

impl Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => Display::fmt(scalar, f),
            Self::Date(date) => Display::fmt(date, f),
            Self::Any => f.write_str("Any"),
            Self::Optional => f.write_str("Optional"),
            Self::Sequence(sequence) => Display::fmt(sequence, f),
            Self::Map(map) => Display::fmt(map, f),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Leaf types decoded from a single JSON scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum ScalarType {
    String,
    Char,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "String",
            Self::Char => "char",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        })
    }
}

/// The date/time family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateType {
    /// A UTC instant carried as epoch milliseconds.
    Date,
    /// A UTC instant.
    Instant,
    /// A calendar date without time or zone.
    LocalDate,
    /// A date and time without zone.
    LocalDateTime,
}

impl Display for DateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Date => "Date",
            Self::Instant => "Instant",
            Self::LocalDate => "LocalDate",
            Self::LocalDateTime => "LocalDateTime",
        })
    }
}

/// Built-in sequence types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequenceType {
    /// Abstract: any collection.
    Collection,
    /// Abstract: an ordered list.
    List,
    /// Abstract: a collection of unique elements.
    Set,
    /// Abstract: unique elements iterated in ascending order.
    SortedSet,
    /// A growable array.
    ArrayList,
    /// A double-ended list.
    LinkedList,
    /// A hash set.
    HashSet,
    /// An insertion-ordered set.
    LinkedHashSet,
    /// A balanced-tree set.
    TreeSet,
    /// A fixed array; decoded like a list.
    Array,
}

impl SequenceType {
    /// Returns true if this type cannot be constructed directly.
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(
            self,
            Self::Collection | Self::List | Self::Set | Self::SortedSet
        )
    }

    /// Returns true if elements must be unique.
    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(
            self,
            Self::Set | Self::SortedSet | Self::HashSet | Self::LinkedHashSet | Self::TreeSet
        )
    }

    /// Returns true if iteration must be in ascending element order.
    #[must_use]
    pub const fn is_sorted(self) -> bool {
        matches!(self, Self::SortedSet | Self::TreeSet)
    }

    /// Returns true if an instance of `self` can be used where `requested`
    /// is declared.
    #[must_use]
    pub const fn satisfies(self, requested: Self) -> bool {
        match requested {
            Self::Collection => true,
            Self::List => matches!(self, Self::List | Self::ArrayList | Self::LinkedList),
            Self::Set => self.is_set(),
            Self::SortedSet => self.is_sorted(),
            Self::ArrayList
            | Self::LinkedList
            | Self::HashSet
            | Self::LinkedHashSet
            | Self::TreeSet
            | Self::Array => self as u8 == requested as u8,
        }
    }
}

impl Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Collection => "Collection",
            Self::List => "List",
            Self::Set => "Set",
            Self::SortedSet => "SortedSet",
            Self::ArrayList => "ArrayList",
            Self::LinkedList => "LinkedList",
            Self::HashSet => "HashSet",
            Self::LinkedHashSet => "LinkedHashSet",
            Self::TreeSet => "TreeSet",
            Self::Array => "Array",
        })
    }
}

/// Built-in map types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapType {
    /// Abstract: any map.
    Map,
    /// Abstract: iterated in ascending key order.
    SortedMap,
    /// Abstract: sorted, with navigation by key.
    NavigableMap,
    /// A hash map.
    HashMap,
    /// An insertion-ordered map.
    LinkedHashMap,
    /// A balanced-tree map.
    TreeMap,
    /// A map keyed by the constants of a single enum.
    EnumMap,
}

impl MapType {
    /// Returns true if this type cannot be constructed directly.
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::Map | Self::SortedMap | Self::NavigableMap)
    }

    /// Returns true if this type promises ascending key order.
    #[must_use]
    pub const fn is_sorted(self) -> bool {
        matches!(self, Self::SortedMap | Self::NavigableMap | Self::TreeMap)
    }
}

impl Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Map => "Map",
            Self::SortedMap => "SortedMap",
            Self::NavigableMap => "NavigableMap",
            Self::HashMap => "HashMap",
            Self::LinkedHashMap => "LinkedHashMap",
            Self::TreeMap => "TreeMap",
            Self::EnumMap => "EnumMap",
        })
    }
}

/// The container family a declared type belongs to.
///
/// Computed once per distinct raw type by the
/// [`StrategyRegistry`](crate::strategy::StrategyRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerClass {
    /// Any sequence whose order is the read order.
    Sequence,
    /// A sequence of unique elements.
    Set,
    /// A set iterated in ascending order.
    OrderedSet,
    /// A map without ordering guarantees.
    Map,
    /// A map iterated in ascending key order.
    OrderedMap,
}

impl ContainerClass {
    /// Classifies a built-in sequence type.
    #[must_use]
    pub const fn of_sequence(sequence: SequenceType) -> Self {
        if sequence.is_sorted() {
            Self::OrderedSet
        } else if sequence.is_set() {
            Self::Set
        } else {
            Self::Sequence
        }
    }

    /// Classifies a built-in map type.
    #[must_use]
    pub const fn of_map(map: MapType) -> Self {
        if map.is_sorted() {
            Self::OrderedMap
        } else {
            Self::Map
        }
    }

    /// Returns true for the map family.
    #[must_use]
    pub const fn is_map(self) -> bool {
        matches!(self, Self::Map | Self::OrderedMap)
    }
}
