use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::{self, Display, Write};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::Serialize;

use crate::types::{MapType, SequenceType};

/// A decoded value: a leaf scalar or a fully populated container or object.
///
/// `Value` is totally ordered and hashable so that it can be used as a set
/// element or map key. Floats compare with [`f64::total_cmp`] and hash-based
/// containers compare and hash independently of their iteration order.
#[derive(Debug, Clone)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A single character.
    Char(char),
    /// A signed integer.
    Integer(i64),
    /// An unsigned integer.
    Unsigned(u64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// A UTC instant carried as milliseconds since the Unix epoch.
    Date(i64),
    /// A UTC instant.
    Instant(DateTime<Utc>),
    /// A calendar date.
    LocalDate(NaiveDate),
    /// A date and time without zone.
    LocalDateTime(NaiveDateTime),
    /// An enum constant.
    Enum(EnumValue),
    /// An instance of a user type produced by a factory method or a custom
    /// deserializer.
    Custom(CustomValue),
    /// An optional wrapper. `Optional(None)` is the empty sentinel.
    Optional(Option<Box<Value>>),
    /// A sequence container.
    Sequence(Sequence),
    /// A map container.
    Mapping(Mapping),
    /// A user object.
    Object(Object),
}

impl Value {
    /// The empty optional sentinel.
    #[must_use]
    pub const fn empty_optional() -> Self {
        Self::Optional(None)
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the contained string, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(string) => Some(string),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is an integer that fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Unsigned(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Unsigned(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the contained sequence.
    #[must_use]
    pub const fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// Returns the contained map.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Returns the contained object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Char(_) => 2,
            Self::Integer(_) => 3,
            Self::Unsigned(_) => 4,
            Self::Float(_) => 5,
            Self::String(_) => 6,
            Self::Date(_) => 7,
            Self::Instant(_) => 8,
            Self::LocalDate(_) => 9,
            Self::LocalDateTime(_) => 10,
            Self::Enum(_) => 11,
            Self::Custom(_) => 12,
            Self::Optional(_) => 13,
            Self::Sequence(_) => 14,
            Self::Mapping(_) => 15,
            Self::Object(_) => 16,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Char(a), Self::Char(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Unsigned(a), Self::Unsigned(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Instant(a), Self::Instant(b)) => a.cmp(b),
            (Self::LocalDate(a), Self::LocalDate(b)) => a.cmp(b),
            (Self::LocalDateTime(a), Self::LocalDateTime(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::Custom(a), Self::Custom(b)) => a.cmp(b),
            (Self::Optional(a), Self::Optional(b)) => a.cmp(b),
            (Self::Sequence(a), Self::Sequence(b)) => a.cmp(b),
            (Self::Mapping(a), Self::Mapping(b)) => a.cmp(b),
            (Self::Object(a), Self::Object(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Self::Null => {}
            Self::Bool(value) => value.hash(state),
            Self::Char(value) => value.hash(state),
            Self::Integer(value) | Self::Date(value) => value.hash(state),
            Self::Unsigned(value) => value.hash(state),
            Self::Float(value) => value.to_bits().hash(state),
            Self::String(value) => value.hash(state),
            Self::Instant(value) => value.hash(state),
            Self::LocalDate(value) => value.hash(state),
            Self::LocalDateTime(value) => value.hash(state),
            Self::Enum(value) => value.hash(state),
            Self::Custom(value) => value.hash(state),
            Self::Optional(value) => value.hash(state),
            Self::Sequence(value) => value.hash(state),
            Self::Mapping(value) => value.hash(state),
            Self::Object(value) => value.hash(state),
        }
    }
}

/// Hashes each item on its own and combines the results commutatively.
fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items.fold(0_u64, |combined, item| {
        let mut hasher = DefaultHasher::new();
        item.hash(&mut hasher);
        combined.wrapping_add(hasher.finish())
    })
}

fn sorted<T: Ord>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort();
    items
}

/// An enum constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumValue {
    /// The enum's registered name.
    pub type_name: Arc<str>,
    /// The constant's position in the declaration.
    pub ordinal: usize,
    /// The constant's name.
    pub variant: Arc<str>,
}

/// An opaque instance of a user type, identified by its canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomValue {
    /// The user type's registered name.
    pub type_name: Arc<str>,
    /// The canonical textual form of the instance.
    pub text: String,
}

impl CustomValue {
    /// Returns a new instance of `type_name` with the given canonical text.
    pub fn new(type_name: impl Into<Arc<str>>, text: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            text: text.into(),
        }
    }
}

/// A decoded user object. Properties iterate in lexicographical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Object {
    /// The class's registered name.
    pub class: Arc<str>,
    /// The decoded properties.
    pub fields: BTreeMap<Arc<str>, Value>,
}

impl Object {
    /// Returns an empty instance of `class`.
    pub fn new(class: impl Into<Arc<str>>) -> Self {
        Self {
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Returns the property `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A sequence container. Each variant is one concrete implementation.
#[derive(Debug, Clone)]
pub enum Sequence {
    /// A growable array.
    List(Vec<Value>),
    /// A double-ended list.
    Linked(VecDeque<Value>),
    /// A hash set.
    HashSet(HashSet<Value>),
    /// An insertion-ordered set.
    LinkedSet(IndexSet<Value>),
    /// A balanced-tree set.
    TreeSet(BTreeSet<Value>),
}

impl Sequence {
    /// Returns an empty instance of the concrete `kind`. Abstract kinds and
    /// arrays map onto their natural backing.
    #[must_use]
    pub fn empty(kind: SequenceType) -> Self {
        match kind {
            SequenceType::LinkedList => Self::Linked(VecDeque::new()),
            SequenceType::HashSet | SequenceType::Set => Self::HashSet(HashSet::new()),
            SequenceType::LinkedHashSet => Self::LinkedSet(IndexSet::new()),
            SequenceType::TreeSet | SequenceType::SortedSet => Self::TreeSet(BTreeSet::new()),
            SequenceType::ArrayList
            | SequenceType::Array
            | SequenceType::List
            | SequenceType::Collection => Self::List(Vec::new()),
        }
    }

    /// The concrete kind backing this instance.
    #[must_use]
    pub const fn kind(&self) -> SequenceType {
        match self {
            Self::List(_) => SequenceType::ArrayList,
            Self::Linked(_) => SequenceType::LinkedList,
            Self::HashSet(_) => SequenceType::HashSet,
            Self::LinkedSet(_) => SequenceType::LinkedHashSet,
            Self::TreeSet(_) => SequenceType::TreeSet,
        }
    }

    /// Appends `value`. Sets ignore duplicates.
    pub fn push(&mut self, value: Value) {
        match self {
            Self::List(values) => values.push(value),
            Self::Linked(values) => values.push_back(value),
            Self::HashSet(values) => {
                values.insert(value);
            }
            Self::LinkedSet(values) => {
                values.insert(value);
            }
            Self::TreeSet(values) => {
                values.insert(value);
            }
        }
    }

    /// The number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(values) => values.len(),
            Self::Linked(values) => values.len(),
            Self::HashSet(values) => values.len(),
            Self::LinkedSet(values) => values.len(),
            Self::TreeSet(values) => values.len(),
        }
    }

    /// Returns true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the elements in the implementation's order.
    #[must_use]
    pub fn iter(&self) -> SequenceIter<'_> {
        match self {
            Self::List(values) => SequenceIter::List(values.iter()),
            Self::Linked(values) => SequenceIter::Linked(values.iter()),
            Self::HashSet(values) => SequenceIter::HashSet(values.iter()),
            Self::LinkedSet(values) => SequenceIter::LinkedSet(values.iter()),
            Self::TreeSet(values) => SequenceIter::TreeSet(values.iter()),
        }
    }
}

impl Ord for Sequence {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::HashSet(a), Self::HashSet(b)) => {
                sorted(a.iter()).cmp(&sorted(b.iter()))
            }
            _ => (self.kind() as u8)
                .cmp(&(other.kind() as u8))
                .then_with(|| self.iter().cmp(other.iter())),
        }
    }
}

impl PartialOrd for Sequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.kind() as u8);
        state.write_usize(self.len());
        match self {
            Self::HashSet(values) => state.write_u64(unordered_hash(values.iter())),
            _ => {
                for value in self.iter() {
                    value.hash(state);
                }
            }
        }
    }
}

/// An iterator over the elements of a [`Sequence`].
#[derive(Debug)]
pub enum SequenceIter<'a> {
    /// Over a list.
    List(std::slice::Iter<'a, Value>),
    /// Over a double-ended list.
    Linked(std::collections::vec_deque::Iter<'a, Value>),
    /// Over a hash set.
    HashSet(std::collections::hash_set::Iter<'a, Value>),
    /// Over an insertion-ordered set.
    LinkedSet(indexmap::set::Iter<'a, Value>),
    /// Over a tree set.
    TreeSet(std::collections::btree_set::Iter<'a, Value>),
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SequenceIter::List(iter) => iter.next(),
            SequenceIter::Linked(iter) => iter.next(),
            SequenceIter::HashSet(iter) => iter.next(),
            SequenceIter::LinkedSet(iter) => iter.next(),
            SequenceIter::TreeSet(iter) => iter.next(),
        }
    }
}

/// A map keyed by the constants of one enum, stored by ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumMap {
    type_name: Arc<str>,
    slots: Vec<Option<(Value, Value)>>,
    len: usize,
}

impl EnumMap {
    /// Returns an empty map keyed by the enum `type_name` with `constants`
    /// constants.
    pub fn new(type_name: impl Into<Arc<str>>, constants: usize) -> Self {
        Self {
            type_name: type_name.into(),
            slots: vec![None; constants],
            len: 0,
        }
    }

    /// The enum this map is keyed by.
    #[must_use]
    pub fn key_type(&self) -> &str {
        &self.type_name
    }

    fn slot_of(&self, key: &Value) -> Option<usize> {
        match key {
            Value::Enum(constant)
                if constant.type_name == self.type_name && constant.ordinal < self.slots.len() =>
            {
                Some(constant.ordinal)
            }
            _ => None,
        }
    }

    /// Associates `value` with `key`, returning the previous value. Keys
    /// that are not constants of this map's enum are handed back.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<Option<Value>, RejectedKey> {
        let Some(slot) = self.slot_of(&key) else {
            return Err(RejectedKey(key));
        };
        let previous = self.slots[slot].replace((key, value));
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous.map(|(_, value)| value))
    }

    /// Returns the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.slot_of(key)
            .and_then(|slot| self.slots[slot].as_ref())
            .map(|(_, value)| value)
    }

    /// The number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A key that a [`Mapping`] cannot hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("key {0} is not a constant of the map's key enum")]
pub struct RejectedKey(pub Value);

/// A map container. Each variant is one concrete implementation.
#[derive(Debug, Clone)]
pub enum Mapping {
    /// A hash map.
    Hash(HashMap<Value, Value>),
    /// An insertion-ordered map.
    Linked(IndexMap<Value, Value>),
    /// A balanced-tree map, iterated in ascending key order.
    Tree(BTreeMap<Value, Value>),
    /// A map keyed by enum constants, iterated in declaration order.
    Enum(EnumMap),
}

impl Mapping {
    /// Returns an empty instance of the concrete `kind`. `EnumMap` requires
    /// the key enum and is created through [`EnumMap::new`].
    #[must_use]
    pub fn empty(kind: MapType) -> Option<Self> {
        match kind {
            MapType::HashMap | MapType::Map => Some(Self::Hash(HashMap::new())),
            MapType::LinkedHashMap => Some(Self::Linked(IndexMap::new())),
            MapType::TreeMap | MapType::SortedMap | MapType::NavigableMap => {
                Some(Self::Tree(BTreeMap::new()))
            }
            MapType::EnumMap => None,
        }
    }

    /// The concrete kind backing this instance.
    #[must_use]
    pub const fn kind(&self) -> MapType {
        match self {
            Self::Hash(_) => MapType::HashMap,
            Self::Linked(_) => MapType::LinkedHashMap,
            Self::Tree(_) => MapType::TreeMap,
            Self::Enum(_) => MapType::EnumMap,
        }
    }

    /// Associates `value` with `key`, replacing and returning any earlier
    /// value for an equal key.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<Option<Value>, RejectedKey> {
        match self {
            Self::Hash(map) => Ok(map.insert(key, value)),
            Self::Linked(map) => Ok(map.insert(key, value)),
            Self::Tree(map) => Ok(map.insert(key, value)),
            Self::Enum(map) => map.insert(key, value),
        }
    }

    /// Returns the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Hash(map) => map.get(key),
            Self::Linked(map) => map.get(key),
            Self::Tree(map) => map.get(key),
            Self::Enum(map) => map.get(key),
        }
    }

    /// Returns the value for the string key `key`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.get(&Value::from(key))
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Hash(map) => map.len(),
            Self::Linked(map) => map.len(),
            Self::Tree(map) => map.len(),
            Self::Enum(map) => map.len(),
        }
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the entries in the implementation's order.
    #[must_use]
    pub fn iter(&self) -> MappingIter<'_> {
        match self {
            Self::Hash(map) => MappingIter::Hash(map.iter()),
            Self::Linked(map) => MappingIter::Linked(map.iter()),
            Self::Tree(map) => MappingIter::Tree(map.iter()),
            Self::Enum(map) => MappingIter::Enum(map.slots.iter()),
        }
    }

    /// Iterates the keys in the implementation's order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.iter().map(|(key, _)| key)
    }
}

impl Ord for Mapping {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Hash(a), Self::Hash(b)) => sorted(a.iter()).cmp(&sorted(b.iter())),
            _ => (self.kind() as u8)
                .cmp(&(other.kind() as u8))
                .then_with(|| self.iter().cmp(other.iter())),
        }
    }
}

impl PartialOrd for Mapping {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Mapping {}

impl Hash for Mapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.kind() as u8);
        state.write_usize(self.len());
        match self {
            Self::Hash(map) => state.write_u64(unordered_hash(map.iter())),
            _ => {
                for entry in self.iter() {
                    entry.hash(state);
                }
            }
        }
    }
}

/// An iterator over the entries of a [`Mapping`].
#[derive(Debug)]
pub enum MappingIter<'a> {
    /// Over a hash map.
    Hash(std::collections::hash_map::Iter<'a, Value, Value>),
    /// Over an insertion-ordered map.
    Linked(indexmap::map::Iter<'a, Value, Value>),
    /// Over a tree map.
    Tree(std::collections::btree_map::Iter<'a, Value, Value>),
    /// Over an enum map's slots.
    Enum(std::slice::Iter<'a, Option<(Value, Value)>>),
}

impl<'a> Iterator for MappingIter<'a> {
    type Item = (&'a Value, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            MappingIter::Hash(iter) => iter.next(),
            MappingIter::Linked(iter) => iter.next(),
            MappingIter::Tree(iter) => iter.next(),
            MappingIter::Enum(iter) => iter
                .find_map(Option::as_ref)
                .map(|(key, value)| (key, value)),
        }
    }
}

fn format_date_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => Display::fmt(value, f),
            Self::Char(value) => f.write_char(*value),
            Self::Integer(value) => Display::fmt(value, f),
            Self::Unsigned(value) => Display::fmt(value, f),
            Self::Float(value) => Display::fmt(value, f),
            Self::String(value) => f.write_str(value),
            Self::Date(millis) => match format_date_millis(*millis) {
                Some(text) => f.write_str(&text),
                None => Display::fmt(millis, f),
            },
            Self::Instant(value) => {
                f.write_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::LocalDate(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Self::LocalDateTime(value) => write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Enum(constant) => f.write_str(&constant.variant),
            Self::Custom(custom) => f.write_str(&custom.text),
            Self::Optional(None) => f.write_str("None"),
            Self::Optional(Some(value)) => Display::fmt(value, f),
            Self::Sequence(sequence) => {
                f.write_char('[')?;
                for (index, value) in sequence.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(value, f)?;
                }
                f.write_char(']')
            }
            Self::Mapping(mapping) => {
                f.write_char('{')?;
                for (index, (key, value)) in mapping.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_char('}')
            }
            Self::Object(object) => {
                write!(f, "{} {{", object.class)?;
                for (index, (name, value)) in object.fields.iter().enumerate() {
                    if index > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, " {name}: {value}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Serializes a map key as its textual form.
struct KeyText<'a>(&'a Value);

impl Serialize for KeyText<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self.0)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Char(value) => serializer.serialize_char(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Unsigned(value) => serializer.serialize_u64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::String(value) => serializer.serialize_str(value),
            Self::Date(millis) => match format_date_millis(*millis) {
                Some(text) => serializer.serialize_str(&text),
                None => serializer.serialize_i64(*millis),
            },
            Self::Instant(_)
            | Self::LocalDate(_)
            | Self::LocalDateTime(_)
            | Self::Enum(_)
            | Self::Custom(_) => serializer.collect_str(self),
            Self::Optional(None) => serializer.serialize_none(),
            Self::Optional(Some(value)) => serializer.serialize_some(value),
            Self::Sequence(sequence) => {
                let mut seq = serializer.serialize_seq(Some(sequence.len()))?;
                for value in sequence.iter() {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Self::Mapping(mapping) => {
                let mut map = serializer.serialize_map(Some(mapping.len()))?;
                for (key, value) in mapping.iter() {
                    map.serialize_entry(&KeyText(key), value)?;
                }
                map.end()
            }
            Self::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.fields.len()))?;
                for (name, value) in &object.fields {
                    map.serialize_entry(&**name, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

macro_rules! define_value_from_primitive {
    ($variant:ident, $target:ty, $primitive:ty) => {
        impl From<$primitive> for Value {
            fn from(value: $primitive) -> Self {
                Self::$variant(<$target>::from(value))
            }
        }
    };
}

define_value_from_primitive!(Integer, i64, i8);
define_value_from_primitive!(Integer, i64, i16);
define_value_from_primitive!(Integer, i64, i32);
define_value_from_primitive!(Integer, i64, i64);
define_value_from_primitive!(Unsigned, u64, u8);
define_value_from_primitive!(Unsigned, u64, u16);
define_value_from_primitive!(Unsigned, u64, u32);
define_value_from_primitive!(Unsigned, u64, u64);
define_value_from_primitive!(Float, f64, f32);
define_value_from_primitive!(Float, f64, f64);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<EnumValue> for Value {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl From<CustomValue> for Value {
    fn from(value: CustomValue) -> Self {
        Self::Custom(value)
    }
}

impl From<Sequence> for Value {
    fn from(value: Sequence) -> Self {
        Self::Sequence(value)
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Sequence(Sequence::List(values))
    }
}
