//! Type-directed JSON binding.
//!
//! A [`Binder`] decodes JSON into [`Value`] graphs whose shape follows a
//! runtime [`TypeDescriptor`]. Descriptors may name generic user types whose
//! type variables are bound by enclosing declarations; they are resolved as
//! decoding descends.

#![deny(unsafe_code)]
#![warn(
    // clippy::cargo,
    missing_docs,
    // clippy::missing_docs_in_private_items,
    clippy::nursery,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms,
)]
#![cfg_attr(doc, deny(rustdoc::all))]
#![allow(
    clippy::missing_errors_doc, // TODO clippy::missing_errors_doc
    clippy::option_if_let_else,
    clippy::used_underscore_binding, // false positive with tracing
)]

mod config;
/// The chain of in-progress values used for resolution and error paths.
pub mod context;
mod date;
/// The type-directed decoding engine.
pub mod de;
mod error;
/// Low-level interface for tokenizing JSON.
pub mod format;
/// Construction of empty containers and objects.
pub mod instance;
/// Conversion of JSON member names into typed map keys.
pub mod keys;
/// Metadata describing user enums and classes.
pub mod metadata;
/// Types for reading data.
pub mod reader;
/// Type variable resolution.
pub mod resolve;
mod scalar;
/// Memoized per-type decoding strategies.
pub mod strategy;
mod types;
mod value;

use std::io::Read;

pub use config::{Binder, Config, MissingFields, DEFAULT_RECURSION_LIMIT};
pub use error::{BoxError, Error, Path, Segment};
pub use types::{
    ContainerClass, DateType, MapType, RawType, ScalarType, SequenceType, TypeDescriptor,
};
pub use value::{
    CustomValue, EnumMap, EnumValue, Mapping, MappingIter, Object, RejectedKey, Sequence,
    SequenceIter, Value,
};

/// A result alias that returns [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Decodes `json` as `ty` using the default configuration and no user types.
pub fn from_str(json: &str, ty: &TypeDescriptor) -> Result<Value> {
    Binder::default().from_str(json, ty)
}

/// Decodes the JSON in `bytes` as `ty` using the default configuration and
/// no user types.
pub fn from_slice(bytes: &[u8], ty: &TypeDescriptor) -> Result<Value> {
    Binder::default().from_slice(bytes, ty)
}

/// Decodes the JSON read from `reader` as `ty` using the default
/// configuration and no user types.
pub fn from_reader<R: Read>(reader: R, ty: &TypeDescriptor) -> Result<Value> {
    Binder::default().from_reader(reader, ty)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use std::thread;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::metadata::{ClassDef, EnumDef, FieldDef, StaticMethod, TypeRegistry};

    fn init_tracing() {
        drop(
            tracing_subscriber::fmt()
                .pretty()
                // enable everything
                .with_max_level(tracing::Level::TRACE)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::ENTER)
                // sets this to be the default, global collector for this application.
                .try_init(),
        );
    }

    fn int() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarType::I32)
    }

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .with_enum(EnumDef::new("Country", ["CZ", "SK", "US"]))
            .with_class(
                ClassDef::new("Code").method(StaticMethod::new("fromString", |text| {
                    if text.chars().all(|ch| ch.is_ascii_alphabetic()) {
                        Ok(Value::from(CustomValue::new("Code", text.to_uppercase())))
                    } else {
                        Err(format!("invalid code {text:?}").into())
                    }
                })),
            )
            .with_class(ClassDef::new("Plain"))
            .with_class(
                ClassDef::new("Buckets").type_params(["K", "V"]).field(
                    "data",
                    TypeDescriptor::map(
                        TypeDescriptor::variable("K"),
                        TypeDescriptor::list(TypeDescriptor::variable("V")),
                    ),
                ),
            )
            .with_class(
                ClassDef::new("Report")
                    .field(
                        "by_country",
                        TypeDescriptor::map(
                            TypeDescriptor::string(),
                            TypeDescriptor::list(int()),
                        ),
                    )
                    .field("names", TypeDescriptor::list(TypeDescriptor::string()))
                    .field("ratio", TypeDescriptor::scalar(ScalarType::F64))
                    .field("active", TypeDescriptor::scalar(ScalarType::Bool))
                    .field("note", TypeDescriptor::optional(TypeDescriptor::string())),
            )
            .with_class(ClassDef::new("Outer").field("a", TypeDescriptor::named("Inner")))
            .with_class(ClassDef::new("Inner").field("b", int()))
            .with_class(
                ClassDef::new("Scores")
                    .type_params(["K"])
                    .extends(TypeDescriptor::map_of(
                        MapType::TreeMap,
                        TypeDescriptor::variable("K"),
                        int(),
                    )),
            )
            .with_class(
                ClassDef::new("Tags").extends(TypeDescriptor::sequence(
                    SequenceType::LinkedHashSet,
                    TypeDescriptor::string(),
                )),
            )
            .with_class(
                ClassDef::new("Event").field_def(
                    FieldDef::new("days", TypeDescriptor::list(TypeDescriptor::date(DateType::LocalDate)))
                        .date_format("%d/%m/%Y"),
                ),
            )
    }

    fn binder() -> Binder {
        init_tracing();
        match Binder::new(Config::default(), types()) {
            Ok(binder) => binder,
            Err(err) => unreachable!("{err}"),
        }
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Report {
        by_country: BTreeMap<String, Vec<i32>>,
        names: Vec<String>,
        ratio: f64,
        active: bool,
        note: Option<String>,
    }

    #[test]
    fn round_trips_through_serde_json() {
        let report = Report {
            by_country: BTreeMap::from([
                (String::from("CZ"), vec![1, 2, 3]),
                (String::from("US"), vec![-4]),
            ]),
            names: vec![String::from("a"), String::from("b\"c")],
            ratio: 0.25,
            active: true,
            note: Some(String::from("hello")),
        };
        let json = serde_json::to_string(&report).unwrap();
        let decoded = binder()
            .from_str(&json, &TypeDescriptor::named("Report"))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::to_value(&report).unwrap()
        );
        let restored: Report = serde_json::from_value(serde_json::to_value(&decoded).unwrap()).unwrap();
        assert_eq!(restored, report);
    }

    #[test]
    fn enum_keyed_maps() {
        let value = binder()
            .from_str(
                r#"{"US":[3],"CZ":[1,2]}"#,
                &TypeDescriptor::map(TypeDescriptor::named("Country"), TypeDescriptor::list(int())),
            )
            .unwrap();
        let Some(Mapping::Enum(map)) = value.as_mapping() else {
            unreachable!("{value:?}")
        };
        assert_eq!(map.len(), 2);
        let keys = value
            .as_mapping()
            .unwrap()
            .keys()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        assert_eq!(keys, ["CZ", "US"]);

        let err = binder()
            .from_str(
                r#"{"DE":[1]}"#,
                &TypeDescriptor::map(TypeDescriptor::named("Country"), TypeDescriptor::list(int())),
            )
            .unwrap_err();
        assert!(matches!(err, Error::KeyCoercion { ref key, .. } if key == "DE"));
    }

    #[test]
    fn generic_map_arguments_resolve_at_both_levels() {
        let value = binder()
            .from_str(
                r#"{"data":{"US":[3],"CZ":[1,2]}}"#,
                &TypeDescriptor::generic("Buckets", [TypeDescriptor::named("Country"), int()]),
            )
            .unwrap();
        let data = value.as_object().and_then(|buckets| buckets.get("data"));
        let Some(Value::Mapping(Mapping::Enum(data))) = data else {
            unreachable!("{value:?}")
        };
        assert_eq!(data.key_type(), "Country");

        let entries = value
            .as_object()
            .and_then(|buckets| buckets.get("data"))
            .and_then(Value::as_mapping)
            .unwrap()
            .iter()
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect::<Vec<_>>();
        let [(Value::Enum(cz), cz_values), (Value::Enum(us), us_values)] = &entries[..] else {
            unreachable!("{entries:?}")
        };
        assert_eq!((&*cz.variant, cz.ordinal), ("CZ", 0));
        assert_eq!((&*us.variant, us.ordinal), ("US", 2));
        assert_eq!(
            cz_values,
            &Value::from(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(us_values, &Value::from(vec![Value::Integer(3)]));
    }

    #[test]
    fn sorted_maps_iterate_in_key_order() {
        let value = binder()
            .from_str(
                r#"{"b":1,"c":3,"a":2}"#,
                &TypeDescriptor::map_of(MapType::SortedMap, TypeDescriptor::string(), int()),
            )
            .unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.kind(), MapType::TreeMap);
        assert_eq!(
            mapping.keys().map(ToString::to_string).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn keys_use_factory_methods() {
        let binder = binder();
        let value = binder
            .from_str(
                r#"{"bi":1,"Cz":2}"#,
                &TypeDescriptor::map(TypeDescriptor::named("Code"), int()),
            )
            .unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(
            mapping.get(&Value::from(CustomValue::new("Code", "BI"))),
            Some(&Value::Integer(1))
        );

        let err = binder
            .from_str(
                r#"{"b1":1}"#,
                &TypeDescriptor::map(TypeDescriptor::named("Code"), int()),
            )
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::KeyCoercion { key, key_type, .. } if key == "b1" && key_type == "Code"
        ));

        // No factory: the member name itself becomes the key.
        let value = binder
            .from_str(
                r#"{"anything":1}"#,
                &TypeDescriptor::map(TypeDescriptor::named("Plain"), int()),
            )
            .unwrap();
        assert_eq!(
            value.as_mapping().unwrap().get_str("anything"),
            Some(&Value::Integer(1))
        );

        let value = binder
            .from_str(
                r#"{"7":"x","-1":"y"}"#,
                &TypeDescriptor::map_of(MapType::TreeMap, int(), TypeDescriptor::string()),
            )
            .unwrap();
        assert_eq!(
            value.as_mapping().unwrap().keys().cloned().collect::<Vec<_>>(),
            [Value::Integer(-1), Value::Integer(7)]
        );
    }

    #[test]
    fn date_values() {
        let value = binder()
            .from_str(
                r#"{"day":"2020-01-01","moment":"2020-01-01T10:15:30Z"}"#,
                &TypeDescriptor::map(
                    TypeDescriptor::string(),
                    TypeDescriptor::date(DateType::Date),
                ),
            )
            .unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.get_str("day"), Some(&Value::Date(1_577_836_800_000)));
        assert_eq!(
            mapping.get_str("moment"),
            Some(&Value::Date(1_577_873_730_000))
        );

        let err = binder()
            .from_str(
                r#"{"days":["01/02/2021","2021-02-03"]}"#,
                &TypeDescriptor::named("Event"),
            )
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::MalformedValue { pattern: Some(pattern), raw, .. }
                if pattern == "%d/%m/%Y" && raw == "2021-02-03"
        ));
        assert_eq!(err.path().unwrap().to_string(), "days[1]");
    }

    #[test]
    fn null_map_values_become_empty_optionals() {
        let value = binder()
            .from_str(
                r#"{"a":null,"b":"x"}"#,
                &TypeDescriptor::map(
                    TypeDescriptor::string(),
                    TypeDescriptor::optional(TypeDescriptor::string()),
                ),
            )
            .unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.get_str("a"), Some(&Value::empty_optional()));
        assert_eq!(
            mapping.get_str("b"),
            Some(&Value::Optional(Some(Box::new(Value::from("x")))))
        );

        let value = binder()
            .from_str(
                r#"{"a":null}"#,
                &TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::string()),
            )
            .unwrap();
        assert_eq!(value.as_mapping().unwrap().get_str("a"), Some(&Value::Null));
    }

    #[test]
    fn errors_report_paths() {
        let err = binder()
            .from_str(r#"{"a":{"b":"not-a-number"}}"#, &TypeDescriptor::named("Outer"))
            .unwrap_err();
        let Error::MalformedValue { raw, target, path, .. } = &err else {
            unreachable!("{err:?}")
        };
        assert_eq!(raw, "not-a-number");
        assert_eq!(target, "i32");
        assert_eq!(path.to_string(), "a.b");

        let err = binder()
            .from_str("[1,2,\"x\"]", &TypeDescriptor::list(int()))
            .unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "[2]");

        let err = binder().from_str("true", &int()).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "<root>");
    }

    #[test]
    fn duplicate_keys_keep_the_last_value() {
        let value = binder()
            .from_str(
                r#"{"a":1,"b":2,"a":3}"#,
                &TypeDescriptor::map_of(MapType::LinkedHashMap, TypeDescriptor::string(), int()),
            )
            .unwrap();
        let entries = value
            .as_mapping()
            .unwrap()
            .iter()
            .map(|(key, value)| (key.to_string(), value.as_i64()))
            .collect::<Vec<_>>();
        assert_eq!(
            entries,
            [(String::from("a"), Some(3)), (String::from("b"), Some(2))]
        );
    }

    #[test]
    fn container_classes() {
        let binder = binder();
        let value = binder
            .from_str(
                r#"{"z":1,"m":2}"#,
                &TypeDescriptor::generic("Scores", [TypeDescriptor::string()]),
            )
            .unwrap();
        assert_eq!(value.as_mapping().map(Mapping::kind), Some(MapType::TreeMap));

        let value = binder
            .from_str(r#"["b","a","b"]"#, &TypeDescriptor::named("Tags"))
            .unwrap();
        let tags = value.as_sequence().unwrap();
        assert_eq!(tags.kind(), SequenceType::LinkedHashSet);
        assert_eq!(
            tags.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["b", "a"]
        );
    }

    #[test]
    fn polymorphic_values() {
        let value = from_str(
            r#"{"list":[1,2.5,"x",true,null],"nested":{"k":-1}}"#,
            &TypeDescriptor::any(),
        )
        .unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.kind(), MapType::HashMap);
        let list = mapping.get_str("list").and_then(Value::as_sequence).unwrap();
        assert_eq!(list.kind(), SequenceType::ArrayList);
        assert_eq!(
            list.iter().cloned().collect::<Vec<_>>(),
            [
                Value::Integer(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Bool(true),
                Value::Null
            ]
        );
    }

    #[test]
    fn default_implementations_are_configurable() {
        let binder = Binder::new(
            Config::default()
                .default_map_implementation(RawType::Map(MapType::LinkedHashMap))
                .default_list_implementation(RawType::Sequence(SequenceType::LinkedList)),
            types(),
        )
        .unwrap();
        let value = binder
            .from_str(
                r#"{"x":[1]}"#,
                &TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::list(int())),
            )
            .unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.kind(), MapType::LinkedHashMap);
        assert_eq!(
            mapping.get_str("x").and_then(Value::as_sequence).map(Sequence::kind),
            Some(SequenceType::LinkedList)
        );
    }

    #[test]
    fn instantiation_failures() {
        let err = binder()
            .from_str(
                r#"{"x":{"1":2}}"#,
                &TypeDescriptor::map(
                    TypeDescriptor::string(),
                    TypeDescriptor::map_of(MapType::EnumMap, int(), int()),
                ),
            )
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::Instantiation { type_name, .. } if type_name == "EnumMap"
        ));
        assert_eq!(err.path().unwrap().to_string(), "x");
    }

    #[test]
    fn concurrent_decodes_share_caches() {
        let binder = binder();
        let ty = TypeDescriptor::map(TypeDescriptor::named("Code"), TypeDescriptor::named("Report"));
        let json = r#"{"ab":{"names":["x"]},"cd":{"ratio":1.5}}"#;

        let decoded = thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| binder.from_str(json, &ty)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap().unwrap())
                .collect::<Vec<_>>()
        });

        assert!(decoded.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(binder.key_cache().len(), 1);
        assert!(binder.key_cache().contains(&RawType::Named(Arc::from("Code"))));
    }

    #[test]
    fn shared_key_cache() {
        let cache = Arc::new(keys::KeyCoercionCache::new());
        let first = Binder::new(Config::default(), types())
            .unwrap()
            .with_key_cache(cache.clone());
        let second = Binder::new(Config::default(), types())
            .unwrap()
            .with_key_cache(cache.clone());
        let ty = TypeDescriptor::map(TypeDescriptor::named("Country"), int());
        first.from_str(r#"{"CZ":1}"#, &ty).unwrap();
        second.from_str(r#"{"SK":1}"#, &ty).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn readers_and_slices_agree() {
        let json = r#"{"b":[1,2],"a":[]}"#;
        let ty = TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::list(int()));
        let from_slice = from_slice(json.as_bytes(), &ty).unwrap();
        let from_reader = from_reader(json.as_bytes(), &ty).unwrap();
        assert_eq!(from_slice, from_reader);
        let expected = HashMap::from([
            (String::from("a"), Vec::<i32>::new()),
            (String::from("b"), vec![1, 2]),
        ]);
        assert_eq!(
            serde_json::to_value(&from_slice).unwrap(),
            serde_json::to_value(expected).unwrap()
        );

        assert!(matches!(
            from_str(r#"{"a":[]} x"#, &ty),
            Err(Error::TrailingData)
        ));
        assert!(matches!(from_str(r#"{"a":["#, &ty), Err(Error::Eof)));
    }
}
