//! Decoding throughput for map-heavy documents.
//!
//! `jsonbind` produces a dynamic value graph while `serde_json` decodes into
//! concrete structs, so the comparison is only indicative.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fake::faker::filesystem::en::FilePath;
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use jsonbind::metadata::{ClassDef, EnumDef, TypeRegistry};
use jsonbind::{Binder, Config, DateType, MapType, ScalarType, TypeDescriptor};
use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    fn generate<R: Rng>(rand: &mut R) -> Self {
        match rand.gen_range(0_u8..=3_u8) {
            0 => Self::North,
            1 => Self::South,
            2 => Self::East,
            _ => Self::West,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Order {
    pub customer: String,
    pub request: String,
    pub note: Option<String>,
    pub code: u16,
    pub placed: DateTime<Utc>,
}

impl Order {
    fn generate<R: Rng>(rand: &mut R) -> Self {
        Self {
            customer: Username().fake_with_rng(rand),
            request: FilePath().fake_with_rng(rand),
            note: if rand.gen() {
                Some(Sentence(3..20).fake_with_rng(rand))
            } else {
                None
            },
            code: rand.gen(),
            placed: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Ledger {
    by_region: BTreeMap<Region, Vec<i32>>,
    labels: HashMap<i32, String>,
    orders: HashMap<String, Order>,
}

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with_enum(EnumDef::new("Region", ["North", "South", "East", "West"]))
        .with_class(
            ClassDef::new("Order")
                .field("customer", TypeDescriptor::string())
                .field("request", TypeDescriptor::string())
                .field("note", TypeDescriptor::optional(TypeDescriptor::string()))
                .field("code", TypeDescriptor::scalar(ScalarType::U16))
                .field("placed", TypeDescriptor::date(DateType::Date)),
        )
        .with_class(
            ClassDef::new("Ledger")
                .field(
                    "by_region",
                    TypeDescriptor::map_of(
                        MapType::SortedMap,
                        TypeDescriptor::named("Region"),
                        TypeDescriptor::list(TypeDescriptor::scalar(ScalarType::I32)),
                    ),
                )
                .field(
                    "labels",
                    TypeDescriptor::map(
                        TypeDescriptor::scalar(ScalarType::I32),
                        TypeDescriptor::string(),
                    ),
                )
                .field(
                    "orders",
                    TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::named("Order")),
                ),
        )
}

enum Backend {
    Jsonbind,
    JsonbindCold,
    SerdeJson,
    SerdeJsonValue,
}

impl Backend {
    fn all() -> [Self; 4] {
        [
            Self::Jsonbind,
            Self::JsonbindCold,
            Self::SerdeJson,
            Self::SerdeJsonValue,
        ]
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Jsonbind => "jsonbind",
            Self::JsonbindCold => "jsonbind(cold caches)",
            Self::SerdeJson => "serde_json",
            Self::SerdeJsonValue => "serde_json(Value)",
        })
    }
}

const ORDERS: usize = 50;

fn bench_maps(c: &mut Criterion) {
    let random_seed = env::args().find(|arg| arg.starts_with("-s")).map_or_else(
        || thread_rng().gen(),
        |seed| {
            let (_, seed) = seed.split_at(2);
            let seed = u128::from_str_radix(seed, 16).expect("invalid hexadecimal seed");
            let mut bytes = [0; 32];
            bytes[16..].copy_from_slice(&seed.to_be_bytes());
            bytes
        },
    );
    print!("Using random seed -s");
    for b in &random_seed[16..] {
        print!("{b:02x}");
    }
    println!();
    let mut rng = StdRng::from_seed(random_seed);

    let mut ledger = Ledger {
        by_region: BTreeMap::new(),
        labels: HashMap::with_capacity(ORDERS),
        orders: HashMap::with_capacity(ORDERS),
    };
    for index in 0..ORDERS {
        ledger
            .by_region
            .entry(Region::generate(&mut rng))
            .or_default()
            .push(rng.gen());
        ledger
            .labels
            .insert(rng.gen(), Sentence(1..4).fake_with_rng(&mut rng));
        ledger
            .orders
            .insert(format!("order-{index}"), Order::generate(&mut rng));
    }
    let json = serde_json::to_string(&ledger).unwrap();

    let ty = TypeDescriptor::named("Ledger");
    let binder = Binder::new(Config::default(), registry()).unwrap();

    let mut deserialize_group = c.benchmark_group("maps/deserialize");
    for backend in Backend::all() {
        deserialize_group.bench_function(backend.to_string(), |b| match backend {
            Backend::Jsonbind => b.iter(|| binder.from_str(black_box(&json), &ty).unwrap()),
            Backend::JsonbindCold => b.iter(|| {
                Binder::new(Config::default(), registry())
                    .unwrap()
                    .from_str(black_box(&json), &ty)
                    .unwrap()
            }),
            Backend::SerdeJson => {
                b.iter(|| serde_json::from_str::<Ledger>(black_box(&json)).unwrap());
            }
            Backend::SerdeJsonValue => {
                b.iter(|| serde_json::from_str::<serde_json::Value>(black_box(&json)).unwrap());
            }
        });
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    bench_maps(c);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
