// begin rustme snippet: example
use anyhow::Context;
use jsonbind::metadata::{ClassDef, EnumDef, TypeRegistry};
use jsonbind::{Binder, Config, MapType, ScalarType, TypeDescriptor};

fn main() -> anyhow::Result<()> {
    // `Page<T>` carries a list of `T` and a map of counts keyed by `Kind`.
    let types = TypeRegistry::new()
        .with_enum(EnumDef::new("Kind", ["Book", "Film"]))
        .with_class(
            ClassDef::new("Page")
                .type_params(["T"])
                .field("items", TypeDescriptor::list(TypeDescriptor::variable("T")))
                .field(
                    "counts",
                    TypeDescriptor::map_of(
                        MapType::Map,
                        TypeDescriptor::named("Kind"),
                        TypeDescriptor::scalar(ScalarType::U32),
                    ),
                ),
        );
    let binder = Binder::new(Config::default(), types)?;

    let page = binder.from_str(
        r#"{"items": ["1", 2, 3.0], "counts": {"Book": 2, "Film": 1}}"#,
        &TypeDescriptor::generic("Page", [TypeDescriptor::scalar(ScalarType::I64)]),
    )?;
    println!("Page decoded as value: {page:?}");

    let page = page.as_object().context("pages decode as objects")?;
    let items = page.get("items").and_then(|items| items.as_sequence());
    assert_eq!(items.map(|items| items.len()), Some(3));

    Ok(())
}
// end rustme snippet

#[test]
fn runs() {
    main().unwrap();
}
