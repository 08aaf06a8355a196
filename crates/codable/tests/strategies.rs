use std::collections::BTreeMap;

use codable::{codable, transformer, ErrorKind, FromStrTransformer, Lossy, TransformError, Transformer};
use serde_json::json;

#[codable]
#[derive(Debug, Clone, PartialEq)]
struct Item {
    id: i64,
}

fn item(id: i64) -> Item {
    Item { id }
}

#[codable]
#[derive(Debug, PartialEq)]
struct Inventory {
    #[coding_key(lossy)]
    items: Vec<Item>,
}

#[test]
fn lossy_arrays_drop_invalid_elements_in_order() {
    let inventory: Inventory = codable::from_value(&json!({
        "items": [{"id": 1}, {"id": "oops"}, {"id": 3}, 4, {"id": 5}]
    }))
    .unwrap();
    assert_eq!(inventory.items, vec![item(1), item(3), item(5)]);
}

#[test]
fn lossy_still_requires_an_array() {
    let err = codable::from_value::<Inventory>(&json!({"items": {"id": 1}})).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { expected: "array", .. }));
    assert_eq!(err.path.to_string(), "items");
}

#[codable]
#[derive(Debug, PartialEq)]
struct Fallbacks {
    #[coding_key(lossy, use_default_on_failure, default = vec![Item { id: 7 }])]
    items: Vec<Item>,
    #[coding_key(lossy)]
    labels: Option<BTreeMap<String, u8>>,
}

#[test]
fn lossy_with_default_falls_back_on_a_non_array() {
    let fallbacks: Fallbacks = codable::from_value(&json!({"items": "nope"})).unwrap();
    assert_eq!(fallbacks.items, vec![item(7)]);
    assert_eq!(fallbacks.labels, None);
}

#[test]
fn lossy_maps_drop_bad_entries() {
    let fallbacks: Fallbacks = codable::from_value(&json!({
        "items": [],
        "labels": {"a": 1, "b": "two", "c": 300, "d": 4}
    }))
    .unwrap();
    let labels = fallbacks.labels.unwrap();
    assert_eq!(labels.keys().collect::<Vec<_>>(), vec!["a", "d"]);
}

#[codable]
struct Wrapped {
    scores: Lossy<Vec<u8>>,
}

#[test]
fn lossy_wrapper_type() {
    let wrapped: Wrapped = codable::from_value(&json!({"scores": [1, -1, 2, "x"]})).unwrap();
    assert_eq!(*wrapped.scores, vec![1, 2]);
    assert_eq!(codable::to_value(&wrapped).unwrap(), json!({"scores": [1, 2]}));
}

#[codable]
#[derive(Debug, Clone, PartialEq)]
struct Room {
    name: String,
    seats: u32,
}

#[codable]
#[derive(Debug, PartialEq)]
struct Booking {
    #[coding_key(transcode_raw_string)]
    room: Room,
    #[coding_key("meta.backup", transcode_raw_string)]
    backup: Option<Room>,
}

#[test]
fn raw_string_fields_hold_embedded_documents() {
    let booking: Booking = codable::from_value(&json!({
        "room": r#"{"name":"Orion","seats":12}"#,
    }))
    .unwrap();
    assert_eq!(
        booking,
        Booking {
            room: Room {
                name: "Orion".into(),
                seats: 12,
            },
            backup: None,
        }
    );

    // The nested object is opened even when nothing is written into it.
    let encoded = codable::to_value(&booking).unwrap();
    assert_eq!(
        encoded,
        json!({"room": r#"{"name":"Orion","seats":12}"#, "meta": {}})
    );
}

#[test]
fn empty_raw_string_is_a_missing_value_at_its_key() {
    let err = codable::from_value::<Booking>(&json!({"room": ""})).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ValueNotFound { .. }));
    assert_eq!(err.path.to_string(), "room");
}

#[test]
fn null_raw_string_matches_the_empty_string() {
    let err = codable::from_value::<Booking>(&json!({"room": null})).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ValueNotFound { .. }));
    assert_eq!(err.path.to_string(), "room");

    let booking: Booking = codable::from_value(&json!({
        "room": r#"{"name":"Vega","seats":4}"#,
        "meta": {"backup": null},
    }))
    .unwrap();
    assert_eq!(booking.backup, None);
}

#[test]
fn malformed_raw_string_is_corrupted_data() {
    let err = codable::from_value::<Booking>(&json!({"room": "{not json"})).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DataCorrupted { .. }));
    assert_eq!(err.path.to_string(), "room");
}

#[test]
fn nested_raw_string_errors_carry_the_full_path() {
    let err = codable::from_value::<Booking>(&json!({
        "room": r#"{"name":"A","seats":1}"#,
        "meta": {"backup": r#"{"name":"B"}"#},
    }))
    .unwrap_err();
    assert_eq!(err.path.to_string(), "meta.backup.seats");
}

#[codable]
#[derive(Debug, PartialEq)]
struct Catalog {
    #[coding_key(lossy, transcode_raw_string)]
    tags: Vec<String>,
    #[coding_key(safe_transcode_raw_string, default = Vec::new())]
    aliases: Vec<String>,
}

#[test]
fn lossy_and_safe_raw_strings() {
    let catalog: Catalog = codable::from_value(&json!({
        "tags": r#"["a", 1, "b"]"#,
        "aliases": "{broken",
    }))
    .unwrap();
    assert_eq!(catalog.tags, vec!["a".to_string(), "b".to_string()]);
    assert!(catalog.aliases.is_empty());
}

fn cents() -> impl Transformer<Input = f64, Output = i64> {
    transformer(
        |dollars: f64| {
            if dollars.is_finite() {
                Ok((dollars * 100.0).round() as i64)
            } else {
                Err(TransformError::new("amount must be finite"))
            }
        },
        |cents: &i64| Ok(*cents as f64 / 100.0),
    )
}

#[codable]
#[derive(Debug, PartialEq)]
struct Invoice {
    #[coding_key(transformer = cents())]
    total: i64,
    #[coding_key("billing.port", transformer = FromStrTransformer::<u16>::new())]
    port: u16,
    #[coding_key(transformer = FromStrTransformer::<u32>::new())]
    reference: Option<u32>,
}

#[test]
fn transformers_convert_both_ways() {
    let invoice: Invoice = codable::from_value(&json!({
        "total": 12.5,
        "billing": {"port": "8443"},
    }))
    .unwrap();
    assert_eq!(
        invoice,
        Invoice {
            total: 1250,
            port: 8443,
            reference: None,
        }
    );
    assert_eq!(
        codable::to_value(&invoice).unwrap(),
        json!({"total": 12.5, "billing": {"port": "8443"}})
    );
}

#[test]
fn transformer_failures_name_the_key_path() {
    let err = codable::from_value::<Invoice>(&json!({
        "total": 1.0,
        "billing": {"port": "https"},
    }))
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TransformFailed { .. }));
    assert_eq!(err.path.to_string(), "billing.port");
}

#[test]
fn composed_transformers_run_in_sequence() {
    let doubled = FromStrTransformer::<i32>::new().compose(transformer(
        |n: i32| Ok(n * 2),
        |n: &i32| Ok(n / 2),
    ));
    assert_eq!(doubled.transform("21".to_string()).unwrap(), 42);
    assert_eq!(doubled.reverse(&42).unwrap(), "21");
}
