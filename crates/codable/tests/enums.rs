use codable::{codable, CodingKey, ErrorKind};
use serde_json::json;

#[codable(rename_all = "snake_case")]
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Empty,
    Circle(f64),
    Rect {
        width: f64,
        #[coding_key("size.h")]
        height: f64,
    },
    #[coding_key("poly")]
    Polygon {
        sides: Option<u8>,
    },
}

#[test]
fn unit_cases_are_bare_strings() {
    assert_eq!(codable::to_value(&Shape::Empty).unwrap(), json!("empty"));
    let shape: Shape = codable::from_value(&json!("empty")).unwrap();
    assert_eq!(shape, Shape::Empty);
}

#[test]
fn single_value_cases_wrap_their_payload() {
    assert_eq!(
        codable::to_value(&Shape::Circle(1.5)).unwrap(),
        json!({"circle": 1.5})
    );
    let shape: Shape = codable::from_value(&json!({"circle": 2.0})).unwrap();
    assert_eq!(shape, Shape::Circle(2.0));
}

#[test]
fn field_cases_use_their_own_keys() {
    let rect = Shape::Rect {
        width: 3.0,
        height: 4.0,
    };
    assert_eq!(
        codable::to_value(&rect).unwrap(),
        json!({"rect": {"width": 3.0, "size": {"h": 4.0}}})
    );
    let decoded: Shape = codable::from_value(&json!({"rect": {"width": 3.0, "size": {"h": 4.0}}})).unwrap();
    assert_eq!(decoded, rect);

    let poly: Shape = codable::from_value(&json!({"poly": {}})).unwrap();
    assert_eq!(poly, Shape::Polygon { sides: None });
    assert_eq!(
        codable::to_value(&Shape::Polygon { sides: Some(6) }).unwrap(),
        json!({"poly": {"sides": 6}})
    );
}

#[test]
fn unknown_case_lists_the_expected_keys() {
    let err = codable::from_value::<Shape>(&json!("hexagon")).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::UnknownCase {
            case: "hexagon".into(),
            expected: vec!["empty".into(), "circle".into(), "rect".into(), "poly".into()],
        }
    );
}

#[test]
fn payload_errors_carry_the_case_key() {
    let err = codable::from_value::<Shape>(&json!({"rect": {"width": 1.0}})).unwrap_err();
    assert_eq!(err.path.to_string(), "rect.size");
}

#[test]
fn case_key_enum_round_trips_wire_names() {
    for key in ShapeCodingKeys::all() {
        assert_eq!(ShapeCodingKeys::from_key(key.as_str()), Some(*key));
    }
}

// Shares its concatenated name with the `Rect` case of `Shape`.
#[codable]
#[derive(Debug, PartialEq)]
struct ShapeRect {
    label: String,
}

#[test]
fn payload_keys_do_not_clash_with_sibling_containers() {
    assert_eq!(ShapeRectCodingKeys::Label.as_str(), "label");
    assert_eq!(Shape_RectCodingKeys::Width.as_str(), "width");
    let rect: ShapeRect = codable::from_value(&json!({"label": "r"})).unwrap();
    assert_eq!(rect.label, "r");
}

#[codable]
#[derive(Debug, PartialEq)]
enum Status {
    Active,
    #[coding_key(ignored)]
    Migrating(u32, u32),
}

#[test]
fn ignored_cases_cannot_be_encoded_or_decoded() {
    assert_eq!(codable::to_value(&Status::Active).unwrap(), json!("Active"));
    let err = codable::to_value(&Status::Migrating(1, 2)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidValue { .. }));

    let err = codable::from_value::<Status>(&json!("Migrating")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownCase { .. }));
}
