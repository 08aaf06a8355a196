use std::cell::RefCell;

use codable::{codable, coding_hooks, Decoder, Encoder, ErrorKind};
use serde_json::json;

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(entry: impl Into<String>) {
    LOG.with(|log| log.borrow_mut().push(entry.into()));
}

fn take_log() -> Vec<String> {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

#[codable(hooks)]
#[derive(Debug, PartialEq)]
struct Member {
    #[coding_key(transformer = codable::forward_only(|raw: String| {
        record(format!("field {raw}"));
        Ok(raw)
    }))]
    name: String,
    #[coding_key(default = 0)]
    normalized: usize,
}

#[coding_hooks]
impl Member {
    #[hook(pre_decode)]
    fn first_check() {
        record("pre 1");
    }

    #[hook(pre_decode)]
    fn second_check(decoder: &Decoder<'_>) {
        record(format!("pre 2 at {}", decoder.coding_path()));
    }

    #[hook(post_decode)]
    fn normalize(&mut self) {
        record("post 1");
        self.normalized = self.name.trim().len();
    }

    #[hook(post_decode)]
    fn verify(&mut self) -> Result<(), String> {
        record("post 2");
        if self.normalized == 0 {
            return Err("name is blank".to_string());
        }
        Ok(())
    }
}

#[test]
fn hooks_run_in_declaration_order_around_field_decoding() {
    take_log();
    let member: Member = codable::from_value(&json!({"name": "  ada "})).unwrap();
    assert_eq!(member.normalized, 3);
    assert_eq!(
        take_log(),
        vec!["pre 1", "pre 2 at <root>", "field   ada ", "post 1", "post 2"]
    );
}

#[test]
fn pre_decode_hooks_run_before_the_container_is_opened() {
    take_log();
    let err = codable::from_value::<Member>(&json!("not an object")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(take_log(), vec!["pre 1", "pre 2 at <root>"]);
}

#[test]
fn failing_hook_surfaces_as_a_hook_error() {
    take_log();
    let err = codable::from_value::<Member>(&json!({"name": "   "})).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::Hook {
            message: "name is blank".to_string()
        }
    );
    assert_eq!(take_log().last().map(String::as_str), Some("post 2"));
}

#[codable(hooks)]
#[derive(Debug, Default)]
struct Stamped {
    body: String,
}

#[coding_hooks]
impl Stamped {
    #[hook(pre_encode)]
    fn announce(&self) {
        record(format!("encoding {}", self.body));
    }

    #[hook(post_encode)]
    fn stamp(&self, encoder: &mut Encoder) -> Result<(), codable::CodingError> {
        encoder.keyed()?.insert("version".into(), json!(2));
        Ok(())
    }

    // Plain methods are left alone.
    fn shout(&self) -> String {
        self.body.to_uppercase()
    }
}

#[test]
fn encode_hooks_wrap_the_generated_body() {
    take_log();
    let stamped = Stamped { body: "hi".into() };
    assert_eq!(
        codable::to_value(&stamped).unwrap(),
        json!({"body": "hi", "version": 2})
    );
    assert_eq!(take_log(), vec!["encoding hi"]);
    assert_eq!(stamped.shout(), "HI");
}

#[codable]
#[derive(Debug, Default, PartialEq)]
struct Quiet {
    value: u8,
}

#[test]
fn containers_without_hooks_get_the_empty_implementation() {
    use codable::CodingHooks;

    let mut quiet = Quiet::default();
    let document = json!({});
    let decoder = Decoder::new(&document, codable::CodingConfig::default());
    assert!(Quiet::pre_decode(&decoder).is_ok());
    assert!(quiet.post_decode(&decoder).is_ok());
    assert_eq!(quiet, Quiet::default());
}
