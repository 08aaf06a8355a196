use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::coding_path::{CodingPath, PathSegment};
use crate::config::CodingConfig;
use crate::error::{value_kind, CodingError};
use crate::key::CodingKey;
use crate::raw_string::RawStringEncoder;
use crate::transformer::Transformer;
use crate::Encode;

/// Write side of one value in a document.
///
/// Starts out as `null`; opening a keyed container turns it into an object,
/// and reopening it later (for example from a supertype's `encode`) keeps the
/// keys written so far.
#[derive(Debug, Clone)]
pub struct Encoder {
    value: Value,
    path: CodingPath,
    config: CodingConfig,
}

impl Encoder {
    pub fn new(config: CodingConfig) -> Self {
        Self::with_path(CodingPath::root(), config)
    }

    pub fn with_path(path: CodingPath, config: CodingConfig) -> Self {
        Self {
            value: Value::Null,
            path,
            config,
        }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    pub fn config(&self) -> CodingConfig {
        self.config
    }

    pub fn child(&self, segment: PathSegment) -> Encoder {
        Self::with_path(self.path.push(segment), self.config)
    }

    pub fn encode_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), CodingError> {
        value.encode(self)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Makes this value an object, keeping any keys already written.
    ///
    /// Containers with nothing to write call this directly so they still
    /// produce `{}`.
    pub fn keyed(&mut self) -> Result<&mut Map<String, Value>, CodingError> {
        if self.value.is_null() {
            self.value = Value::Object(Map::new());
        }
        match &mut self.value {
            Value::Object(map) => Ok(map),
            other => Err(CodingError::invalid_value(
                self.path.clone(),
                format!("cannot write keyed values into a {} value", value_kind(other)),
            )),
        }
    }

    pub fn container<K: CodingKey>(&mut self) -> Result<KeyedEncodingContainer<'_, K>, CodingError> {
        let path = self.path.clone();
        let config = self.config;
        let map = self.keyed()?;
        Ok(KeyedEncodingContainer::new(map, path, config))
    }

    /// Writes a payload-free tagged-union case as its bare key.
    pub fn encode_case<K: CodingKey>(&mut self, case: K) {
        self.value = Value::String(case.as_str().to_string());
    }

    /// Writes `{"case": payload}` for a single-value case.
    pub fn encode_case_payload<K: CodingKey, T: Encode + ?Sized>(
        &mut self,
        case: K,
        payload: &T,
    ) -> Result<(), CodingError> {
        let mut child = self.child(PathSegment::Key(case.as_str().to_string()));
        payload.encode(&mut child)?;
        let mut map = Map::new();
        map.insert(case.as_str().to_string(), child.into_value());
        self.value = Value::Object(map);
        Ok(())
    }

    /// Writes `{"case": {..}}` and hands out the inner keyed container.
    pub fn case_container<K: CodingKey, N: CodingKey>(
        &mut self,
        case: K,
    ) -> Result<KeyedEncodingContainer<'_, N>, CodingError> {
        let outer = self.container::<K>()?;
        Ok(outer.into_nested_container(case))
    }
}

/// One level of keyed values being written, addressed through `K`.
#[derive(Debug)]
pub struct KeyedEncodingContainer<'e, K> {
    map: &'e mut Map<String, Value>,
    path: CodingPath,
    config: CodingConfig,
    keys: PhantomData<fn() -> K>,
}

impl<'e, K: CodingKey> KeyedEncodingContainer<'e, K> {
    fn new(map: &'e mut Map<String, Value>, path: CodingPath, config: CodingConfig) -> Self {
        Self {
            map,
            path,
            config,
            keys: PhantomData,
        }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    pub fn path_for(&self, key: K) -> CodingPath {
        self.path.key(key.as_str())
    }

    fn encode_child<T: Encode + ?Sized>(&self, key: K, value: &T) -> Result<Value, CodingError> {
        let mut encoder = Encoder::with_path(self.path_for(key), self.config);
        value.encode(&mut encoder)?;
        Ok(encoder.into_value())
    }

    pub fn encode<T: Encode + ?Sized>(&mut self, key: K, value: &T) -> Result<(), CodingError> {
        let encoded = self.encode_child(key, value)?;
        self.map.insert(key.as_str().to_string(), encoded);
        Ok(())
    }

    /// Writes the value when present; an absent value leaves the key out.
    pub fn encode_if_present<T: Encode + ?Sized>(
        &mut self,
        key: K,
        value: Option<&T>,
    ) -> Result<(), CodingError> {
        match value {
            Some(value) => self.encode(key, value),
            None => Ok(()),
        }
    }

    pub fn encode_nil(&mut self, key: K) {
        self.map.insert(key.as_str().to_string(), Value::Null);
    }

    pub fn encode_transformed<T>(
        &mut self,
        key: K,
        value: &T::Output,
        transformer: &T,
    ) -> Result<(), CodingError>
    where
        T: Transformer,
        T::Input: Encode,
    {
        let input = transformer
            .reverse(value)
            .map_err(|err| CodingError::transform_failed(self.path_for(key), err.to_string()))?;
        self.encode(key, &input)
    }

    /// Writes the value as a JSON document embedded in a string.
    pub fn encode_raw_string<T: Encode + ?Sized>(
        &mut self,
        key: K,
        value: &T,
        transcoder: &RawStringEncoder,
    ) -> Result<(), CodingError> {
        let raw = transcoder.encode(value, self.path_for(key), self.config)?;
        self.map.insert(key.as_str().to_string(), Value::String(raw));
        Ok(())
    }

    pub fn nested_container<N: CodingKey>(&mut self, key: K) -> KeyedEncodingContainer<'_, N> {
        let path = self.path_for(key);
        let config = self.config;
        KeyedEncodingContainer::new(object_slot(self.map, key.as_str()), path, config)
    }

    fn into_nested_container<N: CodingKey>(self, key: K) -> KeyedEncodingContainer<'e, N> {
        let path = self.path_for(key);
        let config = self.config;
        KeyedEncodingContainer::new(object_slot(self.map, key.as_str()), path, config)
    }
}

fn object_slot<'m>(map: &'m mut Map<String, Value>, key: &str) -> &'m mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot was just replaced with an object"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Keys {
        Name,
        Profile,
    }

    impl CodingKey for Keys {
        fn as_str(&self) -> &'static str {
            match self {
                Keys::Name => "name",
                Keys::Profile => "profile",
            }
        }

        fn from_key(key: &str) -> Option<Self> {
            match key {
                "name" => Some(Keys::Name),
                "profile" => Some(Keys::Profile),
                _ => None,
            }
        }

        fn all() -> &'static [Self] {
            &[Keys::Name, Keys::Profile]
        }
    }

    #[test]
    fn keyed_without_writes_is_an_empty_object() {
        let mut encoder = Encoder::new(CodingConfig::default());
        encoder.keyed().unwrap();
        assert_eq!(encoder.into_value(), json!({}));
    }

    #[test]
    fn reopening_keeps_earlier_keys() {
        let mut encoder = Encoder::new(CodingConfig::default());
        encoder
            .container::<Keys>()
            .unwrap()
            .encode(Keys::Name, "ada")
            .unwrap();
        {
            let mut container = encoder.container::<Keys>().unwrap();
            let mut nested = container.nested_container::<Keys>(Keys::Profile);
            nested.encode_nil(Keys::Name);
        }
        assert_eq!(
            encoder.into_value(),
            json!({"name": "ada", "profile": {"name": null}})
        );
    }

    #[test]
    fn keyed_on_a_scalar_is_invalid() {
        let mut encoder = Encoder::new(CodingConfig::default());
        encoder.encode_value(json!(5));
        let err = encoder.keyed().unwrap_err();
        assert!(matches!(err.kind, crate::ErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn absent_optional_is_omitted() {
        let mut encoder = Encoder::new(CodingConfig::default());
        {
            let mut container = encoder.container::<Keys>().unwrap();
            container.encode_if_present::<String>(Keys::Name, None).unwrap();
        }
        assert_eq!(encoder.into_value(), json!({}));
    }
}
