use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::coding_path::{CodingPath, PathSegment};
use crate::config::CodingConfig;
use crate::error::CodingError;
use crate::key::CodingKey;
use crate::lossy::LossyDecode;
use crate::raw_string::RawStringDecoder;
use crate::transformer::Transformer;
use crate::Decode;

static NULL: Value = Value::Null;

/// Read side of one value in a document.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    value: &'a Value,
    path: CodingPath,
    config: CodingConfig,
}

impl<'a> Decoder<'a> {
    pub fn new(value: &'a Value, config: CodingConfig) -> Self {
        Self::with_path(value, CodingPath::root(), config)
    }

    pub fn with_path(value: &'a Value, path: CodingPath, config: CodingConfig) -> Self {
        Self {
            value,
            path,
            config,
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    pub fn config(&self) -> CodingConfig {
        self.config
    }

    pub fn child(&self, value: &'a Value, segment: PathSegment) -> Decoder<'a> {
        Self::with_path(value, self.path.push(segment), self.config)
    }

    pub fn decode<T: Decode>(&self) -> Result<T, CodingError> {
        T::decode(self)
    }

    /// Opens the keyed container this decoder points at.
    pub fn container<K: CodingKey>(&self) -> Result<KeyedDecodingContainer<'a, K>, CodingError> {
        match self.value {
            Value::Object(map) => Ok(KeyedDecodingContainer::new(
                Some(map),
                self.path.clone(),
                self.config,
            )),
            other => Err(CodingError::type_mismatch(
                self.path.clone(),
                "object",
                other,
            )),
        }
    }

    /// Reads a tagged-union case: either a bare string naming the case, or an
    /// object with exactly one key naming the case and holding its payload.
    pub fn enum_case<K: CodingKey>(&self) -> Result<(K, Decoder<'a>), CodingError> {
        let (name, payload) = match self.value {
            Value::String(name) => (name.as_str(), &NULL),
            Value::Object(map) if map.len() == 1 => match map.iter().next() {
                Some((name, payload)) => (name.as_str(), payload),
                None => return Err(self.type_mismatch("single-key object")),
            },
            _ => return Err(self.type_mismatch("string or single-key object")),
        };
        let case = K::from_key(name).ok_or_else(|| {
            let expected: Vec<&str> = K::all().iter().map(CodingKey::as_str).collect();
            CodingError::unknown_case(self.path.clone(), name, &expected)
        })?;
        Ok((case, self.child(payload, PathSegment::Key(name.to_string()))))
    }

    pub fn type_mismatch(&self, expected: &'static str) -> CodingError {
        CodingError::type_mismatch(self.path.clone(), expected, self.value)
    }

    pub fn out_of_range(&self, value: impl Into<String>, target_type: &'static str) -> CodingError {
        CodingError::out_of_range(self.path.clone(), value, target_type)
    }
}

/// One level of keyed values, addressed through the key enumeration `K`.
///
/// An empty container stands in for a nested object that is absent; every
/// lookup in it reports the key as missing.
#[derive(Debug)]
pub struct KeyedDecodingContainer<'a, K> {
    map: Option<&'a Map<String, Value>>,
    path: CodingPath,
    config: CodingConfig,
    keys: PhantomData<fn() -> K>,
}

impl<'a, K: CodingKey> KeyedDecodingContainer<'a, K> {
    fn new(map: Option<&'a Map<String, Value>>, path: CodingPath, config: CodingConfig) -> Self {
        Self {
            map,
            path,
            config,
            keys: PhantomData,
        }
    }

    pub fn empty(path: CodingPath, config: CodingConfig) -> Self {
        Self::new(None, path, config)
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.path
    }

    pub fn path_for(&self, key: K) -> CodingPath {
        self.path.key(key.as_str())
    }

    pub fn contains(&self, key: K) -> bool {
        self.entry(key).is_some()
    }

    /// Wire keys present at this level, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.map
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    fn entry(&self, key: K) -> Option<&'a Value> {
        self.map.and_then(|map| map.get(key.as_str()))
    }

    fn present(&self, key: K) -> Option<&'a Value> {
        self.entry(key)
            .filter(|value| !(value.is_null() && self.config.null_is_absent))
    }

    fn required(&self, key: K) -> Result<&'a Value, CodingError> {
        self.entry(key)
            .ok_or_else(|| CodingError::key_not_found(self.path.clone(), key.as_str()))
    }

    fn decoder_for(&self, key: K, value: &'a Value) -> Decoder<'a> {
        Decoder::with_path(value, self.path_for(key), self.config)
    }

    pub fn decode<T: Decode>(&self, key: K) -> Result<T, CodingError> {
        let value = self.required(key)?;
        T::decode(&self.decoder_for(key, value))
    }

    pub fn decode_if_present<T: Decode>(&self, key: K) -> Result<Option<T>, CodingError> {
        match self.present(key) {
            Some(value) => T::decode(&self.decoder_for(key, value)).map(Some),
            None => Ok(None),
        }
    }

    pub fn nested_container<N: CodingKey>(
        &self,
        key: K,
    ) -> Result<KeyedDecodingContainer<'a, N>, CodingError> {
        let value = self.required(key)?;
        self.decoder_for(key, value).container()
    }

    /// Like [`nested_container`](Self::nested_container), but an absent or
    /// null entry yields an empty container.
    pub fn nested_container_if_present<N: CodingKey>(
        &self,
        key: K,
    ) -> Result<KeyedDecodingContainer<'a, N>, CodingError> {
        match self.present(key) {
            Some(value) => self.decoder_for(key, value).container(),
            None => Ok(KeyedDecodingContainer::empty(self.path_for(key), self.config)),
        }
    }

    /// Never fails: anything that is not an object becomes an empty container.
    pub fn nested_container_lenient<N: CodingKey>(&self, key: K) -> KeyedDecodingContainer<'a, N> {
        match self.nested_container_if_present(key) {
            Ok(container) => container,
            Err(err) => {
                tracing::debug!(path = %err.path, error = %err.kind, "treating malformed nested container as empty");
                KeyedDecodingContainer::empty(self.path_for(key), self.config)
            }
        }
    }

    pub fn decode_transformed<T>(&self, key: K, transformer: &T) -> Result<T::Output, CodingError>
    where
        T: Transformer,
        T::Input: Decode,
    {
        let input = self.decode::<T::Input>(key)?;
        transformer
            .transform(input)
            .map_err(|err| CodingError::transform_failed(self.path_for(key), err.to_string()))
    }

    pub fn decode_transformed_if_present<T>(
        &self,
        key: K,
        transformer: &T,
    ) -> Result<Option<T::Output>, CodingError>
    where
        T: Transformer,
        T::Input: Decode,
    {
        match self.decode_if_present::<T::Input>(key)? {
            Some(input) => transformer.transform(input).map(Some).map_err(|err| {
                CodingError::transform_failed(self.path_for(key), err.to_string())
            }),
            None => Ok(None),
        }
    }

    pub fn decode_lossy<C: LossyDecode>(&self, key: K) -> Result<C, CodingError> {
        let value = self.required(key)?;
        C::decode_lossy(&self.decoder_for(key, value))
    }

    pub fn decode_lossy_if_present<C: LossyDecode>(&self, key: K) -> Result<Option<C>, CodingError> {
        match self.present(key) {
            Some(value) => C::decode_lossy(&self.decoder_for(key, value)).map(Some),
            None => Ok(None),
        }
    }

    /// Decodes a value stored as a JSON document inside a string.
    ///
    /// An empty string or `null` is reported as a missing value at this key's
    /// path.
    pub fn decode_raw_string<T: Decode>(
        &self,
        key: K,
        transcoder: &RawStringDecoder,
    ) -> Result<T, CodingError> {
        let value = self.required(key)?;
        let decoder = self.decoder_for(key, value);
        let decoded = match raw_text(&decoder)? {
            Some(raw) => transcoder.decode::<T>(&raw, &decoder)?,
            None => None,
        };
        decoded.ok_or_else(|| CodingError::value_not_found(self.path_for(key), std::any::type_name::<T>()))
    }

    pub fn decode_raw_string_if_present<T: Decode>(
        &self,
        key: K,
        transcoder: &RawStringDecoder,
    ) -> Result<Option<T>, CodingError> {
        match self.present(key) {
            Some(value) => {
                let decoder = self.decoder_for(key, value);
                match raw_text(&decoder)? {
                    Some(raw) => transcoder.decode::<T>(&raw, &decoder),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    pub fn decode_lossy_raw_string<C: LossyDecode>(
        &self,
        key: K,
        transcoder: &RawStringDecoder,
    ) -> Result<C, CodingError> {
        let value = self.required(key)?;
        let decoder = self.decoder_for(key, value);
        let decoded = match raw_text(&decoder)? {
            Some(raw) => transcoder.decode_lossy::<C>(&raw, &decoder)?,
            None => None,
        };
        decoded.ok_or_else(|| CodingError::value_not_found(self.path_for(key), std::any::type_name::<C>()))
    }

    pub fn decode_lossy_raw_string_if_present<C: LossyDecode>(
        &self,
        key: K,
        transcoder: &RawStringDecoder,
    ) -> Result<Option<C>, CodingError> {
        match self.present(key) {
            Some(value) => {
                let decoder = self.decoder_for(key, value);
                match raw_text(&decoder)? {
                    Some(raw) => transcoder.decode_lossy::<C>(&raw, &decoder),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }
}

/// The text of a raw-string value. `null` yields `None`, like an empty
/// string does once transcoded.
fn raw_text(decoder: &Decoder<'_>) -> Result<Option<String>, CodingError> {
    if decoder.value().is_null() {
        return Ok(None);
    }
    String::decode(decoder).map(Some)
}

/// Swallows a decode failure so the caller can fall back to a default.
///
/// Generated code routes every `use_default_on_failure` attempt through here;
/// the swallowed error is logged at `debug`.
pub fn lenient<T>(attempt: Result<Option<T>, CodingError>) -> Option<T> {
    match attempt {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(path = %err.path, error = %err.kind, "decode failed, using fallback");
            None
        }
    }
}
