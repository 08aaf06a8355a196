#![allow(clippy::result_large_err)]

pub mod coding_path;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod hooks;
pub mod key;
pub mod lossy;
pub mod raw_string;
pub mod transformer;
mod convert;

pub use coding_path::{CodingPath, PathSegment};
pub use config::CodingConfig;
pub use decoder::{lenient, Decoder, KeyedDecodingContainer};
pub use encoder::{Encoder, KeyedEncodingContainer};
pub use error::{CodingError, ErrorKind};
pub use hooks::{CodingHooks, HookOutcome};
pub use key::{CodingKey, MapKey};
pub use lossy::{Lossy, LossyDecode};
pub use raw_string::{RawStringDecoder, RawStringEncoder};
pub use serde_json::{Map, Value};
pub use transformer::{
    forward_only, transformer, Composed, FnTransformer, FromStrTransformer, Identity,
    TransformError, Transformer,
};

/// Trait for decoding a typed value from a keyed document.
pub trait Decode: Sized {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError>;
}

/// Trait for encoding a typed value into a keyed document.
pub trait Encode {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError>;
}

/// Marker for types that generate both directions.
pub trait Codable: Decode + Encode {}

/// Decode a value from an already parsed document using default config.
pub fn from_value<T: Decode>(value: &Value) -> Result<T, CodingError> {
    from_value_with_config(value, CodingConfig::default())
}

pub fn from_value_with_config<T: Decode>(
    value: &Value,
    config: CodingConfig,
) -> Result<T, CodingError> {
    T::decode(&Decoder::new(value, config))
}

/// Parse a JSON string into a typed value using default config.
pub fn from_str<T: Decode>(contents: &str) -> Result<T, CodingError> {
    from_str_with_config(contents, CodingConfig::default())
}

/// Parse a JSON string into a typed value using the provided config.
pub fn from_str_with_config<T: Decode>(
    contents: &str,
    config: CodingConfig,
) -> Result<T, CodingError> {
    let document: Value = serde_json::from_str(contents)
        .map_err(|e| CodingError::data_corrupted(CodingPath::root(), e.to_string()))?;
    from_value_with_config(&document, config)
}

pub fn to_value<T: Encode + ?Sized>(value: &T) -> Result<Value, CodingError> {
    to_value_with_config(value, CodingConfig::default())
}

pub fn to_value_with_config<T: Encode + ?Sized>(
    value: &T,
    config: CodingConfig,
) -> Result<Value, CodingError> {
    let mut encoder = Encoder::new(config);
    value.encode(&mut encoder)?;
    Ok(encoder.into_value())
}

/// Encode a value as compact JSON.
pub fn to_string<T: Encode + ?Sized>(value: &T) -> Result<String, CodingError> {
    to_string_with_config(value, CodingConfig::default())
}

pub fn to_string_with_config<T: Encode + ?Sized>(
    value: &T,
    config: CodingConfig,
) -> Result<String, CodingError> {
    let document = to_value_with_config(value, config)?;
    serde_json::to_string(&document)
        .map_err(|e| CodingError::invalid_value(CodingPath::root(), e.to_string()))
}

/// Encode a value as indented JSON.
pub fn to_string_pretty<T: Encode + ?Sized>(value: &T) -> Result<String, CodingError> {
    let document = to_value(value)?;
    serde_json::to_string_pretty(&document)
        .map_err(|e| CodingError::invalid_value(CodingPath::root(), e.to_string()))
}

// Re-export the attribute macros so users only need to depend on `codable`
pub use codable_derive::{codable, coding_hooks, decodable, encodable};
