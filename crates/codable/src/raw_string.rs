use serde_json::Value;

use crate::coding_path::CodingPath;
use crate::config::CodingConfig;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::CodingError;
use crate::lossy::LossyDecode;
use crate::{Decode, Encode};

/// Decodes values that travel as a JSON document inside a string.
///
/// Generated code creates one instance per decode routine and shares it across
/// every raw-string field of that routine.
#[derive(Debug, Default)]
pub struct RawStringDecoder {
    _private: (),
}

impl RawStringDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Ok(None)` for an empty string so callers can apply their
    /// default or report a missing value.
    pub fn decode<T: Decode>(&self, raw: &str, at: &Decoder<'_>) -> Result<Option<T>, CodingError> {
        if raw.is_empty() {
            return Ok(None);
        }
        let payload: Value = serde_json::from_slice(raw.as_bytes())
            .map_err(|err| CodingError::data_corrupted(at.coding_path().clone(), err.to_string()))?;
        tracing::trace!(path = %at.coding_path(), "decoding raw-string payload");
        let decoder = Decoder::with_path(&payload, at.coding_path().clone(), at.config());
        T::decode(&decoder).map(Some)
    }

    /// Lossy variant: a malformed payload is treated like an empty one.
    pub fn decode_lossy<C: LossyDecode>(
        &self,
        raw: &str,
        at: &Decoder<'_>,
    ) -> Result<Option<C>, CodingError> {
        if raw.is_empty() {
            return Ok(None);
        }
        let payload: Value = match serde_json::from_slice(raw.as_bytes()) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(path = %at.coding_path(), error = %err, "raw-string payload is malformed");
                return Ok(None);
            }
        };
        let decoder = Decoder::with_path(&payload, at.coding_path().clone(), at.config());
        C::decode_lossy(&decoder).map(Some)
    }
}

/// Encodes values as a JSON document inside a string.
#[derive(Debug, Default)]
pub struct RawStringEncoder {
    _private: (),
}

impl RawStringEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode<T: Encode + ?Sized>(
        &self,
        value: &T,
        path: CodingPath,
        config: CodingConfig,
    ) -> Result<String, CodingError> {
        let mut encoder = Encoder::with_path(path.clone(), config);
        value.encode(&mut encoder)?;
        let payload = encoder.into_value();
        let bytes = if config.pretty_raw_strings {
            serde_json::to_vec_pretty(&payload)
        } else {
            serde_json::to_vec(&payload)
        }
        .map_err(|err| CodingError::invalid_value(path.clone(), err.to_string()))?;
        tracing::trace!(path = %path, len = bytes.len(), "encoded raw-string payload");
        String::from_utf8(bytes).map_err(|err| {
            CodingError::invalid_value(path, format!("raw-string payload is not UTF-8: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_payload_is_absent() {
        let value = json!("");
        let at = Decoder::new(&value, CodingConfig::default());
        let decoded: Option<i64> = RawStringDecoder::new().decode("", &at).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn malformed_payload_is_corrupted_data() {
        let value = json!("{");
        let at = Decoder::new(&value, CodingConfig::default());
        let err = RawStringDecoder::new().decode::<Vec<i64>>("{", &at).unwrap_err();
        assert!(matches!(err.kind, crate::ErrorKind::DataCorrupted { .. }));
    }

    #[test]
    fn encodes_compact_json() {
        let raw = RawStringEncoder::new()
            .encode(&vec![1i64, 2, 3], CodingPath::root(), CodingConfig::default())
            .unwrap();
        assert_eq!(raw, "[1,2,3]");
    }
}
