use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use serde_json::{Map, Number, Value};

use crate::coding_path::PathSegment;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::CodingError;
use crate::key::MapKey;
use crate::{Decode, Encode};

impl Decode for bool {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        decoder
            .value()
            .as_bool()
            .ok_or_else(|| decoder.type_mismatch("bool"))
    }
}

impl Encode for bool {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encoder.encode_value(Value::Bool(*self));
        Ok(())
    }
}

fn integer<'v>(decoder: &Decoder<'v>, expected: &'static str) -> Result<&'v Number, CodingError> {
    match decoder.value() {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n),
        _ => Err(decoder.type_mismatch(expected)),
    }
}

macro_rules! impl_signed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
                    let n = integer(decoder, stringify!($ty))?;
                    match n.as_i64() {
                        Some(v) => <$ty>::try_from(v)
                            .map_err(|_| decoder.out_of_range(n.to_string(), stringify!($ty))),
                        None => Err(decoder.out_of_range(n.to_string(), stringify!($ty))),
                    }
                }
            }

            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
                    let wide = i64::try_from(*self).map_err(|_| {
                        CodingError::out_of_range(encoder.coding_path().clone(), self.to_string(), "i64")
                    })?;
                    encoder.encode_value(Value::from(wide));
                    Ok(())
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
                    let n = integer(decoder, stringify!($ty))?;
                    match n.as_u64() {
                        Some(v) => <$ty>::try_from(v)
                            .map_err(|_| decoder.out_of_range(n.to_string(), stringify!($ty))),
                        None => Err(decoder.out_of_range(n.to_string(), stringify!($ty))),
                    }
                }
            }

            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
                    let wide = u64::try_from(*self).map_err(|_| {
                        CodingError::out_of_range(encoder.coding_path().clone(), self.to_string(), "u64")
                    })?;
                    encoder.encode_value(Value::from(wide));
                    Ok(())
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64, i128, isize);
impl_unsigned!(u8, u16, u32, u64, u128, usize);

impl Decode for f64 {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        decoder
            .value()
            .as_f64()
            .ok_or_else(|| decoder.type_mismatch("f64"))
    }
}

impl Encode for f64 {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        let n = Number::from_f64(*self).ok_or_else(|| {
            CodingError::invalid_value(
                encoder.coding_path().clone(),
                format!("{self} cannot be represented in JSON"),
            )
        })?;
        encoder.encode_value(Value::Number(n));
        Ok(())
    }
}

impl Decode for f32 {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        let wide = f64::decode(decoder)?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(decoder.out_of_range(wide.to_string(), "f32"));
        }
        Ok(wide as f32)
    }
}

impl Encode for f32 {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        f64::from(*self).encode(encoder)
    }
}

impl Decode for String {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        decoder
            .value()
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| decoder.type_mismatch("string"))
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        self.as_str().encode(encoder)
    }
}

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encoder.encode_value(Value::String(self.to_string()));
        Ok(())
    }
}

impl Decode for char {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        let text = decoder
            .value()
            .as_str()
            .ok_or_else(|| decoder.type_mismatch("char"))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(CodingError::data_corrupted(
                decoder.coding_path().clone(),
                format!("expected a single character, found {text:?}"),
            )),
        }
    }
}

impl Encode for char {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encoder.encode_value(Value::String(self.to_string()));
        Ok(())
    }
}

impl Decode for () {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        match decoder.value() {
            Value::Null => Ok(()),
            _ => Err(decoder.type_mismatch("null")),
        }
    }
}

impl Encode for () {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encoder.encode_value(Value::Null);
        Ok(())
    }
}

impl Decode for Value {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(decoder.value().clone())
    }
}

impl Encode for Value {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encoder.encode_value(self.clone());
        Ok(())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        match decoder.value() {
            Value::Null => Ok(None),
            _ => T::decode(decoder).map(Some),
        }
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        match self {
            Some(value) => value.encode(encoder),
            None => {
                encoder.encode_value(Value::Null);
                Ok(())
            }
        }
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        T::decode(decoder).map(Box::new)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        (**self).encode(encoder)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        (**self).encode(encoder)
    }
}

fn decode_elements<T: Decode>(decoder: &Decoder<'_>) -> Result<Vec<T>, CodingError> {
    let items = match decoder.value() {
        Value::Array(items) => items,
        _ => return Err(decoder.type_mismatch("array")),
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| T::decode(&decoder.child(item, PathSegment::Index(index))))
        .collect()
}

fn encode_elements<'t, T: Encode + 't>(
    items: impl IntoIterator<Item = &'t T>,
    encoder: &mut Encoder,
) -> Result<(), CodingError> {
    let mut encoded = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let mut child = encoder.child(PathSegment::Index(index));
        item.encode(&mut child)?;
        encoded.push(child.into_value());
    }
    encoder.encode_value(Value::Array(encoded));
    Ok(())
}

fn decode_entries<K: MapKey, V: Decode>(decoder: &Decoder<'_>) -> Result<Vec<(K, V)>, CodingError> {
    let map = match decoder.value() {
        Value::Object(map) => map,
        _ => return Err(decoder.type_mismatch("object")),
    };
    map.iter()
        .map(|(raw_key, item)| {
            let entry = decoder.child(item, PathSegment::Key(raw_key.clone()));
            let key = K::from_map_key(raw_key).ok_or_else(|| {
                CodingError::data_corrupted(
                    entry.coding_path().clone(),
                    format!("cannot convert dictionary key {raw_key:?}"),
                )
            })?;
            Ok((key, V::decode(&entry)?))
        })
        .collect()
}

fn encode_entries<'t, K: MapKey + 't, V: Encode + 't>(
    entries: impl IntoIterator<Item = (&'t K, &'t V)>,
    encoder: &mut Encoder,
) -> Result<(), CodingError> {
    let mut map = Map::new();
    for (key, value) in entries {
        let key = key.to_map_key();
        let mut child = encoder.child(PathSegment::Key(key.clone()));
        value.encode(&mut child)?;
        map.insert(key, child.into_value());
    }
    encoder.encode_value(Value::Object(map));
    Ok(())
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        decode_elements(decoder)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encode_elements(self, encoder)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encode_elements(self, encoder)
    }
}

impl<T: Decode> Decode for VecDeque<T> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(decode_elements(decoder)?.into())
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encode_elements(self, encoder)
    }
}

impl<T: Decode + Eq + Hash> Decode for HashSet<T> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(decode_elements(decoder)?.into_iter().collect())
    }
}

impl<T: Encode> Encode for HashSet<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encode_elements(self, encoder)
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(decode_elements(decoder)?.into_iter().collect())
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encode_elements(self, encoder)
    }
}

impl<K: MapKey + Eq + Hash, V: Decode> Decode for HashMap<K, V> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(decode_entries(decoder)?.into_iter().collect())
    }
}

impl<K: MapKey, V: Encode> Encode for HashMap<K, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encode_entries(self, encoder)
    }
}

impl<K: MapKey + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(decode_entries(decoder)?.into_iter().collect())
    }
}

impl<K: MapKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        encode_entries(self, encoder)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{CodingConfig, ErrorKind};

    fn decode<T: Decode>(value: Value) -> Result<T, CodingError> {
        T::decode(&Decoder::new(&value, CodingConfig::default()))
    }

    fn encode<T: Encode + ?Sized>(value: &T) -> Value {
        let mut encoder = Encoder::new(CodingConfig::default());
        value.encode(&mut encoder).unwrap();
        encoder.into_value()
    }

    #[test]
    fn integers_check_range() {
        assert_eq!(decode::<u8>(json!(255)).unwrap(), 255);
        let err = decode::<u8>(json!(256)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OutOfRange { .. }));
        let err = decode::<u32>(json!(-1)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OutOfRange { .. }));
    }

    #[test]
    fn floats_do_not_decode_as_integers() {
        let err = decode::<i64>(json!(1.5)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
        assert_eq!(decode::<f64>(json!(2)).unwrap(), 2.0);
    }

    #[test]
    fn element_errors_carry_their_index() {
        let err = decode::<Vec<String>>(json!(["a", "b", 3])).unwrap_err();
        assert_eq!(err.path.to_string(), "[2]");
    }

    #[test]
    fn maps_use_string_keys_on_the_wire() {
        let mut map = BTreeMap::new();
        map.insert(2u32, "two".to_string());
        map.insert(10u32, "ten".to_string());
        assert_eq!(encode(&map), json!({"2": "two", "10": "ten"}));
        let back: BTreeMap<u32, String> = decode(json!({"2": "two", "10": "ten"})).unwrap();
        assert_eq!(back, map);
        assert!(decode::<BTreeMap<u32, String>>(json!({"x": "y"})).is_err());
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(decode::<Option<i64>>(json!(null)).unwrap(), None);
        assert_eq!(encode(&None::<i64>), Value::Null);
        assert_eq!(encode(&Some(3i64)), json!(3));
    }

    #[test]
    fn non_finite_floats_fail_to_encode() {
        let mut encoder = Encoder::new(CodingConfig::default());
        let err = f64::NAN.encode(&mut encoder).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidValue { .. }));
    }
}
