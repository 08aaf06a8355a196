use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::ops::{Deref, DerefMut};

use serde_json::Value;

use crate::coding_path::PathSegment;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::CodingError;
use crate::key::MapKey;
use crate::{Decode, Encode};

/// Collections that can decode while skipping elements that fail.
///
/// The collection itself must still have the right shape: a non-array value
/// for a sequence (or a non-object value for a dictionary) is an error.
pub trait LossyDecode: Sized {
    fn decode_lossy(decoder: &Decoder<'_>) -> Result<Self, CodingError>;
}

/// Wrapper that decodes its collection lossily and encodes it normally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lossy<C>(pub C);

impl<C> Lossy<C> {
    pub fn into_inner(self) -> C {
        self.0
    }
}

impl<C> Deref for Lossy<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C> DerefMut for Lossy<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C: LossyDecode> Decode for Lossy<C> {
    fn decode(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        C::decode_lossy(decoder).map(Lossy)
    }
}

impl<C: Encode> Encode for Lossy<C> {
    fn encode(&self, encoder: &mut Encoder) -> Result<(), CodingError> {
        self.0.encode(encoder)
    }
}

fn lossy_elements<T: Decode>(decoder: &Decoder<'_>) -> Result<Vec<T>, CodingError> {
    let items = match decoder.value() {
        Value::Array(items) => items,
        _ => return Err(decoder.type_mismatch("array")),
    };
    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let element = decoder.child(item, PathSegment::Index(index));
        match T::decode(&element) {
            Ok(value) => decoded.push(value),
            Err(err) => {
                tracing::debug!(path = %err.path, error = %err.kind, "dropping element that failed to decode");
            }
        }
    }
    Ok(decoded)
}

fn lossy_entries<K: MapKey, V: Decode>(decoder: &Decoder<'_>) -> Result<Vec<(K, V)>, CodingError> {
    let map = match decoder.value() {
        Value::Object(map) => map,
        _ => return Err(decoder.type_mismatch("object")),
    };
    let mut decoded = Vec::with_capacity(map.len());
    for (raw_key, item) in map {
        let Some(key) = K::from_map_key(raw_key) else {
            tracing::debug!(path = %decoder.coding_path(), key = %raw_key, "dropping entry with unconvertible key");
            continue;
        };
        let entry = decoder.child(item, PathSegment::Key(raw_key.clone()));
        match V::decode(&entry) {
            Ok(value) => decoded.push((key, value)),
            Err(err) => {
                tracing::debug!(path = %err.path, error = %err.kind, "dropping entry that failed to decode");
            }
        }
    }
    Ok(decoded)
}

impl<T: Decode> LossyDecode for Vec<T> {
    fn decode_lossy(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(lossy_elements(decoder)?.into_iter().collect())
    }
}

impl<T: Decode> LossyDecode for VecDeque<T> {
    fn decode_lossy(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(lossy_elements(decoder)?.into_iter().collect())
    }
}

impl<T: Decode + Eq + Hash> LossyDecode for HashSet<T> {
    fn decode_lossy(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(lossy_elements(decoder)?.into_iter().collect())
    }
}

impl<T: Decode + Ord> LossyDecode for BTreeSet<T> {
    fn decode_lossy(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(lossy_elements(decoder)?.into_iter().collect())
    }
}

impl<K: MapKey + Eq + Hash, V: Decode> LossyDecode for HashMap<K, V> {
    fn decode_lossy(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(lossy_entries(decoder)?.into_iter().collect())
    }
}

impl<K: MapKey + Ord, V: Decode> LossyDecode for BTreeMap<K, V> {
    fn decode_lossy(decoder: &Decoder<'_>) -> Result<Self, CodingError> {
        Ok(lossy_entries(decoder)?.into_iter().collect())
    }
}
