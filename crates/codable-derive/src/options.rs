//! Field and container option sets, and the strategies they select.

use bitflags::bitflags;

bitflags! {
    /// Per-field switches set through key attributes.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct FieldOptions: u8 {
        /// Never decoded or encoded; decode fills in the default.
        const IGNORED                = 1 << 0;
        /// Write `null` for an absent optional instead of omitting the key.
        const EXPLICIT_NIL           = 1 << 1;
        /// Emit a `const fn <field>_coding_key()` accessor.
        const GENERATE_CUSTOM_KEY    = 1 << 2;
        /// The value travels as a JSON document inside a string.
        const TRANSCODE_RAW_STRING   = 1 << 3;
        /// Any decode failure falls back to the default or `None`.
        const USE_DEFAULT_ON_FAILURE = 1 << 4;
        /// Collection elements or entries that fail to decode are dropped.
        const LOSSY                  = 1 << 5;

        const SAFE_TRANSCODE_RAW_STRING =
            Self::TRANSCODE_RAW_STRING.bits() | Self::USE_DEFAULT_ON_FAILURE.bits();
    }
}

bitflags! {
    /// Per-container switches set through the container macro arguments.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct ContainerOptions: u8 {
        /// Do not chain to the supertype's decode and encode.
        const SKIP_SUPER_CODING         = 1 << 0;
        /// Do not emit the `Codable` marker, and do not warn about
        /// conformances requested twice.
        const SKIP_PROTOCOL_CONFORMANCE = 1 << 1;
        /// Lifecycle hooks come from a `#[coding_hooks]` impl block.
        const HOOKS                     = 1 << 2;
    }
}

impl FieldOptions {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ignored" => Some(Self::IGNORED),
            "explicit_nil" => Some(Self::EXPLICIT_NIL),
            "generate_custom_key" => Some(Self::GENERATE_CUSTOM_KEY),
            "transcode_raw_string" => Some(Self::TRANSCODE_RAW_STRING),
            "use_default_on_failure" => Some(Self::USE_DEFAULT_ON_FAILURE),
            "lossy" => Some(Self::LOSSY),
            "safe_transcode_raw_string" => Some(Self::SAFE_TRANSCODE_RAW_STRING),
            _ => None,
        }
    }

    pub fn is_ignored(self) -> bool {
        self.contains(Self::IGNORED)
    }

    /// Picks how a field's value is decoded.
    ///
    /// `lossy_applies` is false when `LOSSY` is set on a type that is not a
    /// collection; the flag is then ignored. Returns `None` for combinations
    /// that cannot be generated.
    pub fn decode_strategy(self, has_transformer: bool, lossy_applies: bool) -> Option<DecodeStrategy> {
        let lossy = lossy_applies && self.contains(Self::LOSSY);
        let raw = self.contains(Self::TRANSCODE_RAW_STRING);
        match (has_transformer, lossy, raw) {
            (false, false, false) => Some(DecodeStrategy::Value),
            (true, false, false) => Some(DecodeStrategy::Transform),
            (false, true, false) => Some(DecodeStrategy::Lossy),
            (false, false, true) => Some(DecodeStrategy::RawString),
            (false, true, true) => Some(DecodeStrategy::LossyRawString),
            (true, true, _) | (true, _, true) => None,
        }
    }

    /// Picks how a field's value is encoded. Lossy is decode-only.
    pub fn encode_strategy(self, has_transformer: bool) -> Option<EncodeStrategy> {
        match (has_transformer, self.contains(Self::TRANSCODE_RAW_STRING)) {
            (false, false) => Some(EncodeStrategy::Value),
            (true, false) => Some(EncodeStrategy::Transform),
            (false, true) => Some(EncodeStrategy::RawString),
            (true, true) => None,
        }
    }

    pub fn absent_policy(self) -> AbsentPolicy {
        if self.contains(Self::EXPLICIT_NIL) {
            AbsentPolicy::WriteNil
        } else {
            AbsentPolicy::Omit
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStrategy {
    Value,
    Transform,
    Lossy,
    RawString,
    LossyRawString,
}

impl DecodeStrategy {
    pub fn uses_raw_string(self) -> bool {
        matches!(self, DecodeStrategy::RawString | DecodeStrategy::LossyRawString)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodeStrategy {
    Value,
    Transform,
    RawString,
}

impl EncodeStrategy {
    pub fn uses_raw_string(self) -> bool {
        matches!(self, EncodeStrategy::RawString)
    }
}

/// What encode writes for an absent optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsentPolicy {
    Omit,
    WriteNil,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_raw_string_is_the_union() {
        let options = FieldOptions::parse("safe_transcode_raw_string").unwrap();
        assert!(options.contains(FieldOptions::TRANSCODE_RAW_STRING));
        assert!(options.contains(FieldOptions::USE_DEFAULT_ON_FAILURE));
        assert_eq!(
            options & FieldOptions::TRANSCODE_RAW_STRING,
            FieldOptions::TRANSCODE_RAW_STRING
        );
    }

    #[test]
    fn lossy_on_non_collection_decodes_normally() {
        assert_eq!(
            FieldOptions::LOSSY.decode_strategy(false, false),
            Some(DecodeStrategy::Value)
        );
        assert_eq!(
            (FieldOptions::LOSSY | FieldOptions::TRANSCODE_RAW_STRING).decode_strategy(false, true),
            Some(DecodeStrategy::LossyRawString)
        );
    }

    #[test]
    fn transformer_rejects_lossy_and_raw_string() {
        assert_eq!(FieldOptions::LOSSY.decode_strategy(true, true), None);
        assert_eq!(
            FieldOptions::TRANSCODE_RAW_STRING.decode_strategy(true, false),
            None
        );
        assert_eq!(FieldOptions::TRANSCODE_RAW_STRING.encode_strategy(true), None);
    }

    #[test]
    fn lossy_encodes_as_a_plain_value() {
        assert_eq!(
            FieldOptions::LOSSY.encode_strategy(false),
            Some(EncodeStrategy::Value)
        );
    }
}
