//! Enum types for codable attribute configuration.
//!
//! These types are parsed from attribute paths and string values by the helper
//! functions in `parse.rs`.

use syn::Path;

/// Rename strategy for fields and enum cases without a custom key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RenameStrategy {
    #[default]
    None,
    KebabCase,
    SnakeCase,
    ScreamingSnakeCase,
    CamelCase,
    PascalCase,
    Lowercase,
    Uppercase,
}

impl RenameStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kebab-case" => Some(RenameStrategy::KebabCase),
            "snake_case" => Some(RenameStrategy::SnakeCase),
            "SCREAMING_SNAKE_CASE" => Some(RenameStrategy::ScreamingSnakeCase),
            "camelCase" => Some(RenameStrategy::CamelCase),
            "PascalCase" => Some(RenameStrategy::PascalCase),
            "lowercase" => Some(RenameStrategy::Lowercase),
            "UPPERCASE" => Some(RenameStrategy::Uppercase),
            "none" => Some(RenameStrategy::None),
            _ => None,
        }
    }

    pub fn apply(&self, name: &str) -> String {
        let name = name.strip_prefix("r#").unwrap_or(name);
        match self {
            RenameStrategy::None => name.to_string(),
            RenameStrategy::KebabCase => words(name).join("-"),
            RenameStrategy::SnakeCase => words(name).join("_"),
            RenameStrategy::ScreamingSnakeCase => words(name).join("_").to_uppercase(),
            RenameStrategy::CamelCase => {
                let pascal = to_pascal_case(name);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => pascal,
                }
            }
            RenameStrategy::PascalCase => to_pascal_case(name),
            RenameStrategy::Lowercase => name.to_lowercase(),
            RenameStrategy::Uppercase => name.to_uppercase(),
        }
    }
}

/// Splits an identifier into lowercase words on `_`, `-` and case boundaries.
fn words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in s.chars() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            current.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn to_pascal_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// Family of a field-level key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyFamily {
    /// `#[coding_key]`, both directions.
    Coding,
    /// `#[decoding_key]`
    Decoding,
    /// `#[encoding_key]`
    Encoding,
}

impl KeyFamily {
    pub const ALL: [KeyFamily; 3] = [KeyFamily::Coding, KeyFamily::Decoding, KeyFamily::Encoding];

    pub fn attr_name(self) -> &'static str {
        match self {
            KeyFamily::Coding => "coding_key",
            KeyFamily::Decoding => "decoding_key",
            KeyFamily::Encoding => "encoding_key",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|family| path.is_ident(family.attr_name()))
    }

    pub fn applies_to(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (KeyFamily::Coding, _)
                | (KeyFamily::Decoding, Direction::Decode)
                | (KeyFamily::Encoding, Direction::Encode)
        )
    }
}

/// Which container macro requested generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroFamily {
    Codable,
    Decodable,
    Encodable,
}

impl MacroFamily {
    pub const ALL: [MacroFamily; 3] = [
        MacroFamily::Codable,
        MacroFamily::Decodable,
        MacroFamily::Encodable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MacroFamily::Codable => "codable",
            MacroFamily::Decodable => "decodable",
            MacroFamily::Encodable => "encodable",
        }
    }

    /// Matches `#[codable]` as well as `#[codable::codable]`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let last = path.segments.last()?;
        Self::ALL.into_iter().find(|family| last.ident == family.name())
    }

    pub fn directions(self) -> Directions {
        match self {
            MacroFamily::Codable => Directions {
                decode: true,
                encode: true,
            },
            MacroFamily::Decodable => Directions {
                decode: true,
                encode: false,
            },
            MacroFamily::Encodable => Directions {
                decode: false,
                encode: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Decode,
    Encode,
}

/// The directions one container generates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directions {
    pub decode: bool,
    pub encode: bool,
}

impl Directions {
    pub fn union(self, other: Directions) -> Directions {
        Directions {
            decode: self.decode || other.decode,
            encode: self.encode || other.encode,
        }
    }

    pub fn contains(self, other: Directions) -> bool {
        (self.decode || !other.decode) && (self.encode || !other.encode)
    }

    pub fn both(self) -> bool {
        self.decode && self.encode
    }
}

#[cfg(test)]
mod tests {
    use super::RenameStrategy;

    #[test]
    fn rename_strategy_kebab() {
        assert_eq!(
            RenameStrategy::KebabCase.apply("myFieldName"),
            "my-field-name"
        );
        assert_eq!(
            RenameStrategy::KebabCase.apply("my_field_name"),
            "my-field-name"
        );
    }

    #[test]
    fn rename_strategy_snake() {
        assert_eq!(
            RenameStrategy::SnakeCase.apply("myFieldName"),
            "my_field_name"
        );
        assert_eq!(
            RenameStrategy::ScreamingSnakeCase.apply("user_id"),
            "USER_ID"
        );
    }

    #[test]
    fn rename_strategy_camel_and_pascal() {
        assert_eq!(RenameStrategy::CamelCase.apply("first_name"), "firstName");
        assert_eq!(RenameStrategy::PascalCase.apply("first_name"), "FirstName");
        assert_eq!(RenameStrategy::CamelCase.apply("Circle"), "circle");
    }

    #[test]
    fn raw_identifiers_lose_their_prefix() {
        assert_eq!(RenameStrategy::None.apply("r#type"), "type");
    }
}
