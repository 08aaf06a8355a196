/// A key of one keyed container level.
///
/// Generated code implements this for every key enumeration; each case maps to
/// exactly one wire key.
pub trait CodingKey: Copy + 'static {
    fn as_str(&self) -> &'static str;

    fn from_key(key: &str) -> Option<Self>;

    fn all() -> &'static [Self];
}

/// Conversion between dictionary keys and their string form on the wire.
pub trait MapKey: Sized {
    fn from_map_key(key: &str) -> Option<Self>;

    fn to_map_key(&self) -> String;
}

impl MapKey for String {
    fn from_map_key(key: &str) -> Option<Self> {
        Some(key.to_string())
    }

    fn to_map_key(&self) -> String {
        self.clone()
    }
}

impl MapKey for char {
    fn from_map_key(key: &str) -> Option<Self> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    fn to_map_key(&self) -> String {
        self.to_string()
    }
}

macro_rules! impl_parsed_map_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapKey for $ty {
                fn from_map_key(key: &str) -> Option<Self> {
                    key.parse().ok()
                }

                fn to_map_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_parsed_map_key!(bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
