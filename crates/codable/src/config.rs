/// Runtime knobs shared by every decoder and encoder of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingConfig {
    /// Treat an explicit `null` like an absent key when decoding optional or
    /// defaulted fields.
    pub null_is_absent: bool,
    /// Pretty-print the documents embedded in raw-string fields.
    pub pretty_raw_strings: bool,
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            null_is_absent: true,
            pretty_raw_strings: false,
        }
    }
}
