use std::fmt;

use serde_json::Value;

use crate::coding_path::CodingPath;

/// Error raised by generated decode or encode routines.
///
/// Every error carries the full key path of the value that failed, so nested
/// containers report `profile.info.name` rather than just `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct CodingError {
    pub kind: ErrorKind,
    pub path: CodingPath,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("no value associated with key '{key}'")]
    KeyNotFound { key: String },
    #[error("expected {expected} value but found null or an empty payload")]
    ValueNotFound { expected: &'static str },
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },
    #[error("value '{value}' is out of range for {target_type}")]
    OutOfRange {
        value: String,
        target_type: &'static str,
    },
    #[error("data corrupted: {message}")]
    DataCorrupted { message: String },
    #[error("invalid value: {message}")]
    InvalidValue { message: String },
    #[error("transform failed: {message}")]
    TransformFailed { message: String },
    #[error("unknown case '{case}', expected one of: {}", .expected.join(", "))]
    UnknownCase { case: String, expected: Vec<String> },
    #[error("hook failed: {message}")]
    Hook { message: String },
    #[error("{0}")]
    Custom(String),
}

impl fmt::Display for CodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "coding error: {}", self.kind)
        } else {
            write!(f, "coding error at '{}': {}", self.path, self.kind)
        }
    }
}

impl std::error::Error for CodingError {}

/// Short name of a JSON value's kind, used in mismatch messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl CodingError {
    pub fn new(kind: ErrorKind, path: CodingPath) -> Self {
        Self { kind, path }
    }

    pub fn key_not_found(path: CodingPath, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            path: path.key(key.clone()),
            kind: ErrorKind::KeyNotFound { key },
        }
    }

    pub fn value_not_found(path: CodingPath, expected: &'static str) -> Self {
        Self {
            kind: ErrorKind::ValueNotFound { expected },
            path,
        }
    }

    pub fn type_mismatch(path: CodingPath, expected: &'static str, actual: &Value) -> Self {
        Self {
            kind: ErrorKind::TypeMismatch {
                expected,
                actual: value_kind(actual).to_string(),
            },
            path,
        }
    }

    pub fn out_of_range(
        path: CodingPath,
        value: impl Into<String>,
        target_type: &'static str,
    ) -> Self {
        Self {
            kind: ErrorKind::OutOfRange {
                value: value.into(),
                target_type,
            },
            path,
        }
    }

    pub fn data_corrupted(path: CodingPath, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::DataCorrupted {
                message: message.into(),
            },
            path,
        }
    }

    pub fn invalid_value(path: CodingPath, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidValue {
                message: message.into(),
            },
            path,
        }
    }

    pub fn transform_failed(path: CodingPath, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::TransformFailed {
                message: message.into(),
            },
            path,
        }
    }

    pub fn unknown_case(path: CodingPath, case: impl Into<String>, expected: &[&str]) -> Self {
        Self {
            kind: ErrorKind::UnknownCase {
                case: case.into(),
                expected: expected.iter().map(|name| name.to_string()).collect(),
            },
            path,
        }
    }

    pub fn hook(path: CodingPath, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Hook {
                message: message.into(),
            },
            path,
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Custom(message.into()),
            path: CodingPath::root(),
        }
    }

    /// True when this error reports an absent key or an absent value.
    pub fn is_missing(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::KeyNotFound { .. } | ErrorKind::ValueNotFound { .. }
        )
    }
}
