use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use url::Url;

/// Error returned when converting an `EvValue` into a concrete attribute type.
///
/// This is designed for attribute setters and extension validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvValueCastError {
    /// Strict type mismatch for non-coercible conversions.
    #[error("type mismatch: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },
    /// Numeric value is out of the representable range of the target type.
    #[error("numeric value out of range for {target}")]
    OutOfRange { target: &'static str },
    /// String value cannot be parsed into the target type.
    #[error("failed to parse {target} from string: {value}")]
    Parse { target: &'static str, value: String },
    /// Input shape has no canonical attribute representation.
    #[error("unsupported value shape: {actual}")]
    Unsupported { actual: &'static str },
}

/// Kind tag for `EvValue`, used in cast errors and capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Integer,
    String,
    Binary,
    Uri,
    Timestamp,
}

/// A strongly-typed attribute/extension value.
///
/// This is the closed set of types an event context can carry. Arbitrary
/// JSON input is canonicalized through [`EvValue::validate`]; anything
/// outside this set (floats with fractional parts, arrays, objects, null)
/// is rejected rather than silently stringified.
#[derive(Clone, Debug, PartialEq)]
pub enum EvValue {
    Bool(bool),
    Integer(i32),
    String(String),
    Binary(Bytes),
    Uri(Url),
    Timestamp(DateTime<Utc>),
}

impl EvValue {
    /// Return the kind tag for this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            EvValue::Bool(_) => ValueKind::Bool,
            EvValue::Integer(_) => ValueKind::Integer,
            EvValue::String(_) => ValueKind::String,
            EvValue::Binary(_) => ValueKind::Binary,
            EvValue::Uri(_) => ValueKind::Uri,
            EvValue::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// Canonicalize arbitrary JSON input into an `EvValue`.
    ///
    /// Numbers must be whole and fit `i32`. Null, arrays and objects have no
    /// canonical attribute representation and fail; the caller surfaces the
    /// failure as an invalid-extension-value error.
    pub fn validate(value: Value) -> Result<EvValue, EvValueCastError> {
        match value {
            Value::Bool(b) => Ok(EvValue::Bool(b)),
            Value::Number(n) => {
                let i = n
                    .as_i64()
                    .ok_or(EvValueCastError::Unsupported { actual: "float" })?;
                i32::try_from(i)
                    .map(EvValue::Integer)
                    .map_err(|_| EvValueCastError::OutOfRange { target: "i32" })
            }
            Value::String(s) => Ok(EvValue::String(s)),
            Value::Null => Err(EvValueCastError::Unsupported { actual: "null" }),
            Value::Array(_) => Err(EvValueCastError::Unsupported { actual: "array" }),
            Value::Object(_) => Err(EvValueCastError::Unsupported { actual: "object" }),
        }
    }

    /// Canonical string form.
    ///
    /// RFC 3339 for timestamps, base64 for binary, decimal for integers.
    /// Total: every value has a string representation.
    pub fn to_string_repr(&self) -> String {
        match self {
            EvValue::Bool(b) => b.to_string(),
            EvValue::Integer(i) => i.to_string(),
            EvValue::String(s) => s.clone(),
            EvValue::Binary(b) => base64::engine::general_purpose::STANDARD.encode(b),
            EvValue::Uri(u) => u.to_string(),
            EvValue::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    /// Convert into a timestamp, parsing RFC 3339 strings.
    pub fn to_timestamp(&self) -> Result<DateTime<Utc>, EvValueCastError> {
        match self {
            EvValue::Timestamp(t) => Ok(*t),
            EvValue::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| EvValueCastError::Parse {
                    target: "timestamp",
                    value: s.clone(),
                }),
            other => Err(EvValueCastError::TypeMismatch {
                expected: ValueKind::Timestamp,
                actual: other.kind(),
            }),
        }
    }

    /// Convert into a URI, parsing strings.
    pub fn to_uri(&self) -> Result<Url, EvValueCastError> {
        match self {
            EvValue::Uri(u) => Ok(u.clone()),
            EvValue::String(s) => Url::parse(s).map_err(|_| EvValueCastError::Parse {
                target: "uri",
                value: s.clone(),
            }),
            other => Err(EvValueCastError::TypeMismatch {
                expected: ValueKind::Uri,
                actual: other.kind(),
            }),
        }
    }

    /// Convert into an integer, parsing decimal strings.
    pub fn to_integer(&self) -> Result<i32, EvValueCastError> {
        match self {
            EvValue::Integer(i) => Ok(*i),
            EvValue::String(s) => s.parse().map_err(|_| EvValueCastError::Parse {
                target: "i32",
                value: s.clone(),
            }),
            other => Err(EvValueCastError::TypeMismatch {
                expected: ValueKind::Integer,
                actual: other.kind(),
            }),
        }
    }

    /// JSON representation used by the structured format.
    ///
    /// Bool and integer keep their native JSON types; binary becomes base64,
    /// URIs and timestamps become strings.
    pub fn to_json(&self) -> Value {
        match self {
            EvValue::Bool(b) => Value::Bool(*b),
            EvValue::Integer(i) => Value::Number((*i).into()),
            EvValue::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string_repr()),
        }
    }
}

impl From<bool> for EvValue {
    fn from(v: bool) -> Self {
        EvValue::Bool(v)
    }
}

impl From<i32> for EvValue {
    fn from(v: i32) -> Self {
        EvValue::Integer(v)
    }
}

impl From<&str> for EvValue {
    fn from(v: &str) -> Self {
        EvValue::String(v.to_string())
    }
}

impl From<String> for EvValue {
    fn from(v: String) -> Self {
        EvValue::String(v)
    }
}

impl From<Bytes> for EvValue {
    fn from(v: Bytes) -> Self {
        EvValue::Binary(v)
    }
}

impl From<Url> for EvValue {
    fn from(v: Url) -> Self {
        EvValue::Uri(v)
    }
}

impl From<DateTime<Utc>> for EvValue {
    fn from(v: DateTime<Utc>) -> Self {
        EvValue::Timestamp(v)
    }
}
