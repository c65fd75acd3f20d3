use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `top_n` that was sent but is not a non-negative integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTopN;

/// Reads `top_n` from a query-string value. `top_n=` counts as absent.
pub fn top_n_from_query(raw: Option<&str>) -> Result<Option<usize>, InvalidTopN> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| InvalidTopN),
    }
}

/// Reads `top_n` from a JSON body field: a number, a numeric string or null.
pub fn top_n_from_json(value: Option<&Value>) -> Result<Option<usize>, InvalidTopN> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or(InvalidTopN),
        Some(Value::String(s)) => top_n_from_query(Some(s)),
        Some(_) => Err(InvalidTopN),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub ready: bool,
    pub catalog_size: usize,
    pub vocabulary_size: Option<usize>,
}
