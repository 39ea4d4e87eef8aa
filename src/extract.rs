//! Typed field extraction from JSON responses.
//!
//! A field path is a dot-separated list of object keys. A key ending in `[]`
//! names an array whose elements are each visited by the rest of the path:
//!
//! | Path | Selects |
//! |------|---------|
//! | `public_access_enabled` | a top-level field |
//! | `account.bss` | a nested field |
//! | `regions[].name` | `name` of every element of `regions`, in order |

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ExtractionError;

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    key: String,
    each: bool,
}

impl FieldPath {
    /// Parse a path expression such as `regions[].name`.
    pub fn parse(raw: &str) -> Result<Self, ExtractionError> {
        let invalid = || ExtractionError::InvalidPath(raw.to_string());

        let segments = raw
            .split('.')
            .map(|part| {
                let (key, each) = match part.strip_suffix("[]") {
                    Some(key) => (key, true),
                    None => (part, false),
                };
                if key.is_empty() || key.contains(['[', ']']) {
                    return Err(invalid());
                }
                Ok(Segment {
                    key: key.to_string(),
                    each,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Whether the path can select more than one value.
    pub fn is_multi(&self) -> bool {
        self.segments.iter().any(|s| s.each)
    }

    /// Select every value the path points at, in document order.
    pub fn select<'a>(&self, value: &'a Value) -> Result<Vec<&'a Value>, ExtractionError> {
        let mut current = vec![value];

        for segment in &self.segments {
            let mut next = Vec::with_capacity(current.len());
            for node in current {
                let Value::Object(map) = node else {
                    return Err(self.unexpected("an object"));
                };
                let field = match map.get(&segment.key) {
                    None | Some(Value::Null) => return Err(self.missing()),
                    Some(field) => field,
                };
                if segment.each {
                    let Value::Array(items) = field else {
                        return Err(self.unexpected("an array"));
                    };
                    next.extend(items.iter());
                } else {
                    next.push(field);
                }
            }
            current = next;
        }

        Ok(current)
    }

    fn select_one<'a>(&self, value: &'a Value) -> Result<&'a Value, ExtractionError> {
        if self.is_multi() {
            return Err(self.unexpected("a single value"));
        }
        self.select(value)?
            .into_iter()
            .next()
            .ok_or_else(|| self.missing())
    }

    fn missing(&self) -> ExtractionError {
        ExtractionError::MissingField(self.raw.clone())
    }

    fn unexpected(&self, expected: &'static str) -> ExtractionError {
        ExtractionError::UnexpectedType {
            path: self.raw.clone(),
            expected,
        }
    }
}

impl FromStr for FieldPath {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Extract a list of strings, preserving response order. Duplicates are kept.
pub fn extract_strings(value: &Value, path: &str) -> Result<Vec<String>, ExtractionError> {
    let path = FieldPath::parse(path)?;
    path.select(value)?
        .into_iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| path.unexpected("a string"))
        })
        .collect()
}

/// Extract a single string.
pub fn extract_string(value: &Value, path: &str) -> Result<String, ExtractionError> {
    let path = FieldPath::parse(path)?;
    path.select_one(value)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| path.unexpected("a string"))
}

/// Extract a single boolean flag.
pub fn extract_bool(value: &Value, path: &str) -> Result<bool, ExtractionError> {
    let path = FieldPath::parse(path)?;
    path.select_one(value)?
        .as_bool()
        .ok_or_else(|| path.unexpected("a boolean"))
}
