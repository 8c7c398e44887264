//! Frontmatter value model
//!
//! Frontmatter is a flat mapping from string keys to scalar values. Values
//! are kept as a tagged union rather than raw `serde_yaml::Value` so that
//! date-typed values exist as first-class dates (the date inference and
//! backlink ordering logic depends on them) and so that wrong-shape access
//! fails with a `TypeMismatch` error instead of succeeding silently.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{Error, Result};

/// A single frontmatter value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(DateTime<FixedOffset>),
}

impl MetaValue {
    /// Shape name used in `TypeMismatch` errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            MetaValue::Null => "null",
            MetaValue::Bool(_) => "bool",
            MetaValue::Int(_) => "int",
            MetaValue::Float(_) => "float",
            MetaValue::Str(_) => "string",
            MetaValue::Date(_) => "date",
        }
    }

    /// Access as a string, failing on any other shape.
    pub fn expect_str(&self, key: &str) -> Result<&str> {
        match self {
            MetaValue::Str(s) => Ok(s),
            other => Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// Access as a date, failing on any other shape.
    pub fn expect_date(&self, key: &str) -> Result<DateTime<FixedOffset>> {
        match self {
            MetaValue::Date(d) => Ok(*d),
            other => Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: "date",
                found: other.type_name(),
            }),
        }
    }

    fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            MetaValue::Null => serde_yaml::Value::Null,
            MetaValue::Bool(b) => serde_yaml::Value::Bool(*b),
            MetaValue::Int(i) => serde_yaml::Value::Number((*i).into()),
            MetaValue::Float(f) => serde_yaml::Value::Number((*f).into()),
            MetaValue::Str(s) => serde_yaml::Value::String(s.clone()),
            MetaValue::Date(d) => serde_yaml::Value::String(d.to_rfc3339()),
        }
    }
}

/// Parse a string scalar as a timestamp.
///
/// Accepts RFC3339, `YYYY-MM-DD HH:MM:SS` and bare `YYYY-MM-DD` (the shapes
/// YAML authors actually write); the non-offset forms are taken as UTC.
pub fn parse_date_scalar(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt).fixed_offset());
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = nd.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&ndt).fixed_offset());
    }
    None
}

/// Parse a frontmatter body into a flat metadata mapping.
///
/// The YAML must deserialize to a mapping with string keys and scalar
/// values; anything nested is rejected. The `date` key's string scalar is
/// promoted to `MetaValue::Date` when it parses as a timestamp; other keys
/// keep their string shape so a title that happens to look like a date
/// survives a re-run unchanged.
pub fn parse_mapping(file: &str, text: &str) -> Result<BTreeMap<String, MetaValue>> {
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| Error::MetadataParse {
        file: file.to_string(),
        reason: e.to_string(),
    })?;

    let mapping = match value {
        serde_yaml::Value::Null => return Ok(BTreeMap::new()),
        serde_yaml::Value::Mapping(m) => m,
        _ => {
            return Err(Error::MetadataParse {
                file: file.to_string(),
                reason: "frontmatter is not a key-value mapping".to_string(),
            })
        }
    };

    let mut result = BTreeMap::new();
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            other => {
                return Err(Error::MetadataParse {
                    file: file.to_string(),
                    reason: format!("non-string frontmatter key: {:?}", other),
                })
            }
        };
        let value = scalar_value(file, &key, value)?;
        result.insert(key, value);
    }
    Ok(result)
}

fn scalar_value(file: &str, key: &str, value: serde_yaml::Value) -> Result<MetaValue> {
    match value {
        serde_yaml::Value::Null => Ok(MetaValue::Null),
        serde_yaml::Value::Bool(b) => Ok(MetaValue::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(MetaValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(MetaValue::Float(f))
            } else {
                Err(Error::MetadataParse {
                    file: file.to_string(),
                    reason: format!("key '{}' has an unrepresentable number", key),
                })
            }
        }
        serde_yaml::Value::String(s) => {
            if key == "date" {
                if let Some(d) = parse_date_scalar(&s) {
                    return Ok(MetaValue::Date(d));
                }
            }
            Ok(MetaValue::Str(s))
        }
        serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_)
        | serde_yaml::Value::Tagged(_) => Err(Error::MetadataParse {
            file: file.to_string(),
            reason: format!("key '{}' has a non-scalar value", key),
        }),
    }
}

/// Serialize a metadata mapping back to YAML text.
///
/// `BTreeMap` iteration gives sorted keys, so output is deterministic and
/// stable across runs. Dates serialize as RFC3339 strings, which
/// `parse_date_scalar` reads back to the same instant.
pub fn to_yaml_string(map: &BTreeMap<String, MetaValue>) -> String {
    let mut mapping = serde_yaml::Mapping::new();
    for (key, value) in map {
        mapping.insert(serde_yaml::Value::String(key.clone()), value.to_yaml());
    }
    serde_yaml::to_string(&serde_yaml::Value::Mapping(mapping)).unwrap_or_default()
}
