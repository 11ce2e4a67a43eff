//! Input documents decoded into a closed set of shapes.

use serde_yaml::Value;

use super::error::{ExtractError, Result};

/// One decoded input value. Mapping entries keep the order of the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Map(Vec<(String, Document)>),
    Array(Vec<Document>),
    Scalar(Scalar),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i128),
    Bool(bool),
    Float(f64),
}

impl Scalar {
    /// Text handed to setters.
    ///
    /// Integers and booleans use their canonical form. Floats use the shortest
    /// representation that round-trips, so `3.0` becomes `3`.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Integer(i) => i.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Float(f) => f.to_string(),
        }
    }
}

impl Document {
    /// Decodes a YAML (or JSON) document whose root must be a mapping.
    ///
    /// An empty document decodes to an empty mapping.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_yaml::from_slice(bytes)
            .map_err(|e| ExtractError::InvalidDocument(e.to_string()))?;

        match Self::from_value(value)? {
            Document::Null => Ok(Document::Map(Vec::new())),
            map @ Document::Map(_) => Ok(map),
            other => Err(ExtractError::InvalidDocument(format!(
                "root is {}",
                other.kind()
            ))),
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Document::Scalar(number(&n)),
            Value::String(s) => Document::Scalar(Scalar::String(s)),
            Value::Sequence(items) => Document::Array(
                items
                    .into_iter()
                    .map(Self::from_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Mapping(mapping) => {
                let mut entries = Vec::with_capacity(mapping.len());
                for (key, value) in mapping {
                    entries.push((key_text(key)?, Self::from_value(value)?));
                }
                Document::Map(entries)
            }
            Value::Tagged(tagged) => Self::from_value(tagged.value)?,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Document::Map(_) => "map",
            Document::Array(_) => "array",
            Document::Scalar(_) => "scalar",
            Document::Null => "null",
        }
    }
}

fn number(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Integer(i128::from(i))
    } else if let Some(u) = n.as_u64() {
        Scalar::Integer(i128::from(u))
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Stringifies a mapping key. Only scalar keys are supported.
pub(crate) fn key_text(key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(number(&n).to_text()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => key_text(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(ExtractError::InvalidDocument(
            "mapping keys must be scalars".to_string(),
        )),
    }
}
