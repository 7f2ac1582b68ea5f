//! Typed attribute values.
//!
//! Attribute carriers exchange values through a small closed value enum.
//! Type conformance (value matches the spec's declared type) is the only
//! validation this crate performs; range checks, color formats and similar
//! deep rules belong to the layers above.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger_error::NetLedgerError;

/// The four attribute value types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    Bool,
    Int,
    Float,
    Text,
}

impl AttrType {
    /// Parses `input` into a value of this type.
    ///
    /// Booleans accept `true`/`false`/`1`/`0`. Numbers use standard Rust
    /// syntax. `Text` never fails.
    ///
    /// # Errors
    ///
    /// [`NetLedgerError::AttributeParse`] when `input` does not read as this
    /// type.
    pub fn parse(self, input: &str) -> Result<AttrValue, NetLedgerError> {
        let fail = || NetLedgerError::AttributeParse {
            expected: self,
            input: input.to_owned(),
        };
        match self {
            AttrType::Bool => match input {
                "true" | "1" => Ok(AttrValue::Bool(true)),
                "false" | "0" => Ok(AttrValue::Bool(false)),
                _ => Err(fail()),
            },
            AttrType::Int => input.parse::<i64>().map(AttrValue::Int).map_err(|_| fail()),
            AttrType::Float => input
                .parse::<f64>()
                .map(AttrValue::Float)
                .map_err(|_| fail()),
            AttrType::Text => Ok(AttrValue::Text(input.to_owned())),
        }
    }

    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            AttrType::Bool => "bool",
            AttrType::Int => "int",
            AttrType::Float => "float",
            AttrType::Text => "text",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// The type this value inhabits.
    #[inline]
    pub const fn type_of(&self) -> AttrType {
        match self {
            AttrValue::Bool(_) => AttrType::Bool,
            AttrValue::Int(_) => AttrType::Int,
            AttrValue::Float(_) => AttrType::Float,
            AttrValue::Text(_) => AttrType::Text,
        }
    }
}

/// Display renders the bare value, the way it would appear in a dialog field.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}
impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}
impl From<f64> for AttrValue {
    fn from(x: f64) -> Self {
        AttrValue::Float(x)
    }
}
impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_owned())
    }
}
impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
