//! Values in a binding table.
//!
//! The sandbox reports every top-level name the learner's code bound, and
//! every probe result, as a [`Value`]. The wire form is adjacently tagged
//! JSON (`{"type": "int", "value": 5}`) so functions, classes and dicts
//! with non-string keys survive the trip. Comparison follows Python's
//! `==` closely enough for grading: ints and floats compare numerically,
//! dicts and sets ignore ordering.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A snapshot of one Python value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    /// Key/value pairs in insertion order.
    Dict(Vec<(Value, Value)>),
    Function { name: String },
    Class { name: String },
    Module { name: String },
    /// Anything else, kept as its `repr()`.
    Object { type_name: String, repr: String },
}

impl Value {
    /// Convert a plain literal (as written in a catalog) into a value.
    ///
    /// JSON objects become dicts with string keys.
    pub fn from_json(json: &serde_json::Value) -> Result<Value, CatalogError> {
        Ok(match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(CatalogError::UnsupportedValue {
                        context: "number".into(),
                        message: format!("{n} does not fit in a 64-bit integer"),
                    });
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            serde_json::Value::Object(map) => Value::Dict(
                map.iter()
                    .map(|(k, v)| Ok((Value::Str(k.clone()), Value::from_json(v)?)))
                    .collect::<Result<Vec<_>, CatalogError>>()?,
            ),
        })
    }

    /// Short type name, as Python's `type(x).__name__` would report it.
    pub fn kind_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Function { .. } => "function",
            Value::Class { .. } => "type",
            Value::Module { .. } => "module",
            Value::Object { type_name, .. } => type_name,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function { .. })
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Value::Class { .. })
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Python-style equality.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self.matches(other, None)
    }

    /// Equality with an optional absolute tolerance applied to every
    /// numeric comparison that involves a float.
    pub fn matches(&self, other: &Value, tolerance: Option<f64>) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let (Some(a), Some(b)) = (self.as_number(), other.as_number()) else {
                    return false;
                };
                match tolerance {
                    Some(t) => (a - b).abs() <= t,
                    None => a == b,
                }
            }
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y, tolerance))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.matches(y, tolerance)))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter()
                            .find(|(k2, _)| k.loosely_equals(k2))
                            .is_some_and(|(_, v2)| v.matches(v2, tolerance))
                    })
            }
            (Value::Function { name: a }, Value::Function { name: b })
            | (Value::Class { name: a }, Value::Class { name: b })
            | (Value::Module { name: a }, Value::Module { name: b }) => a == b,
            (Value::Object { repr: a, .. }, Value::Object { repr: b, .. }) => a == b,
            _ => false,
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

/// Renders the way Python's `repr()` would, for learner feedback.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write_str_repr(f, s),
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => {
                write!(f, "{{")?;
                write_seq(f, items)?;
                write!(f, "}}")
            }
            Value::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Function { name } => write!(f, "<function {name}>"),
            Value::Class { name } => write!(f, "<class '{name}'>"),
            Value::Module { name } => write!(f, "<module '{name}'>"),
            Value::Object { repr, .. } => write!(f, "{repr}"),
        }
    }
}
