use std::collections::HashMap;
use std::fmt::{self, Display};

/// A parsed configuration value.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    /// A short name for the value's kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// Formats a float so that it always carries a fractional part (`3.0`, not `3`).
pub(crate) fn format_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    // Debug output is the shortest round-trip form and keeps the `.0`.
    write!(f, "{value:?}")
}

/// The canonical text form: what the XML emitter writes and what `concat()` joins.
impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => format_float(f, *x),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Dict(dict) => write!(f, "{dict}"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Pair {
    pub key: String,
    pub value: Value,
}

/// An insertion-ordered mapping with unique keys.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Dict {
    pairs: Vec<Pair>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`. An existing key keeps its position and gets
    /// the new value; the old value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.pairs.iter_mut().find(|pair| pair.key == key) {
            Some(pair) => Some(std::mem::replace(&mut pair.value, value)),
            None => {
                self.pairs.push(Pair { key, value });
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs
            .iter()
            .find(|pair| pair.key == key)
            .map(|pair| &pair.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Merges every pair of `other` into `self`, later keys overwriting earlier ones.
    pub fn merge(&mut self, other: Dict) {
        for pair in other.pairs {
            self.insert(pair.key, pair.value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|pair| (pair.key.as_str(), &pair.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|pair| pair.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Display for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

// --- Constant Table ---

/// Named constants defined by `set` directives, local to one translation.
#[derive(Debug, Default, Clone)]
pub struct Constants {
    values: HashMap<String, Value>,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines or shadows `name`.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
