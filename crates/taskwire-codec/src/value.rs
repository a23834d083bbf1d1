use serde::{Deserialize, Serialize};

/// The self-describing value model task payloads are expressed in.
///
/// Covers the scalar and symbolic atoms plus the composite containers the
/// base codec must round-trip byte-exactly: ordered sequences and
/// order-preserving, key-unique mappings, nested to any depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// A symbolic atom, distinct from ordinary text.
    Symbol(String),
    List(Vec<Value>),
    /// Key-unique mapping. Pairs preserve insertion order; key uniqueness is
    /// the producer's contract and is preserved, not enforced, here.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Convenience constructor for a list of integers.
    pub fn ints(values: impl IntoIterator<Item = i64>) -> Self {
        Value::List(values.into_iter().map(Value::Int).collect())
    }

    /// The contained integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The contained list, if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
