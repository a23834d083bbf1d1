use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use taskwire_codec::Value;

use crate::error::ServerError;

/// Errors raised while evaluating a task closure.
///
/// Fatal to the connection, exactly like malformed closure bytes: the
/// connection drops without output and nothing is signaled on the wire.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// `main` referenced a name `setup` never bound.
    #[error("name {0:?} is not bound in the task environment")]
    UnboundName(String),

    /// An operation was applied to a value of the wrong shape.
    #[error("{op} expects {expected}, got {got}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        got: &'static str,
    },
}

/// The opaque two-part computational unit carried in the closure frame.
///
/// The wire representation is a bincode blob; the worker only decodes and
/// invokes it. `setup` establishes the captured environment once, then
/// `main` runs as an ordered pipeline over `(split_index, inputs)`.
///
/// The operation vocabulary is deliberately fixed and declarative; no
/// executable code crosses the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskClosure {
    /// Named environment bindings, evaluated once before `main`.
    /// A later binding of the same name overwrites the earlier one.
    pub setup: Vec<(String, Value)>,
    /// The pipeline invoked with the split index and the input sequence.
    pub main: Vec<TaskOp>,
}

/// One stage of a task pipeline. Stages apply in order to the value stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskOp {
    /// Append literal values to the stream.
    Emit(Vec<Value>),
    /// Append the elements of the list bound to this name during setup.
    LoadEnv(String),
    /// Append the split index as an integer value.
    PushSplitIndex,
    /// Transform every value in the stream.
    Map(Transform),
    /// Keep only values satisfying the predicate.
    Filter(Predicate),
    /// Keep at most the first `n` values.
    Take(u64),
    /// Collapse the stream of integers into its sum.
    Sum,
    /// Collapse the stream into its length.
    Count,
}

/// Per-value transformation used by [`TaskOp::Map`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    AddInt(i64),
    MulInt(i64),
    /// Add the integer bound to this name during setup.
    AddEnvInt(String),
    Uppercase,
}

/// Per-value predicate used by [`TaskOp::Filter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    NonNull,
    IsInt,
    IntGreaterThan(i64),
    Equals(Value),
}

impl TaskClosure {
    /// A closure with an empty environment.
    pub fn new(main: Vec<TaskOp>) -> Self {
        Self { setup: Vec::new(), main }
    }

    /// A closure with environment bindings.
    pub fn with_setup(setup: Vec<(String, Value)>, main: Vec<TaskOp>) -> Self {
        Self { setup, main }
    }

    /// The simplest useful closure: ignore the inputs' absence and emit
    /// literal values.
    pub fn emit(values: Vec<Value>) -> Self {
        Self::new(vec![TaskOp::Emit(values)])
    }

    /// Encode to the wire blob format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ServerError> {
        bincode::serialize(self).map_err(ServerError::MalformedClosure)
    }

    /// Decode from the wire blob format. Failure is fatal to the connection.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ServerError> {
        bincode::deserialize(bytes).map_err(ServerError::MalformedClosure)
    }

    /// Evaluate setup once, then run `main` over the input sequence.
    ///
    /// Returns the ordered output sequence.
    pub fn invoke(&self, split_index: i32, inputs: Vec<Value>) -> Result<Vec<Value>, TaskError> {
        let mut env: HashMap<&str, &Value> = HashMap::new();
        for (name, value) in &self.setup {
            env.insert(name.as_str(), value);
        }

        let mut stream = inputs;
        for op in &self.main {
            stream = apply_op(op, &env, split_index, stream)?;
        }
        Ok(stream)
    }
}

fn apply_op(
    op: &TaskOp,
    env: &HashMap<&str, &Value>,
    split_index: i32,
    mut stream: Vec<Value>,
) -> Result<Vec<Value>, TaskError> {
    match op {
        TaskOp::Emit(values) => {
            stream.extend(values.iter().cloned());
            Ok(stream)
        }
        TaskOp::LoadEnv(name) => {
            let bound = lookup(env, name)?;
            match bound {
                Value::List(items) => {
                    stream.extend(items.iter().cloned());
                    Ok(stream)
                }
                other => Err(TaskError::TypeMismatch {
                    op: "LoadEnv",
                    expected: "a list binding",
                    got: kind_name(other),
                }),
            }
        }
        TaskOp::PushSplitIndex => {
            stream.push(Value::Int(i64::from(split_index)));
            Ok(stream)
        }
        TaskOp::Map(transform) => stream
            .into_iter()
            .map(|v| apply_transform(transform, env, v))
            .collect(),
        TaskOp::Filter(predicate) => Ok(stream
            .into_iter()
            .filter(|v| matches_predicate(predicate, v))
            .collect()),
        TaskOp::Take(n) => {
            stream.truncate(usize::try_from(*n).unwrap_or(usize::MAX));
            Ok(stream)
        }
        TaskOp::Sum => {
            let mut total = 0i64;
            for value in &stream {
                let v = value.as_int().ok_or(TaskError::TypeMismatch {
                    op: "Sum",
                    expected: "integers",
                    got: kind_name(value),
                })?;
                total = total.saturating_add(v);
            }
            Ok(vec![Value::Int(total)])
        }
        TaskOp::Count => Ok(vec![Value::Int(stream.len() as i64)]),
    }
}

fn apply_transform(
    transform: &Transform,
    env: &HashMap<&str, &Value>,
    value: Value,
) -> Result<Value, TaskError> {
    match transform {
        Transform::AddInt(k) => int_transform("AddInt", value, |v| v.saturating_add(*k)),
        Transform::MulInt(k) => int_transform("MulInt", value, |v| v.saturating_mul(*k)),
        Transform::AddEnvInt(name) => {
            let bound = lookup(env, name)?;
            let k = bound.as_int().ok_or(TaskError::TypeMismatch {
                op: "AddEnvInt",
                expected: "an integer binding",
                got: kind_name(bound),
            })?;
            int_transform("AddEnvInt", value, |v| v.saturating_add(k))
        }
        Transform::Uppercase => match value {
            Value::Text(text) => Ok(Value::Text(text.to_uppercase())),
            other => Err(TaskError::TypeMismatch {
                op: "Uppercase",
                expected: "text",
                got: kind_name(&other),
            }),
        },
    }
}

fn int_transform(
    op: &'static str,
    value: Value,
    f: impl FnOnce(i64) -> i64,
) -> Result<Value, TaskError> {
    match value {
        Value::Int(v) => Ok(Value::Int(f(v))),
        other => Err(TaskError::TypeMismatch {
            op,
            expected: "an integer",
            got: kind_name(&other),
        }),
    }
}

fn matches_predicate(predicate: &Predicate, value: &Value) -> bool {
    match predicate {
        Predicate::NonNull => !matches!(value, Value::Null),
        Predicate::IsInt => matches!(value, Value::Int(_)),
        Predicate::IntGreaterThan(k) => matches!(value, Value::Int(v) if v > k),
        Predicate::Equals(expected) => value == expected,
    }
}

fn lookup<'e>(env: &HashMap<&str, &'e Value>, name: &str) -> Result<&'e Value, TaskError> {
    env.get(name)
        .copied()
        .ok_or_else(|| TaskError::UnboundName(name.to_string()))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Bytes(_) => "bytes",
        Value::Symbol(_) => "symbol",
        Value::List(_) => "list",
        Value::Map(_) => "map",
    }
}
