use std::io::IsTerminal;

use clap::ValueEnum;
use serde_json::json;
use taskwire_codec::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Text
        } else {
            Self::Json
        }
    }
}

/// Print task outputs one per line.
pub fn print_values(values: &[Value], format: OutputFormat) {
    for value in values {
        match format {
            OutputFormat::Json => println!("{}", value_to_json(value)),
            OutputFormat::Text => println!("{}", value_to_text(value)),
        }
    }
}

/// Parse a JSON literal into the value model.
///
/// Objects become order-preserving maps with text keys; there is no JSON
/// spelling for `Symbol` or `Bytes`, which only ever originate server-side.
pub fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        serde_json::Value::Object(fields) => Value::Map(
            fields
                .iter()
                .map(|(k, v)| (Value::Text(k.clone()), value_from_json(v)))
                .collect(),
        ),
    }
}

/// Render a value as display JSON (lossy for `Symbol` and `Bytes`).
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => json!(f),
        Value::Text(s) => json!(s),
        Value::Bytes(bytes) => json!(bytes),
        Value::Symbol(s) => json!(format!(":{s}")),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(pairs) => serde_json::Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (map_key_text(k), value_to_json(v)))
                .collect(),
        ),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => value_to_json(other).to_string(),
    }
}

fn map_key_text(key: &Value) -> String {
    match key {
        Value::Text(s) => s.clone(),
        Value::Symbol(s) => format!(":{s}"),
        other => value_to_json(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip_for_plain_values() {
        let json: serde_json::Value =
            serde_json::from_str(r#"[1, "two", 3.5, null, true, {"k": [4]}]"#).unwrap();

        let value = value_from_json(&json);
        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(1),
                Value::Text("two".into()),
                Value::Float(3.5),
                Value::Null,
                Value::Bool(true),
                Value::Map(vec![(
                    Value::Text("k".into()),
                    Value::List(vec![Value::Int(4)])
                )]),
            ])
        );
        assert_eq!(value_to_json(&value), json);
    }

    #[test]
    fn symbol_renders_with_prefix() {
        assert_eq!(value_to_json(&Value::Symbol("ok".into())), json!(":ok"));
    }
}
