use serde_json::{Number, Value};

/// Flattens a raw host cell value into its exported string form.
///
/// `None` stands for a value the host never set. Arrays (multi-selects,
/// linked records, lookups) are joined with `", "`, objects carrying a truthy
/// `name` render as that name, and everything else falls back to its natural
/// string form. Never fails.
pub fn normalize(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(normalize_item)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => normalize_item(other),
    }
}

fn normalize_item(value: &Value) -> String {
    if let Value::Object(map) = value {
        if let Some(name) = map.get("name").filter(|name| is_truthy(name)) {
            return coerce(name);
        }
    }
    coerce(value)
}

fn coerce(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        // Nested arrays keep the plain comma join of their elements
        Value::Array(items) => items.iter().map(coerce).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops the fractional part of whole numbers (3.0 -> "3")
        n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
