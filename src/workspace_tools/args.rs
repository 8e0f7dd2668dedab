use serde_json::Value;

use crate::errors::EngineError;

pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, EngineError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(EngineError::validation(format!("{} must be a string, got {}", key, other))),
        None => Err(EngineError::validation(format!("{} is required", key))),
    }
}

pub fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, EngineError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(EngineError::validation(format!("{} must be a string, got {}", key, other))),
    }
}

pub fn optional_bool(args: &Value, key: &str) -> Result<Option<bool>, EngineError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(EngineError::validation(format!("{} must be a boolean, got {}", key, other))),
    }
}

/// Accepts JSON numbers and numeric strings, since models send both.
pub fn optional_usize(args: &Value, key: &str) -> Result<Option<usize>, EngineError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| EngineError::validation(format!("{} must be a non-negative integer", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| EngineError::validation(format!("{} must be a non-negative integer", key))),
        Some(other) => Err(EngineError::validation(format!("{} must be an integer, got {}", key, other))),
    }
}

/// A single string or an array of strings.
pub fn optional_str_list(args: &Value, key: &str) -> Result<Vec<String>, EngineError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| EngineError::validation(format!("{} must contain only strings", key)))
            })
            .collect(),
        Some(other) => Err(EngineError::validation(format!("{} must be a list of strings, got {}", key, other))),
    }
}
