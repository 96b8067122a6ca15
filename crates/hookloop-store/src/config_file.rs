//! `.claude/hookloop.json`: a flat JSON object of dot-notation keys.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::{Map, Value};

use crate::paths::ProjectPaths;
use crate::write_atomic;

/// Read the settings object. A missing file or non-object document is empty.
pub fn read_config(path: &Path) -> anyhow::Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let val: Value =
        serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
    match val {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

pub fn write_config(path: &Path, config: &Map<String, Value>) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(config)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Look up `key` (e.g. `loop.max_iterations`), either stored flat under the
/// dotted name or nested one object per segment.
pub fn config_value(paths: &ProjectPaths, key: &str) -> Option<Value> {
    let config = read_config(&paths.config_json).ok()?;
    if let Some(v) = config.get(key) {
        return Some(v.clone());
    }
    let mut parts = key.split('.');
    let mut current = config.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current.clone())
}

/// Parse a command-line value: JSON booleans and numbers keep their type,
/// anything else is stored as a string.
pub fn parse_value(s: &str) -> Value {
    match serde_json::from_str::<Value>(s) {
        Ok(v @ (Value::Bool(_) | Value::Number(_))) => v,
        _ => Value::String(s.to_string()),
    }
}
