//! Configuration model and named-value loading.
//!
//! Named values can be supplied from a JSON document instead of being
//! registered one by one. Nested objects are flattened into keys joined by
//! the configured separator, so `{"db": {"url": "..."}}` yields `db.url`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WiringError};
use crate::types::Instance;

/// Root configuration for a wiring container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    /// JSON file whose leaves are registered as named values.
    pub values_file: Option<PathBuf>,
    /// Separator used when flattening nested keys.
    pub value_separator: String,
}

impl Default for WeftConfig {
    fn default() -> Self {
        Self {
            values_file: None,
            value_separator: crate::constants::DEFAULT_VALUE_SEPARATOR.to_string(),
        }
    }
}

impl WeftConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = read(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A named value decoded from JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Registered as `String`.
    Str(String),
    /// Registered as `i64`.
    Int(i64),
    /// Registered as `f64`.
    Float(f64),
    /// Registered as `bool`.
    Bool(bool),
    /// Arrays and nulls, registered as `serde_json::Value`.
    Json(serde_json::Value),
}

impl ConfigValue {
    /// Converts the value into a shareable instance of its Rust type.
    #[must_use]
    pub fn into_instance(self) -> Instance {
        match self {
            Self::Str(s) => Arc::new(s),
            Self::Int(i) => Arc::new(i),
            Self::Float(x) => Arc::new(x),
            Self::Bool(b) => Arc::new(b),
            Self::Json(v) => Arc::new(v),
        }
    }
}

/// Flattens a JSON object into named values.
///
/// # Errors
///
/// Returns an error if the document root is not an object, the separator
/// is empty, or two paths flatten to the same key.
pub fn flatten_values(
    document: &serde_json::Value,
    separator: &str,
) -> Result<BTreeMap<String, ConfigValue>> {
    if separator.is_empty() {
        return Err(WiringError::Config {
            message: "value separator must not be empty".into(),
        });
    }
    let serde_json::Value::Object(root) = document else {
        return Err(WiringError::Config {
            message: "named values document must be a JSON object".into(),
        });
    };

    let mut out = BTreeMap::new();
    for (key, value) in root {
        flatten_into(&mut out, key.clone(), value, separator)?;
    }
    Ok(out)
}

fn flatten_into(
    out: &mut BTreeMap<String, ConfigValue>,
    key: String,
    value: &serde_json::Value,
    separator: &str,
) -> Result<()> {
    use serde_json::Value;

    let leaf = match value {
        Value::Object(map) => {
            for (child, nested) in map {
                flatten_into(out, format!("{key}{separator}{child}"), nested, separator)?;
            }
            return Ok(());
        }
        Value::String(s) => ConfigValue::Str(s.clone()),
        Value::Bool(b) => ConfigValue::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(ConfigValue::Int)
            .or_else(|| n.as_f64().map(ConfigValue::Float))
            .unwrap_or_else(|| ConfigValue::Json(value.clone())),
        Value::Array(_) | Value::Null => ConfigValue::Json(value.clone()),
    };
    if out.contains_key(&key) {
        return Err(WiringError::AmbiguousValueName { name: key });
    }
    let _ = out.insert(key, leaf);
    Ok(())
}

/// Reads and flattens a JSON file of named values.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or its root is
/// not an object.
pub fn load_values(path: &Path, separator: &str) -> Result<BTreeMap<String, ConfigValue>> {
    tracing::info!(path = %path.display(), "loading named values");
    let content = read(path)?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    flatten_values(&document, separator)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| WiringError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn flatten_nested_objects_into_dotted_keys() {
        let doc = serde_json::json!({
            "db": { "url": "postgres://localhost", "pool": { "size": 8 } },
            "debug": true,
            "ratio": 0.5,
            "tags": ["a", "b"],
        });
        let values = flatten_values(&doc, ".").expect("flatten");
        assert_eq!(
            values.get("db.url"),
            Some(&ConfigValue::Str("postgres://localhost".into()))
        );
        assert_eq!(values.get("db.pool.size"), Some(&ConfigValue::Int(8)));
        assert_eq!(values.get("debug"), Some(&ConfigValue::Bool(true)));
        assert_eq!(values.get("ratio"), Some(&ConfigValue::Float(0.5)));
        assert!(matches!(values.get("tags"), Some(ConfigValue::Json(_))));
        assert!(!values.contains_key("db"));
    }

    #[test]
    fn flatten_uses_custom_separator() {
        let doc = serde_json::json!({ "a": { "b": "c" } });
        let values = flatten_values(&doc, "/").expect("flatten");
        assert!(values.contains_key("a/b"));
    }

    #[test]
    fn flatten_rejects_colliding_keys() {
        let doc = serde_json::json!({ "db.url": "flat", "db": { "url": "nested" } });
        let err = flatten_values(&doc, ".").unwrap_err();
        assert!(
            matches!(err, WiringError::AmbiguousValueName { ref name } if name == "db.url"),
            "got: {err}"
        );
    }

    #[test]
    fn flatten_rejects_non_object_root() {
        let err = flatten_values(&serde_json::json!([1, 2]), ".").unwrap_err();
        assert!(err.to_string().contains("JSON object"), "got: {err}");
    }

    #[test]
    fn flatten_rejects_empty_separator() {
        let err = flatten_values(&serde_json::json!({}), "").unwrap_err();
        assert!(err.to_string().contains("separator"), "got: {err}");
    }

    #[test]
    fn config_value_becomes_typed_instance() {
        let instance = ConfigValue::Str("x".into()).into_instance();
        assert_eq!(
            instance.downcast::<String>().ok().as_deref(),
            Some(&"x".to_string())
        );
        let instance = ConfigValue::Int(3).into_instance();
        assert!(instance.downcast::<i64>().is_ok());
    }

    #[test]
    fn load_values_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"service": {{"name": "billing"}}}}"#).expect("write");
        let values = load_values(file.path(), ".").expect("load");
        assert_eq!(
            values.get("service.name"),
            Some(&ConfigValue::Str("billing".into()))
        );
    }

    #[test]
    fn load_values_missing_file_is_io_error() {
        let err = load_values(Path::new("/nonexistent/weft/values.json"), ".").unwrap_err();
        assert!(matches!(err, WiringError::Io { .. }));
    }

    #[test]
    fn config_defaults_and_partial_json() {
        let config: WeftConfig =
            serde_json::from_str(r#"{"values_file": "values.json"}"#).expect("parse");
        assert_eq!(config.values_file, Some(PathBuf::from("values.json")));
        assert_eq!(config.value_separator, ".");
        assert_eq!(WeftConfig::default().values_file, None);
    }
}
