//! Project configuration tree (`package.json`).
//!
//! Every lookup is defaulted: a missing key yields the default, a key whose
//! JSON type differs from the default's type is a [`TaskError::ConfigType`].
//! Mapping order is the order of the file.

use crate::error::{TaskError, TaskWarning};
use crate::task::Reporter;
use crate::Settings;
use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// An immutable node of the project config.
#[derive(Debug, Clone, Default)]
pub struct ConfigNode {
    value: Map<String, Value>,
    path: Vec<String>,
}

/// Types that can be read out of a [`ConfigNode`].
pub trait ConfigValue: Sized {
    /// Name used in type-mismatch messages.
    const TYPE_NAME: &'static str;

    fn from_json(value: &Value, path: &[String]) -> Option<Self>;
}

impl ConfigValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_json(value: &Value, _path: &[String]) -> Option<Self> {
        value.as_str().map(String::from)
    }
}

impl ConfigValue for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_json(value: &Value, _path: &[String]) -> Option<Self> {
        value.as_bool()
    }
}

impl ConfigValue for f64 {
    const TYPE_NAME: &'static str = "number";

    fn from_json(value: &Value, _path: &[String]) -> Option<Self> {
        value.as_f64()
    }
}

impl ConfigValue for Vec<String> {
    const TYPE_NAME: &'static str = "list of strings";

    fn from_json(value: &Value, _path: &[String]) -> Option<Self> {
        value
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(String::from))
            .collect()
    }
}

impl ConfigValue for ConfigNode {
    const TYPE_NAME: &'static str = "mapping";

    fn from_json(value: &Value, path: &[String]) -> Option<Self> {
        value.as_object().map(|map| ConfigNode {
            value: map.clone(),
            path: path.to_vec(),
        })
    }
}

impl ConfigNode {
    /// Build the root node. Fails unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                value: map,
                path: Vec::new(),
            }),
            _ => None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Typed, defaulted lookup.
    pub fn get<T: ConfigValue>(&self, key: &str, default: T) -> Result<T, TaskError> {
        let mut path = self.path.clone();
        path.push(key.to_string());
        match self.value.get(key) {
            None => Ok(default),
            Some(v) => T::from_json(v, &path).ok_or_else(|| TaskError::ConfigType {
                path: path.join("."),
                expected: T::TYPE_NAME,
            }),
        }
    }

    /// Nested mapping, empty when absent.
    pub fn node(&self, key: &str) -> Result<ConfigNode, TaskError> {
        let mut empty = ConfigNode::empty();
        empty.path = self.path.clone();
        empty.path.push(key.to_string());
        self.get(key, empty)
    }

    /// `(key, string value)` pairs in file order.
    pub fn items(&self) -> Result<Vec<(String, String)>, TaskError> {
        self.value
            .keys()
            .map(|k| Ok((k.clone(), self.get(k, String::new())?)))
            .collect()
    }
}

/// Load the project config as a reported task.
///
/// A missing file is a warning and yields an empty config; a malformed one is
/// fatal.
pub fn load_config(settings: &Settings, reporter: &Reporter) -> Result<ConfigNode> {
    let path = settings.config_path();
    let file = settings.config_file.clone();
    let loaded = reporter.task(&format!("Loading config from {}", file), || {
        if !path.exists() {
            return Err(TaskWarning(format!("Missing {} config file.", file)).into());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Read {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|_| TaskError::InvalidConfig(file.clone()))?;
        let node =
            ConfigNode::from_value(value).ok_or_else(|| TaskError::InvalidConfig(file.clone()))?;
        Ok(node)
    })?;
    Ok(loaded.unwrap_or_default())
}
