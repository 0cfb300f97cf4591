//! Lookups over an injected key-value source.
//!
//! Same fallback rules everywhere: empty values count as unset, booleans
//! accept 1/true/yes/on and 0/false/no/off.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Snapshot of key-value pairs, usually `std::env::vars_os()` taken once in
/// `main`. Pairs that are not valid UTF-8 are never looked up; they are kept
/// aside so child processes still inherit them unchanged.
#[derive(Debug, Clone, Default)]
pub struct VarSource {
    vars: BTreeMap<String, String>,
    opaque: Vec<(OsString, OsString)>,
}

impl VarSource {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            opaque: Vec::new(),
        }
    }

    /// Snapshot from OS strings. Never fails on non-UTF-8 data.
    pub fn from_os<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut src = Self::default();
        for (key, value) in vars {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => {
                    src.vars.insert(key, value);
                }
                (key, value) => {
                    let key = key.map(OsString::from).unwrap_or_else(|raw| raw);
                    let value = value.map(OsString::from).unwrap_or_else(|raw| raw);
                    src.opaque.push((key, value));
                }
            }
        }
        src
    }

    /// Raw lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Lookup, treating blank values as unset.
    pub fn optional(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Lookup with a default for unset or blank values.
    pub fn or<F>(&self, key: &str, default: F) -> String
    where
        F: FnOnce() -> String,
    {
        self.optional(key).unwrap_or_else(default)
    }

    /// Boolean lookup. Unrecognised values count as true, like the flag being set.
    pub fn bool(&self, key: &str, default: bool) -> bool {
        match self.optional(key) {
            Some(s) => !matches!(
                s.to_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            ),
            None => default,
        }
    }

    /// All UTF-8 pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pairs that are not valid UTF-8, in source order.
    pub fn opaque(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.opaque.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}
