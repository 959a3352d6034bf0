//! Structural matching of response values against expectations
//!
//! An [`Expected`] tree is compared top-down with an actual JSON value and
//! every elementary comparison becomes a [`Check`]. Mappings use subset
//! semantics: keys that only exist in the actual value are never looked at.

use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::common::{Error, Result};

/// One node of an expectation tree
#[derive(Debug, Clone)]
pub enum Expected {
    /// The value must not exist at this path
    Absent,
    /// The stringified value must match the regular expression
    Pattern(Regex),
    /// The value must be an array whose elements match pairwise
    Seq(Vec<Expected>),
    /// The value must be an object containing (at least) these keys
    Map(BTreeMap<String, Expected>),
    /// The value must equal this scalar exactly
    Value(Value),
}

impl Expected {
    /// Compile a pattern expectation
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Expected::Pattern)
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Build a mapping expectation from key/value pairs
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Expected>,
    {
        Expected::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a sequence expectation
    pub fn seq<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Expected>,
    {
        Expected::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Look up a key of a mapping expectation
    pub fn get(&self, key: &str) -> Option<&Expected> {
        match self {
            Expected::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Insert or replace a key of a mapping expectation.
    ///
    /// Returns `false` (and changes nothing) when this node is not a mapping.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Expected>) -> bool {
        match self {
            Expected::Map(map) => {
                map.insert(key.into(), value.into());
                true
            }
            _ => false,
        }
    }

    /// Remove a key of a mapping expectation
    pub fn remove(&mut self, key: &str) -> Option<Expected> {
        match self {
            Expected::Map(map) => map.remove(key),
            _ => None,
        }
    }

    /// Deep-merge `overlay` into `self`.
    ///
    /// Mappings merge key by key; anything else is replaced wholesale.
    pub fn merge(&mut self, overlay: &Expected) {
        match (self, overlay) {
            (Expected::Map(base), Expected::Map(over)) => {
                for (key, value) in over {
                    match base.get_mut(key) {
                        Some(existing) => existing.merge(value),
                        None => {
                            base.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            (slot, _) => *slot = overlay.clone(),
        }
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                Expected::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            Value::Array(items) => Expected::Seq(items.into_iter().map(Into::into).collect()),
            scalar => Expected::Value(scalar),
        }
    }
}

impl From<Regex> for Expected {
    fn from(re: Regex) -> Self {
        Expected::Pattern(re)
    }
}

impl From<&str> for Expected {
    fn from(s: &str) -> Self {
        Expected::Value(Value::String(s.to_string()))
    }
}

impl From<String> for Expected {
    fn from(s: String) -> Self {
        Expected::Value(Value::String(s))
    }
}

impl From<i64> for Expected {
    fn from(n: i64) -> Self {
        Expected::Value(n.into())
    }
}

impl From<u64> for Expected {
    fn from(n: u64) -> Self {
        Expected::Value(n.into())
    }
}

impl From<bool> for Expected {
    fn from(b: bool) -> Self {
        Expected::Value(Value::Bool(b))
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Absent => write!(f, "<absent>"),
            Expected::Pattern(re) => write!(f, "/{}/", re.as_str()),
            Expected::Value(v) => write!(f, "{}", v),
            other => match serde_json::to_string(other) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "<expectation>"),
            },
        }
    }
}

impl Serialize for Expected {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Expected::Absent => serializer.serialize_str("<absent>"),
            Expected::Pattern(re) => serializer.serialize_str(&format!("/{}/", re.as_str())),
            Expected::Value(v) => v.serialize(serializer),
            Expected::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Expected::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// A single elementary assertion produced by the matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub passed: bool,
    pub path: String,
    pub description: String,
}

impl Check {
    fn new(passed: bool, path: &str, description: String) -> Self {
        Self {
            passed,
            path: path.to_string(),
            description,
        }
    }
}

/// Compare `actual` against `expected`; `None` means the value is absent
pub fn matches(expected: &Expected, actual: Option<&Value>, path: &str) -> Vec<Check> {
    let mut checks = Vec::new();
    match_into(expected, actual, path, &mut checks);
    checks
}

/// Full deep equality, without subset semantics
pub fn equals(expected: &Value, actual: &Value, path: &str) -> Check {
    let passed = same_value(expected, actual);
    let description = if passed {
        format!("`{}` deep-equals expected value", path)
    } else {
        format!(
            "`{}` deep-equals expected value (expected {}, got {})",
            path,
            expected,
            truncate(&actual.to_string())
        )
    };
    Check::new(passed, path, description)
}

fn match_into(expected: &Expected, actual: Option<&Value>, path: &str, out: &mut Vec<Check>) {
    if let Expected::Absent = expected {
        out.push(Check::new(
            actual.is_none(),
            path,
            format!("`{}` is absent", path),
        ));
        return;
    }

    let actual = match actual {
        Some(value) => {
            out.push(Check::new(true, path, format!("`{}` is defined", path)));
            value
        }
        None => {
            out.push(Check::new(false, path, format!("`{}` is defined", path)));
            return;
        }
    };

    match expected {
        Expected::Absent => {}
        Expected::Pattern(re) => {
            let text = stringify(actual);
            let passed = re.is_match(&text);
            let mut description = format!("`{}` matches /{}/", path, re.as_str());
            if !passed {
                description.push_str(&format!(" (got {})", truncate(&text)));
            }
            out.push(Check::new(passed, path, description));
        }
        Expected::Seq(items) => {
            let Some(actual_items) = actual.as_array() else {
                out.push(Check::new(
                    false,
                    path,
                    format!("`{}` is an array (got {})", path, kind(actual)),
                ));
                return;
            };
            out.push(Check::new(true, path, format!("`{}` is an array", path)));
            if actual_items.len() != items.len() {
                out.push(Check::new(
                    false,
                    path,
                    format!(
                        "`{}` has {} element(s) (got {})",
                        path,
                        items.len(),
                        actual_items.len()
                    ),
                ));
            }
            for (i, item) in items.iter().enumerate() {
                match_into(item, actual_items.get(i), &format!("{}[{}]", path, i), out);
            }
        }
        Expected::Map(entries) => {
            let Some(object) = actual.as_object() else {
                out.push(Check::new(
                    false,
                    path,
                    format!("`{}` is an object (got {})", path, kind(actual)),
                ));
                return;
            };
            for (key, item) in entries {
                match_into(item, object.get(key), &child_path(path, key), out);
            }
        }
        Expected::Value(value) => {
            let passed = same_value(value, actual);
            let mut description = format!("`{}` equals {}", path, value);
            if !passed {
                description.push_str(&format!(" (got {})", truncate(&actual.to_string())));
            }
            out.push(Check::new(passed, path, description));
        }
    }
}

/// JSON equality where numbers compare by value, so `1` equals `1.0`
fn same_value(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => same_number(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| same_value(x, y)))
        }
        _ => expected == actual,
    }
}

fn same_number(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}
