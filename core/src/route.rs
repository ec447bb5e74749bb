use crate::error::{StepError, StepResult};
use crate::step::Args;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Lookup key of a dispatcher option.
///
/// Any JSON value can act as a key. Keys compare by their canonical JSON
/// text, so `"1"` and `1` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchKey(String);

impl BranchKey {
    pub fn new(value: &Value) -> Self {
        BranchKey(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Value> for BranchKey {
    fn from(value: &Value) -> Self {
        BranchKey::new(value)
    }
}

impl From<Value> for BranchKey {
    fn from(value: Value) -> Self {
        BranchKey::new(&value)
    }
}

impl From<&str> for BranchKey {
    fn from(key: &str) -> Self {
        BranchKey::new(&Value::from(key))
    }
}

impl From<String> for BranchKey {
    fn from(key: String) -> Self {
        BranchKey::new(&Value::from(key))
    }
}

impl From<i64> for BranchKey {
    fn from(key: i64) -> Self {
        BranchKey::new(&Value::from(key))
    }
}

impl From<bool> for BranchKey {
    fn from(key: bool) -> Self {
        BranchKey::new(&Value::from(key))
    }
}

/// The `{key, args}` pair a Direct dispatcher root returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub key: Value,
    #[serde(default)]
    pub args: Args,
}

impl Route {
    pub fn new(key: impl Into<Value>, args: Args) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }

    pub fn branch_key(&self) -> BranchKey {
        BranchKey::new(&self.key)
    }

    pub fn into_value(self) -> Value {
        json!({ "key": self.key, "args": self.args })
    }

    pub fn from_value(value: Value) -> StepResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| StepError::MalformedRoute(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_json_shape() {
        assert_eq!(BranchKey::from("left"), BranchKey::from(json!("left")));
        assert_ne!(BranchKey::from("1"), BranchKey::from(1i64));
        assert_eq!(BranchKey::from("1").as_str(), "\"1\"");
        assert_eq!(BranchKey::from(true).as_str(), "true");
        assert_eq!(
            BranchKey::from(json!({"b": 1, "a": 2})),
            BranchKey::from(json!({"a": 2, "b": 1}))
        );
    }

    #[test]
    fn route_decodes_from_value() {
        let route = Route::from_value(json!({"key": "even", "args": [4]}))
            .unwrap();
        assert_eq!(route, Route::new("even", vec![json!(4)]));
        assert_eq!(route.into_value(), json!({"key": "even", "args": [4]}));
    }

    #[test]
    fn route_without_args_defaults_empty() {
        let route = Route::from_value(json!({"key": 7})).unwrap();
        assert!(route.args.is_empty());
        assert_eq!(route.branch_key(), BranchKey::from(7i64));
    }

    #[test]
    fn non_route_is_malformed() {
        let err = Route::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, StepError::MalformedRoute(_)));
    }
}
