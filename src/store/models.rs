/// Data models for wishes
///
/// `Wish` is the live entry in the registry. `WishSpec` is what callers hand
/// in to create one, and `WishRecord` is the serializable form used in
/// snapshots and wish files.

use crate::context::Scope;
use crate::core::handler::{Handler, NavigateTarget};
use crate::core::engine::WishEngine;
use crate::error::{Result, WishError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A trigger phrase. Numbers and booleans are accepted and kept in their
/// display form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "String")]
pub struct MagicWord(String);

impl MagicWord {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MagicWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MagicWord {
    fn from(word: &str) -> Self {
        MagicWord(word.to_string())
    }
}

impl From<String> for MagicWord {
    fn from(word: String) -> Self {
        MagicWord(word)
    }
}

impl From<i32> for MagicWord {
    fn from(n: i32) -> Self {
        MagicWord(n.to_string())
    }
}

impl From<i64> for MagicWord {
    fn from(n: i64) -> Self {
        MagicWord(n.to_string())
    }
}

impl From<u64> for MagicWord {
    fn from(n: u64) -> Self {
        MagicWord(n.to_string())
    }
}

impl From<f64> for MagicWord {
    fn from(n: f64) -> Self {
        MagicWord(n.to_string())
    }
}

impl From<bool> for MagicWord {
    fn from(b: bool) -> Self {
        MagicWord(b.to_string())
    }
}

impl From<MagicWord> for String {
    fn from(word: MagicWord) -> Self {
        word.0
    }
}

impl TryFrom<Value> for MagicWord {
    type Error = WishError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(MagicWord(s)),
            Value::Number(n) => Ok(MagicWord(n.to_string())),
            Value::Bool(b) => Ok(MagicWord(b.to_string())),
            other => Err(WishError::InvalidMagicWord(describe(&other))),
        }
    }
}

/// Turn a JSON value into a query fragment. `null` means "no fragment" and
/// becomes the empty string. Arrays and objects are rejected.
pub fn parse_fragment(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(WishError::InvalidMagicWord(describe(other))),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(_) => format!("an array ({})", value),
        Value::Object(_) => format!("an object ({})", value),
        other => other.to_string(),
    }
}

/// How often a wish has been made
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub total: u64,
    #[serde(default)]
    pub by_fragment: BTreeMap<String, u64>,
    #[serde(default)]
    pub last_invoked: Option<DateTime<Utc>>,
}

impl Usage {
    pub fn record(&mut self, fragment: Option<&str>) {
        self.total += 1;
        if let Some(fragment) = fragment {
            *self.by_fragment.entry(fragment.to_string()).or_insert(0) += 1;
        }
        self.last_invoked = Some(Utc::now());
    }

    pub fn count_for(&self, fragment: &str) -> u64 {
        self.by_fragment.get(fragment).copied().unwrap_or(0)
    }
}

/// A registered wish
#[derive(Debug, Clone)]
pub struct Wish {
    pub id: String,
    pub magic_words: Vec<MagicWord>,
    pub scope: Scope,
    pub payload: Value,
    pub usage: Usage,
    pub handler: Option<Handler>,
}

impl Wish {
    /// The magic word shown to users
    pub fn primary_magic_word(&self) -> Option<&MagicWord> {
        self.magic_words.first()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn to_record(&self) -> WishRecord {
        WishRecord {
            id: Some(self.id.clone()),
            magic_words: self.magic_words.clone(),
            scope: Some(self.scope.clone()),
            payload: self.payload.clone(),
            usage: self.usage.clone(),
            navigate: self
                .handler
                .as_ref()
                .and_then(Handler::navigation_target)
                .cloned(),
        }
    }
}

/// Input for registering a wish
#[derive(Debug, Clone, Default)]
pub struct WishSpec {
    pub id: Option<String>,
    pub magic_words: Vec<MagicWord>,
    pub scope: Option<Scope>,
    pub payload: Option<Value>,
    pub handler: Option<Handler>,
}

impl WishSpec {
    pub fn new<I, W>(magic_words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<MagicWord>,
    {
        Self {
            magic_words: magic_words.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_callback<F>(self, f: F) -> Self
    where
        F: Fn(&mut WishEngine, &Wish, Option<&str>) + 'static,
    {
        self.with_handler(Handler::callback(f))
    }

    pub fn with_navigation(self, target: impl Into<String>, open_in_new_surface: bool) -> Self {
        self.with_handler(Handler::navigate(target, open_in_new_surface))
    }
}

/// Serializable wish, used for snapshots and wish files.
///
/// Callbacks can't be written out, so only navigation handlers survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub magic_words: Vec<MagicWord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate: Option<NavigateTarget>,
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

impl WishRecord {
    /// Read a record from JSON, reporting a bad magic word as
    /// `InvalidMagicWord` instead of a generic data format error
    pub fn from_value(value: Value) -> Result<Self> {
        if let Some(words) = value.get("magic_words").and_then(Value::as_array) {
            for word in words {
                MagicWord::try_from(word.clone())?;
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn into_spec(self) -> WishSpec {
        WishSpec {
            id: self.id,
            magic_words: self.magic_words,
            scope: self.scope,
            payload: Some(self.payload),
            handler: self.navigate.map(Handler::Navigate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_magic_word_from_values() {
        assert_eq!(MagicWord::try_from(json!("hey3")).unwrap().as_str(), "hey3");
        assert_eq!(MagicWord::try_from(json!(1)).unwrap().as_str(), "1");
        assert_eq!(MagicWord::try_from(json!(true)).unwrap().as_str(), "true");
        assert_eq!(MagicWord::from(2).as_str(), "2");
    }

    #[test]
    fn test_magic_word_rejects_objects() {
        match MagicWord::try_from(json!({"word": "x"})) {
            Err(WishError::InvalidMagicWord(msg)) => assert!(msg.contains("object")),
            other => panic!("Expected InvalidMagicWord, got {:?}", other),
        }
        assert!(MagicWord::try_from(json!(["x"])).is_err());
        assert!(MagicWord::try_from(Value::Null).is_err());
    }

    #[test]
    fn test_parse_fragment() {
        assert_eq!(parse_fragment(&Value::Null).unwrap(), "");
        assert_eq!(parse_fragment(&json!(1)).unwrap(), "1");
        assert!(parse_fragment(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_usage_record() {
        let mut usage = Usage::default();
        usage.record(Some("mertz"));
        usage.record(Some("mertz"));
        usage.record(None);

        assert_eq!(usage.total, 3);
        assert_eq!(usage.count_for("mertz"), 2);
        assert_eq!(usage.count_for("other"), 0);
        assert!(usage.last_invoked.is_some());
    }

    #[test]
    fn test_record_from_json_file_shape() {
        let record: WishRecord = serde_json::from_str(
            r#"{
                "magic_words": ["Settings", 42],
                "scope": "admin",
                "navigate": "/settings"
            }"#,
        )
        .unwrap();

        assert_eq!(record.id, None);
        assert_eq!(record.magic_words[1].as_str(), "42");
        assert_eq!(record.scope, Some(Scope::any(["admin"])));
        assert_eq!(record.payload, json!({}));

        let spec = record.into_spec();
        assert!(spec.handler.is_some());
    }

    #[test]
    fn test_record_rejects_object_magic_word() {
        let result: std::result::Result<WishRecord, _> =
            serde_json::from_str(r#"{"magic_words": [{"nested": true}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_from_value_reports_invalid_magic_word() {
        match WishRecord::from_value(json!({"magic_words": ["ok", {"x": 1}]})) {
            Err(WishError::InvalidMagicWord(msg)) => assert!(msg.contains("object")),
            other => panic!("Expected InvalidMagicWord, got {:?}", other),
        }
        assert!(matches!(
            WishRecord::from_value(json!({"magic_words": [["nested"]]})),
            Err(WishError::InvalidMagicWord(_))
        ));

        let record = WishRecord::from_value(json!({"magic_words": ["Home", 7], "navigate": "/"})).unwrap();
        assert_eq!(record.magic_words[1].as_str(), "7");
        assert!(record.navigate.is_some());
    }

    #[test]
    fn test_to_record_keeps_navigation_only() {
        let wish = Wish {
            id: "g-0".to_string(),
            magic_words: vec!["Home".into()],
            scope: Scope::universal("universe"),
            payload: json!({"icon": "house"}),
            usage: Usage::default(),
            handler: Some(Handler::navigate("/home", true)),
        };
        let record = wish.to_record();
        assert_eq!(record.navigate.unwrap().target, "/home");

        let wish = Wish {
            handler: Some(Handler::callback(|_, _, _| {})),
            ..wish
        };
        assert!(wish.to_record().navigate.is_none());
    }
}
