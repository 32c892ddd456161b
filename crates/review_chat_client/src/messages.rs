//! HTTP message types for the chat API. Client ↔ server JSON.
//!
//! Responses are decoded leniently: the server is an external service and
//! every field of a source is optional.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Client → server: `POST /chat` body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub query: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub fn new(query: &'a str) -> Self {
        Self { query }
    }
}

/// Server → client: `GET /health` body.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub ok: bool,
}

/// Server → client: answer plus the review snippets backing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl ChatResponse {
    /// Decode from any JSON value. Missing or mistyped fields degrade to empty.
    pub fn from_json(value: &Value) -> Self {
        let answer = value
            .get("answer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let sources = value
            .get("sources")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Source::from_json).collect())
            .unwrap_or_default();
        Self { answer, sources }
    }
}

/// One review snippet returned alongside an answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Source {
    pub snippet: String,
    pub metadata: SourceMetadata,
}

impl Source {
    /// Returns `None` for entries that are not JSON objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let snippet = obj
            .get("snippet")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let metadata = obj
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .map(SourceMetadata::from)
            .unwrap_or_default();
        Some(Self { snippet, metadata })
    }
}

/// Open-ended source metadata. Known keys have typed accessors; anything else
/// is reachable through [`SourceMetadata::get`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMetadata(Map<String, Value>);

impl From<Map<String, Value>> for SourceMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl SourceMetadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn brand(&self) -> Option<&str> {
        self.text_field("brand")
    }

    pub fn model(&self) -> Option<&str> {
        self.text_field("model")
    }

    pub fn sentiment(&self) -> Option<&str> {
        self.text_field("sentiment")
    }

    pub fn rating(&self) -> Option<String> {
        self.scalar_field("rating")
    }

    pub fn battery_life_rating(&self) -> Option<String> {
        self.scalar_field("battery_life_rating")
    }

    fn text_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn scalar_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }
}
