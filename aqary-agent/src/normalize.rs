//! Defensive reading of generated JSON.
//!
//! The service is asked for JSON but nothing guarantees the shape. Every read
//! here falls back to a default and records which field fell back, so a report
//! can always be built and callers can tell how much of it is real.

use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

/// Parse response text into a JSON object.
///
/// Missing text, invalid JSON and non-object documents all become `{}`.
/// A surrounding markdown code fence is tolerated.
pub fn parse_payload(text: Option<&str>) -> Value {
    let Some(text) = text else {
        debug!("Response carried no text");
        return Value::Object(Map::new());
    };

    match serde_json::from_str::<Value>(strip_fence(text.trim())) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            warn!(kind = json_kind(&other), "Response JSON is not an object, using defaults");
            Value::Object(Map::new())
        }
        Err(e) => {
            warn!(error = %e, "Response text is not JSON, using defaults");
            Value::Object(Map::new())
        }
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fold a label for lenient matching: lowercase, separators removed.
///
/// `"Under Construction"`, `"under_construction"` and `"UNDER-CONSTRUCTION"`
/// all fold to `"underconstruction"`.
pub fn fold_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Reads typed fields out of a JSON value, tracking defaults.
///
/// Paths use dots for nesting: `"breakdown.punctuality"`.
pub struct FieldReader<'a> {
    value: &'a Value,
    prefix: String,
    defaulted: Vec<String>,
}

impl<'a> FieldReader<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            prefix: String::new(),
            defaulted: Vec::new(),
        }
    }

    fn nested(value: &'a Value, prefix: String) -> Self {
        Self {
            value,
            prefix,
            defaulted: Vec::new(),
        }
    }

    fn lookup(&self, path: &str) -> Option<&'a Value> {
        path.split('.')
            .try_fold(self.value, |current, key| current.get(key))
            .filter(|v| !v.is_null())
    }

    fn mark(&mut self, path: &str) {
        self.defaulted.push(format!("{}{}", self.prefix, path));
    }

    /// Numeric field, `0` when absent or not a number.
    pub fn number(&mut self, path: &str) -> f64 {
        match self.lookup(path).and_then(Value::as_f64) {
            Some(n) => n,
            None => {
                self.mark(path);
                0.0
            }
        }
    }

    /// Numeric field clamped into `min..=max`.
    pub fn bounded(&mut self, path: &str, min: f64, max: f64) -> f64 {
        self.number(path).clamp(min, max)
    }

    /// Text field, `sentinel` when absent or mistyped. Numbers are rendered as text.
    pub fn text(&mut self, path: &str, sentinel: &str) -> String {
        match self.lookup(path) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                self.mark(path);
                sentinel.to_string()
            }
        }
    }

    /// Enumerated label, its `Default` when absent or unrecognized.
    pub fn label<T>(&mut self, path: &str) -> T
    where
        T: FromStr + Default,
    {
        match self.lookup(path).and_then(Value::as_str).map(str::parse::<T>) {
            Some(Ok(label)) => label,
            _ => {
                self.mark(path);
                T::default()
            }
        }
    }

    /// List of strings. Non-string items are skipped.
    pub fn strings(&mut self, path: &str) -> Vec<String> {
        match self.lookup(path).and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            None => {
                self.mark(path);
                Vec::new()
            }
        }
    }

    /// List of objects, each read by `read` with its own nested reader.
    ///
    /// Non-object items are skipped. Defaults inside items are recorded as
    /// `path[index].field`.
    pub fn objects<T>(&mut self, path: &str, mut read: impl FnMut(&mut FieldReader<'a>) -> T) -> Vec<T> {
        let Some(items) = self.lookup(path).and_then(Value::as_array) else {
            self.mark(path);
            return Vec::new();
        };

        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if !item.is_object() {
                continue;
            }
            let mut reader = FieldReader::nested(item, format!("{}{}[{}].", self.prefix, path, index));
            out.push(read(&mut reader));
            self.defaulted.append(&mut reader.defaulted);
        }
        out
    }

    /// Names of the fields that fell back to defaults.
    pub fn finish(self) -> Vec<String> {
        self.defaulted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload_falls_back_to_empty_object() {
        assert_eq!(parse_payload(None), json!({}));
        assert_eq!(parse_payload(Some("not json at all")), json!({}));
        assert_eq!(parse_payload(Some("[1, 2]")), json!({}));
        assert_eq!(parse_payload(Some("{\"score\": 7}")), json!({ "score": 7 }));
        assert_eq!(
            parse_payload(Some("```json\n{\"score\": 7}\n```")),
            json!({ "score": 7 })
        );
    }

    #[test]
    fn test_reader_defaults_and_records() {
        let value = json!({
            "score": 81,
            "summary": 12,
            "breakdown": { "specs": "high" },
            "pros": ["view", 3, "finishing"]
        });
        let mut reader = FieldReader::new(&value);

        assert_eq!(reader.number("score"), 81.0);
        assert_eq!(reader.text("summary", "n/a"), "12");
        assert_eq!(reader.number("breakdown.specs"), 0.0);
        assert_eq!(reader.number("breakdown.location"), 0.0);
        assert_eq!(reader.strings("pros"), vec!["view", "finishing"]);
        assert!(reader.strings("cons").is_empty());
        assert_eq!(reader.text("title", "Untitled"), "Untitled");

        assert_eq!(
            reader.finish(),
            vec!["breakdown.specs", "breakdown.location", "cons", "title"]
        );
    }

    #[test]
    fn test_null_counts_as_absent() {
        let value = json!({ "score": null });
        let mut reader = FieldReader::new(&value);
        assert_eq!(reader.number("score"), 0.0);
        assert_eq!(reader.finish(), vec!["score"]);
    }

    #[test]
    fn test_objects_prefix_nested_defaults() {
        let value = json!({ "items": [{ "name": "A" }, "junk", { "progress": 150 }] });
        let mut reader = FieldReader::new(&value);

        let items = reader.objects("items", |item| {
            (item.text("name", "?"), item.bounded("progress", 0.0, 100.0))
        });

        assert_eq!(items, vec![("A".to_string(), 0.0), ("?".to_string(), 100.0)]);
        assert_eq!(reader.finish(), vec!["items[0].progress", "items[2].name"]);
    }

    #[test]
    fn test_fold_label() {
        assert_eq!(fold_label("Under Construction"), "underconstruction");
        assert_eq!(fold_label("UNDER_CONSTRUCTION"), "underconstruction");
        assert_eq!(fold_label(" high "), "high");
    }
}
