//! Core data models used throughout review-lens.
//!
//! A [`Record`] is one row of an uploaded dataset. The upload backend emits
//! rows as loosely-typed JSON objects: a rating may be `5`, `"5"`, `5.0` or
//! `null`, and any column of the source file may appear. Records keep a fixed
//! set of known fields as [`FieldValue`]s and carry everything else in an
//! ordered side mapping, so the pipeline never has to guess at field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// The full ordered sequence of records currently loaded.
///
/// Shared immutably; a new upload replaces the whole dataset.
pub type Dataset = Arc<[Record]>;

/// Field names that must be non-blank for a record to be displayed.
pub const REQUIRED_FIELDS: [&str; 5] = ["customer_name", "rating", "place", "review_text", "dates"];

/// A single field value as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Arrays, objects, or numbers outside the `i64` range.
    Other(Value),
}

impl FieldValue {
    /// Convert a raw JSON value; `null` has no field value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Integer(i),
                (None, Some(f)) => Self::Float(f),
                _ => Self::Other(value.clone()),
            }),
            Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Other(other.clone())),
        }
    }

    /// Whether the value counts as set: not empty text, zero, or `false`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Integer(n) => *n != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Text(s) => !s.is_empty(),
            Self::Other(_) => true,
        }
    }

    /// Numeric reading of the value; numeric strings are accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer prefix of the value: fractions are truncated and text is read
    /// up to its first non-digit, so `"4.7"` and `"4 stars"` both give 4.
    pub fn leading_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Self::Text(s) => {
                let s = s.trim_start();
                let digits_from = usize::from(s.starts_with(['+', '-']));
                let end = s[digits_from..]
                    .find(|c: char| !c.is_ascii_digit())
                    .map_or(s.len(), |i| i + digits_from);
                if end == digits_from {
                    return None;
                }
                s[..end].parse().ok()
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
                write!(f, "{}", *x as i64)
            }
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
            Self::Other(v) => write!(f, "{}", v),
        }
    }
}

/// One row of the uploaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_text: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<FieldValue>,
    /// Parsed message date (mbox `Date:` header or a `date` column).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_link: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_suggestion: Option<FieldValue>,
    /// Every other column of the source file, in source order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Look up a field by column name, known or extra.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        let known = match name {
            "customer_name" => &self.customer_name,
            "rating" => &self.rating,
            "place" => &self.place,
            "review_text" => &self.review_text,
            "dates" => &self.dates,
            "date" => &self.date,
            "review_link" => &self.review_link,
            "subject" => &self.subject,
            "message_thread" => &self.message_thread,
            "has_suggestion" => &self.has_suggestion,
            other => return self.extra.get(other).and_then(FieldValue::from_json),
        };
        known.clone()
    }

    /// Display string of a field, or `""` when it is missing.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(|v| v.to_string()).unwrap_or_default()
    }

    /// Display string of a field, or `""` when it is missing or not truthy.
    pub fn truthy_text(&self, name: &str) -> String {
        match self.get(name) {
            Some(v) if v.is_truthy() => v.to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leading_integer() {
        let text = |s: &str| FieldValue::Text(s.to_string());
        assert_eq!(text(" 4 stars").leading_integer(), Some(4));
        assert_eq!(text("3.9").leading_integer(), Some(3));
        assert_eq!(text("-2").leading_integer(), Some(-2));
        assert_eq!(text("five").leading_integer(), None);
        assert_eq!(text("-").leading_integer(), None);
        assert_eq!(FieldValue::Float(4.99).leading_integer(), Some(4));
        assert_eq!(FieldValue::Bool(true).leading_integer(), None);
    }

    #[test]
    fn test_deserialize_mixed_types() {
        let record: Record = serde_json::from_value(json!({
            "customer_name": "Ana",
            "rating": "5",
            "place": null,
            "has_suggestion": true,
            "keywords": ["quiet", "view"],
            "from": "ana@example.com"
        }))
        .unwrap();

        assert_eq!(record.customer_name, Some(FieldValue::Text("Ana".into())));
        assert_eq!(record.rating, Some(FieldValue::Text("5".into())));
        assert_eq!(record.place, None);
        assert_eq!(record.has_suggestion, Some(FieldValue::Bool(true)));
        let keys: Vec<&str> = record.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["keywords", "from"]);
    }

    #[test]
    fn test_numeric_display() {
        assert_eq!(FieldValue::Integer(4).to_string(), "4");
        assert_eq!(FieldValue::Float(5.0).to_string(), "5");
        assert_eq!(FieldValue::Float(4.5).to_string(), "4.5");
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_zero_is_present_but_not_truthy() {
        let zero = FieldValue::Integer(0);
        assert_eq!(zero.to_string(), "0");
        assert!(!zero.is_truthy());
        assert!(!FieldValue::Text(String::new()).is_truthy());
        assert!(FieldValue::Text("0".into()).is_truthy());
    }

    #[test]
    fn test_get_extra_field() {
        let record: Record =
            serde_json::from_value(json!({"body": "hello", "score": 3})).unwrap();
        assert_eq!(record.text("body"), "hello");
        assert_eq!(record.get("score"), Some(FieldValue::Integer(3)));
        assert_eq!(record.text("missing"), "");
    }

    #[test]
    fn test_as_f64_accepts_numeric_strings() {
        assert_eq!(FieldValue::Text(" 4 ".into()).as_f64(), Some(4.0));
        assert_eq!(FieldValue::Text("four".into()).as_f64(), None);
        assert_eq!(FieldValue::Bool(true).as_f64(), None);
    }
}
