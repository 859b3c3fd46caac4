use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type Id = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Default user for rows exported before audit fields existed
pub(crate) fn default_user() -> String {
    "legacy-user".to_string()
}

/// Default timestamp for rows exported before audit fields existed
pub(crate) fn default_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(0, 0).unwrap_or_else(Utc::now)
}

/// Render a JSON number the way the web client prints it: whole-valued
/// floats lose their fractional part, so `12.0` and `12` render alike.
pub fn render_number(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(value) if number.is_f64() && value.is_finite() && value.fract() == 0.0 => {
            if value == 0.0 {
                "0".to_string()
            } else {
                format!("{:.0}", value)
            }
        }
        _ => number.to_string(),
    }
}

/// Identifier coming from the catalog or room tables.
///
/// The stored JSON carries these either as integers (`7`) or strings
/// (`"custom-3"`); both render to the same text the grouping key embeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(value) => write!(f, "{}", value),
            RecordId::Text(value) => f.write_str(value),
        }
    }
}

impl RecordId {
    /// An empty text id carries no identity
    pub fn is_blank(&self) -> bool {
        matches!(self, RecordId::Text(value) if value.is_empty())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_accepts_numbers_and_strings() {
        let numeric: RecordId = serde_json::from_str("7").unwrap();
        let text: RecordId = serde_json::from_str(r#""custom-3""#).unwrap();

        assert_eq!(numeric, RecordId::Int(7));
        assert_eq!(text, RecordId::Text("custom-3".to_string()));
        assert_eq!(numeric.to_string(), "7");
        assert_eq!(text.to_string(), "custom-3");
    }

    #[test]
    fn test_blank_ids() {
        assert!(RecordId::Text(String::new()).is_blank());
        assert!(!RecordId::Text("0".to_string()).is_blank());
        assert!(!RecordId::Int(0).is_blank());
    }

    #[test]
    fn test_render_number_drops_whole_fraction() {
        let render = |value: serde_json::Value| match value {
            serde_json::Value::Number(n) => render_number(&n),
            other => panic!("not a number: {}", other),
        };
        assert_eq!(render(serde_json::json!(12.0)), "12");
        assert_eq!(render(serde_json::json!(12)), "12");
        assert_eq!(render(serde_json::json!(-0.0)), "0");
        assert_eq!(render(serde_json::json!(12.5)), "12.5");
        assert_eq!(render(serde_json::json!(-3)), "-3");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
