use crate::query::classify::{parse_bool_keyword, parse_float, parse_int};

/// A single field value in a record
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean view: booleans, boolean keywords, and numbers (non-zero is true)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::String(s) => parse_bool_keyword(s),
            Value::Null => None,
        }
    }

    /// Integer view. Floats only convert when they have no fractional part.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            // i64::MAX as f64 rounds up to 2^63, one past the range
            Value::Float(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) => {
                Some(*f as i64)
            }
            Value::String(s) => parse_int(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => parse_float(s),
            _ => None,
        }
    }

    /// Text rendering of any non-null value
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            // Nested values are compared as their JSON text
            other => Value::String(other.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(Value::from(json!(true)), Value::Boolean(true));
        assert_eq!(Value::from(json!(42)), Value::Int(42));
        assert_eq!(Value::from(json!(0.5)), Value::Float(0.5));
        assert_eq!(Value::from(json!("x")), Value::String("x".to_string()));
        assert_eq!(Value::from(json!([1, 2])), Value::String("[1,2]".to_string()));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::String("yes".to_string()).as_bool(), Some(true));
        assert_eq!(Value::String("maybe".to_string()).as_bool(), None);
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::Float(3.0).as_int(), Some(3));
        assert_eq!(Value::Float(3.5).as_int(), None);
        assert_eq!(Value::String("12".to_string()).as_int(), Some(12));
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert_eq!(Value::Boolean(true).as_float(), None);
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Float(0.25).to_text().as_deref(), Some("0.25"));
    }

    #[test]
    fn test_float_to_int_range() {
        assert_eq!(Value::Float(i64::MIN as f64).as_int(), Some(i64::MIN));
        assert_eq!(Value::Float(-1e19).as_int(), None);
        assert_eq!(Value::Float(i64::MAX as f64).as_int(), None);
        assert_eq!(Value::Float(-9.0).as_int(), Some(-9));
    }
}
