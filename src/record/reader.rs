//! JSON-lines records.

use super::value::Value;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::io::BufRead;

/// One data element: field name to value. Missing and `null` fields are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Get a present value. `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Parse one JSON object
    pub fn from_json(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text).context("Invalid JSON")?;
        let map = match json {
            serde_json::Value::Object(map) => map,
            other => bail!("Expected a JSON object, found {}", other),
        };

        Ok(Record {
            fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                .collect(),
        )
    }
}

/// Read one record per non-blank line
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record =
            Record::from_json(&line).with_context(|| format!("Bad record on line {}", index + 1))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_record_from_json() {
        let record = Record::from_json(r#"{"age": 30, "name": "ann", "note": null}"#).unwrap();
        assert_eq!(record.get("age"), Some(&Value::Int(30)));
        assert_eq!(record.get("name"), Some(&Value::String("ann".to_string())));
        assert_eq!(record.get("note"), None);
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["age", "name", "note"]);
    }

    #[test]
    fn test_record_rejects_non_object() {
        assert!(Record::from_json("[1, 2]").is_err());
        assert!(Record::from_json("{").is_err());
    }

    #[test]
    fn test_to_json() {
        let record = Record::new()
            .with("a", Value::Int(1))
            .with("b", Value::Float(0.5))
            .with("c", Value::Boolean(false));
        assert_eq!(record.to_json().to_string(), r#"{"a":1,"b":0.5,"c":false}"#);
    }

    #[test]
    fn test_read_records() {
        let input = "{\"n\": 1}\n\n   \n{\"n\": 2}\n";
        let records = read_records(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("n"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_read_records_reports_line() {
        let input = "{\"n\": 1}\nnot json\n";
        let err = read_records(Cursor::new(input)).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
