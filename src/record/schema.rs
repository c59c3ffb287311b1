use crate::query::FieldType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Field names with their static types, e.g. `{"age": "int", "name": "string"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid schema JSON")
    }

    /// Load a schema from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("In schema file {}", path.display()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_schema_from_json() {
        let schema = Schema::from_json(r#"{"age": "int", "name": "string", "x": "unknown"}"#)
            .unwrap();
        assert_eq!(schema.len(), 3);
        let fields: Vec<_> = schema.iter().collect();
        assert_eq!(
            fields,
            vec![
                ("age", FieldType::Int),
                ("name", FieldType::String),
                ("x", FieldType::Unknown)
            ]
        );
    }

    #[test]
    fn test_schema_rejects_bad_type() {
        assert!(Schema::from_json(r#"{"age": "integer"}"#).is_err());
        assert!(Schema::from_json("[1]").is_err());
    }

    #[test]
    fn test_schema_load() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"flag": "bool", "score": "float"}}"#).unwrap();

        let schema = Schema::load(file.path()).unwrap();
        let fields: Vec<_> = schema.iter().collect();
        assert_eq!(
            fields,
            vec![("flag", FieldType::Bool), ("score", FieldType::Float)]
        );
    }

    #[test]
    fn test_schema_round_trip_serde() {
        let schema = Schema::new().with_field("age", FieldType::Int);
        let text = serde_json::to_string(&schema).unwrap();
        assert_eq!(text, r#"{"age":"int"}"#);
    }
}
