use super::reader::Record;
use super::schema::Schema;
use super::value::Value;
use crate::query::{FieldId, FieldResolver, FieldType};
use std::collections::HashMap;

/// Names a query may reference as fields, with their static types.
///
/// Carries no values, which is enough for preprocessing a query.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    names: Vec<String>,
    types: Vec<FieldType>,
    index: HashMap<String, FieldId>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schema(schema: &Schema) -> Self {
        let mut catalog = Self::new();
        for (name, field_type) in schema.iter() {
            catalog.add_field(name, field_type);
        }
        catalog
    }

    /// Every key seen in `records`, all with unknown type.
    ///
    /// A field absent from every record is not known, so a bare word naming
    /// it is read as literal text (`name = ""` compares two strings). Use
    /// `from_schema` when queries may name such fields.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            for name in record.field_names() {
                catalog.add_field(name, FieldType::Unknown);
            }
        }
        catalog
    }

    /// Register a field. An existing name keeps its id and type.
    pub fn add_field(&mut self, name: &str, field_type: FieldType) -> FieldId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = FieldId(self.names.len());
        self.names.push(name.to_string());
        self.types.push(field_type);
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn name(&self, id: FieldId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FieldResolver for FieldCatalog {
    fn has_identifier(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn field_id(&self, name: &str) -> Option<FieldId> {
        self.index.get(name).copied()
    }

    fn static_type(&self, name: &str) -> FieldType {
        self.index
            .get(name)
            .and_then(|id| self.types.get(id.0))
            .copied()
            .unwrap_or_default()
    }

    fn resolve_bool(&self, _id: FieldId) -> Option<bool> {
        None
    }

    fn resolve_int(&self, _id: FieldId) -> Option<i64> {
        None
    }

    fn resolve_float(&self, _id: FieldId) -> Option<f64> {
        None
    }

    fn resolve_string(&self, _id: FieldId) -> Option<String> {
        None
    }
}

/// Resolves catalog fields against one record
pub struct RecordResolver<'a> {
    catalog: &'a FieldCatalog,
    record: &'a Record,
}

impl<'a> RecordResolver<'a> {
    pub fn new(catalog: &'a FieldCatalog, record: &'a Record) -> Self {
        Self { catalog, record }
    }

    fn value(&self, id: FieldId) -> Option<&'a Value> {
        self.catalog.name(id).and_then(|name| self.record.get(name))
    }
}

impl FieldResolver for RecordResolver<'_> {
    fn has_identifier(&self, name: &str) -> bool {
        self.catalog.has_identifier(name)
    }

    fn field_id(&self, name: &str) -> Option<FieldId> {
        self.catalog.field_id(name)
    }

    fn static_type(&self, name: &str) -> FieldType {
        self.catalog.static_type(name)
    }

    fn resolve_bool(&self, id: FieldId) -> Option<bool> {
        self.value(id)?.as_bool()
    }

    fn resolve_int(&self, id: FieldId) -> Option<i64> {
        self.value(id)?.as_int()
    }

    fn resolve_float(&self, id: FieldId) -> Option<f64> {
        self.value(id)?.as_float()
    }

    fn resolve_string(&self, id: FieldId) -> Option<String> {
        self.value(id)?.to_text()
    }
}
