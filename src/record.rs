//! Record data that queries run against.
//!
//! This module provides:
//! - JSON-backed field values and records
//! - Schemas mapping field names to static types
//! - A field catalog for preprocessing and a per-record resolver for evaluation

pub mod reader;
pub mod resolver;
pub mod schema;
pub mod value;

pub use reader::{read_records, Record};
pub use resolver::{FieldCatalog, RecordResolver};
pub use schema::Schema;
pub use value::Value;
