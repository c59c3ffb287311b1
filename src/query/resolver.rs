//! Contracts between the evaluator and the data it queries.

use serde::{Deserialize, Serialize};

/// Opaque handle for a field known to a resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub usize);

/// Static schema type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
    #[default]
    Unknown,
}

/// Field lookup for the current data element.
///
/// `has_identifier`, `field_id` and `static_type` are asked once while the
/// query is preprocessed. The `resolve_*` methods are asked per record and
/// return `None` when the field has no value (or no value of that kind) on
/// the current record.
pub trait FieldResolver {
    fn has_identifier(&self, name: &str) -> bool;

    fn field_id(&self, name: &str) -> Option<FieldId>;

    fn static_type(&self, _name: &str) -> FieldType {
        FieldType::Unknown
    }

    fn resolve_bool(&self, id: FieldId) -> Option<bool>;

    fn resolve_int(&self, id: FieldId) -> Option<i64>;

    fn resolve_float(&self, id: FieldId) -> Option<f64>;

    fn resolve_string(&self, id: FieldId) -> Option<String>;
}

/// Identifier-aware equality for sequence ids.
///
/// Only asked after a case-insensitive text comparison has failed and both
/// ids are non-blank.
pub trait SeqIdComparator {
    fn equal(&self, a: &str, b: &str) -> bool;
}

/// Matches FASTA style ids (`db|ACCESSION.version|...`) on their accession.
///
/// Accessions compare case-insensitively. Versions only matter when both
/// sides carry one.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessionMatcher;

impl AccessionMatcher {
    /// Split an id into accession and optional version
    fn accession(id: &str) -> (&str, Option<&str>) {
        let id = id.trim();
        let core = match id.split_once('|') {
            Some((_, rest)) => rest.split('|').next().unwrap_or(rest),
            None => id,
        };
        match core.rsplit_once('.') {
            Some((acc, version))
                if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) =>
            {
                (acc, Some(version))
            }
            _ => (core, None),
        }
    }
}

impl SeqIdComparator for AccessionMatcher {
    fn equal(&self, a: &str, b: &str) -> bool {
        let (acc_a, ver_a) = Self::accession(a);
        let (acc_b, ver_b) = Self::accession(b);
        if acc_a.is_empty() || !acc_a.eq_ignore_ascii_case(acc_b) {
            return false;
        }
        match (ver_a, ver_b) {
            (Some(va), Some(vb)) => va == vb,
            _ => true,
        }
    }
}
