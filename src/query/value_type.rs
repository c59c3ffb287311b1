//! Type tags for values flowing through a query tree.

use std::fmt;

/// Type of a value attached to a query tree node.
///
/// Literal types come from the query text, `String*` types are quoted or bare
/// strings that also parse as a bool/int/float, and `Field*` types are values
/// read from the data source for each record. The declaration order is the
/// sort order of promotion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ValueType {
    #[default]
    Undefined,
    Bool,
    Int,
    Float,
    String,
    SeqId,
    StringBool,
    StringInt,
    StringFloat,
    BoolResult,
    FieldBool,
    FieldInt,
    FieldFloat,
    FieldString,
    FieldSeqId,
}

impl ValueType {
    /// Check if a type has been assigned
    pub fn is_defined(self) -> bool {
        self != ValueType::Undefined
    }

    /// Get the display string for this type
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Undefined => "undefined",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::SeqId => "seq-id",
            ValueType::StringBool => "string-bool",
            ValueType::StringInt => "string-int",
            ValueType::StringFloat => "string-float",
            ValueType::BoolResult => "bool-result",
            ValueType::FieldBool => "field-bool",
            ValueType::FieldInt => "field-int",
            ValueType::FieldFloat => "field-float",
            ValueType::FieldString => "field-string",
            ValueType::FieldSeqId => "field-seq-id",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined() {
        assert!(!ValueType::default().is_defined());
        assert!(ValueType::Bool.is_defined());
    }

    #[test]
    fn test_order_follows_declaration() {
        assert!(ValueType::Undefined < ValueType::Bool);
        assert!(ValueType::StringFloat < ValueType::BoolResult);
        assert!(ValueType::FieldString < ValueType::FieldSeqId);
    }
}
