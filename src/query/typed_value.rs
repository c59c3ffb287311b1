//! Per-node values of a query tree.

use crate::query::classify::{self, ScalarGuess};
use crate::query::resolver::FieldId;
use crate::query::value_type::ValueType;

/// Promotion decided for one operand pair of an operator node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedPromotion {
    /// Comparison index, `i - 1` for the pair (operand 0, operand i)
    pub index: usize,
    pub left: ValueType,
    pub right: ValueType,
    pub promoted: ValueType,
}

/// Value attached to every node of a query tree.
///
/// The type tag selects the native slot. Promotion fills further slots in
/// place without changing the tag, so one literal can take part in several
/// comparisons that need different representations.
#[derive(Debug, Clone, Default)]
pub struct TypedValue {
    value_type: ValueType,
    /// Type a field returns to on `reset`
    static_type: ValueType,
    bool_val: bool,
    int_val: i64,
    float_val: f64,
    string_val: String,
    /// `string_val` holds the text the value was read from
    text_backed: bool,
    field_id: Option<FieldId>,
    promoted: Vec<CachedPromotion>,
}

impl TypedValue {
    pub fn bool(value: bool) -> Self {
        Self {
            value_type: ValueType::Bool,
            bool_val: value,
            ..Self::default()
        }
    }

    pub fn int(value: i64) -> Self {
        Self {
            value_type: ValueType::Int,
            int_val: value,
            ..Self::default()
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            value_type: ValueType::Float,
            float_val: value,
            ..Self::default()
        }
    }

    /// Literal text, sniffed to `StringBool`, `StringInt`, `StringFloat` or `String`
    pub fn text(text: &str) -> Self {
        let mut value = Self {
            value_type: ValueType::String,
            string_val: text.to_string(),
            text_backed: true,
            ..Self::default()
        };
        match classify::classify_literal(text) {
            ScalarGuess::Bool(b) => {
                value.value_type = ValueType::StringBool;
                value.bool_val = b;
            }
            ScalarGuess::Int(i) => {
                value.value_type = ValueType::StringInt;
                value.int_val = i;
            }
            ScalarGuess::Float(f) => {
                value.value_type = ValueType::StringFloat;
                value.float_val = f;
            }
            ScalarGuess::Text => {}
        }
        value
    }

    /// Field reference with its static type (`Undefined` when unknown)
    pub fn field(id: FieldId, static_type: ValueType) -> Self {
        Self {
            value_type: static_type,
            static_type,
            field_id: Some(id),
            ..Self::default()
        }
    }

    /// Operator result, false until evaluated
    pub fn bool_result() -> Self {
        Self {
            value_type: ValueType::BoolResult,
            ..Self::default()
        }
    }

    /// Value of an identifier nobody can resolve
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_field(&self) -> bool {
        self.field_id.is_some()
    }

    pub fn field_id(&self) -> Option<FieldId> {
        self.field_id
    }

    pub fn as_bool(&self) -> bool {
        self.bool_val
    }

    pub fn as_int(&self) -> i64 {
        self.int_val
    }

    pub fn as_float(&self) -> f64 {
        self.float_val
    }

    pub fn as_str(&self) -> &str {
        &self.string_val
    }

    /// Human readable form used in error messages
    pub fn describe(&self) -> String {
        match self.native_slot() {
            Slot::Bool => self.bool_val.to_string(),
            Slot::Int if !self.text_backed => self.int_val.to_string(),
            Slot::Float if !self.text_backed => self.float_val.to_string(),
            _ => format!("\"{}\"", self.string_val),
        }
    }

    /// Check if this is the literal empty string
    pub fn is_empty_string_literal(&self) -> bool {
        !self.is_field() && self.value_type == ValueType::String && self.string_val.is_empty()
    }

    pub fn set_bool_result(&mut self, value: bool) {
        self.value_type = ValueType::BoolResult;
        self.bool_val = value;
    }

    /// Retag the value. A field also keeps the new tag across resets.
    pub fn set_type(&mut self, value_type: ValueType) {
        self.value_type = value_type;
        if self.is_field() {
            self.static_type = value_type;
        }
    }

    pub fn load_field_bool(&mut self, value: bool) {
        self.value_type = ValueType::FieldBool;
        self.bool_val = value;
    }

    pub fn load_field_int(&mut self, value: i64) {
        self.value_type = ValueType::FieldInt;
        self.int_val = value;
    }

    pub fn load_field_float(&mut self, value: f64) {
        self.value_type = ValueType::FieldFloat;
        self.float_val = value;
    }

    /// Load field text, keeping `FieldSeqId` and sniffing anything else
    pub fn load_field_text(&mut self, text: String, sniff: bool) {
        self.text_backed = true;
        if self.value_type != ValueType::FieldSeqId {
            self.value_type = ValueType::FieldString;
            if sniff {
                match classify::sniff_field(&text) {
                    ScalarGuess::Bool(b) => self.load_field_bool(b),
                    ScalarGuess::Int(i) => self.load_field_int(i),
                    ScalarGuess::Float(f) => self.load_field_float(f),
                    ScalarGuess::Text => {}
                }
            }
        }
        self.string_val = text;
    }

    /// Fill the slot for `target` from the native slot.
    ///
    /// Returns false when the value has no representation in `target`.
    pub fn promote_to(&mut self, target: ValueType) -> bool {
        let native = self.native_slot();
        match target {
            ValueType::Bool => match native {
                Slot::Bool => true,
                Slot::Int => {
                    self.bool_val = self.int_val != 0;
                    true
                }
                Slot::Float => {
                    self.bool_val = self.float_val != 0.0;
                    true
                }
                Slot::Text => match classify::parse_bool_keyword(&self.string_val) {
                    Some(b) => {
                        self.bool_val = b;
                        true
                    }
                    None => false,
                },
                Slot::None => false,
            },
            ValueType::Int => match native {
                Slot::Bool => {
                    self.int_val = i64::from(self.bool_val);
                    true
                }
                Slot::Int => true,
                Slot::Float => false,
                Slot::Text => match classify::parse_int(&self.string_val) {
                    Some(i) => {
                        self.int_val = i;
                        true
                    }
                    None => false,
                },
                Slot::None => false,
            },
            ValueType::Float => match native {
                Slot::Int => {
                    self.float_val = self.int_val as f64;
                    true
                }
                Slot::Float => true,
                Slot::Text => match classify::parse_float(&self.string_val) {
                    Some(f) => {
                        self.float_val = f;
                        true
                    }
                    None => false,
                },
                Slot::Bool | Slot::None => false,
            },
            ValueType::String | ValueType::SeqId => {
                if !self.text_backed {
                    self.string_val = match native {
                        Slot::Bool => self.bool_val.to_string(),
                        Slot::Int => self.int_val.to_string(),
                        Slot::Float => self.float_val.to_string(),
                        Slot::Text => return true,
                        Slot::None => return false,
                    };
                    self.text_backed = true;
                }
                true
            }
            _ => false,
        }
    }

    /// Clear per-record state. Fields go back to their static type, literals
    /// keep their classification.
    pub fn reset(&mut self) {
        if self.is_field() {
            self.value_type = self.static_type;
            self.bool_val = false;
            self.int_val = 0;
            self.float_val = 0.0;
            self.string_val.clear();
            self.text_backed = false;
        }
    }

    pub fn cache_promotion(&mut self, promotion: CachedPromotion) {
        self.promoted
            .retain(|p| !(p.index == promotion.index && p.left == promotion.left && p.right == promotion.right));
        self.promoted.push(promotion);
    }

    /// Promotion cached for comparison `index` between operands of these types
    pub fn cached_promotion(
        &self,
        index: usize,
        left: ValueType,
        right: ValueType,
    ) -> Option<ValueType> {
        self.promoted
            .iter()
            .find(|p| p.index == index && p.left == left && p.right == right)
            .map(|p| p.promoted)
    }

    fn native_slot(&self) -> Slot {
        match self.value_type {
            ValueType::Bool | ValueType::StringBool | ValueType::FieldBool | ValueType::BoolResult => {
                Slot::Bool
            }
            ValueType::Int | ValueType::StringInt | ValueType::FieldInt => Slot::Int,
            ValueType::Float | ValueType::StringFloat | ValueType::FieldFloat => Slot::Float,
            ValueType::String | ValueType::SeqId | ValueType::FieldString | ValueType::FieldSeqId => {
                Slot::Text
            }
            ValueType::Undefined => Slot::None,
        }
    }
}

/// Storage slot that is live for a type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Bool,
    Int,
    Float,
    Text,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_classification() {
        assert_eq!(TypedValue::text("27").value_type(), ValueType::StringInt);
        assert_eq!(TypedValue::text("27.5").value_type(), ValueType::StringFloat);
        assert_eq!(TypedValue::text("YES").value_type(), ValueType::StringBool);
        assert_eq!(TypedValue::text("open").value_type(), ValueType::String);
        assert_eq!(TypedValue::text("").value_type(), ValueType::String);
    }

    #[test]
    fn test_promote_keeps_original_text() {
        let mut v = TypedValue::text("27.50");
        assert!(v.promote_to(ValueType::Float));
        assert_eq!(v.as_float(), 27.5);
        assert!(v.promote_to(ValueType::String));
        assert_eq!(v.as_str(), "27.50");
        assert_eq!(v.value_type(), ValueType::StringFloat);
    }

    #[test]
    fn test_promote_numbers() {
        let mut v = TypedValue::int(3);
        assert!(v.promote_to(ValueType::Float));
        assert_eq!(v.as_float(), 3.0);
        assert!(v.promote_to(ValueType::Bool));
        assert!(v.as_bool());
        assert!(v.promote_to(ValueType::String));
        assert_eq!(v.as_str(), "3");

        let mut v = TypedValue::float(2.5);
        assert!(!v.promote_to(ValueType::Int));

        let mut v = TypedValue::bool(true);
        assert!(v.promote_to(ValueType::Int));
        assert_eq!(v.as_int(), 1);
        assert!(!v.promote_to(ValueType::Float));
    }

    #[test]
    fn test_promote_text_failures() {
        let mut v = TypedValue::text("abc");
        assert!(!v.promote_to(ValueType::Bool));
        assert!(!v.promote_to(ValueType::Int));
        assert!(!v.promote_to(ValueType::Float));
        assert!(v.promote_to(ValueType::SeqId));
        assert!(!TypedValue::undefined().promote_to(ValueType::String));
    }

    #[test]
    fn test_field_reset() {
        let mut v = TypedValue::field(FieldId(0), ValueType::Undefined);
        v.load_field_text("42".to_string(), true);
        assert_eq!(v.value_type(), ValueType::FieldInt);
        assert_eq!(v.as_int(), 42);
        v.reset();
        assert_eq!(v.value_type(), ValueType::Undefined);
        assert_eq!(v.as_str(), "");

        let mut lit = TypedValue::text("42");
        lit.reset();
        assert_eq!(lit.value_type(), ValueType::StringInt);
    }

    #[test]
    fn test_seq_id_field_is_not_sniffed() {
        let mut v = TypedValue::field(FieldId(1), ValueType::FieldSeqId);
        v.load_field_text("12345".to_string(), true);
        assert_eq!(v.value_type(), ValueType::FieldSeqId);
        assert_eq!(v.as_str(), "12345");
    }

    #[test]
    fn test_promotion_cache() {
        let mut v = TypedValue::bool_result();
        v.cache_promotion(CachedPromotion {
            index: 0,
            left: ValueType::FieldInt,
            right: ValueType::Int,
            promoted: ValueType::Int,
        });
        assert_eq!(
            v.cached_promotion(0, ValueType::FieldInt, ValueType::Int),
            Some(ValueType::Int)
        );
        assert_eq!(v.cached_promotion(1, ValueType::FieldInt, ValueType::Int), None);
        assert_eq!(v.cached_promotion(0, ValueType::FieldFloat, ValueType::Int), None);
    }
}
