//! Type promotion rules.
//!
//! A promotion rule says which common type two operand types are converted to
//! before an operator compares them. Rules are kept in a sorted vector and
//! looked up with a binary search. Each operator family (equality, ordering,
//! pattern match) has its own table, built once on first use.

use crate::query::operator::{Operator, OperatorFamily};
use crate::query::value_type::ValueType;
use std::sync::LazyLock;

use ValueType as V;

/// A single `(operator, left, right) -> promoted` fact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionRule {
    pub operator: Operator,
    pub left: ValueType,
    pub right: ValueType,
    pub promoted: ValueType,
}

impl PromotionRule {
    pub fn new(operator: Operator, left: ValueType, right: ValueType, promoted: ValueType) -> Self {
        Self {
            operator,
            left,
            right,
            promoted,
        }
    }

    /// Sort key: operator, then left type, then right type
    pub fn key(&self) -> (Operator, ValueType, ValueType) {
        (self.operator, self.left, self.right)
    }
}

/// Sorted promotion rule table
#[derive(Debug, Clone, Default)]
pub struct PromotionRules {
    rules: Vec<PromotionRule>,
    sorted: bool,
}

impl PromotionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `left op right` and `right op left`, both promoting to `promoted`
    pub fn add_rule(
        &mut self,
        operator: Operator,
        left: ValueType,
        right: ValueType,
        promoted: ValueType,
    ) {
        self.add_directed_rule(operator, left, right, promoted);
        self.add_directed_rule(operator, right, left, promoted);
    }

    /// Add only `left op right`
    pub fn add_directed_rule(
        &mut self,
        operator: Operator,
        left: ValueType,
        right: ValueType,
        promoted: ValueType,
    ) {
        self.rules
            .push(PromotionRule::new(operator, left, right, promoted));
        self.sorted = false;
    }

    /// Sort the table and drop duplicate keys, keeping the first registration
    pub fn finish(mut self) -> Self {
        self.rules.sort_by_key(PromotionRule::key);
        self.rules.dedup_by_key(|rule| rule.key());
        self.sorted = true;
        self
    }

    /// Find the promoted type for `left op right`, `Undefined` if there is none
    pub fn lookup(&self, operator: Operator, left: ValueType, right: ValueType) -> ValueType {
        debug_assert!(self.sorted, "promotion rules looked up before finish()");
        self.rules
            .binary_search_by_key(&(operator, left, right), PromotionRule::key)
            .map(|idx| self.rules[idx].promoted)
            .unwrap_or(ValueType::Undefined)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromotionRule> {
        self.rules.iter()
    }
}

/// Rules shared by `=` and `IN`
const EQUALITY_RULES: &[(ValueType, ValueType, ValueType)] = &[
    (V::BoolResult, V::BoolResult, V::Bool),
    (V::BoolResult, V::Bool, V::Bool),
    (V::BoolResult, V::Int, V::Bool),
    (V::BoolResult, V::Float, V::Bool),
    (V::BoolResult, V::String, V::Undefined),
    (V::BoolResult, V::SeqId, V::Undefined),
    (V::BoolResult, V::StringBool, V::Bool),
    (V::BoolResult, V::StringInt, V::Bool),
    (V::BoolResult, V::StringFloat, V::Bool),
    (V::BoolResult, V::FieldSeqId, V::Undefined),
    (V::BoolResult, V::FieldString, V::Undefined),
    (V::BoolResult, V::FieldBool, V::Bool),
    (V::BoolResult, V::FieldFloat, V::Bool),
    (V::BoolResult, V::FieldInt, V::Bool),
    (V::Bool, V::Bool, V::Bool),
    (V::Bool, V::Int, V::Bool),
    (V::Bool, V::Float, V::Bool),
    (V::Bool, V::String, V::Undefined),
    (V::Bool, V::SeqId, V::Undefined),
    (V::Bool, V::StringBool, V::Bool),
    (V::Bool, V::StringInt, V::Bool),
    (V::Bool, V::StringFloat, V::Bool),
    (V::Bool, V::FieldSeqId, V::Undefined),
    (V::Bool, V::FieldString, V::Undefined),
    (V::Bool, V::FieldBool, V::Bool),
    (V::Bool, V::FieldFloat, V::Bool),
    (V::Bool, V::FieldInt, V::Bool),
    (V::Int, V::Int, V::Int),
    (V::Int, V::Float, V::Float),
    (V::Int, V::String, V::Undefined),
    (V::Int, V::SeqId, V::SeqId),
    (V::Int, V::StringBool, V::Bool),
    (V::Int, V::StringInt, V::Int),
    (V::Int, V::StringFloat, V::Float),
    (V::Int, V::FieldSeqId, V::SeqId),
    (V::Int, V::FieldString, V::String),
    (V::Int, V::FieldBool, V::Bool),
    (V::Int, V::FieldFloat, V::Float),
    (V::Int, V::FieldInt, V::Int),
    (V::Float, V::Float, V::Float),
    (V::Float, V::SeqId, V::Undefined),
    (V::Float, V::String, V::Undefined),
    (V::Float, V::StringBool, V::Bool),
    (V::Float, V::StringInt, V::Float),
    (V::Float, V::StringFloat, V::Float),
    (V::Float, V::FieldSeqId, V::Undefined),
    (V::Float, V::FieldString, V::String),
    (V::Float, V::FieldBool, V::Bool),
    (V::Float, V::FieldFloat, V::Float),
    (V::Float, V::FieldInt, V::Float),
    (V::SeqId, V::SeqId, V::SeqId),
    (V::SeqId, V::String, V::SeqId),
    (V::SeqId, V::StringBool, V::Undefined),
    (V::SeqId, V::StringInt, V::SeqId),
    (V::SeqId, V::StringFloat, V::Undefined),
    (V::SeqId, V::FieldSeqId, V::SeqId),
    (V::SeqId, V::FieldString, V::SeqId),
    (V::SeqId, V::FieldBool, V::Undefined),
    (V::SeqId, V::FieldFloat, V::Undefined),
    (V::SeqId, V::FieldInt, V::SeqId),
    (V::String, V::String, V::String),
    (V::String, V::StringBool, V::String),
    (V::String, V::StringInt, V::String),
    (V::String, V::StringFloat, V::String),
    (V::String, V::FieldSeqId, V::SeqId),
    (V::String, V::FieldString, V::String),
    (V::String, V::FieldBool, V::String),
    (V::String, V::FieldFloat, V::String),
    (V::String, V::FieldInt, V::String),
    (V::StringBool, V::StringBool, V::Bool),
    (V::StringBool, V::StringInt, V::Bool),
    (V::StringBool, V::StringFloat, V::Bool),
    (V::StringBool, V::FieldSeqId, V::Undefined),
    (V::StringBool, V::FieldString, V::String),
    (V::StringBool, V::FieldBool, V::Bool),
    (V::StringBool, V::FieldFloat, V::Bool),
    (V::StringBool, V::FieldInt, V::Bool),
    (V::StringInt, V::StringInt, V::Int),
    (V::StringInt, V::StringFloat, V::Float),
    (V::StringInt, V::FieldSeqId, V::SeqId),
    (V::StringInt, V::FieldString, V::String),
    (V::StringInt, V::FieldBool, V::Bool),
    (V::StringInt, V::FieldFloat, V::Float),
    (V::StringInt, V::FieldInt, V::Int),
    (V::StringFloat, V::StringFloat, V::Float),
    (V::StringFloat, V::FieldSeqId, V::Undefined),
    (V::StringFloat, V::FieldString, V::String),
    (V::StringFloat, V::FieldBool, V::Bool),
    (V::StringFloat, V::FieldFloat, V::Float),
    (V::StringFloat, V::FieldInt, V::Float),
    (V::FieldSeqId, V::FieldSeqId, V::SeqId),
    (V::FieldSeqId, V::FieldString, V::SeqId),
    (V::FieldSeqId, V::FieldBool, V::Undefined),
    (V::FieldSeqId, V::FieldFloat, V::Undefined),
    (V::FieldSeqId, V::FieldInt, V::SeqId),
    (V::FieldString, V::FieldString, V::String),
    (V::FieldString, V::FieldBool, V::String),
    (V::FieldString, V::FieldFloat, V::String),
    (V::FieldString, V::FieldInt, V::String),
    (V::FieldBool, V::FieldBool, V::Bool),
    (V::FieldBool, V::FieldFloat, V::Bool),
    (V::FieldBool, V::FieldInt, V::Bool),
    (V::FieldFloat, V::FieldFloat, V::Float),
    (V::FieldFloat, V::FieldInt, V::Float),
    (V::FieldInt, V::FieldInt, V::Int),
];

/// Rules shared by `<`, `<=`, `>`, `>=` and `BETWEEN`.
///
/// Seq-ids are ordered as plain strings here.
const ORDERING_RULES: &[(ValueType, ValueType, ValueType)] = &[
    (V::BoolResult, V::BoolResult, V::Bool),
    (V::BoolResult, V::Bool, V::Bool),
    (V::BoolResult, V::Int, V::Bool),
    (V::BoolResult, V::Float, V::Bool),
    (V::BoolResult, V::String, V::Undefined),
    (V::BoolResult, V::SeqId, V::Undefined),
    (V::BoolResult, V::StringBool, V::Bool),
    (V::BoolResult, V::StringInt, V::Bool),
    (V::BoolResult, V::StringFloat, V::Bool),
    (V::BoolResult, V::FieldSeqId, V::Undefined),
    (V::BoolResult, V::FieldString, V::Undefined),
    (V::BoolResult, V::FieldBool, V::Bool),
    (V::BoolResult, V::FieldFloat, V::Bool),
    (V::BoolResult, V::FieldInt, V::Bool),
    (V::Bool, V::Bool, V::Bool),
    (V::Bool, V::Int, V::Bool),
    (V::Bool, V::Float, V::Bool),
    (V::Bool, V::String, V::Undefined),
    (V::Bool, V::SeqId, V::Undefined),
    (V::Bool, V::StringBool, V::Bool),
    (V::Bool, V::StringInt, V::Bool),
    (V::Bool, V::StringFloat, V::Bool),
    (V::Bool, V::FieldSeqId, V::Undefined),
    (V::Bool, V::FieldString, V::Undefined),
    (V::Bool, V::FieldBool, V::Bool),
    (V::Bool, V::FieldFloat, V::Bool),
    (V::Bool, V::FieldInt, V::Bool),
    (V::Int, V::Int, V::Int),
    (V::Int, V::Float, V::Float),
    (V::Int, V::String, V::Undefined),
    (V::Int, V::SeqId, V::Undefined),
    (V::Int, V::StringBool, V::Bool),
    (V::Int, V::StringInt, V::Int),
    (V::Int, V::StringFloat, V::Float),
    (V::Int, V::FieldSeqId, V::Undefined),
    (V::Int, V::FieldString, V::String),
    (V::Int, V::FieldBool, V::Bool),
    (V::Int, V::FieldFloat, V::Float),
    (V::Int, V::FieldInt, V::Int),
    (V::Float, V::Float, V::Float),
    (V::Float, V::SeqId, V::Undefined),
    (V::Float, V::String, V::Undefined),
    (V::Float, V::StringBool, V::Bool),
    (V::Float, V::StringInt, V::Float),
    (V::Float, V::StringFloat, V::Float),
    (V::Float, V::FieldSeqId, V::Undefined),
    (V::Float, V::FieldString, V::String),
    (V::Float, V::FieldBool, V::Bool),
    (V::Float, V::FieldFloat, V::Float),
    (V::Float, V::FieldInt, V::Float),
    (V::SeqId, V::SeqId, V::String),
    (V::SeqId, V::String, V::String),
    (V::SeqId, V::StringBool, V::String),
    (V::SeqId, V::StringInt, V::String),
    (V::SeqId, V::StringFloat, V::String),
    (V::SeqId, V::FieldSeqId, V::Undefined),
    (V::SeqId, V::FieldString, V::String),
    (V::SeqId, V::FieldBool, V::String),
    (V::SeqId, V::FieldFloat, V::String),
    (V::SeqId, V::FieldInt, V::String),
    (V::String, V::String, V::String),
    (V::String, V::StringBool, V::String),
    (V::String, V::StringInt, V::String),
    (V::String, V::StringFloat, V::String),
    (V::String, V::FieldSeqId, V::Undefined),
    (V::String, V::FieldString, V::String),
    (V::String, V::FieldBool, V::String),
    (V::String, V::FieldFloat, V::String),
    (V::String, V::FieldInt, V::String),
    (V::StringBool, V::StringBool, V::Bool),
    (V::StringBool, V::StringInt, V::Bool),
    (V::StringBool, V::StringFloat, V::Bool),
    (V::StringBool, V::FieldSeqId, V::Undefined),
    (V::StringBool, V::FieldString, V::String),
    (V::StringBool, V::FieldBool, V::Bool),
    (V::StringBool, V::FieldFloat, V::Bool),
    (V::StringBool, V::FieldInt, V::Bool),
    (V::StringInt, V::StringInt, V::Int),
    (V::StringInt, V::StringFloat, V::Float),
    (V::StringInt, V::FieldSeqId, V::Undefined),
    (V::StringInt, V::FieldString, V::String),
    (V::StringInt, V::FieldBool, V::Bool),
    (V::StringInt, V::FieldFloat, V::Float),
    (V::StringInt, V::FieldInt, V::Int),
    (V::StringFloat, V::StringFloat, V::Float),
    (V::StringFloat, V::FieldSeqId, V::Undefined),
    (V::StringFloat, V::FieldString, V::String),
    (V::StringFloat, V::FieldBool, V::Bool),
    (V::StringFloat, V::FieldFloat, V::Float),
    (V::StringFloat, V::FieldInt, V::Float),
    (V::FieldSeqId, V::FieldSeqId, V::String),
    (V::FieldSeqId, V::FieldString, V::String),
    (V::FieldSeqId, V::FieldBool, V::String),
    (V::FieldSeqId, V::FieldFloat, V::String),
    (V::FieldSeqId, V::FieldInt, V::String),
    (V::FieldString, V::FieldString, V::String),
    (V::FieldString, V::FieldBool, V::String),
    (V::FieldString, V::FieldFloat, V::String),
    (V::FieldString, V::FieldInt, V::String),
    (V::FieldBool, V::FieldBool, V::Bool),
    (V::FieldBool, V::FieldFloat, V::Bool),
    (V::FieldBool, V::FieldInt, V::Bool),
    (V::FieldFloat, V::FieldFloat, V::Float),
    (V::FieldFloat, V::FieldInt, V::Float),
    (V::FieldInt, V::FieldInt, V::Int),
];

/// Left operand types accepted by `LIKE`. Subexpression results are excluded.
const PATTERN_SUBJECTS: &[ValueType] = &[
    V::Bool,
    V::Int,
    V::Float,
    V::String,
    V::SeqId,
    V::StringBool,
    V::StringInt,
    V::StringFloat,
    V::FieldString,
    V::FieldSeqId,
    V::FieldBool,
    V::FieldFloat,
    V::FieldInt,
];

/// Right operand (pattern) types accepted by `LIKE`
const PATTERN_MASKS: &[ValueType] = &[V::String, V::StringBool, V::StringInt, V::StringFloat];

fn register(rules: &mut PromotionRules, operator: Operator, table: &[(ValueType, ValueType, ValueType)]) {
    for &(left, right, promoted) in table {
        rules.add_rule(operator, left, right, promoted);
    }
}

fn build_equality_rules() -> PromotionRules {
    let mut rules = PromotionRules::new();
    register(&mut rules, Operator::Eq, EQUALITY_RULES);
    register(&mut rules, Operator::In, EQUALITY_RULES);
    rules.finish()
}

fn build_ordering_rules() -> PromotionRules {
    let mut rules = PromotionRules::new();
    for op in [
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::Between,
    ] {
        register(&mut rules, op, ORDERING_RULES);
    }
    rules.finish()
}

fn build_pattern_rules() -> PromotionRules {
    let mut rules = PromotionRules::new();
    for &subject in PATTERN_SUBJECTS {
        for &mask in PATTERN_MASKS {
            rules.add_directed_rule(Operator::Like, subject, mask, V::String);
        }
    }
    rules.finish()
}

static EQUALITY: LazyLock<PromotionRules> = LazyLock::new(build_equality_rules);
static ORDERING: LazyLock<PromotionRules> = LazyLock::new(build_ordering_rules);
static PATTERN: LazyLock<PromotionRules> = LazyLock::new(build_pattern_rules);

/// Promotion table for an operator, `None` for logical operators
pub fn rules_for(operator: Operator) -> Option<&'static PromotionRules> {
    match operator.family() {
        OperatorFamily::Equality => Some(&*EQUALITY),
        OperatorFamily::Ordering => Some(&*ORDERING),
        OperatorFamily::Pattern => Some(&*PATTERN),
        OperatorFamily::Logical => None,
    }
}

/// Promoted type for `left op right` using the operator's family table
pub fn promoted_type(operator: Operator, left: ValueType, right: ValueType) -> ValueType {
    rules_for(operator)
        .map(|rules| rules.lookup(operator, left, right))
        .unwrap_or(ValueType::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rule_is_symmetric() {
        let rules = {
            let mut rules = PromotionRules::new();
            rules.add_rule(Operator::Eq, V::Int, V::Float, V::Float);
            rules.finish()
        };
        assert_eq!(rules.lookup(Operator::Eq, V::Int, V::Float), V::Float);
        assert_eq!(rules.lookup(Operator::Eq, V::Float, V::Int), V::Float);
        assert_eq!(rules.lookup(Operator::Lt, V::Int, V::Float), V::Undefined);
    }

    #[test]
    fn test_duplicate_rules_collapse() {
        let mut rules = PromotionRules::new();
        rules.add_rule(Operator::Eq, V::Int, V::Int, V::Int);
        rules.add_rule(Operator::Eq, V::Int, V::Int, V::Int);
        rules.add_rule(Operator::Eq, V::Int, V::Float, V::Float);
        rules.add_rule(Operator::Eq, V::Int, V::Float, V::Float);
        let rules = rules.finish();

        // (int, int) once, (int, float) and (float, int) once each
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_first_registration_wins() {
        let mut rules = PromotionRules::new();
        rules.add_directed_rule(Operator::Eq, V::Int, V::String, V::String);
        rules.add_directed_rule(Operator::Eq, V::Int, V::String, V::Undefined);
        let rules = rules.finish();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.lookup(Operator::Eq, V::Int, V::String), V::String);
    }

    #[test]
    fn test_builtin_tables_are_symmetric() {
        for rules in [&*EQUALITY, &*ORDERING] {
            for rule in rules.iter() {
                assert_eq!(
                    rules.lookup(rule.operator, rule.right, rule.left),
                    rule.promoted,
                    "missing mirror of {:?}",
                    rule
                );
            }
        }
    }

    #[test]
    fn test_builtin_tables_are_sorted_and_unique() {
        for rules in [&*EQUALITY, &*ORDERING, &*PATTERN] {
            let keys: Vec<_> = rules.iter().map(PromotionRule::key).collect();
            assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_equality_promotions() {
        assert_eq!(promoted_type(Operator::Eq, V::Int, V::StringInt), V::Int);
        assert_eq!(promoted_type(Operator::In, V::FieldInt, V::Float), V::Float);
        assert_eq!(promoted_type(Operator::Eq, V::Bool, V::String), V::Undefined);
        assert_eq!(promoted_type(Operator::Eq, V::FieldSeqId, V::String), V::SeqId);
        assert_eq!(promoted_type(Operator::Eq, V::SeqId, V::SeqId), V::SeqId);
    }

    #[test]
    fn test_ordering_orders_seq_ids_as_strings() {
        assert_eq!(promoted_type(Operator::Lt, V::SeqId, V::SeqId), V::String);
        assert_eq!(promoted_type(Operator::Between, V::FieldSeqId, V::FieldSeqId), V::String);
        assert_eq!(promoted_type(Operator::Gt, V::FieldInt, V::Int), V::Int);
        assert_eq!(promoted_type(Operator::Ge, V::Int, V::SeqId), V::Undefined);
    }

    #[test]
    fn test_pattern_rules_are_directed() {
        assert_eq!(promoted_type(Operator::Like, V::FieldString, V::String), V::String);
        assert_eq!(promoted_type(Operator::Like, V::Bool, V::StringInt), V::String);
        assert_eq!(promoted_type(Operator::Like, V::SeqId, V::String), V::String);
        assert_eq!(promoted_type(Operator::Like, V::String, V::FieldString), V::Undefined);
        assert_eq!(promoted_type(Operator::Like, V::BoolResult, V::String), V::Undefined);
    }

    #[test]
    fn test_logical_operators_have_no_table() {
        assert!(rules_for(Operator::And).is_none());
        assert_eq!(promoted_type(Operator::Not, V::Bool, V::Bool), V::Undefined);
    }
}
