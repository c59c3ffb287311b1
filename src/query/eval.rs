//! Query preprocessing and per-record evaluation.

use crate::query::compare::{self, CaseSensitivity, QueryOptions, StringMatching};
use crate::query::error::{QueryError, QueryResult};
use crate::query::operator::Operator;
use crate::query::promote;
use crate::query::resolver::{AccessionMatcher, FieldResolver, FieldType, SeqIdComparator};
use crate::query::tree::{NodeId, NodeKind, QueryTree};
use crate::query::typed_value::{CachedPromotion, TypedValue};
use crate::query::value_type::ValueType;
use log::{debug, trace};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Name of the field that always holds sequence identifiers
const SEQ_ID_FIELD: &str = "seq-id";

/// Evaluates a query tree against the records exposed by a `FieldResolver`.
///
/// `preprocess` is run once per tree, then `evaluate` once per record. The
/// tree keeps per-record state in its node values, so one tree must not be
/// evaluated for two records at the same time.
pub struct Evaluator {
    options: QueryOptions,
    seq_ids: Box<dyn SeqIdComparator>,
    /// Compiled regular expressions keyed by pattern text
    regex_cache: HashMap<String, Regex>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl Evaluator {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            seq_ids: Box::new(AccessionMatcher),
            regex_cache: HashMap::new(),
        }
    }

    /// Replace the comparator used for identifier-aware seq-id equality
    pub fn with_seq_id_comparator(mut self, comparator: Box<dyn SeqIdComparator>) -> Self {
        self.seq_ids = comparator;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Classify every node and precompute static promotions.
    ///
    /// Fails on operators with the wrong operand count and on literal
    /// operands that can never be compared.
    pub fn preprocess(
        &mut self,
        tree: &mut QueryTree,
        resolver: &dyn FieldResolver,
    ) -> QueryResult<()> {
        let order = tree.post_order();
        if order.is_empty() {
            return Err(QueryError::exec("query tree has no root"));
        }

        for id in order {
            if tree.node(id).is_value() {
                let value = Self::classify_value(tree, id, resolver);
                *tree.value_mut(id) = value;
            } else {
                self.preprocess_operator(tree, id)?;
            }
        }

        debug!("Preprocessed query {} ({} nodes)", tree, tree.len());
        Ok(())
    }

    fn classify_value(tree: &QueryTree, id: NodeId, resolver: &dyn FieldResolver) -> TypedValue {
        match &tree.node(id).kind {
            NodeKind::Text { text, quoted: true } => TypedValue::text(text),
            NodeKind::Text { text, quoted: false } => {
                if resolver.has_identifier(text) {
                    Self::field_value(text, resolver)
                } else {
                    TypedValue::text(text)
                }
            }
            NodeKind::Identifier(name) => {
                if resolver.has_identifier(name) {
                    Self::field_value(name, resolver)
                } else {
                    debug!("Identifier `{}` is not a known field", name);
                    TypedValue::undefined()
                }
            }
            NodeKind::Bool(b) => TypedValue::bool(*b),
            NodeKind::Int(i) => TypedValue::int(*i),
            NodeKind::Float(f) => TypedValue::float(*f),
            NodeKind::Operator(_) => TypedValue::bool_result(),
        }
    }

    fn field_value(name: &str, resolver: &dyn FieldResolver) -> TypedValue {
        let Some(id) = resolver.field_id(name) else {
            return TypedValue::undefined();
        };

        let static_type = if name.eq_ignore_ascii_case(SEQ_ID_FIELD) {
            ValueType::FieldSeqId
        } else {
            match resolver.static_type(name) {
                FieldType::Bool => ValueType::FieldBool,
                FieldType::Int => ValueType::FieldInt,
                FieldType::Float => ValueType::FieldFloat,
                FieldType::String => ValueType::FieldString,
                FieldType::Unknown => ValueType::Undefined,
            }
        };
        TypedValue::field(id, static_type)
    }

    fn preprocess_operator(&mut self, tree: &mut QueryTree, id: NodeId) -> QueryResult<()> {
        let node = tree.node(id);
        let (op, negated) = match node.operator() {
            Some(op) => (op, node.negated),
            None => return Err(QueryError::exec(format!("{} is not an operator", node.label()))),
        };
        let children = node.children.clone();

        if !op.accepts_operands(children.len()) {
            return Err(QueryError::wrong_argument_count(
                op.display(negated),
                children.len(),
            ));
        }

        *tree.value_mut(id) = TypedValue::bool_result();

        let first = children[0];
        if op.is_logical() {
            // Logical context needs booleans, surface bad literals now.
            // Pairs with an undefined side wait for evaluation.
            for &other in children.iter().skip(1) {
                if !tree.value(first).value_type().is_defined()
                    || !tree.value(other).value_type().is_defined()
                {
                    continue;
                }
                for operand in [first, other] {
                    Self::coerce_logical_operand(tree, operand)?;
                }
            }
            return Ok(());
        }

        for (i, &other) in children.iter().enumerate().skip(1) {
            let left = tree.value(first).value_type();
            let right = tree.value(other).value_type();
            if !left.is_defined() || !right.is_defined() {
                continue;
            }

            let promoted = promote::promoted_type(op, left, right);
            if !promoted.is_defined() {
                if tree.value(first).is_field() || tree.value(other).is_field() {
                    trace!(
                        "No static promotion for {} {} {}, deferring to evaluation",
                        left,
                        op.as_str(),
                        right
                    );
                    continue;
                }
                return Err(QueryError::incomparable(
                    &tree.node(first).label(),
                    &tree.node(other).label(),
                    &op.display(negated),
                ));
            }

            tree.value_mut(id).cache_promotion(CachedPromotion {
                index: i - 1,
                left,
                right,
                promoted,
            });

            for operand in [first, other] {
                let value = tree.value_mut(operand);
                if !value.is_field() && !value.promote_to(promoted) {
                    return Err(QueryError::unconvertible_value(
                        &tree.node(operand).label(),
                        promoted.as_str(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn coerce_logical_operand(tree: &mut QueryTree, id: NodeId) -> QueryResult<()> {
        if !tree.node(id).is_value() {
            return Ok(());
        }
        let value = tree.value_mut(id);
        if value.is_field() {
            value.set_type(ValueType::FieldBool);
        } else if !value.promote_to(ValueType::Bool) {
            return Err(QueryError::unconvertible_value(
                &tree.node(id).label(),
                ValueType::Bool.as_str(),
            ));
        }
        Ok(())
    }

    /// Evaluate the whole tree for the current record
    pub fn evaluate(
        &mut self,
        tree: &mut QueryTree,
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let root = tree
            .root()
            .ok_or_else(|| QueryError::exec("query tree has no root"))?;

        self.evaluate_subtree(tree, root, resolver)?;
        if tree.node(root).is_value() {
            self.operand_bool(tree, root, resolver)
        } else {
            Ok(tree.value(root).as_bool())
        }
    }

    fn evaluate_subtree(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        resolver: &dyn FieldResolver,
    ) -> QueryResult<()> {
        for node in tree.evaluation_order(id) {
            self.evaluate_node(tree, node, resolver)?;
        }
        Ok(())
    }

    /// Evaluate one node.
    ///
    /// Nodes must be visited in `QueryTree::evaluation_order`: operands
    /// first, except that AND and OR evaluate their own operands lazily.
    /// Value nodes are reset to drop the previous record's state. Operator
    /// nodes store their boolean result in their own value.
    pub fn evaluate_node(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        resolver: &dyn FieldResolver,
    ) -> QueryResult<()> {
        let node = tree.node(id);
        let Some(op) = node.operator() else {
            tree.value_mut(id).reset();
            return Ok(());
        };
        let children = node.children.clone();
        if !op.accepts_operands(children.len()) {
            return Err(QueryError::wrong_argument_count(
                op.display(node.negated),
                children.len(),
            ));
        }

        let result = match op {
            Operator::Eq => self.eval_eq(tree, id, &children, resolver)?,
            Operator::In => self.eval_in(tree, id, &children, resolver)?,
            Operator::Like => self.eval_like(tree, id, &children, resolver)?,
            Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
                self.eval_ordering(tree, id, op, &children, resolver)?
            }
            Operator::Between => self.eval_between(tree, id, &children, resolver)?,
            Operator::And | Operator::Or => self.eval_and_or(tree, id, op, &children, resolver)?,
            Operator::Not => self.eval_not(tree, &children, resolver)?,
            Operator::Xor | Operator::Sub => self.eval_xor_sub(tree, id, op, &children, resolver)?,
        };

        tree.value_mut(id).set_bool_result(result);
        Ok(())
    }

    /// Resolve field operands and promote the pair `(a, b)` of comparison `index`.
    ///
    /// `Undefined` means a field had no usable value on this record.
    fn resolve_and_promote(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        index: usize,
        a: NodeId,
        b: NodeId,
        resolver: &dyn FieldResolver,
    ) -> QueryResult<ValueType> {
        let op = tree
            .node(id)
            .operator()
            .ok_or_else(|| QueryError::exec("comparison on a value node"))?;
        let left = tree.value(a).value_type();
        let right = tree.value(b).value_type();

        let cached = tree.value(id).cached_promotion(index, left, right);
        let promoted = match cached {
            Some(promoted) => {
                if !Self::resolve_field(tree.value_mut(a), resolver)
                    || !Self::resolve_field(tree.value_mut(b), resolver)
                {
                    return Ok(ValueType::Undefined);
                }
                promoted
            }
            None => {
                if !Self::set_compare_type(tree.value_mut(a), resolver)
                    || !Self::set_compare_type(tree.value_mut(b), resolver)
                {
                    return Ok(ValueType::Undefined);
                }

                let left = tree.value(a).value_type();
                let right = tree.value(b).value_type();
                let promoted = promote::promoted_type(op, left, right);
                if !promoted.is_defined() {
                    if !tree.value(a).is_field() && !tree.value(b).is_field() {
                        return Err(QueryError::incomparable(
                            &tree.node(a).label(),
                            &tree.node(b).label(),
                            &op.display(tree.node(id).negated),
                        ));
                    }
                    trace!(
                        "Cannot compare {} ({}) with {} ({}), no match",
                        tree.value(a).describe(),
                        left,
                        tree.value(b).describe(),
                        right
                    );
                    return Ok(ValueType::Undefined);
                }
                promoted
            }
        };

        for operand in [a, b] {
            let value = tree.value_mut(operand);
            if value.promote_to(promoted) {
                continue;
            }
            if value.is_field() {
                trace!("Field value {} is not a {}", value.describe(), promoted);
                return Ok(ValueType::Undefined);
            }
            return Err(QueryError::unconvertible_value(
                &tree.node(operand).label(),
                promoted.as_str(),
            ));
        }

        Ok(promoted)
    }

    /// Load a field's value for its current type. False if the record has none.
    fn resolve_field(value: &mut TypedValue, resolver: &dyn FieldResolver) -> bool {
        let Some(id) = value.field_id() else {
            return true;
        };

        match value.value_type() {
            ValueType::FieldBool => resolver.resolve_bool(id).map(|b| value.load_field_bool(b)),
            ValueType::FieldInt => resolver.resolve_int(id).map(|i| value.load_field_int(i)),
            ValueType::FieldFloat => resolver.resolve_float(id).map(|f| value.load_field_float(f)),
            _ => resolver
                .resolve_string(id)
                .map(|s| value.load_field_text(s, false)),
        }
        .is_some()
    }

    /// Load a field as text and guess its type from the value itself
    fn set_compare_type(value: &mut TypedValue, resolver: &dyn FieldResolver) -> bool {
        let Some(id) = value.field_id() else {
            return true;
        };
        if value.value_type() == ValueType::FieldSeqId {
            return Self::resolve_field(value, resolver);
        }

        match resolver.resolve_string(id) {
            Some(text) => {
                value.load_field_text(text, true);
                trace!("Field value {} sniffed as {}", value.describe(), value.value_type());
                true
            }
            None => false,
        }
    }

    fn eval_eq(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let &[a, b] = children else {
            return Err(QueryError::exec("'=' needs two operands"));
        };
        let negated = tree.node(id).negated;
        let promoted = self.resolve_and_promote(tree, id, 0, a, b, resolver)?;

        if !promoted.is_defined() {
            // A missing field equals the empty string
            let (va, vb) = (tree.value(a), tree.value(b));
            let blank = (va.is_field() && vb.is_empty_string_literal())
                || (vb.is_field() && va.is_empty_string_literal());
            return Ok(blank != negated);
        }

        Ok(self.values_equal(tree, a, b, promoted)? != negated)
    }

    fn eval_in(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let negated = tree.node(id).negated;
        let first = children[0];

        let mut found = false;
        for (i, &other) in children.iter().enumerate().skip(1) {
            let promoted = self.resolve_and_promote(tree, id, i - 1, first, other, resolver)?;
            if promoted.is_defined() && self.values_equal(tree, first, other, promoted)? {
                found = true;
                break;
            }
        }

        Ok(found != negated)
    }

    fn eval_like(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let &[a, b] = children else {
            return Err(QueryError::exec("LIKE needs two operands"));
        };
        let promoted = self.resolve_and_promote(tree, id, 0, a, b, resolver)?;
        if promoted != ValueType::String {
            return Ok(false);
        }

        let matched = compare::wildcard_match(
            tree.value(a).as_str(),
            tree.value(b).as_str(),
            self.options.case,
        );
        Ok(matched != tree.node(id).negated)
    }

    fn eval_ordering(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        op: Operator,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let &[a, b] = children else {
            return Err(QueryError::exec(format!("'{}' needs two operands", op.as_str())));
        };
        let promoted = self.resolve_and_promote(tree, id, 0, a, b, resolver)?;
        if !promoted.is_defined() {
            return Ok(false);
        }

        let Some(ordering) = self.compare_values(tree, a, b, promoted) else {
            return Ok(false);
        };
        Ok(match op {
            Operator::Lt => ordering == Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Ge => ordering != Ordering::Less,
            _ => return Err(QueryError::exec(format!("'{}' is not an ordering", op.as_str()))),
        })
    }

    /// `a BETWEEN b AND c`, with the bounds in either order
    fn eval_between(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let &[a, b, c] = children else {
            return Err(QueryError::exec("BETWEEN needs three operands"));
        };

        let promoted = self.resolve_and_promote(tree, id, 0, a, b, resolver)?;
        if !promoted.is_defined() {
            return Ok(false);
        }
        let low = self.compare_values(tree, a, b, promoted);
        let is_gt = low == Some(Ordering::Greater);
        let mut is_eq = low == Some(Ordering::Equal);

        let mut is_lt = false;
        if !is_eq {
            let promoted = self.resolve_and_promote(tree, id, 1, a, c, resolver)?;
            if !promoted.is_defined() {
                return Ok(false);
            }
            let high = self.compare_values(tree, a, c, promoted);
            is_lt = high == Some(Ordering::Less);
            is_eq = high == Some(Ordering::Equal);
        }

        // Inside means above one bound and below the other
        let between = (is_gt == is_lt) || is_eq;
        Ok(between != tree.node(id).negated)
    }

    fn eval_and_or(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        op: Operator,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let is_and = op == Operator::And;
        let mut result = is_and;

        for &child in children {
            self.evaluate_subtree(tree, child, resolver)?;
            let value = self.operand_bool(tree, child, resolver)?;
            if value != is_and {
                result = value;
                break;
            }
        }

        Ok(result != tree.node(id).negated)
    }

    fn eval_not(
        &mut self,
        tree: &mut QueryTree,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let &[operand] = children else {
            return Err(QueryError::exec("NOT needs one operand"));
        };
        Ok(!self.operand_bool(tree, operand, resolver)?)
    }

    fn eval_xor_sub(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        op: Operator,
        children: &[NodeId],
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        let &[a, b] = children else {
            return Err(QueryError::exec(format!("{} needs two operands", op.as_str())));
        };
        let left = self.operand_bool(tree, a, resolver)?;
        let right = self.operand_bool(tree, b, resolver)?;

        let result = match op {
            Operator::Sub => left && !right,
            Operator::Xor => left != right,
            _ => return Err(QueryError::exec(format!("unexpected logical operator {}", op.as_str()))),
        };
        Ok(result != tree.node(id).negated)
    }

    /// Boolean value of a logical operand. Fields must resolve to a boolean.
    fn operand_bool(
        &mut self,
        tree: &mut QueryTree,
        id: NodeId,
        resolver: &dyn FieldResolver,
    ) -> QueryResult<bool> {
        if !tree.node(id).is_value() {
            return Ok(tree.value(id).as_bool());
        }

        let value = tree.value_mut(id);
        if let Some(field) = value.field_id() {
            return match resolver.resolve_bool(field) {
                Some(b) => {
                    value.load_field_bool(b);
                    Ok(b)
                }
                None => {
                    let node = tree.node(id);
                    let name = node.name().map(str::to_string).unwrap_or_else(|| node.label());
                    Err(QueryError::unconvertible_field(&name))
                }
            };
        }

        if value.promote_to(ValueType::Bool) {
            Ok(value.as_bool())
        } else {
            Err(QueryError::unconvertible_value(
                &tree.node(id).label(),
                ValueType::Bool.as_str(),
            ))
        }
    }

    fn values_equal(
        &mut self,
        tree: &QueryTree,
        a: NodeId,
        b: NodeId,
        promoted: ValueType,
    ) -> QueryResult<bool> {
        let (va, vb) = (tree.value(a), tree.value(b));
        match promoted {
            ValueType::Bool => Ok(va.as_bool() == vb.as_bool()),
            ValueType::Int => Ok(va.as_int() == vb.as_int()),
            ValueType::Float => Ok(va.as_float() == vb.as_float()),
            ValueType::String => {
                if self.options.matching != StringMatching::Plain && va.is_field() != vb.is_field() {
                    let (field, pattern) = if va.is_field() { (va, vb) } else { (vb, va) };
                    self.pattern_match(field.as_str(), pattern.as_str())
                } else {
                    Ok(compare::strings_equal(va.as_str(), vb.as_str(), self.options.case))
                }
            }
            ValueType::SeqId => Ok(self.seq_ids_equal(va.as_str(), vb.as_str())),
            other => Err(QueryError::exec(format!("cannot test {} values for equality", other))),
        }
    }

    fn compare_values(
        &self,
        tree: &QueryTree,
        a: NodeId,
        b: NodeId,
        promoted: ValueType,
    ) -> Option<Ordering> {
        let (va, vb) = (tree.value(a), tree.value(b));
        match promoted {
            ValueType::Bool => Some(va.as_bool().cmp(&vb.as_bool())),
            ValueType::Int => Some(va.as_int().cmp(&vb.as_int())),
            ValueType::Float => va.as_float().partial_cmp(&vb.as_float()),
            ValueType::String | ValueType::SeqId => Some(compare::compare_strings(
                va.as_str(),
                vb.as_str(),
                self.options.case,
            )),
            _ => None,
        }
    }

    fn seq_ids_equal(&self, a: &str, b: &str) -> bool {
        if compare::strings_equal(a, b, CaseSensitivity::Insensitive) {
            true
        } else if a.trim().is_empty() || b.trim().is_empty() {
            false
        } else {
            self.seq_ids.equal(a, b)
        }
    }

    fn pattern_match(&mut self, text: &str, pattern: &str) -> QueryResult<bool> {
        match self.options.matching {
            StringMatching::Plain => Ok(compare::strings_equal(text, pattern, self.options.case)),
            StringMatching::Wildcard => Ok(compare::wildcard_match(text, pattern, self.options.case)),
            StringMatching::Regex => {
                if !self.regex_cache.contains_key(pattern) {
                    let regex = RegexBuilder::new(pattern)
                        .case_insensitive(self.options.case == CaseSensitivity::Insensitive)
                        .build()
                        .map_err(|e| QueryError::InvalidPattern {
                            pattern: pattern.to_string(),
                            reason: e.to_string(),
                        })?;
                    self.regex_cache.insert(pattern.to_string(), regex);
                }
                Ok(self
                    .regex_cache
                    .get(pattern)
                    .map_or(false, |regex| regex.is_match(text)))
            }
        }
    }
}
