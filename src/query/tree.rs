//! Arena-allocated query trees.
//!
//! Nodes are stored in a flat vector and refer to their children by index.
//! Every node owns the `TypedValue` the evaluator works on, so one parsed tree
//! is reused for every record.

use crate::query::operator::Operator;
use crate::query::typed_value::TypedValue;
use std::fmt;

/// Index of a node in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Syntactic kind of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Quoted string or bare word
    Text { text: String, quoted: bool },
    /// Name that can only refer to a field
    Identifier(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Operator(Operator),
}

#[derive(Debug, Clone)]
pub struct QueryNode {
    pub kind: NodeKind,
    /// `!=`, `NOT IN`, `NOT LIKE`, `NOT BETWEEN`
    pub negated: bool,
    pub children: Vec<NodeId>,
    pub value: TypedValue,
}

impl QueryNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            negated: false,
            children: Vec::new(),
            value: TypedValue::undefined(),
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            NodeKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Check if this node is a value (leaf) rather than an operator
    pub fn is_value(&self) -> bool {
        !matches!(self.kind, NodeKind::Operator(_))
    }

    /// Raw text of a word, string or identifier node
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text, .. } => Some(text),
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Text of the node as written in the query
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Text { text, quoted: true } => format!("\"{}\"", text),
            NodeKind::Text { text, quoted: false } => text.clone(),
            NodeKind::Identifier(name) => format!("`{}`", name),
            NodeKind::Bool(b) => b.to_string(),
            NodeKind::Int(i) => i.to_string(),
            NodeKind::Float(f) => f.to_string(),
            NodeKind::Operator(op) => op.display(self.negated),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryTree {
    nodes: Vec<QueryNode>,
    root: Option<NodeId>,
}

impl QueryTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: QueryNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_text(&mut self, text: impl Into<String>, quoted: bool) -> NodeId {
        self.push(QueryNode::new(NodeKind::Text {
            text: text.into(),
            quoted,
        }))
    }

    pub fn add_identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.push(QueryNode::new(NodeKind::Identifier(name.into())))
    }

    pub fn add_bool(&mut self, value: bool) -> NodeId {
        self.push(QueryNode::new(NodeKind::Bool(value)))
    }

    pub fn add_int(&mut self, value: i64) -> NodeId {
        self.push(QueryNode::new(NodeKind::Int(value)))
    }

    pub fn add_float(&mut self, value: f64) -> NodeId {
        self.push(QueryNode::new(NodeKind::Float(value)))
    }

    pub fn add_operator(&mut self, op: Operator, negated: bool, children: Vec<NodeId>) -> NodeId {
        let mut node = QueryNode::new(NodeKind::Operator(op));
        node.negated = negated;
        node.children = children;
        self.push(node)
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &QueryNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn value(&self, id: NodeId) -> &TypedValue {
        &self.nodes[id.0].value
    }

    pub fn value_mut(&mut self, id: NodeId) -> &mut TypedValue {
        &mut self.nodes[id.0].value
    }

    /// Nodes reachable from the root, children before parents.
    ///
    /// Visits every node, which is what preprocessing needs. Per-record
    /// evaluation uses `evaluation_order` instead.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if let Some(root) = self.root {
            self.collect_post_order(root, &mut order);
        }
        order
    }

    fn collect_post_order(&self, id: NodeId, order: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            self.collect_post_order(child, order);
        }
        order.push(id);
    }

    /// Post-order from `from` that stops at AND and OR nodes.
    ///
    /// AND and OR evaluate their own operands one at a time to short
    /// circuit, so their subtrees are left out.
    pub fn evaluation_order(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.collect_evaluation_order(from, &mut order);
        order
    }

    fn collect_evaluation_order(&self, id: NodeId, order: &mut Vec<NodeId>) {
        let node = &self.nodes[id.0];
        if !matches!(node.operator(), Some(Operator::And | Operator::Or)) {
            for &child in &node.children {
                self.collect_evaluation_order(child, order);
            }
        }
        order.push(id);
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node(id);
        let Some(op) = node.operator() else {
            return f.write_str(&node.label());
        };

        match (op, node.children.as_slice()) {
            (Operator::Not, [operand]) => {
                f.write_str("NOT ")?;
                self.fmt_node(*operand, f)
            }
            (Operator::In, [first, rest @ ..]) => {
                self.fmt_node(*first, f)?;
                write!(f, " {} (", op.display(node.negated))?;
                for (i, child) in rest.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.fmt_node(*child, f)?;
                }
                f.write_str(")")
            }
            (Operator::Between, [subject, low, high]) => {
                self.fmt_node(*subject, f)?;
                write!(f, " {} ", op.display(node.negated))?;
                self.fmt_node(*low, f)?;
                f.write_str(" AND ")?;
                self.fmt_node(*high, f)
            }
            (_, children) => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.display(node.negated))?;
                    }
                    self.fmt_node(*child, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for QueryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.fmt_node(root, f),
            None => f.write_str("<empty>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryTree {
        // age > 27 AND name IN ("a", "b")
        let mut tree = QueryTree::new();
        let age = tree.add_text("age", false);
        let lit = tree.add_int(27);
        let gt = tree.add_operator(Operator::Gt, false, vec![age, lit]);
        let name = tree.add_text("name", false);
        let a = tree.add_text("a", true);
        let b = tree.add_text("b", true);
        let within = tree.add_operator(Operator::In, false, vec![name, a, b]);
        let and = tree.add_operator(Operator::And, false, vec![gt, within]);
        tree.set_root(and);
        tree
    }

    #[test]
    fn test_post_order() {
        let tree = sample();
        let order = tree.post_order();
        assert_eq!(order.len(), tree.len());
        assert_eq!(order.last(), tree.root().as_ref());
        // children come before parents
        for (pos, id) in order.iter().enumerate() {
            for child in tree.children(*id) {
                let child_pos = order.iter().position(|n| n == child).unwrap();
                assert!(child_pos < pos);
            }
        }
    }

    #[test]
    fn test_evaluation_order_stops_at_and_or() {
        let tree = sample();
        let root = tree.root().unwrap();
        assert_eq!(tree.evaluation_order(root), vec![root]);

        let gt = tree.children(root)[0];
        let order = tree.evaluation_order(gt);
        assert_eq!(order.len(), 3);
        assert_eq!(order.last(), Some(&gt));
    }

    #[test]
    fn test_display() {
        let tree = sample();
        assert_eq!(tree.to_string(), "((age > 27) AND name IN (\"a\", \"b\"))");
        assert_eq!(QueryTree::new().to_string(), "<empty>");
    }

    #[test]
    fn test_negated_label() {
        let mut tree = QueryTree::new();
        let a = tree.add_text("a", false);
        let b = tree.add_text("b", false);
        let ne = tree.add_operator(Operator::Eq, true, vec![a, b]);
        tree.set_root(ne);
        assert_eq!(tree.to_string(), "(a != b)");
        assert!(!tree.node(ne).is_value());
        assert!(tree.node(a).is_value());
    }
}
