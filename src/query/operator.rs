//! Operator definitions for query trees.

/// Operators that can appear as interior nodes of a query tree.
///
/// Negated forms (`!=`, `NOT IN`, `NOT LIKE`, `NOT BETWEEN`) are the base
/// operator with the node's `negated` flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    // Equality
    Eq,
    In,

    // Pattern match
    Like,

    // Ordering
    Lt,
    Le,
    Gt,
    Ge,
    Between,

    // Logical
    And,
    Or,
    Not,
    Xor,
    Sub,
}

/// Operator families that share a promotion table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    Equality,
    Ordering,
    Pattern,
    Logical,
}

impl Operator {
    pub fn family(self) -> OperatorFamily {
        match self {
            Operator::Eq | Operator::In => OperatorFamily::Equality,
            Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge | Operator::Between => {
                OperatorFamily::Ordering
            }
            Operator::Like => OperatorFamily::Pattern,
            Operator::And | Operator::Or | Operator::Not | Operator::Xor | Operator::Sub => {
                OperatorFamily::Logical
            }
        }
    }

    pub fn is_logical(self) -> bool {
        self.family() == OperatorFamily::Logical
    }

    /// Minimum and maximum operand count (`None` for unbounded)
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Operator::Not => (1, Some(1)),
            Operator::Between => (3, Some(3)),
            Operator::In | Operator::And | Operator::Or => (2, None),
            Operator::Eq
            | Operator::Like
            | Operator::Lt
            | Operator::Le
            | Operator::Gt
            | Operator::Ge
            | Operator::Xor
            | Operator::Sub => (2, Some(2)),
        }
    }

    /// Check if `count` operands are acceptable for this operator
    pub fn accepts_operands(self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && max.map_or(true, |max| count <= max)
    }

    /// Get the display string for this operator
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::In => "IN",
            Operator::Like => "LIKE",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Between => "BETWEEN",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::Xor => "XOR",
            Operator::Sub => "SUB",
        }
    }

    /// Display string including the negation flag of a node
    pub fn display(self, negated: bool) -> String {
        match (self, negated) {
            (Operator::Eq, true) => "!=".to_string(),
            (op, true) => format!("NOT {}", op.as_str()),
            (op, false) => op.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_families() {
        assert_eq!(Operator::Eq.family(), OperatorFamily::Equality);
        assert_eq!(Operator::In.family(), OperatorFamily::Equality);
        assert_eq!(Operator::Between.family(), OperatorFamily::Ordering);
        assert_eq!(Operator::Like.family(), OperatorFamily::Pattern);
        assert!(Operator::Sub.is_logical());
        assert!(!Operator::Ge.is_logical());
    }

    #[test]
    fn test_operator_arity() {
        assert!(Operator::Not.accepts_operands(1));
        assert!(!Operator::Not.accepts_operands(2));
        assert!(Operator::Between.accepts_operands(3));
        assert!(!Operator::Between.accepts_operands(2));
        assert!(Operator::In.accepts_operands(7));
        assert!(!Operator::In.accepts_operands(1));
        assert!(Operator::And.accepts_operands(4));
        assert!(!Operator::Eq.accepts_operands(3));
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(Operator::Eq.display(false), "=");
        assert_eq!(Operator::Eq.display(true), "!=");
        assert_eq!(Operator::In.display(true), "NOT IN");
        assert_eq!(Operator::Like.display(true), "NOT LIKE");
        assert_eq!(Operator::And.as_str(), "AND");
    }
}
