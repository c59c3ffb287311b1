//! Typed query evaluation.
//!
//! This module provides:
//! - Query trees with a typed value on every node
//! - Type promotion rules per operator family
//! - One-time preprocessing and per-record evaluation with tri-state comparisons
//! - The resolver contracts the evaluator reads field values through

pub mod classify;
pub mod compare;
pub mod error;
pub mod eval;
pub mod operator;
pub mod promote;
pub mod resolver;
pub mod tree;
pub mod typed_value;
pub mod value_type;

pub use compare::{CaseSensitivity, QueryOptions, StringMatching};
pub use error::{QueryError, QueryResult};
pub use eval::Evaluator;
pub use operator::{Operator, OperatorFamily};
pub use promote::{PromotionRule, PromotionRules};
pub use resolver::{AccessionMatcher, FieldId, FieldResolver, FieldType, SeqIdComparator};
pub use tree::{NodeId, NodeKind, QueryNode, QueryTree};
pub use typed_value::TypedValue;
pub use value_type::ValueType;
