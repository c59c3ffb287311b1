//! Query runner.
//!
//! Parses and preprocesses a query once against a field catalog, then
//! evaluates it record by record.

use crate::parse::parse_query;
use crate::query::{Evaluator, QueryOptions, QueryResult, QueryTree, SeqIdComparator};
use crate::record::{FieldCatalog, Record, RecordResolver};
use anyhow::{Context, Result};
use log::{debug, info};

/// Counters for one filtering pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub evaluated: usize,
    pub matched: usize,
}

pub struct QueryRunner {
    tree: QueryTree,
    evaluator: Evaluator,
    catalog: FieldCatalog,
}

impl QueryRunner {
    /// Parse `query` and prepare it for the fields in `catalog`
    pub fn new(query: &str, options: QueryOptions, catalog: FieldCatalog) -> Result<Self> {
        Self::with_evaluator(query, Evaluator::new(options), catalog)
    }

    /// Like `new`, with a custom comparator for `seq-id` equality
    pub fn with_seq_id_comparator(
        query: &str,
        options: QueryOptions,
        catalog: FieldCatalog,
        comparator: Box<dyn SeqIdComparator>,
    ) -> Result<Self> {
        let evaluator = Evaluator::new(options).with_seq_id_comparator(comparator);
        Self::with_evaluator(query, evaluator, catalog)
    }

    fn with_evaluator(query: &str, mut evaluator: Evaluator, catalog: FieldCatalog) -> Result<Self> {
        let mut tree =
            parse_query(query).with_context(|| format!("Failed to parse query: {}", query))?;
        evaluator
            .preprocess(&mut tree, &catalog)
            .with_context(|| format!("Failed to prepare query: {}", query))?;
        debug!("Query ready over {} known fields", catalog.len());

        Ok(Self {
            tree,
            evaluator,
            catalog,
        })
    }

    pub fn query(&self) -> &QueryTree {
        &self.tree
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Evaluate the query for one record
    pub fn matches(&mut self, record: &Record) -> QueryResult<bool> {
        let resolver = RecordResolver::new(&self.catalog, record);
        self.evaluator.evaluate(&mut self.tree, &resolver)
    }

    /// Indices of the matching records. Stops at the first fatal error.
    pub fn filter<'r>(
        &mut self,
        records: impl IntoIterator<Item = &'r Record>,
    ) -> QueryResult<(Vec<usize>, RunStats)> {
        let mut matched = Vec::new();
        let mut stats = RunStats::default();

        for (index, record) in records.into_iter().enumerate() {
            stats.evaluated += 1;
            if self.matches(record)? {
                stats.matched += 1;
                matched.push(index);
            }
        }

        info!(
            "Query {} matched {} of {} records",
            self.tree, stats.matched, stats.evaluated
        );
        Ok((matched, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FieldType, QueryError};
    use crate::record::{Schema, Value};

    fn people() -> Vec<Record> {
        vec![
            Record::new()
                .with("name", Value::String("ann".to_string()))
                .with("age", Value::Int(31)),
            Record::new()
                .with("name", Value::String("bob".to_string()))
                .with("age", Value::Int(22)),
            Record::new().with("name", Value::String("cy".to_string())),
        ]
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_schema(
            &Schema::new()
                .with_field("name", FieldType::String)
                .with_field("age", FieldType::Int),
        )
    }

    #[test]
    fn test_filter() {
        let records = people();
        let mut runner = QueryRunner::new("age > 27", QueryOptions::default(), catalog()).unwrap();
        let (matched, stats) = runner.filter(&records).unwrap();

        assert_eq!(matched, vec![0]);
        assert_eq!(
            stats,
            RunStats {
                evaluated: 3,
                matched: 1
            }
        );
    }

    #[test]
    fn test_runner_is_reusable() {
        let records = people();
        let mut runner =
            QueryRunner::new("name IN (\"bob\", \"cy\")", QueryOptions::default(), catalog())
                .unwrap();
        assert!(!runner.matches(&records[0]).unwrap());
        assert!(runner.matches(&records[1]).unwrap());
        assert!(runner.matches(&records[2]).unwrap());
        assert!(!runner.matches(&records[0]).unwrap());
    }

    #[test]
    fn test_prepare_errors() {
        assert!(QueryRunner::new("age >", QueryOptions::default(), catalog()).is_err());

        let err = QueryRunner::new("\"abc\" = true", QueryOptions::default(), catalog())
            .err()
            .unwrap();
        let query_error = err.downcast_ref::<QueryError>().unwrap();
        assert!(matches!(query_error, QueryError::IncompatibleType { .. }));
    }

    #[test]
    fn test_evaluation_error_stops_filter() {
        let records = vec![Record::new().with("name", Value::String("bob".to_string()))];
        let mut runner = QueryRunner::new("name AND true", QueryOptions::default(), catalog())
            .unwrap();
        assert!(runner.filter(&records).is_err());
    }
}
