//! WHERE-clause construction from equality filters.

use crate::value::{Value, ValueMap};

/// A parameterized conjunction clause plus its bound arguments.
///
/// The clause always starts from the tautology `1=1`, so an empty filter
/// means "match every row" instead of a syntax error. Values never appear in
/// the clause text; they travel in `args`, in filter order. That is a
/// correctness invariant (injection-proof by construction), not a style
/// choice.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    clause: String,
    args: Vec<Value>,
}

impl Condition {
    /// Builds the clause from a filter's value map.
    pub fn build(filter: &ValueMap) -> Condition {
        let mut clause = String::from("1=1");
        let mut args = Vec::with_capacity(filter.len());
        for (column, value) in filter {
            clause.push_str(" AND ");
            clause.push_str(column);
            clause.push_str("=?");
            args.push(value.clone());
        }
        Condition { clause, args }
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let condition = Condition::build(&ValueMap::new());
        assert_eq!(condition.clause(), "1=1");
        assert!(condition.args().is_empty());
    }

    #[test]
    fn predicates_follow_filter_order() {
        let mut filter = ValueMap::new();
        filter.insert("name", Value::Text("simon".into()));
        filter.insert("age", Value::Integer(30));
        let condition = Condition::build(&filter);
        assert_eq!(condition.clause(), "1=1 AND name=? AND age=?");
        assert_eq!(
            condition.args(),
            &[Value::Text("simon".into()), Value::Integer(30)]
        );
    }
}
