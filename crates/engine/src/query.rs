//! The external query protocol and the adapter that embeds query objects in
//! expressions.
//!
//! Query objects are opaque to the language. They come in two shapes:
//! single-candidate predicates ([`MatchQuery`]) and whole-sequence
//! operations ([`SequenceQuery`]). [`QueryObject`] is the closed union of
//! the two; the adapter resolves the shape once per evaluation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::ast::{Expression, Operator, THIS};
use crate::context::EvaluationContext;
use crate::engine::{evaluate, evaluate_as_sequence};
use crate::error::QueryError;
use crate::value::{Sequence, Value};

/// A query that tests one candidate at a time.
///
/// `perform` drives the three-phase protocol: `pre_perform`, then
/// `is_match` per candidate, then `post_perform`, which runs even when a
/// candidate test fails.
pub trait MatchQuery: Send + Sync {
    fn pre_perform(&self) {}

    fn is_match(&self, candidate: &Value) -> Result<bool, QueryError>;

    fn post_perform(&self) {}

    /// Matching candidates in input order.
    fn perform<'s>(&self, input: Sequence<'s>) -> Result<Vec<Value>, QueryError> {
        let _scope = PerformScope::enter(self);
        let mut matches = Vec::new();
        for candidate in input {
            let candidate = candidate?;
            if self.is_match(&candidate)? {
                matches.push(candidate);
            }
        }
        Ok(matches)
    }
}

/// A query that consumes a whole sequence and produces another.
pub trait SequenceQuery: Send + Sync {
    fn perform<'s>(&self, input: Sequence<'s>) -> Result<Sequence<'s>, QueryError>;
}

/// Calls `pre_perform` on entry and `post_perform` on drop.
#[must_use = "post_perform runs as soon as the scope is dropped"]
pub struct PerformScope<'q, Q: MatchQuery + ?Sized> {
    query: &'q Q,
}

impl<'q, Q: MatchQuery + ?Sized> PerformScope<'q, Q> {
    pub fn enter(query: &'q Q) -> Self {
        query.pre_perform();
        Self { query }
    }
}

impl<Q: MatchQuery + ?Sized> Drop for PerformScope<'_, Q> {
    fn drop(&mut self) {
        self.query.post_perform();
    }
}

#[derive(Clone)]
pub enum QueryObject {
    Match(Arc<dyn MatchQuery>),
    Sequence(Arc<dyn SequenceQuery>),
}

impl QueryObject {
    pub fn matching(query: impl MatchQuery + 'static) -> Self {
        QueryObject::Match(Arc::new(query))
    }

    pub fn sequence(query: impl SequenceQuery + 'static) -> Self {
        QueryObject::Sequence(Arc::new(query))
    }

    fn address(&self) -> *const () {
        match self {
            QueryObject::Match(q) => Arc::as_ptr(q) as *const (),
            QueryObject::Sequence(q) => Arc::as_ptr(q) as *const (),
        }
    }
}

impl PartialEq for QueryObject {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for QueryObject {}

impl Hash for QueryObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for QueryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryObject::Match(_) => write!(f, "QueryObject::Match({:p})", self.address()),
            QueryObject::Sequence(_) => write!(f, "QueryObject::Sequence({:p})", self.address()),
        }
    }
}

impl fmt::Display for QueryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryObject::Match(_) => write!(f, "<match query>"),
            QueryObject::Sequence(_) => write!(f, "<sequence query>"),
        }
    }
}

/// Scalar evaluation of the adapter: a boolean for match queries, a
/// materialized list for sequence queries.
pub(crate) fn evaluate_wrapped<'c, 'a: 'c>(
    operands: &'c [Expression],
    ctx: &'c EvaluationContext<'a>,
) -> Result<Value, QueryError> {
    match resolve_query(operands, ctx)? {
        QueryObject::Match(query) => test_candidate(query.as_ref(), operands, ctx).map(Value::Boolean),
        QueryObject::Sequence(query) => {
            let results = perform_sequence(query.as_ref(), operands, ctx)?;
            Ok(Value::list(results.collect::<Result<Vec<_>, _>>()?))
        }
    }
}

pub(crate) fn evaluate_wrapped_as_sequence<'c, 'a: 'c>(
    operands: &'c [Expression],
    ctx: &'c EvaluationContext<'a>,
) -> Result<Sequence<'c>, QueryError> {
    match resolve_query(operands, ctx)? {
        QueryObject::Match(query) => {
            Ok(Value::Boolean(test_candidate(query.as_ref(), operands, ctx)?).into_sequence())
        }
        QueryObject::Sequence(query) => perform_sequence(query.as_ref(), operands, ctx),
    }
}

fn resolve_query(
    operands: &[Expression],
    ctx: &EvaluationContext<'_>,
) -> Result<QueryObject, QueryError> {
    match evaluate(&operands[0], ctx)? {
        Value::Query(query) => Ok(query),
        other => Err(QueryError::type_mismatch(format!(
            "first argument of '{}' must be a recognized query object, got {}",
            Operator::WrappedQuery.name(),
            other.type_name()
        ))),
    }
}

fn test_candidate(
    query: &dyn MatchQuery,
    operands: &[Expression],
    ctx: &EvaluationContext<'_>,
) -> Result<bool, QueryError> {
    let candidate = match operands.get(1) {
        Some(target) => evaluate(target, ctx)?,
        None => ctx.resolve_variable(THIS)?,
    };
    query.is_match(&candidate)
}

fn perform_sequence<'c, 'a: 'c>(
    query: &dyn SequenceQuery,
    operands: &'c [Expression],
    ctx: &'c EvaluationContext<'a>,
) -> Result<Sequence<'c>, QueryError> {
    let input: Sequence<'c> = match operands.get(1) {
        Some(target) => evaluate_as_sequence(target, ctx)?,
        None => ctx.take_everything()?,
    };
    query.perform(input)
}
