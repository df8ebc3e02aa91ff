//! Expression evaluation entry points.
//!
//! Every node has two evaluation shapes: [`evaluate`] for a scalar result and
//! [`evaluate_as_sequence`] for nodes whose natural result is a collection.
//! Sequence evaluation stays lazy wherever the operator allows it.

use crate::ast::{EVERYTHING, Expression, Lambda, THIS};
use crate::context::EvaluationContext;
use crate::error::QueryError;
use crate::filters;
use crate::operators;
use crate::value::{Sequence, Value};

pub fn evaluate<'c, 'a: 'c>(
    expr: &'c Expression,
    ctx: &'c EvaluationContext<'a>,
) -> Result<Value, QueryError> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Variable(name) if is_working_set(name, ctx) => collect(ctx.take_everything()?),
        Expression::Variable(name) => ctx.resolve_variable(name),
        Expression::Parameter(reference) => ctx.parameter(reference),
        Expression::Lambda(lambda) => {
            let this = ctx.resolve_variable(THIS)?;
            lambda.apply(this, ctx)
        }
        Expression::FunctionCall { operator, operands } => operators::call(*operator, operands, ctx),
        Expression::CollectionFilter { .. } => collect(evaluate_as_sequence(expr, ctx)?),
    }
}

pub fn evaluate_as_sequence<'c, 'a: 'c>(
    expr: &'c Expression,
    ctx: &'c EvaluationContext<'a>,
) -> Result<Sequence<'c>, QueryError> {
    match expr {
        Expression::Variable(name) if is_working_set(name, ctx) => Ok(ctx.take_everything()?),
        Expression::CollectionFilter {
            kind,
            source,
            lambda,
        } => filters::apply(*kind, source, lambda.as_ref(), ctx),
        Expression::FunctionCall { operator, operands } if operator.is_sequence_valued() => {
            operators::call_as_sequence(*operator, operands, ctx)
        }
        _ => Ok(evaluate(expr, ctx)?.into_sequence()),
    }
}

/// Evaluates `expr` as a predicate: only `true` matches.
pub fn evaluate_predicate(expr: &Expression, ctx: &EvaluationContext<'_>) -> Result<bool, QueryError> {
    Ok(evaluate(expr, ctx)?.is_true())
}

/// `everything` names the working set unless a lambda has rebound it.
fn is_working_set(name: &str, ctx: &EvaluationContext<'_>) -> bool {
    name == EVERYTHING && !ctx.is_bound(name)
}

fn collect(sequence: Sequence<'_>) -> Result<Value, QueryError> {
    Ok(Value::list(sequence.collect::<Result<Vec<_>, _>>()?))
}

impl Lambda {
    /// Evaluates the body with the lambda variable bound to `value`. The
    /// binding is released on every exit path.
    pub fn apply(&self, value: Value, ctx: &EvaluationContext<'_>) -> Result<Value, QueryError> {
        let _scope = ctx.push_variable(&self.variable, value);
        evaluate(&self.body, ctx)
    }

    pub fn test(&self, value: &Value, ctx: &EvaluationContext<'_>) -> Result<bool, QueryError> {
        Ok(self.apply(value.clone(), ctx)?.is_true())
    }
}
