//! Collection filters: sequence-to-sequence operators.
//!
//! `select`, `reject`, `collect` and `unique` stream: each pulls one source
//! item per produced item. `latest` has to see the whole source before it
//! can emit, so it groups eagerly when first evaluated.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::trace;
use provql_types::ItemId;

use crate::ast::{Expression, FilterKind, Lambda};
use crate::context::EvaluationContext;
use crate::engine::evaluate_as_sequence;
use crate::error::QueryError;
use crate::value::{Sequence, Value, empty_sequence, sequence_of};

pub(crate) fn apply<'c, 'a: 'c>(
    kind: FilterKind,
    source: &'c Expression,
    lambda: Option<&'c Lambda>,
    ctx: &'c EvaluationContext<'a>,
) -> Result<Sequence<'c>, QueryError> {
    match kind {
        FilterKind::Latest => latest(source, lambda, ctx),
        FilterKind::Select | FilterKind::Reject => {
            let lambda = required(kind, lambda)?;
            let items = evaluate_as_sequence(source, ctx)?;
            let keep = kind == FilterKind::Select;
            Ok(Box::new(LambdaFilter::new(items, lambda, ctx, keep)))
        }
        FilterKind::Collect => {
            let lambda = required(kind, lambda)?;
            let items = evaluate_as_sequence(source, ctx)?;
            Ok(Box::new(items.map(move |item| lambda.apply(item?, ctx))))
        }
        FilterKind::Unique => {
            let mut seen = HashSet::new();
            let items = evaluate_as_sequence(source, ctx)?;
            Ok(Box::new(items.filter(move |item| match item {
                Ok(value) => seen.insert(value.clone()),
                Err(_) => true,
            })))
        }
    }
}

fn required<'c>(kind: FilterKind, lambda: Option<&'c Lambda>) -> Result<&'c Lambda, QueryError> {
    lambda.ok_or_else(|| QueryError::evaluation(kind.name(), 1, "filter requires a lambda"))
}

/// Keeps, per identifier, the item with the greatest version.
///
/// When the source is itself a `select`, its predicate is evaluated inline
/// while grouping instead of streaming through a separate filter. An optional
/// lambda on the `latest` node acts as an additional inline predicate.
///
/// Ties go to the candidate examined last. Winners are emitted in the order
/// their identifier was first seen. Items without an identifier+version shape
/// are skipped.
fn latest<'c, 'a: 'c>(
    source: &'c Expression,
    lambda: Option<&'c Lambda>,
    ctx: &'c EvaluationContext<'a>,
) -> Result<Sequence<'c>, QueryError> {
    let (items, fused) = match source {
        Expression::CollectionFilter {
            kind: FilterKind::Select,
            source: inner,
            lambda: Some(predicate),
        } => {
            trace!("latest: fusing select predicate into the grouping pass");
            (evaluate_as_sequence(inner, ctx)?, Some(predicate))
        }
        _ => (evaluate_as_sequence(source, ctx)?, None),
    };

    let mut items = items.peekable();
    if items.peek().is_none() {
        return Ok(empty_sequence());
    }

    let mut winners: IndexMap<ItemId, Value> = IndexMap::new();
    let mut examined = 0usize;
    'candidates: for item in items {
        let item = item?;
        examined += 1;
        for predicate in [fused, lambda].into_iter().flatten() {
            if !predicate.test(&item, ctx)? {
                continue 'candidates;
            }
        }

        let Some((id, version)) = item.versioned() else {
            continue;
        };
        let replace = winners
            .get(id)
            .and_then(Value::versioned)
            .is_none_or(|(_, best)| version >= best);
        if replace {
            trace!("latest: {} -> {}", id, version);
            let id = id.clone();
            winners.insert(id, item);
        }
    }

    trace!(
        "latest: {} candidates examined, {} identifiers kept",
        examined,
        winners.len()
    );
    Ok(sequence_of(winners.into_values()))
}

/// Streams the source, keeping items whose lambda result equals `keep`.
struct LambdaFilter<'c, 'a> {
    items: Sequence<'c>,
    lambda: &'c Lambda,
    ctx: &'c EvaluationContext<'a>,
    keep: bool,
}

impl<'c, 'a> LambdaFilter<'c, 'a> {
    fn new(
        items: Sequence<'c>,
        lambda: &'c Lambda,
        ctx: &'c EvaluationContext<'a>,
        keep: bool,
    ) -> Self {
        Self {
            items,
            lambda,
            ctx,
            keep,
        }
    }
}

impl Iterator for LambdaFilter<'_, '_> {
    type Item = Result<Value, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.items.next()? {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };
            match self.lambda.test(&item, self.ctx) {
                Ok(passed) if passed == self.keep => return Some(Ok(item)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
