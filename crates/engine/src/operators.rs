use std::cmp::Ordering;

use log::warn;
use provql_types::VersionRange;
use regex::Regex;

use crate::ast::{Expression, Lambda, Operator};
use crate::context::EvaluationContext;
use crate::engine::{evaluate, evaluate_as_sequence};
use crate::error::QueryError;
use crate::query;
use crate::value::{Sequence, Value};

pub(crate) fn call<'c, 'a: 'c>(
    operator: Operator,
    operands: &'c [Expression],
    ctx: &'c EvaluationContext<'a>,
) -> Result<Value, QueryError> {
    check_arity(operator, operands)?;
    match operator {
        Operator::Equals => {
            let (left, right) = evaluate_pair(operands, ctx)?;
            Ok(Value::Boolean(values_equal(&left, &right)))
        }
        Operator::NotEquals => {
            let (left, right) = evaluate_pair(operands, ctx)?;
            Ok(Value::Boolean(!values_equal(&left, &right)))
        }
        Operator::Less | Operator::LessOrEqual | Operator::Greater | Operator::GreaterOrEqual => {
            evaluate_ordering(operator, operands, ctx)
        }
        Operator::And => {
            for operand in operands {
                if !evaluate(operand, ctx)?.is_true() {
                    return Ok(Value::Boolean(false));
                }
            }
            Ok(Value::Boolean(true))
        }
        Operator::Or => {
            for operand in operands {
                if evaluate(operand, ctx)?.is_true() {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        Operator::Not => Ok(Value::Boolean(!evaluate(&operands[0], ctx)?.is_true())),
        Operator::Member => evaluate_member(operands, ctx),
        Operator::Matches => evaluate_matches(operands, ctx),
        Operator::Translated => evaluate_translated(operands, ctx),
        Operator::Exists | Operator::All | Operator::First => {
            evaluate_quantified(operator, operands, ctx)
        }
        Operator::Count => {
            let mut count = 0i64;
            for item in evaluate_as_sequence(&operands[0], ctx)? {
                item?;
                count += 1;
            }
            Ok(Value::Integer(count))
        }
        Operator::Limit => {
            let items = limit(operands, ctx)?.collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(items))
        }
        Operator::WrappedQuery => query::evaluate_wrapped(operands, ctx),
    }
}

pub(crate) fn call_as_sequence<'c, 'a: 'c>(
    operator: Operator,
    operands: &'c [Expression],
    ctx: &'c EvaluationContext<'a>,
) -> Result<Sequence<'c>, QueryError> {
    check_arity(operator, operands)?;
    match operator {
        Operator::Limit => limit(operands, ctx),
        Operator::WrappedQuery => query::evaluate_wrapped_as_sequence(operands, ctx),
        _ => Ok(call(operator, operands, ctx)?.into_sequence()),
    }
}

fn check_arity(operator: Operator, operands: &[Expression]) -> Result<(), QueryError> {
    let (min, max) = operator.arity();
    let count = operands.len();
    if count < min || max.is_some_and(|max| count > max) {
        let expected = match max {
            Some(max) if max == min => format!("{}", min),
            Some(max) => format!("{} to {}", min, max),
            None => format!("at least {}", min),
        };
        // first missing operand, or first surplus one
        let operand = match max {
            Some(max) if count > max => max,
            _ => count,
        };
        return Err(QueryError::evaluation(
            operator.name(),
            operand,
            format!("expected {} operands, got {}", expected, count),
        ));
    }
    Ok(())
}

fn evaluate_pair(
    operands: &[Expression],
    ctx: &EvaluationContext<'_>,
) -> Result<(Value, Value), QueryError> {
    Ok((evaluate(&operands[0], ctx)?, evaluate(&operands[1], ctx)?))
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match left.compare(right) {
        Some(ordering) => ordering == Ordering::Equal,
        None => left == right,
    }
}

fn evaluate_ordering(
    operator: Operator,
    operands: &[Expression],
    ctx: &EvaluationContext<'_>,
) -> Result<Value, QueryError> {
    let (left, right) = evaluate_pair(operands, ctx)?;
    let ordering = left.compare(&right).ok_or_else(|| {
        QueryError::evaluation(
            operator.name(),
            1,
            format!("cannot compare {} with {}", left.type_name(), right.type_name()),
        )
    })?;
    Ok(Value::Boolean(match operator {
        Operator::Less => ordering.is_lt(),
        Operator::LessOrEqual => ordering.is_le(),
        Operator::Greater => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

fn property_name(
    operator: Operator,
    operands: &[Expression],
    ctx: &EvaluationContext<'_>,
) -> Result<String, QueryError> {
    match evaluate(&operands[1], ctx)? {
        Value::String(name) => Ok(name),
        other => Err(QueryError::evaluation(
            operator.name(),
            1,
            format!("property name must be a string, got {}", other.type_name()),
        )),
    }
}

fn property_of(operator: Operator, target: &Value, name: &str) -> Result<Value, QueryError> {
    match target {
        Value::Record(record) => Ok(record.property(name).cloned().unwrap_or(Value::Null)),
        Value::Null => Ok(Value::Null),
        other => Err(QueryError::evaluation(
            operator.name(),
            0,
            format!("cannot read property '{}' of {}", name, other.type_name()),
        )),
    }
}

fn evaluate_member(operands: &[Expression], ctx: &EvaluationContext<'_>) -> Result<Value, QueryError> {
    let target = evaluate(&operands[0], ctx)?;
    let name = property_name(Operator::Member, operands, ctx)?;
    property_of(Operator::Member, &target, &name)
}

fn evaluate_matches(operands: &[Expression], ctx: &EvaluationContext<'_>) -> Result<Value, QueryError> {
    let (left, right) = evaluate_pair(operands, ctx)?;
    let matched = match (&left, &right) {
        (Value::Version(version), Value::Range(range)) => range.contains(version),
        (Value::Version(version), Value::String(range)) => VersionRange::parse(range)
            .map_err(|e| QueryError::evaluation(Operator::Matches.name(), 1, e.to_string()))?
            .contains(version),
        (Value::String(_) | Value::Id(_), Value::String(pattern)) => {
            wildcard_regex(pattern)?.is_match(left.as_str().unwrap_or_default())
        }
        (Value::Record(record), Value::String(kind)) => record.kind() == kind,
        _ => values_equal(&left, &right),
    };
    Ok(Value::Boolean(matched))
}

/// Compiles a pattern where `*` stands for any run of characters into an
/// anchored regex. Every other character matches itself.
fn wildcard_regex(pattern: &str) -> Result<Regex, QueryError> {
    let literal: Vec<String> = pattern.split('*').map(regex::escape).collect();
    Regex::new(&format!("(?s)^{}$", literal.join(".*")))
        .map_err(|e| QueryError::evaluation(Operator::Matches.name(), 1, e.to_string()))
}

fn evaluate_translated(
    operands: &[Expression],
    ctx: &EvaluationContext<'_>,
) -> Result<Value, QueryError> {
    let target = evaluate(&operands[0], ctx)?;
    let name = property_name(Operator::Translated, operands, ctx)?;
    let raw = property_of(Operator::Translated, &target, &name)?;

    // Only values of the form `%key` are translation keys.
    let Some(key) = raw.as_str().and_then(|s| s.strip_prefix('%')).map(str::to_string) else {
        return Ok(raw);
    };

    match ctx.translation_support() {
        Some(binding) => match binding.resolve(&key) {
            Some(text) => Ok(Value::String(text)),
            None if binding.fallback() => Ok(raw),
            None => Ok(Value::Null),
        },
        None => {
            warn!(
                "property '{}' needs translation but the context has no translation support",
                name
            );
            Ok(raw)
        }
    }
}

fn lambda_operand<'e>(operator: Operator, operands: &'e [Expression]) -> Result<&'e Lambda, QueryError> {
    match &operands[1] {
        Expression::Lambda(lambda) => Ok(lambda),
        _ => Err(QueryError::evaluation(operator.name(), 1, "expected a lambda")),
    }
}

fn evaluate_quantified(
    operator: Operator,
    operands: &[Expression],
    ctx: &EvaluationContext<'_>,
) -> Result<Value, QueryError> {
    let lambda = lambda_operand(operator, operands)?;
    let items = evaluate_as_sequence(&operands[0], ctx)?;

    match operator {
        Operator::Exists => {
            for item in items {
                if lambda.test(&item?, ctx)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        Operator::All => {
            for item in items {
                if !lambda.test(&item?, ctx)? {
                    return Ok(Value::Boolean(false));
                }
            }
            Ok(Value::Boolean(true))
        }
        _ => {
            for item in items {
                let item = item?;
                if lambda.test(&item, ctx)? {
                    return Ok(item);
                }
            }
            Ok(Value::Null)
        }
    }
}

fn limit<'c, 'a: 'c>(
    operands: &'c [Expression],
    ctx: &'c EvaluationContext<'a>,
) -> Result<Sequence<'c>, QueryError> {
    let count = match evaluate(&operands[1], ctx)? {
        Value::Integer(n) if n >= 0 => usize::try_from(n).map_err(|_| {
            QueryError::evaluation(
                Operator::Limit.name(),
                1,
                format!("limit {} exceeds the platform's addressable size", n),
            )
        })?,
        other => {
            return Err(QueryError::evaluation(
                Operator::Limit.name(),
                1,
                format!("limit must be a non-negative integer, got {}", other),
            ));
        }
    };
    Ok(Box::new(evaluate_as_sequence(&operands[0], ctx)?.take(count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Parameters;
    use crate::value::{Record, sequence_of};
    use provql_types::Version;

    fn unit(id: &str, version: &str) -> Value {
        Value::from(
            Record::versioned("unit", id, Version::parse(version).unwrap())
                .with("name", format!("%{}.name", id))
                .with("vendor", "Example Corp"),
        )
    }

    fn eval(expr: &Expression) -> Result<Value, QueryError> {
        let ctx = EvaluationContext::new();
        let _this = ctx.push_variable(crate::ast::THIS, unit("core", "1.2.0"));
        evaluate(expr, &ctx)
    }

    #[test]
    fn test_equality_across_id_and_string() {
        let expr = Expression::this().member("id").equals(Expression::literal("core"));
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(true));

        let expr = Expression::this().member("id").not_equals(Expression::literal("core"));
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_equality_of_incomparable_kinds_is_false() {
        let expr = Expression::literal(1).equals(Expression::literal("1"));
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_version_ordering_with_string_coercion() {
        let expr = Expression::this().member("version").greater_or_equal(Expression::literal("1.2"));
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(true));

        let expr = Expression::this().member("version").less(Expression::literal("1.1"));
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_ordering_incomparable_is_error() {
        let expr = Expression::literal(true).less(Expression::literal(3));
        let err = eval(&expr).unwrap_err();
        assert!(matches!(
            err,
            QueryError::Evaluation { ref operator, operand: 1, .. } if operator == "<"
        ));
    }

    #[test]
    fn test_and_short_circuits() {
        // The right operand would fail if evaluated.
        let failing = Expression::literal(true).less(Expression::literal(3));
        let expr = Expression::literal(false).and(failing.clone());
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(false));

        let expr = Expression::literal(true).or(failing);
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_not() {
        let expr = Expression::literal(false).negate();
        assert_eq!(eval(&expr).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_member_missing_property_is_null() {
        let expr = Expression::this().member("nope");
        assert_eq!(eval(&expr).unwrap(), Value::Null);

        let err = eval(&Expression::literal(3).member("id")).unwrap_err();
        assert!(matches!(err, QueryError::Evaluation { operand: 0, .. }));
    }

    #[test]
    fn test_matches_version_range_and_glob() {
        let in_range = Expression::this().member("version").matches(Expression::literal("[1.0,2.0)"));
        assert_eq!(eval(&in_range).unwrap(), Value::Boolean(true));

        let outside = Expression::this()
            .member("version")
            .matches(Expression::literal(VersionRange::parse("[2.0,3.0)").unwrap()));
        assert_eq!(eval(&outside).unwrap(), Value::Boolean(false));

        let glob = Expression::this().member("vendor").matches(Expression::literal("Example*"));
        assert_eq!(eval(&glob).unwrap(), Value::Boolean(true));

        let kind = Expression::this().matches(Expression::literal("unit"));
        assert_eq!(eval(&kind).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_matches_bad_range_is_error() {
        let expr = Expression::this().member("version").matches(Expression::literal("[1.0"));
        assert!(matches!(
            eval(&expr).unwrap_err(),
            QueryError::Evaluation { operand: 1, .. }
        ));
    }

    #[test]
    fn test_wildcard_regex() {
        let wildcard = |pattern: &str, text: &str| wildcard_regex(pattern).unwrap().is_match(text);
        assert!(wildcard("*", ""));
        assert!(wildcard("**", "anything"));
        assert!(wildcard("org.*", "org.example"));
        assert!(wildcard("*.ui", "org.example.ui"));
        assert!(wildcard("org.*.ui", "org.example.ui"));
        assert!(wildcard("a*b*c", "aXbYc"));
        assert!(!wildcard("a*b*c", "aXc"));
        assert!(!wildcard("ab*ba", "aba"));
        assert!(wildcard("exact", "exact"));
        assert!(!wildcard("exact", "exactly"));
        // regex metacharacters are literal
        assert!(!wildcard("org.example", "orgXexample"));
        assert!(wildcard("v(1)+[2]", "v(1)+[2]"));
        assert!(wildcard("a*", "a\nb"));
    }

    #[test]
    fn test_arity_checked() {
        let expr = Expression::call(Operator::Equals, vec![Expression::literal(1)]);
        assert!(matches!(
            eval(&expr).unwrap_err(),
            QueryError::Evaluation { ref operator, operand: 1, .. } if operator == "=="
        ));

        let surplus = Expression::call(
            Operator::Not,
            vec![Expression::literal(true), Expression::literal(false), Expression::literal(true)],
        );
        assert!(matches!(
            eval(&surplus).unwrap_err(),
            QueryError::Evaluation { ref operator, operand: 1, .. } if operator == "!"
        ));

        let missing = Expression::call(Operator::Count, vec![]);
        assert!(matches!(
            eval(&missing).unwrap_err(),
            QueryError::Evaluation { operand: 0, .. }
        ));
    }

    #[test]
    fn test_quantifiers_short_circuit() {
        let items = vec![unit("a", "1.0"), unit("b", "2.0"), unit("c", "3.0")];
        let newer = |v: &str| {
            Lambda::new("x", Expression::variable("x").member("version").greater(Expression::literal(v)))
        };

        let ctx = EvaluationContext::new().with_everything(sequence_of(items.clone()));
        let exists = Expression::everything().exists(newer("2.5"));
        assert_eq!(evaluate(&exists, &ctx).unwrap(), Value::Boolean(true));

        let ctx = EvaluationContext::new().with_everything(sequence_of(items.clone()));
        let all = Expression::everything().all(newer("1.5"));
        assert_eq!(evaluate(&all, &ctx).unwrap(), Value::Boolean(false));

        let ctx = EvaluationContext::new().with_everything(sequence_of(items.clone()));
        let first = Expression::everything().first(newer("1.5"));
        assert_eq!(evaluate(&first, &ctx).unwrap(), items[1]);

        let ctx = EvaluationContext::new().with_everything(sequence_of(items));
        let none = Expression::everything().first(newer("9.0"));
        assert_eq!(evaluate(&none, &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_quantifier_needs_lambda() {
        let expr = Expression::call(
            Operator::Exists,
            vec![Expression::everything(), Expression::literal(true)],
        );
        assert!(matches!(
            eval(&expr).unwrap_err(),
            QueryError::Evaluation { operand: 1, .. }
        ));
    }

    #[test]
    fn test_count_and_limit() {
        let items = vec![unit("a", "1.0"), unit("b", "1.0"), unit("c", "1.0")];

        let ctx = EvaluationContext::new().with_everything(sequence_of(items.clone()));
        assert_eq!(
            evaluate(&Expression::everything().count(), &ctx).unwrap(),
            Value::Integer(3)
        );

        let mut ctx = EvaluationContext::new().with_everything(sequence_of(items.clone()));
        let expr = Expression::everything().limit(Expression::parameter(0));
        ctx.bind_parameters(Parameters::new().with(2), &expr).unwrap();
        assert_eq!(
            evaluate(&expr, &ctx).unwrap(),
            Value::list(items[..2].to_vec())
        );

        let ctx = EvaluationContext::new();
        let negative = Expression::everything().limit(Expression::literal(-1));
        assert!(evaluate(&negative, &ctx).is_err());

        let ctx = EvaluationContext::new().with_everything(sequence_of(items.clone()));
        let unbounded = Expression::everything().limit(Expression::literal(i64::MAX));
        assert_eq!(evaluate(&unbounded, &ctx).unwrap(), Value::list(items));
    }

    #[test]
    fn test_limit_stops_pulling_source() {
        let pulled = std::cell::Cell::new(0);
        let source = (0..100).map(|i| {
            pulled.set(pulled.get() + 1);
            Ok::<_, QueryError>(Value::Integer(i))
        });
        let ctx = EvaluationContext::new().with_everything(Box::new(source));
        let expr = Expression::everything().limit(Expression::literal(3));

        let taken: Vec<Value> = evaluate_as_sequence(&expr, &ctx)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(taken.len(), 3);
        assert_eq!(pulled.get(), 3);
    }

    #[test]
    fn test_translated_without_support_returns_raw() {
        let expr = Expression::this().translated("name");
        assert_eq!(eval(&expr).unwrap(), Value::from("%core.name"));
    }

    #[test]
    fn test_translated_with_support() {
        use crate::translation::TranslationTable;

        let table = TranslationTable::new().with("de", "core.name", "Kern");
        let expr = Expression::this().translated("name");

        let ctx = EvaluationContext::new().with_translations(&table, "de", true);
        let _this = ctx.push_variable(crate::ast::THIS, unit("core", "1.0"));
        assert_eq!(evaluate(&expr, &ctx).unwrap(), Value::from("Kern"));

        let ctx = EvaluationContext::new().with_translations(&table, "fr", true);
        let _this = ctx.push_variable(crate::ast::THIS, unit("core", "1.0"));
        assert_eq!(evaluate(&expr, &ctx).unwrap(), Value::from("%core.name"));

        let ctx = EvaluationContext::new().with_translations(&table, "fr", false);
        let _this = ctx.push_variable(crate::ast::THIS, unit("core", "1.0"));
        assert_eq!(evaluate(&expr, &ctx).unwrap(), Value::Null);

        // Plain values are never looked up.
        let vendor = Expression::this().translated("vendor");
        assert_eq!(evaluate(&vendor, &ctx).unwrap(), Value::from("Example Corp"));
    }
}
