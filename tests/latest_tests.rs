mod common;

use common::fixtures::repository_json;
use common::{TestResult, ids_and_versions, pairs, unit};
use provql::{
    ContextQueryDriver, EvaluationContext, Expression, Lambda, LatestQuery, Parameters,
    QueryConfig, QueryError, Value, evaluate_as_sequence, parse_records, sequence_of,
};
use std::cell::Cell;

fn id_equals_parameter() -> Lambda {
    Lambda::new(
        "x",
        Expression::variable("x").member("id").equals(Expression::parameter(0)),
    )
}

#[test]
fn test_latest_of_selected_unit() -> TestResult {
    let query = Expression::everything().select(id_equals_parameter()).latest();
    let driver = ContextQueryDriver::new(query, vec![Value::from("a")]);

    let input = vec![unit("a", "1.0.0"), unit("b", "3.0.0"), unit("a", "2.0.0")];
    let result = driver.query(sequence_of(input))?;

    assert_eq!(ids_and_versions(&result), pairs(&[("a", "2.0.0")]));
    Ok(())
}

#[test]
fn test_latest_emits_in_first_seen_order() -> TestResult {
    let driver = ContextQueryDriver::new(Expression::everything().latest(), Parameters::new());
    let input = vec![
        unit("b", "1.0.0"),
        unit("a", "1.0.0"),
        unit("c", "5.0.0"),
        unit("a", "1.5.0"),
        unit("b", "0.5.0"),
    ];

    let result = driver.query(sequence_of(input))?;
    assert_eq!(
        ids_and_versions(&result),
        pairs(&[("b", "1.0.0"), ("a", "1.5.0"), ("c", "5.0.0")])
    );
    Ok(())
}

#[test]
fn test_latest_on_empty_input() -> TestResult {
    let driver = ContextQueryDriver::new(
        Expression::everything().select(id_equals_parameter()).latest(),
        vec![Value::from("a")],
    );
    assert!(driver.query(sequence_of(Vec::new()))?.is_empty());
    Ok(())
}

#[test]
fn test_fused_and_separate_passes_agree() -> TestResult {
    let input = || {
        vec![
            unit("a", "1.0.0"),
            unit("b", "2.0.0"),
            unit("a", "3.0.0"),
            unit("c", "1.0.0"),
            unit("b", "2.5.0"),
        ]
    };
    let predicate = Lambda::new(
        "x",
        Expression::variable("x")
            .member("id")
            .not_equals(Expression::literal("c")),
    );

    // select then latest fuses into one pass
    let fused = Expression::everything().select(predicate.clone()).latest();
    let fused_ctx = EvaluationContext::new().with_everything(sequence_of(input()));
    let fused_result: Vec<_> = evaluate_as_sequence(&fused, &fused_ctx)?.collect::<Result<_, _>>()?;

    // the select materialized as a list first cannot fuse
    let selected: Vec<_> = {
        let select = Expression::everything().select(predicate);
        let ctx = EvaluationContext::new().with_everything(sequence_of(input()));
        evaluate_as_sequence(&select, &ctx)?.collect::<Result<_, _>>()?
    };
    let separate = Expression::literal(Value::list(selected)).latest();
    let separate_result: Vec<_> =
        evaluate_as_sequence(&separate, &EvaluationContext::new())?.collect::<Result<_, _>>()?;

    assert_eq!(fused_result, separate_result);
    assert_eq!(
        ids_and_versions(&fused_result),
        pairs(&[("a", "3.0.0"), ("b", "2.5.0")])
    );
    Ok(())
}

#[test]
fn test_predicate_error_surfaces() {
    // ordering an identifier against an integer fails inside the fused select
    let query = Expression::everything()
        .select(Lambda::new(
            "x",
            Expression::variable("x").member("id").less(Expression::literal(1)),
        ))
        .latest();
    let driver = ContextQueryDriver::new(query, Parameters::new());

    let err = driver
        .query(sequence_of(vec![unit("a", "1.0.0")]))
        .unwrap_err();
    assert_eq!(err.operator(), Some("<"));
}

#[test]
fn test_working_set_is_pulled_lazily() -> TestResult {
    let pulled = Cell::new(0usize);
    let source = (0..100).map(|i| {
        pulled.set(pulled.get() + 1);
        Ok::<_, QueryError>(unit(&format!("unit{}", i % 3), "1.0.0"))
    });

    let query = Expression::everything().limit(Expression::literal(4));
    let ctx = EvaluationContext::new().with_everything(Box::new(source));
    let result: Vec<_> = evaluate_as_sequence(&query, &ctx)?.collect::<Result<_, _>>()?;

    assert_eq!(result.len(), 4);
    assert_eq!(pulled.get(), 4);
    Ok(())
}

#[test]
fn test_latest_query_over_repository() -> TestResult {
    let records = parse_records(repository_json())?;
    let config = QueryConfig::default().with_locale("en");

    let all = LatestQuery::default().run(records.clone(), &config)?;
    assert_eq!(
        ids_and_versions(&all),
        pairs(&[
            ("org.example.core", "2.0.0.beta"),
            ("org.example.ui", "1.1.0"),
            ("org.example.feature", "3.0.0"),
            ("com.other.tool", "0.9.0"),
        ])
    );

    let units = LatestQuery {
        kind: Some("unit".into()),
        id_pattern: Some("org.example.*".into()),
    }
    .run(records, &config)?;
    assert_eq!(
        ids_and_versions(&units),
        pairs(&[("org.example.core", "2.0.0.beta"), ("org.example.ui", "1.1.0")])
    );
    Ok(())
}
