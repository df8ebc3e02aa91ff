//! The canned queries behind the command line.

use std::sync::Arc;

use provql_core::{ContextQueryDriver, ElementShape, MatchQueryDriver, QueryConfig};
use provql_engine::{
    Expression, Lambda, MatchQuery, Parameters, TranslationSupport, Value, VersionRange,
    sequence_of,
};

use crate::error::ProvqlError;

const ID: &str = "id";
const KIND: &str = "kind";
const NAME: &str = "name";
const RANGE: &str = "range";

/// The latest version of each unit, optionally narrowed by kind and by an
/// identifier pattern (`*` wildcards).
#[derive(Debug, Clone, Default)]
pub struct LatestQuery {
    pub kind: Option<String>,
    pub id_pattern: Option<String>,
}

impl LatestQuery {
    /// `everything.select(x | x ~= $kind && x.id ~= $id).latest()`, leaving
    /// out the select when nothing narrows it.
    pub fn driver(&self) -> ContextQueryDriver {
        let mut parameters = Parameters::new();
        let mut conditions = Vec::new();
        if let Some(kind) = &self.kind {
            parameters = parameters.with_named(KIND, kind.as_str());
            conditions.push(Expression::variable("x").matches(Expression::named_parameter(KIND)));
        }
        if let Some(pattern) = &self.id_pattern {
            parameters = parameters.with_named(ID, pattern.as_str());
            conditions.push(
                Expression::variable("x")
                    .member("id")
                    .matches(Expression::named_parameter(ID)),
            );
        }

        let body = match conjunction(conditions) {
            Some(condition) => Expression::everything().select(Lambda::new("x", condition)),
            None => Expression::everything(),
        };
        ContextQueryDriver::new(body.latest(), parameters)
    }

    pub fn run(&self, records: Vec<Value>, config: &QueryConfig) -> Result<Vec<Value>, ProvqlError> {
        let driver = self.driver().with_config(config.clone());
        Ok(driver.query(sequence_of(records))?)
    }
}

/// Every version whose identifier matches a pattern and, optionally, whose
/// version lies in a range and whose translated name matches a pattern.
#[derive(Debug, Clone)]
pub struct MatchFilter {
    pub kind: Option<String>,
    pub id_pattern: String,
    pub range: Option<VersionRange>,
    pub name_pattern: Option<String>,
}

impl Default for MatchFilter {
    fn default() -> Self {
        Self {
            kind: None,
            id_pattern: "*".to_string(),
            range: None,
            name_pattern: None,
        }
    }
}

impl MatchFilter {
    pub fn with_range(mut self, range: &str) -> Result<Self, ProvqlError> {
        self.range = Some(VersionRange::parse(range)?);
        Ok(self)
    }

    pub fn driver(&self) -> MatchQueryDriver {
        let mut parameters = Parameters::new().with_named(ID, self.id_pattern.as_str());
        let mut conditions = vec![Expression::this()
            .member("id")
            .matches(Expression::named_parameter(ID))];
        if let Some(range) = &self.range {
            parameters = parameters.with_named(RANGE, range.clone());
            conditions.push(
                Expression::this()
                    .member("version")
                    .matches(Expression::named_parameter(RANGE)),
            );
        }
        if let Some(pattern) = &self.name_pattern {
            parameters = parameters.with_named(NAME, pattern.as_str());
            conditions.push(
                Expression::this()
                    .translated("name")
                    .matches(Expression::named_parameter(NAME)),
            );
        }

        let shape = match &self.kind {
            Some(kind) => ElementShape::kind(kind.as_str()),
            None => ElementShape::Versioned,
        };
        let predicate = conjunction(conditions).unwrap_or_else(|| Expression::literal(true));
        MatchQueryDriver::new(shape, predicate, parameters)
    }

    pub fn run(
        &self,
        records: Vec<Value>,
        config: &QueryConfig,
        translations: Option<Arc<dyn TranslationSupport>>,
    ) -> Result<Vec<Value>, ProvqlError> {
        let mut driver = self.driver().with_config(config.clone());
        if let Some(support) = translations {
            driver = driver.with_translations(support);
        }
        Ok(driver.perform(sequence_of(records))?)
    }
}

fn conjunction(conditions: Vec<Expression>) -> Option<Expression> {
    conditions.into_iter().reduce(Expression::and)
}
