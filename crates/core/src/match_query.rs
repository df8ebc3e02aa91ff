//! Exposes a compiled predicate as a [`MatchQuery`].

use std::sync::Arc;

use log::debug;
use provql_engine::{
    EvaluationContext, Expression, MatchQuery, Parameters, PerformScope, QueryError, Sequence,
    THIS, TranslationSupport, Value, evaluate_predicate,
};

use crate::config::QueryConfig;
use crate::driver::DriverState;
use crate::error::DriverError;
use crate::factory::ExpressionFactory;
use crate::hooks::PerformHooks;

/// Which candidates a driver considers at all. Candidates outside the shape
/// never match; they are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ElementShape {
    #[default]
    Any,
    /// Records carrying an identifier and a version.
    Versioned,
    /// Records of one kind, e.g. `unit` or `feature`.
    Kind(String),
}

impl ElementShape {
    pub fn kind(kind: impl Into<String>) -> Self {
        ElementShape::Kind(kind.into())
    }

    pub fn accepts(&self, candidate: &Value) -> bool {
        match self {
            ElementShape::Any => true,
            ElementShape::Versioned => candidate.versioned().is_some(),
            ElementShape::Kind(kind) => candidate
                .as_record()
                .is_some_and(|record| record.kind() == kind),
        }
    }
}

/// Evaluates a predicate expression against each candidate with the
/// candidate bound to `this`.
pub struct MatchQueryDriver {
    shape: ElementShape,
    state: DriverState,
}

impl MatchQueryDriver {
    pub fn new(
        shape: ElementShape,
        predicate: impl Into<Arc<Expression>>,
        parameters: impl Into<Parameters>,
    ) -> Self {
        Self {
            shape,
            state: DriverState::new(predicate.into(), parameters.into()),
        }
    }

    /// Compiles `source` with `factory` and checks the parameters against
    /// it up front.
    pub fn from_source(
        factory: &dyn ExpressionFactory,
        shape: ElementShape,
        source: &str,
        parameters: impl Into<Parameters>,
    ) -> Result<Self, DriverError> {
        let driver = Self::new(shape, factory.compile_predicate(source)?, parameters);
        driver.state.check_parameters()?;
        Ok(driver)
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.state.config = config;
        self
    }

    pub fn with_translations(mut self, support: Arc<dyn TranslationSupport>) -> Self {
        self.state.set_translations(support);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn PerformHooks>) -> Self {
        self.state.set_hooks(hooks);
        self
    }

    pub fn shape(&self) -> &ElementShape {
        &self.shape
    }

    pub fn predicate(&self) -> &Expression {
        &self.state.body
    }

    pub fn needs_translations(&self) -> bool {
        self.state.needs_translations()
    }

    fn test(&self, candidate: &Value, ctx: &EvaluationContext<'_>) -> Result<bool, QueryError> {
        if !self.shape.accepts(candidate) {
            return Ok(false);
        }
        let _this = ctx.push_variable(THIS, candidate.clone());
        evaluate_predicate(&self.state.body, ctx)
    }
}

impl MatchQuery for MatchQueryDriver {
    fn pre_perform(&self) {
        if let Some(hooks) = self.state.hooks() {
            hooks.setup();
        }
    }

    fn is_match(&self, candidate: &Value) -> Result<bool, QueryError> {
        let ctx = self.state.context()?;
        self.test(candidate, &ctx)
    }

    fn post_perform(&self) {
        if let Some(hooks) = self.state.hooks() {
            hooks.teardown();
        }
    }

    fn perform<'s>(&self, input: Sequence<'s>) -> Result<Vec<Value>, QueryError> {
        let ctx = self.state.context()?;
        let _scope = PerformScope::enter(self);

        let mut tested = 0usize;
        let mut matches = Vec::new();
        for candidate in input {
            let candidate = candidate?;
            tested += 1;
            if self.test(&candidate, &ctx)? {
                matches.push(candidate);
            }
        }
        debug!(
            "predicate '{}' matched {} of {} candidates",
            self.state.body,
            matches.len(),
            tested
        );
        Ok(matches)
    }
}
