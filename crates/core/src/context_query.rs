//! Exposes a compiled collection query as a [`SequenceQuery`].

use std::sync::Arc;

use log::debug;
use provql_engine::{
    Expression, Parameters, QueryError, Sequence, SequenceQuery, TranslationSupport, Value,
    evaluate_as_sequence, sequence_of,
};

use crate::config::QueryConfig;
use crate::driver::DriverState;
use crate::error::DriverError;
use crate::factory::ExpressionFactory;
use crate::hooks::{HookScope, PerformHooks};

/// Evaluates a collection-level expression with the input bound to
/// `everything`.
pub struct ContextQueryDriver {
    state: DriverState,
}

impl ContextQueryDriver {
    pub fn new(body: impl Into<Arc<Expression>>, parameters: impl Into<Parameters>) -> Self {
        Self {
            state: DriverState::new(body.into(), parameters.into()),
        }
    }

    pub fn from_source(
        factory: &dyn ExpressionFactory,
        source: &str,
        parameters: impl Into<Parameters>,
    ) -> Result<Self, DriverError> {
        let driver = Self::new(factory.compile(source)?, parameters);
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

    pub fn body(&self) -> &Expression {
        &self.state.body
    }

    /// Runs the query over `input` and collects the result.
    pub fn query<'s>(&self, input: Sequence<'s>) -> Result<Vec<Value>, QueryError> {
        let ctx = self.state.context()?.with_everything(input);
        let _hooks = HookScope::enter(self.state.hooks());

        let results = evaluate_as_sequence(&self.state.body, &ctx)?.collect::<Result<Vec<_>, _>>()?;
        debug!("query '{}' produced {} results", self.state.body, results.len());
        Ok(results)
    }
}

impl SequenceQuery for ContextQueryDriver {
    fn perform<'s>(&self, input: Sequence<'s>) -> Result<Sequence<'s>, QueryError> {
        Ok(sequence_of(self.query(input)?))
    }
}
