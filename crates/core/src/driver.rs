//! State shared by the two drivers: the compiled body, its bound
//! parameters and the optional collaborators a perform call wires in.

use std::sync::{Arc, OnceLock};

use log::debug;
use provql_engine::{EvaluationContext, Expression, Parameters, QueryError, TranslationSupport};

use crate::config::QueryConfig;
use crate::hooks::PerformHooks;

pub(crate) struct DriverState {
    pub(crate) body: Arc<Expression>,
    parameters: Parameters,
    pub(crate) config: QueryConfig,
    translations: Option<Arc<dyn TranslationSupport>>,
    hooks: Option<Arc<dyn PerformHooks>>,
    needs_translations: bool,
    parameter_check: OnceLock<Result<(), QueryError>>,
}

impl DriverState {
    pub(crate) fn new(body: Arc<Expression>, parameters: Parameters) -> Self {
        let needs_translations = body.needs_translations();
        Self {
            body,
            parameters,
            config: QueryConfig::default(),
            translations: None,
            hooks: None,
            needs_translations,
            parameter_check: OnceLock::new(),
        }
    }

    pub(crate) fn set_translations(&mut self, support: Arc<dyn TranslationSupport>) {
        self.translations = Some(support);
    }

    pub(crate) fn set_hooks(&mut self, hooks: Arc<dyn PerformHooks>) {
        self.hooks = Some(hooks);
    }

    pub(crate) fn needs_translations(&self) -> bool {
        self.needs_translations
    }

    pub(crate) fn hooks(&self) -> Option<&dyn PerformHooks> {
        self.hooks.as_deref()
    }

    /// Checks the parameters against the body once per driver.
    pub(crate) fn check_parameters(&self) -> Result<(), QueryError> {
        self.parameter_check
            .get_or_init(|| self.parameters.check(&self.body))
            .clone()
    }

    /// A fresh context for one invocation, with parameters bound and
    /// translations attached when the body uses them.
    pub(crate) fn context(&self) -> Result<EvaluationContext<'_>, QueryError> {
        self.check_parameters()?;
        let mut ctx = EvaluationContext::new().with_parameters(self.parameters.clone());
        if self.needs_translations {
            match &self.translations {
                Some(support) => {
                    ctx = ctx.with_translations(
                        support.as_ref(),
                        self.config.locale.as_str(),
                        self.config.translation_fallback,
                    );
                }
                None => debug!("query uses 'translated' without translation support"),
            }
        }
        Ok(ctx)
    }
}
