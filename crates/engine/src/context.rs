//! Per-invocation evaluation state.
//!
//! An [`EvaluationContext`] is created once per `perform` call and never
//! shared. Variable bindings live on a stack behind a `RefCell` so lazy
//! sequences can hold a shared reference to the context while still binding
//! lambda variables as they pull items.

use std::cell::RefCell;

use indexmap::IndexMap;
use log::debug;

use crate::ast::{EVERYTHING, Expression, ParameterRef};
use crate::error::QueryError;
use crate::translation::{TranslationSupport, locale_chain};
use crate::value::{Sequence, Value, empty_sequence};

/// Positional and named parameter values for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    positional: Vec<Value>,
    named: IndexMap<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, reference: &ParameterRef) -> Option<&Value> {
        match reference {
            ParameterRef::Index(i) => self.positional.get(*i),
            ParameterRef::Name(name) => self.named.get(name),
        }
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails if `body` references a parameter that is not supplied.
    pub fn check(&self, body: &Expression) -> Result<(), QueryError> {
        match body.parameter_refs().into_iter().find(|r| self.get(r).is_none()) {
            Some(missing) => Err(QueryError::configuration(format!(
                "query references parameter {} but only {} were supplied",
                missing,
                self.len()
            ))),
            None => Ok(()),
        }
    }
}

impl From<Vec<Value>> for Parameters {
    fn from(positional: Vec<Value>) -> Self {
        Self {
            positional,
            named: IndexMap::new(),
        }
    }
}

enum WorkingSet<'a> {
    Unset,
    Available(Sequence<'a>),
    Consumed,
}

/// A translation facility bound to the caller's locale.
pub struct TranslationBinding<'a> {
    support: &'a dyn TranslationSupport,
    locale: String,
    fallback: bool,
}

impl TranslationBinding<'_> {
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Whether an untranslated key falls back to the raw property value.
    pub fn fallback(&self) -> bool {
        self.fallback
    }

    pub fn resolve(&self, key: &str) -> Option<String> {
        locale_chain(&self.locale)
            .into_iter()
            .find_map(|locale| self.support.resolve_translated_property(locale, key))
    }
}

pub struct EvaluationContext<'a> {
    parameters: Parameters,
    variables: RefCell<Vec<(String, Value)>>,
    everything: RefCell<WorkingSet<'a>>,
    translations: Option<TranslationBinding<'a>>,
}

impl Default for EvaluationContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> EvaluationContext<'a> {
    pub fn new() -> Self {
        Self {
            parameters: Parameters::default(),
            variables: RefCell::new(Vec::new()),
            everything: RefCell::new(WorkingSet::Unset),
            translations: None,
        }
    }

    pub fn with_translations(
        mut self,
        support: &'a dyn TranslationSupport,
        locale: impl Into<String>,
        fallback: bool,
    ) -> Self {
        self.translations = Some(TranslationBinding {
            support,
            locale: locale.into(),
            fallback,
        });
        self
    }

    /// Installs the one-shot working set the `everything` variable yields.
    pub fn with_everything(self, everything: Sequence<'a>) -> Self {
        *self.everything.borrow_mut() = WorkingSet::Available(everything);
        self
    }

    /// Installs `parameters` after checking that `body` references nothing
    /// missing from them.
    pub fn bind_parameters(
        &mut self,
        parameters: Parameters,
        body: &Expression,
    ) -> Result<(), QueryError> {
        parameters.check(body)?;
        self.parameters = parameters;
        Ok(())
    }

    /// Installs `parameters` that were already checked against the body.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn parameter(&self, reference: &ParameterRef) -> Result<Value, QueryError> {
        self.parameters
            .get(reference)
            .cloned()
            .ok_or_else(|| QueryError::configuration(format!("parameter {} is not bound", reference)))
    }

    /// Binds `name` until the returned scope is dropped.
    pub fn push_variable(&self, name: &str, value: Value) -> VariableScope<'_, 'a> {
        self.variables.borrow_mut().push((name.to_string(), value));
        VariableScope {
            ctx: self,
            name: name.to_string(),
        }
    }

    pub(crate) fn pop_variable(&self, name: &str) {
        let mut variables = self.variables.borrow_mut();
        debug_assert_eq!(
            variables.last().map(|(n, _)| n.as_str()),
            Some(name),
            "variable scopes must unwind in LIFO order"
        );
        variables.pop();
    }

    /// Innermost binding wins.
    pub fn resolve_variable(&self, name: &str) -> Result<Value, QueryError> {
        self.variables
            .borrow()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| QueryError::unbound(name))
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.variables.borrow().iter().any(|(n, _)| n == name)
    }

    /// Number of live variable bindings.
    pub fn depth(&self) -> usize {
        self.variables.borrow().len()
    }

    /// Hands out the working set. It can be taken once; a context without a
    /// working set yields an empty sequence.
    pub fn take_everything(&self) -> Result<Sequence<'a>, QueryError> {
        let mut slot = self.everything.borrow_mut();
        match std::mem::replace(&mut *slot, WorkingSet::Consumed) {
            WorkingSet::Available(sequence) => Ok(sequence),
            WorkingSet::Unset => {
                *slot = WorkingSet::Unset;
                debug!("no working set bound; '{}' is empty", EVERYTHING);
                Ok(empty_sequence())
            }
            WorkingSet::Consumed => Err(QueryError::evaluation(
                EVERYTHING,
                0,
                "working set is single-pass and was already consumed",
            )),
        }
    }

    pub fn translation_support(&self) -> Option<&TranslationBinding<'a>> {
        self.translations.as_ref()
    }
}

/// Pops its variable binding on drop, whatever path leaves the scope.
#[must_use = "the variable is unbound as soon as the scope is dropped"]
pub struct VariableScope<'c, 'a> {
    ctx: &'c EvaluationContext<'a>,
    name: String,
}

impl Drop for VariableScope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.pop_variable(&self.name);
    }
}
