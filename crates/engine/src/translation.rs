//! Locale-aware property lookup.

use indexmap::IndexMap;

/// Resolves translation keys for a locale. Implemented by the external
/// localization subsystem.
pub trait TranslationSupport: Send + Sync {
    fn resolve_translated_property(&self, locale: &str, key: &str) -> Option<String>;
}

/// An in-memory translation catalog keyed by locale then key.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    locales: IndexMap<String, IndexMap<String, String>>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.locales
            .entry(locale.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn with(
        mut self,
        locale: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.insert(locale, key, value);
        self
    }
}

impl TranslationSupport for TranslationTable {
    fn resolve_translated_property(&self, locale: &str, key: &str) -> Option<String> {
        self.locales.get(locale)?.get(key).cloned()
    }
}

/// Candidate locales from most to least specific: `de_CH` → `de_CH`, `de`.
pub fn locale_chain(locale: &str) -> Vec<&str> {
    let mut chain = vec![locale];
    let mut current = locale;
    while let Some(idx) = current.rfind(['_', '-']) {
        current = &current[..idx];
        chain.push(current);
    }
    chain
}
