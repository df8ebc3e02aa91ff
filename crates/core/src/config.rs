use serde::Deserialize;
use std::env;

const LOCALE_VARIABLES: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];
const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// The locale translated properties are resolved for, e.g. `de_CH`.
    ///
    /// Defaults to the calling environment's locale (`LC_ALL`, `LC_MESSAGES`,
    /// then `LANG`), or `en` when none is set.
    pub locale: String,

    /// When a translation key has no entry for the locale, return the raw
    /// property value instead of null.
    ///
    /// Defaults to `true`.
    pub translation_fallback: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            locale: environment_locale(),
            translation_fallback: true,
        }
    }
}

impl QueryConfig {
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_translation_fallback(mut self, fallback: bool) -> Self {
        self.translation_fallback = fallback;
        self
    }
}

fn environment_locale() -> String {
    LOCALE_VARIABLES
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find_map(|value| normalize_locale(&value))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// `de_CH.UTF-8@euro` → `de_CH`. The POSIX locales carry no language.
fn normalize_locale(value: &str) -> Option<String> {
    let locale = value.split(['.', '@']).next().unwrap_or_default();
    match locale {
        "" | "C" | "POSIX" => None,
        other => Some(other.to_string()),
    }
}
