//! Validated language handle.
//!
//! A `Language` can only be obtained through a [`LanguageRegistry`],
//! so holding one is proof the code was registered at construction
//! time. Code paths that accept arbitrary request input (URL segments,
//! query parameters, form field keys) validate through the registry
//! first and fall back to the default language when validation fails.

use crate::i18n::LanguageConfig;

/// A language validated against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    code: String,
    name: String,
    is_default: bool,
}

impl Language {
    /// Construct from a registry entry. Crate-internal: external
    /// callers go through [`LanguageRegistry::language`].
    ///
    /// [`LanguageRegistry::language`]: crate::i18n::LanguageRegistry::language
    pub(crate) fn from_config(config: &LanguageConfig) -> Self {
        Self {
            code: config.code.clone(),
            name: config.name.clone(),
            is_default: config.is_default,
        }
    }

    /// The language code (e.g., "en", "de").
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The display name (e.g., "English", "German").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the registry's default language. Content in the
    /// default language is the canonical body itself; no substitution
    /// applies.
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}
