//! Language registry: single source of truth for supported languages.
//!
//! Holds the ordered list of languages a deployment serves. Exactly one
//! language is the default; translation substitution never applies to
//! it. The list comes from the `LANGUAGES` environment variable when
//! set, otherwise from the built-in list.

use anyhow::{bail, Result};

use crate::i18n::Language;

/// Configuration for a supported language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// ISO 639-1 language code (e.g., "en", "de", "fr")
    pub code: String,

    /// Display name of the language (e.g., "English", "German")
    pub name: String,

    /// Whether this is the default language (exactly one per registry).
    /// Requests for the default language always resolve to the
    /// canonical body; no translation entry is stored for it.
    pub is_default: bool,
}

/// Ordered registry of supported languages.
///
/// Built once at startup from deployment configuration and shared by
/// reference afterwards. Order is preserved from the configuration and
/// drives the order of editor tabs and exported schema fields.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

impl LanguageRegistry {
    /// Build a registry from an ordered list of language configurations.
    ///
    /// Fails if the list is empty, contains duplicate codes, or does not
    /// contain exactly one default language.
    pub fn new(languages: Vec<LanguageConfig>) -> Result<Self> {
        if languages.is_empty() {
            bail!("Language registry cannot be empty");
        }

        for (i, lang) in languages.iter().enumerate() {
            if lang.code.is_empty() {
                bail!("Language code cannot be empty");
            }
            if languages[..i].iter().any(|other| other.code == lang.code) {
                bail!("Duplicate language code: '{}'", lang.code);
            }
        }

        let default_count = languages.iter().filter(|l| l.is_default).count();
        if default_count != 1 {
            bail!(
                "Registry must have exactly one default language, found {}",
                default_count
            );
        }

        Ok(Self { languages })
    }

    /// Parse a registry from the `LANGUAGES` configuration syntax:
    /// a comma-separated list of `code:Name` pairs. The first entry is
    /// the default unless another entry is marked with a `*` prefix
    /// (e.g., `de:German,*en:English,fr:French`).
    pub fn from_config(spec: &str) -> Result<Self> {
        let mut languages = Vec::new();
        let mut saw_marked_default = false;

        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            let (marked, entry) = match entry.strip_prefix('*') {
                Some(rest) => (true, rest),
                None => (false, entry),
            };
            if marked && saw_marked_default {
                bail!("Only one language may be marked as default with '*'");
            }

            let (code, name) = entry
                .split_once(':')
                .map(|(c, n)| (c.trim(), n.trim()))
                .unwrap_or((entry, entry));
            if code.is_empty() || name.is_empty() {
                bail!("Invalid language entry: '{}'", entry);
            }

            languages.push(LanguageConfig {
                code: code.to_string(),
                name: name.to_string(),
                is_default: marked,
            });
            saw_marked_default |= marked;
        }

        if !saw_marked_default {
            if let Some(first) = languages.first_mut() {
                first.is_default = true;
            }
        }

        Self::new(languages)
    }

    /// All languages in registration order.
    pub fn list(&self) -> &[LanguageConfig] {
        &self.languages
    }

    /// Non-default languages in registration order. These are the
    /// languages that carry stored translations, editor tabs, and
    /// exported schema fields.
    pub fn translatable(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.languages.iter().filter(|l| !l.is_default)
    }

    /// Look up a language configuration by code.
    pub fn get(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Whether a code is registered.
    pub fn is_valid(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// The default language's code.
    pub fn default_code(&self) -> &str {
        &self
            .languages
            .iter()
            .find(|l| l.is_default)
            .expect("registry construction guarantees one default")
            .code
    }

    /// Construct a validated [`Language`] handle for a registered code.
    pub fn language(&self, code: &str) -> Result<Language> {
        match self.get(code) {
            Some(config) => Ok(Language::from_config(config)),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// The default language as a validated handle.
    pub fn default_language(&self) -> Language {
        self.language(self.default_code())
            .expect("default code is always registered")
    }
}

impl Default for LanguageRegistry {
    /// The built-in language list used when no deployment override is
    /// configured: English (default), German, French, Spanish.
    fn default() -> Self {
        Self::new(vec![
            LanguageConfig {
                code: "en".to_string(),
                name: "English".to_string(),
                is_default: true,
            },
            LanguageConfig {
                code: "de".to_string(),
                name: "German".to_string(),
                is_default: false,
            },
            LanguageConfig {
                code: "fr".to_string(),
                name: "French".to_string(),
                is_default: false,
            },
            LanguageConfig {
                code: "es".to_string(),
                name: "Spanish".to_string(),
                is_default: false,
            },
        ])
        .expect("built-in language list is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_languages() {
        let registry = LanguageRegistry::default();
        let codes: Vec<&str> = registry.list().iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["en", "de", "fr", "es"]);
        assert_eq!(registry.default_code(), "en");
    }

    #[test]
    fn test_get_by_code() {
        let registry = LanguageRegistry::default();
        let config = registry.get("de").expect("de is registered");
        assert_eq!(config.code, "de");
        assert_eq!(config.name, "German");
        assert!(!config.is_default);
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        let registry = LanguageRegistry::default();
        assert!(registry.get("ja").is_none());
    }

    #[test]
    fn test_is_valid() {
        let registry = LanguageRegistry::default();
        assert!(registry.is_valid("en"));
        assert!(registry.is_valid("fr"));
        assert!(!registry.is_valid("ja"));
        assert!(!registry.is_valid(""));
    }

    #[test]
    fn test_translatable_excludes_default() {
        let registry = LanguageRegistry::default();
        let codes: Vec<&str> = registry.translatable().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["de", "fr", "es"]);
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(LanguageRegistry::new(vec![]).is_err());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let result = LanguageRegistry::new(vec![
            LanguageConfig {
                code: "en".to_string(),
                name: "English".to_string(),
                is_default: true,
            },
            LanguageConfig {
                code: "en".to_string(),
                name: "Also English".to_string(),
                is_default: false,
            },
        ]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_zero_defaults_rejected() {
        let result = LanguageRegistry::new(vec![LanguageConfig {
            code: "en".to_string(),
            name: "English".to_string(),
            is_default: false,
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn test_two_defaults_rejected() {
        let result = LanguageRegistry::new(vec![
            LanguageConfig {
                code: "en".to_string(),
                name: "English".to_string(),
                is_default: true,
            },
            LanguageConfig {
                code: "de".to_string(),
                name: "German".to_string(),
                is_default: true,
            },
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_first_entry_default() {
        let registry =
            LanguageRegistry::from_config("en:English,de:German,tr:Turkish").expect("valid spec");
        assert_eq!(registry.default_code(), "en");
        assert_eq!(registry.get("tr").unwrap().name, "Turkish");
        assert_eq!(registry.list().len(), 3);
    }

    #[test]
    fn test_from_config_marked_default() {
        let registry =
            LanguageRegistry::from_config("de:German,*en:English,fr:French").expect("valid spec");
        assert_eq!(registry.default_code(), "en");
        // Order is preserved even when the default is not first.
        let codes: Vec<&str> = registry.list().iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["de", "en", "fr"]);
    }

    #[test]
    fn test_from_config_two_marked_defaults_rejected() {
        assert!(LanguageRegistry::from_config("*en:English,*de:German").is_err());
    }

    #[test]
    fn test_from_config_code_without_name() {
        let registry = LanguageRegistry::from_config("en,de").expect("valid spec");
        assert_eq!(registry.get("de").unwrap().name, "de");
    }

    #[test]
    fn test_from_config_empty_rejected() {
        assert!(LanguageRegistry::from_config("").is_err());
        assert!(LanguageRegistry::from_config(" , ,").is_err());
    }

    #[test]
    fn test_language_handle_construction() {
        let registry = LanguageRegistry::default();
        let german = registry.language("de").expect("de is registered");
        assert_eq!(german.code(), "de");
        assert_eq!(german.name(), "German");
        assert!(!german.is_default());

        assert!(registry.language("ja").is_err());
    }

    #[test]
    fn test_default_language_handle() {
        let registry = LanguageRegistry::default();
        let default = registry.default_language();
        assert_eq!(default.code(), "en");
        assert!(default.is_default());
    }
}
