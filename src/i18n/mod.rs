//! Language registry and validated language handles.
//!
//! The registry is the single source of truth for the set of supported
//! languages: an ordered list of (code, display name) pairs with exactly
//! one designated default. The set is deployment-configured (via the
//! `LANGUAGES` environment variable), so the registry is a plain value
//! built at startup and shared by reference rather than a process-wide
//! singleton.
//!
//! # Example
//!
//! ```rust,ignore
//! use content_translations::i18n::LanguageRegistry;
//!
//! let registry = LanguageRegistry::default();
//! let german = registry.language("de")?;
//! assert!(!german.is_default());
//! ```

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
