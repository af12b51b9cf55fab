//! Schema export: the query-side projection of the translation store.
//!
//! The exported shape mirrors what the plugin registered into the
//! GraphQL type registry: a `Translations` object with one field per
//! registered non-default language, each holding a `content` field
//! parameterized by a RAW/RENDERED format argument. The execution
//! engine itself is an external collaborator; this module ships the
//! introspectable shape and the resolvers.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::db::{ContentItem, Database};
use crate::i18n::LanguageRegistry;
use crate::render::{FilterChain, RenderContext};

/// Output format for translated content.
///
/// RAW returns the stored body unchanged; RENDERED passes it through
/// the same filter chain applied to canonical content. RENDERED is the
/// default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentFormat {
    Raw,
    #[default]
    Rendered,
}

impl ContentFormat {
    /// Parse a format argument. Case-insensitive; anything other than
    /// RAW or RENDERED is a malformed query.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "RAW" => Ok(Self::Raw),
            "RENDERED" => Ok(Self::Rendered),
            other => bail!("Unknown content format: '{}'", other),
        }
    }
}

/// One exported per-language field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub description: String,
}

/// The exported `Translations` object type.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationsSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldDescription>,
    pub formats: [&'static str; 2],
    pub default_format: ContentFormat,
}

/// Describe the exported type for the current registry: one field per
/// non-default language, in registry order.
pub fn translations_schema(registry: &LanguageRegistry) -> TranslationsSchema {
    TranslationsSchema {
        name: "Translations",
        description: "Content translations keyed by language code",
        fields: registry
            .translatable()
            .map(|lang| FieldDescription {
                name: lang.code.clone(),
                type_name: "TranslatedContent",
                description: format!("{} translation", lang.name),
            })
            .collect(),
        formats: ["RAW", "RENDERED"],
        default_format: ContentFormat::default(),
    }
}

/// A resolved `content` field.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedContent {
    pub content: String,
}

/// Resolve one language field on an item's `translations` object.
///
/// RAW is the stored body verbatim (empty string when absent).
/// RENDERED runs the canonical filter chain with this item as the
/// rendering context, so embedded constructs expand exactly as they do
/// for canonical content.
pub fn resolve_translation(
    db: &Database,
    chain: &FilterChain,
    registry: &LanguageRegistry,
    item: &ContentItem,
    code: &str,
    format: ContentFormat,
) -> Result<TranslatedContent> {
    let language = registry.language(code)?;

    let raw = db
        .get_translations(item.id)?
        .and_then(|set| set.get(code).map(str::to_string))
        .unwrap_or_default();

    let content = match format {
        ContentFormat::Raw => raw,
        ContentFormat::Rendered => {
            let ctx = RenderContext {
                item,
                language: &language,
            };
            chain.render(&raw, &ctx)
        }
    };

    Ok(TranslatedContent { content })
}

/// Resolve the whole `translations` object for an item: every
/// registered non-default language, in registry order.
pub fn project_translations(
    db: &Database,
    chain: &FilterChain,
    registry: &LanguageRegistry,
    item: &ContentItem,
    format: ContentFormat,
) -> Result<Vec<(String, TranslatedContent)>> {
    registry
        .translatable()
        .map(|lang| {
            let resolved = resolve_translation(db, chain, registry, item, &lang.code, format)?;
            Ok((lang.code.clone(), resolved))
        })
        .collect()
}
