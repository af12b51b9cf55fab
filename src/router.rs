//! Request-side language derivation and link generation.
//!
//! A request's language comes from a leading path segment matching a
//! registered non-default code (`/de/my-post/`), or from an explicit
//! `lang` query parameter; absent both, the default language applies.
//! Links to content embed the active non-default language as the same
//! path prefix, so generated links resolve back through this module.

use crate::db::ContentItem;
use crate::i18n::{Language, LanguageRegistry};

/// Outcome of routing one inbound path.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    /// The language the request asked for (default if no usable signal).
    pub language: Language,
    /// The path with any language prefix stripped, normalized to a
    /// leading slash.
    pub rest: String,
    /// Whether the request carried an explicit language signal (valid
    /// path prefix or valid query parameter). When set, closest-match
    /// redirect guessing must stay disabled so the guesser does not
    /// fight language-prefixed paths.
    pub has_language_signal: bool,
}

/// Derive the requested language from path and query state.
///
/// Only non-default codes act as path prefixes; the default language's
/// URLs are unprefixed, so a first segment equal to the default code is
/// an ordinary slug. Invalid codes in the query parameter are ignored
/// rather than rejected; resolution degrades to the default language.
pub fn language_for(
    path: &str,
    lang_param: Option<&str>,
    registry: &LanguageRegistry,
) -> RouteDecision {
    let trimmed = path.trim_start_matches('/');
    let (first, rest) = match trimmed.split_once('/') {
        Some((first, rest)) => (first, rest),
        None => (trimmed, ""),
    };

    if !first.is_empty() && first != registry.default_code() && registry.is_valid(first) {
        let language = registry
            .language(first)
            .expect("validated against registry");
        return RouteDecision {
            language,
            rest: format!("/{}", rest),
            has_language_signal: true,
        };
    }

    if let Some(code) = lang_param {
        if registry.is_valid(code) {
            let language = registry.language(code).expect("validated against registry");
            return RouteDecision {
                language,
                rest: normalize(path),
                has_language_signal: true,
            };
        }
    }

    RouteDecision {
        language: registry.default_language(),
        rest: normalize(path),
        has_language_signal: false,
    }
}

fn normalize(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Extract the content slug from a routed path (`/my-post/` → `my-post`).
/// Empty for the home path.
pub fn slug_from_path(rest: &str) -> &str {
    rest.trim_matches('/')
}

/// The public link for a content item in a given language: prefixed
/// with the language code for non-default languages, unprefixed for the
/// default.
pub fn content_link(item: &ContentItem, language: &Language) -> String {
    if language.is_default() {
        format!("/{}/", item.slug)
    } else {
        format!("/{}/{}/", language.code(), item.slug)
    }
}

/// Closest-match guess for an unknown slug: the redirect target when
/// exactly one known slug starts with the requested one. Callers must
/// skip this whenever the request carried a language signal.
pub fn guess_slug<'a>(known_slugs: &'a [String], requested: &str) -> Option<&'a str> {
    if requested.is_empty() {
        return None;
    }

    let mut matches = known_slugs
        .iter()
        .filter(|slug| slug.starts_with(requested));

    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}
